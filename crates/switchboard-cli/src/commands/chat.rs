use anyhow::Result;
use cliclack::{input, spinner};
use console::style;
use switchboard::configuration::Services;
use switchboard::models::message::Message;

use crate::render::{print_markdown, print_titled};

pub async fn run(services: &Services) -> Result<()> {
    let agent = services.chat_agent()?;
    let mut history: Vec<Message> = Vec::new();

    println!(
        "Chatting as {} {}",
        style(&services.persona.name).bold(),
        style("- type \"exit\" to end the session").dim()
    );
    println!("\n");

    loop {
        let message_text: String = input("Message:").placeholder("").multiline().interact()?;
        if message_text.trim().eq_ignore_ascii_case("exit") {
            break;
        }

        let spin = spinner();
        spin.start("awaiting reply");
        let outcome = agent.reply(&history, &message_text).await;
        spin.stop("");
        let outcome = outcome?;

        if let Some(reply) = &outcome.reply {
            print_markdown(reply)?;
        }
        for result in &outcome.tool_results {
            let content = serde_json::to_string_pretty(&result.content)?;
            print_titled(&content, &format!("Tool: {}", result.name), "JSON")?;
        }
        if outcome.reply.is_none() && outcome.tool_results.is_empty() {
            println!("{}", style("(no reply)").dim());
        }

        history = outcome.messages;
        println!("\n");
    }
    Ok(())
}
