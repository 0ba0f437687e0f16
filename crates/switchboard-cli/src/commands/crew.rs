use anyhow::Result;
use cliclack::spinner;
use console::style;
use std::collections::HashMap;
use std::path::PathBuf;
use switchboard::configuration::Services;
use switchboard::crew::CrewSpec;

use crate::render::{print_markdown, print_titled};

pub fn list() -> Result<()> {
    for name in CrewSpec::bundled_names() {
        let spec = CrewSpec::bundled(name)?;
        println!("{}  {}", style(name).bold(), style(spec.description).dim());
    }
    Ok(())
}

pub async fn run(
    mut services: Services,
    name: &str,
    inputs: Vec<(String, String)>,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let spec = CrewSpec::bundled(name)?;
    let inputs: HashMap<String, String> = inputs.into_iter().collect();
    if let Some(output_dir) = output_dir {
        services.output_dir = output_dir;
    }

    println!(
        "Starting crew {} {}",
        style(&spec.name).bold(),
        style(format!("({} tasks)", spec.tasks.len())).dim()
    );

    let spin = spinner();
    spin.start("crew is working");
    let output = services.crew_runner().kickoff(&spec, &inputs).await;
    spin.stop("");
    let output = output?;

    for task in &output.tasks[..output.tasks.len().saturating_sub(1)] {
        print_titled(&task.raw, &format!("{} ({})", task.name, task.agent), "Markdown")?;
    }
    println!("\n");
    print_markdown(&output.raw)?;
    Ok(())
}
