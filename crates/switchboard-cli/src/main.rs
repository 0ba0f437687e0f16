mod commands;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use switchboard::configuration::{Services, Settings};
use switchboard::providers::factory::ProviderType;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Model endpoint to use (openai, deepseek or gemini)
    #[arg(long, global = true, value_parser = parse_provider)]
    provider: Option<ProviderType>,

    /// Model to use, defaults to the provider's default model
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chat with the persona assistant
    Chat,

    /// Run the research pipeline and email the report
    Research {
        /// What to research; asked interactively when omitted
        query: Option<String>,
    },

    /// Kick off a bundled crew
    Crew {
        /// Name of the crew (fincore, optionstrader, profitpilot, thinkbot)
        name: String,

        /// Template input as key=value, may be repeated
        #[arg(short = 'i', long = "input", value_parser = parse_key_val)]
        inputs: Vec<(String, String)>,

        /// Directory task output files are written under
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// List the bundled crews
    Crews,
}

fn parse_provider(value: &str) -> Result<ProviderType, String> {
    ProviderType::from_str(value).map_err(|_| format!("unknown provider: {}", value))
}

fn parse_key_val(value: &str) -> Result<(String, String), String> {
    let (key, val) = value
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {}", value))?;
    Ok((key.trim().to_string(), val.to_string()))
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::new()?;
    apply_overrides(&mut settings, cli.provider, cli.model.as_deref());
    Ok(settings)
}

/// Command line choices win over configured ones, for chat, research and crews alike
fn apply_overrides(settings: &mut Settings, provider: Option<ProviderType>, model: Option<&str>) {
    if let Some(provider_type) = provider {
        if provider_type != settings.provider.provider_type {
            // host, key and models belonged to the configured provider
            settings.provider.provider_type = provider_type;
            settings.provider.host = None;
            settings.provider.api_key = None;
            settings.provider.model = None;
            settings.research.model = None;
            settings.fill_conventional_env();
        }
    }
    if let Some(model) = model {
        settings.provider.model = Some(model.to_string());
        settings.research.model = Some(model.to_string());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let services = Services::from_settings(load_settings(&cli)?)?;

    match cli.command {
        Command::Chat => commands::chat::run(&services).await,
        Command::Research { query } => commands::research::run(&services, query).await,
        Command::Crew {
            name,
            inputs,
            output_dir,
        } => commands::crew::run(services, &name, inputs, output_dir).await,
        Command::Crews => commands::crew::list(),
    }
}
