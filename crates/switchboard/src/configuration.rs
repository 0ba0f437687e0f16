use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::agents::{AgentRunner, AgentTable};
use crate::channels::mail::{Mailer, SendGridConfig, SendGridMailer};
use crate::channels::notify::{Notifier, PushoverConfig, PushoverNotifier};
use crate::channels::search::{SearchClient, SerperClient, SerperConfig};
use crate::chat::{ChatAgent, PersonaConfig};
use crate::crew::CrewRunner;
use crate::errors::{to_env_var, ConfigError};
use crate::providers::base::Provider;
use crate::providers::configs::OpenAiProviderConfig;
use crate::providers::factory::{get_provider, ProviderType};
use crate::research::{ResearchConfig, ResearchManager};
use crate::tools::contact::{RecordUnknownQuestion, RecordUserDetails};
use crate::tools::email::SendEmail;
use crate::tools::push::SendPushNotification;
use crate::tools::web_search::WebSearch;
use crate::tools::ToolRegistry;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: ProviderType,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl ProviderSettings {
    pub fn model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider_type.default_model().to_string())
    }

    pub fn into_config(self) -> OpenAiProviderConfig {
        let host = self
            .host
            .unwrap_or_else(|| self.provider_type.default_host().to_string());
        OpenAiProviderConfig::new(host, self.api_key)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    #[serde(default)]
    pub pushover: PushoverConfig,
    #[serde(default)]
    pub email: SendGridConfig,
    #[serde(default)]
    pub search: SerperConfig,
    #[serde(default)]
    pub research: ResearchConfig,
    pub persona: PersonaConfig,
}

impl Settings {
    /// Load settings from an optional `switchboard.toml`, then `SWITCHBOARD_*` variables.
    /// Credentials still unset afterwards are taken from their conventional variables.
    pub fn new() -> Result<Self, ConfigError> {
        let mut settings = Self::load_and_validate()?;
        settings.fill_conventional_env();
        Ok(settings)
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("provider.type", "openai")?
            .set_default("persona.name", default_persona_name())?
            .set_default("persona.summary_path", "resources/summary.txt")?
            .set_default("persona.profile_path", "resources/profile.txt")?
            .add_source(File::with_name("switchboard").required(false))
            .add_source(
                Environment::with_prefix("SWITCHBOARD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }

    pub fn fill_conventional_env(&mut self) {
        fn first_set(vars: &[&str]) -> Option<String> {
            vars.iter()
                .find_map(|var| env::var(var).ok().filter(|value| !value.is_empty()))
        }

        let provider_vars = self.provider.provider_type.api_key_vars();
        fill(&mut self.provider.api_key, || first_set(provider_vars));
        fill(&mut self.pushover.token, || first_set(&["PUSHOVER_TOKEN"]));
        fill(&mut self.pushover.user, || first_set(&["PUSHOVER_USER"]));
        fill(&mut self.email.api_key, || first_set(&["SENDGRID_API_KEY"]));
        fill(&mut self.search.api_key, || first_set(&["SERPER_API_KEY"]));
    }
}

fn fill(slot: &mut Option<String>, lookup: impl FnOnce() -> Option<String>) {
    if slot.is_none() {
        *slot = lookup();
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_provider_type() -> ProviderType {
    ProviderType::OpenAi
}

fn default_persona_name() -> String {
    "Parag Agrawal".to_string()
}

/// Everything the front ends need, built once from [`Settings`]
#[derive(Clone)]
pub struct Services {
    pub provider: Arc<dyn Provider>,
    pub model: String,
    pub notifier: Arc<dyn Notifier>,
    pub mailer: Arc<dyn Mailer>,
    pub search: Arc<dyn SearchClient>,
    /// Every built-in tool
    pub registry: ToolRegistry,
    pub research: ResearchConfig,
    pub persona: PersonaConfig,
    pub output_dir: PathBuf,
}

impl Services {
    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let model = settings.provider.model();
        let provider = get_provider(settings.provider.into_config())?;
        let notifier: Arc<dyn Notifier> = Arc::new(PushoverNotifier::new(settings.pushover));
        let mailer: Arc<dyn Mailer> = Arc::new(SendGridMailer::new(settings.email));
        let search: Arc<dyn SearchClient> = Arc::new(SerperClient::new(settings.search));

        Ok(Self::new(provider, model, notifier, mailer, search)
            .with_research(settings.research)
            .with_persona(settings.persona))
    }

    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        notifier: Arc<dyn Notifier>,
        mailer: Arc<dyn Mailer>,
        search: Arc<dyn SearchClient>,
    ) -> Self {
        let registry = ToolRegistry::new()
            .with(RecordUserDetails::new(notifier.clone()))
            .with(RecordUnknownQuestion::new(notifier.clone()))
            .with(SendPushNotification::new(notifier.clone()))
            .with(SendEmail::new(mailer.clone()))
            .with(WebSearch::new(search.clone()));

        Self {
            provider,
            model: model.into(),
            notifier,
            mailer,
            search,
            registry,
            research: ResearchConfig::default(),
            persona: PersonaConfig {
                name: default_persona_name(),
                summary_path: PathBuf::from("resources/summary.txt"),
                profile_path: PathBuf::from("resources/profile.txt"),
            },
            output_dir: PathBuf::from("."),
        }
    }

    pub fn with_research(mut self, research: ResearchConfig) -> Self {
        self.research = research;
        self
    }

    pub fn with_persona(mut self, persona: PersonaConfig) -> Self {
        self.persona = persona;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// The persona chat, with only the two contact-recording tools
    pub fn chat_agent(&self) -> anyhow::Result<ChatAgent> {
        let registry = ToolRegistry::new()
            .with(RecordUserDetails::new(self.notifier.clone()))
            .with(RecordUnknownQuestion::new(self.notifier.clone()));
        Ok(ChatAgent::new(
            self.provider.clone(),
            registry,
            &self.model,
            self.persona.system_prompt()?,
        ))
    }

    pub fn research_manager(&self) -> anyhow::Result<ResearchManager> {
        let runner = AgentRunner::new(
            self.provider.clone(),
            self.registry.clone(),
            AgentTable::research(&self.research, &self.model)?,
        );
        Ok(ResearchManager::new(runner, &self.research.trace_url))
    }

    pub fn crew_runner(&self) -> CrewRunner {
        CrewRunner::new(self.provider.clone(), self.registry.clone(), &self.model)
            .with_output_dir(&self.output_dir)
    }
}
