use super::{base::Provider, configs::OpenAiProviderConfig, openai::OpenAiProvider};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum_macros::{Display, EnumIter, EnumString};

/// The OpenAI-compatible endpoints we know how to reach
#[derive(
    EnumIter, EnumString, Display, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProviderType {
    OpenAi,
    DeepSeek,
    Gemini,
}

impl ProviderType {
    pub fn default_host(&self) -> &'static str {
        match self {
            ProviderType::OpenAi => "https://api.openai.com/v1",
            ProviderType::DeepSeek => "https://api.deepseek.com",
            ProviderType::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderType::OpenAi => "gpt-4.1-mini",
            ProviderType::DeepSeek => "deepseek-chat",
            ProviderType::Gemini => "gemini-2.0-flash",
        }
    }

    /// Conventional environment variables holding the API key, most specific first
    pub fn api_key_vars(&self) -> &'static [&'static str] {
        match self {
            ProviderType::OpenAi => &["OPENAI_API_KEY"],
            ProviderType::DeepSeek => &["DEEPSEEK_API_KEY", "API_TOKEN"],
            ProviderType::Gemini => &["GEMINI_API_KEY"],
        }
    }
}

pub fn get_provider(config: OpenAiProviderConfig) -> Result<Arc<dyn Provider>> {
    Ok(Arc::new(OpenAiProvider::new(config)?))
}
