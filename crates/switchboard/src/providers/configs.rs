use serde::{Deserialize, Serialize};

/// Connection details for an OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiProviderConfig {
    /// Base url, the `/chat/completions` path is appended to it
    pub host: String,
    /// Bearer token; a missing key only fails when the first request is made
    pub api_key: Option<String>,
}

impl OpenAiProviderConfig {
    pub fn new<H: Into<String>>(host: H, api_key: Option<String>) -> Self {
        Self {
            host: host.into(),
            api_key,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.host.trim_end_matches('/'))
    }
}
