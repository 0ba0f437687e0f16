use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One organic web result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerperConfig {
    #[serde(default = "default_serper_host")]
    pub host: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_results")]
    pub results: usize,
}

impl Default for SerperConfig {
    fn default() -> Self {
        Self {
            host: default_serper_host(),
            api_key: None,
            results: default_results(),
        }
    }
}

fn default_serper_host() -> String {
    "https://google.serper.dev".to_string()
}

fn default_results() -> usize {
    5
}

/// Google search through serper.dev
pub struct SerperClient {
    client: Client,
    config: SerperConfig,
}

impl SerperClient {
    pub fn new(config: SerperConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl SearchClient for SerperClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("SERPER_API_KEY is not set"))?;

        let response = self
            .client
            .post(format!("{}/search", self.config.host.trim_end_matches('/')))
            .header("X-API-KEY", api_key)
            .json(&json!({"q": query, "num": self.config.results}))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("Search failed: {}", response.status()));
        }

        let body: Value = response.json().await?;
        let hits = body
            .get("organic")
            .cloned()
            .map(serde_json::from_value::<Vec<SearchHit>>)
            .transpose()?
            .unwrap_or_default();
        Ok(hits.into_iter().take(self.config.results).collect())
    }
}

/// Answers every query with one canned hit naming the query
#[cfg(test)]
#[derive(Default)]
pub struct CannedSearch {
    queries: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl CannedSearch {
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl SearchClient for CannedSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(vec![SearchHit {
            title: format!("About {}", query),
            link: "https://example.com".to_string(),
            snippet: format!("{} explained", query),
        }])
    }
}
