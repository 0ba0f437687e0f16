use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::channels::search::SearchClient;
use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;
use crate::tools::{parse_arguments, ToolHandler};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchArguments {
    query: String,
}

pub struct WebSearch {
    tool: Tool,
    client: Arc<dyn SearchClient>,
}

impl WebSearch {
    pub fn new(client: Arc<dyn SearchClient>) -> Self {
        let tool = Tool::new(
            "web_search",
            "Search the web and return the top results with their titles, links and snippets",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "The search query"}
                },
                "required": ["query"],
                "additionalProperties": false
            }),
        );
        Self { tool, client }
    }
}

#[async_trait]
impl ToolHandler for WebSearch {
    fn tool(&self) -> &Tool {
        &self.tool
    }

    async fn call(&self, arguments: Value) -> AgentResult<Value> {
        let SearchArguments { query } = parse_arguments(arguments)?;
        let hits = self
            .client
            .search(&query)
            .await
            .map_err(|e| AgentError::ExecutionError(e.to_string()))?;
        Ok(json!({"results": hits}))
    }
}
