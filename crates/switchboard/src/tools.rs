//! Local tools the model can call, and the table that dispatches them by name
pub mod contact;
pub mod email;
pub mod push;
pub mod web_search;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::{Tool, ToolRequest, ToolResponse};

/// A single callable tool: its schema and the code behind it
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// The schema advertised to the model
    fn tool(&self) -> &Tool;

    /// Run the tool with already-decoded arguments
    async fn call(&self, arguments: Value) -> AgentResult<Value>;
}

/// Decode tool arguments into a typed struct, reporting failures as invalid parameters
pub fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> AgentResult<T> {
    if !arguments.is_object() {
        return Err(AgentError::InvalidParameters(format!(
            "expected a JSON object, got {}",
            arguments
        )));
    }
    serde_json::from_value(arguments).map_err(|e| AgentError::InvalidParameters(e.to_string()))
}

/// Dispatch table from tool name to handler. Registration order is kept so the
/// schemas are advertised in a stable order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: Vec<Arc<dyn ToolHandler>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler. A handler with the same name replaces the earlier one.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        let name = handler.tool().name.clone();
        match self.index.get(&name) {
            Some(&position) => self.handlers[position] = handler,
            None => {
                self.index.insert(name, self.handlers.len());
                self.handlers.push(handler);
            }
        }
    }

    pub fn with<H: ToolHandler + 'static>(mut self, handler: H) -> Self {
        self.register(Arc::new(handler));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.index.get(name).map(|&position| &self.handlers[position])
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Schemas of every registered tool
    pub fn tools(&self) -> Vec<Tool> {
        self.handlers.iter().map(|h| h.tool().clone()).collect()
    }

    /// Schemas of the named tools, in registry order. Unknown names are skipped.
    pub fn subset(&self, names: &[String]) -> Vec<Tool> {
        self.handlers
            .iter()
            .filter(|h| names.iter().any(|name| name == &h.tool().name))
            .map(|h| h.tool().clone())
            .collect()
    }

    /// Execute every requested call in order. Each call gets exactly one response
    /// carrying its id; failures become `{"error": ...}` payloads and never stop the batch.
    pub async fn dispatch(&self, requests: &[ToolRequest]) -> Vec<ToolResponse> {
        let mut responses = Vec::with_capacity(requests.len());
        for request in requests {
            tracing::info!(tool = %request.name, id = %request.id, "Tool called");
            let response = match self.dispatch_one(request).await {
                Ok(content) => ToolResponse::new(&request.id, &request.name, content),
                Err(e) => {
                    tracing::warn!(tool = %request.name, error = %e, "tool call failed");
                    ToolResponse::error(&request.id, &request.name, e)
                }
            };
            responses.push(response);
        }
        responses
    }

    async fn dispatch_one(&self, request: &ToolRequest) -> AgentResult<Value> {
        let handler = self
            .get(&request.name)
            .ok_or_else(|| AgentError::ToolNotFound(request.name.clone()))?;

        let raw = request.arguments.trim();
        let arguments: Value = if raw.is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(raw).map_err(|e| AgentError::InvalidParameters(e.to_string()))?
        };

        handler.call(arguments).await
    }
}
