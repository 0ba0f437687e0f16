use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::message::Message;
use crate::models::tool::{Tool, ToolChoice};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    ToolCalls,
    Length,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    pub fn parse(reason: &str) -> Self {
        match reason {
            "stop" => FinishReason::Stop,
            "tool_calls" => FinishReason::ToolCalls,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            other => FinishReason::Other(other.to_string()),
        }
    }

    pub fn is_tool_calls(&self) -> bool {
        matches!(self, FinishReason::ToolCalls)
    }
}

/// A named JSON schema the model must answer with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFormat {
    pub name: String,
    pub schema: Value,
}

impl ResponseFormat {
    pub fn new<S: Into<String>>(name: S, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    pub fn to_openai_spec(&self) -> Value {
        json!({
            "type": "json_schema",
            "json_schema": {
                "name": self.name,
                "schema": self.schema,
                "strict": true
            }
        })
    }
}

/// Everything a single model invocation needs
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub messages: &'a [Message],
    pub tools: &'a [Tool],
    pub tool_choice: ToolChoice,
    pub response_format: Option<&'a ResponseFormat>,
}

impl<'a> CompletionRequest<'a> {
    pub fn new(model: &'a str, system: &'a str, messages: &'a [Message]) -> Self {
        Self {
            model,
            system,
            messages,
            tools: &[],
            tool_choice: ToolChoice::Auto,
            response_format: None,
        }
    }

    pub fn with_tools(mut self, tools: &'a [Tool], tool_choice: ToolChoice) -> Self {
        self.tools = tools;
        self.tool_choice = tool_choice;
        self
    }

    pub fn with_response_format(mut self, format: Option<&'a ResponseFormat>) -> Self {
        self.response_format = format;
        self
    }
}

/// The model's reply to a completion request
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub message: Message,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

/// Base trait for model endpoints (OpenAI, DeepSeek, Gemini, ...)
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next message for the conversation in the request
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion>;
}
