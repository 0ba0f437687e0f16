use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;

use crate::models::message::Message;
use crate::models::tool::{ToolChoice, ToolRequest};
use crate::providers::base::{Completion, CompletionRequest, FinishReason, Provider, Usage};

/// What a mock provider saw for one call
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub system: String,
    pub messages: Vec<Message>,
    pub tools: Vec<String>,
    pub tool_choice: ToolChoice,
    pub response_format: Option<String>,
}

/// A mock provider that returns pre-configured responses for testing
pub struct MockProvider {
    responses: Arc<Mutex<Vec<Result<Completion>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<Completion>) -> Self {
        Self::scripted(responses.into_iter().map(Ok).collect())
    }

    /// Like `new`, but individual calls can fail
    pub fn scripted(responses: Vec<Result<Completion>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// An assistant reply that ends the turn
pub fn text_completion(text: &str) -> Completion {
    Completion {
        message: Message::assistant().with_text(text),
        finish_reason: FinishReason::Stop,
        usage: Usage::default(),
    }
}

/// An assistant reply asking for the given tool calls
pub fn tool_call_completion(text: Option<&str>, calls: Vec<ToolRequest>) -> Completion {
    let mut message = Message::assistant();
    if let Some(text) = text {
        message = message.with_text(text);
    }
    for call in calls {
        message = message.with_tool_request(call);
    }
    Completion {
        message,
        finish_reason: FinishReason::ToolCalls,
        usage: Usage::default(),
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion> {
        self.requests.lock().unwrap().push(RecordedRequest {
            model: request.model.to_string(),
            system: request.system.to_string(),
            messages: request.messages.to_vec(),
            tools: request.tools.iter().map(|tool| tool.name.clone()).collect(),
            tool_choice: request.tool_choice,
            response_format: request.response_format.map(|format| format.name.clone()),
        });

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Err(anyhow!("mock provider has no more responses"))
        } else {
            responses.remove(0)
        }
    }
}
