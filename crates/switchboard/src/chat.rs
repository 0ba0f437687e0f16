//! Single-round conversation loop for the persona chat
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::models::message::Message;
use crate::models::tool::{Tool, ToolChoice, ToolResponse};
use crate::prompt_template::load_prompt_file;
use crate::providers::base::{CompletionRequest, FinishReason, Provider};
use crate::tools::ToolRegistry;

/// Who the chat assistant speaks for, and where their background material lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaConfig {
    pub name: String,
    pub summary_path: PathBuf,
    pub profile_path: PathBuf,
}

impl PersonaConfig {
    /// Render the system prompt from the persona template and the two text files
    pub fn system_prompt(&self) -> Result<String> {
        let summary = fs::read_to_string(&self.summary_path)
            .with_context(|| format!("Failed to read summary {}", self.summary_path.display()))?;
        let profile = fs::read_to_string(&self.profile_path)
            .with_context(|| format!("Failed to read profile {}", self.profile_path.display()))?;

        let prompt = load_prompt_file(
            "persona.md",
            &json!({"name": self.name, "summary": summary, "profile": profile}),
        )?;
        Ok(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    AwaitingModel,
    Done,
}

/// The result of one user turn
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    /// Text of the model's response. `None` when the model only asked for tools.
    pub reply: Option<String>,
    pub finish_reason: FinishReason,
    /// History, the new user message, and anything appended during the turn
    pub messages: Vec<Message>,
    pub tool_results: Vec<ToolResponse>,
}

pub struct ChatAgent {
    provider: Arc<dyn Provider>,
    registry: ToolRegistry,
    model: String,
    system: String,
}

impl ChatAgent {
    pub fn new(
        provider: Arc<dyn Provider>,
        registry: ToolRegistry,
        model: impl Into<String>,
        system: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            registry,
            model: model.into(),
            system: system.into(),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system
    }

    /// Answer one user message. The model is called exactly once; requested tools are
    /// dispatched once and their results appended, without a follow-up model call.
    pub async fn reply(&self, history: &[Message], user_message: &str) -> Result<ChatOutcome> {
        let tools: Vec<Tool> = self.registry.tools();
        let mut messages = history.to_vec();
        messages.push(Message::user().with_text(user_message));

        let mut state = ChatState::AwaitingModel;
        let mut reply = None;
        let mut finish_reason = FinishReason::Stop;
        let mut tool_results = Vec::new();

        while state != ChatState::Done {
            let request = CompletionRequest::new(&self.model, &self.system, &messages)
                .with_tools(&tools, ToolChoice::Auto);
            let completion = self.provider.complete(request).await?;
            tracing::info!(finish_reason = ?completion.finish_reason, "Finish Reason");

            reply = completion.message.text();
            finish_reason = completion.finish_reason;

            if finish_reason.is_tool_calls() {
                let requests: Vec<_> = completion
                    .message
                    .tool_requests()
                    .into_iter()
                    .cloned()
                    .collect();
                messages.push(completion.message);
                tool_results = self.registry.dispatch(&requests).await;
                messages.extend(tool_results.iter().cloned().map(Message::tool));
            } else {
                messages.push(completion.message);
            }
            state = ChatState::Done;
        }

        Ok(ChatOutcome {
            reply,
            finish_reason,
            messages,
            tool_results,
        })
    }
}
