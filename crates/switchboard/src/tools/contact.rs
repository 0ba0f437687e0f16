use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::channels::notify::{Notification, Notifier};
use crate::errors::AgentResult;
use crate::models::tool::Tool;
use crate::tools::{parse_arguments, ToolHandler};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UserDetails {
    email: String,
    #[serde(default = "default_name")]
    name: String,
    #[serde(default = "default_notes")]
    notes: String,
}

fn default_name() -> String {
    "Name not provided".to_string()
}

fn default_notes() -> String {
    "not provided".to_string()
}

/// Records a visitor who left contact details, by pushing them to the operator
pub struct RecordUserDetails {
    tool: Tool,
    notifier: Arc<dyn Notifier>,
}

impl RecordUserDetails {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        let tool = Tool::new(
            "record_user_details",
            "Use this tool to record that a user is interested in being in touch and provided an email address",
            json!({
                "type": "object",
                "properties": {
                    "email": {
                        "type": "string",
                        "description": "The email address of this user"
                    },
                    "name": {
                        "type": "string",
                        "description": "The user's name, if they provided it"
                    },
                    "notes": {
                        "type": "string",
                        "description": "Any additional information about the conversation that's worth recording to give context"
                    }
                },
                "required": ["email"],
                "additionalProperties": false
            }),
        );
        Self { tool, notifier }
    }
}

#[async_trait]
impl ToolHandler for RecordUserDetails {
    fn tool(&self) -> &Tool {
        &self.tool
    }

    async fn call(&self, arguments: Value) -> AgentResult<Value> {
        let details: UserDetails = parse_arguments(arguments)?;
        let message = format!(
            "[User Interest] {} ({}) | Notes: {}",
            details.name, details.email, details.notes
        );
        self.notifier.push(Notification::new(message)).await;
        Ok(json!({"recorded": "ok"}))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnknownQuestion {
    question: String,
}

/// Records a question the assistant could not answer
pub struct RecordUnknownQuestion {
    tool: Tool,
    notifier: Arc<dyn Notifier>,
}

impl RecordUnknownQuestion {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        let tool = Tool::new(
            "record_unknown_question",
            "Always use this tool to record any question that couldn't be answered as you didn't know the answer",
            json!({
                "type": "object",
                "properties": {
                    "question": {
                        "type": "string",
                        "description": "The question that couldn't be answered"
                    }
                },
                "required": ["question"],
                "additionalProperties": false
            }),
        );
        Self { tool, notifier }
    }
}

#[async_trait]
impl ToolHandler for RecordUnknownQuestion {
    fn tool(&self) -> &Tool {
        &self.tool
    }

    async fn call(&self, arguments: Value) -> AgentResult<Value> {
        let UnknownQuestion { question } = parse_arguments(arguments)?;
        self.notifier
            .push(Notification::new(format!("[Unknown Question] {}", question)))
            .await;
        Ok(json!({"recorded": "ok"}))
    }
}
