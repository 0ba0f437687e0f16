use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::channels::mail::{Email, Mailer};
use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;
use crate::tools::{parse_arguments, ToolHandler};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EmailArguments {
    subject: String,
    html_body: String,
}

pub struct SendEmail {
    tool: Tool,
    mailer: Arc<dyn Mailer>,
}

impl SendEmail {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        let tool = Tool::new(
            "send_email",
            "Send out an email with the given subject and HTML body",
            json!({
                "type": "object",
                "properties": {
                    "subject": {"type": "string", "description": "The email subject line"},
                    "html_body": {"type": "string", "description": "The email body as HTML"}
                },
                "required": ["subject", "html_body"],
                "additionalProperties": false
            }),
        );
        Self { tool, mailer }
    }
}

#[async_trait]
impl ToolHandler for SendEmail {
    fn tool(&self) -> &Tool {
        &self.tool
    }

    async fn call(&self, arguments: Value) -> AgentResult<Value> {
        let EmailArguments { subject, html_body } = parse_arguments(arguments)?;
        let code = self
            .mailer
            .send(&Email { subject, html_body })
            .await
            .map_err(|e| AgentError::ExecutionError(e.to_string()))?;
        Ok(json!({"status": "Success", "code": code}))
    }
}
