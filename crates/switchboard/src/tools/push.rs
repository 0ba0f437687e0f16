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
struct PushArguments {
    title: String,
    body: String,
}

/// Sends a titled push notification and reports whether it was delivered
pub struct SendPushNotification {
    tool: Tool,
    notifier: Arc<dyn Notifier>,
}

impl SendPushNotification {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        let tool = Tool::new(
            "send_push_notification",
            "Send a push notification to the user's phone with a short title and message body",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Short notification title"},
                    "body": {"type": "string", "description": "The notification text"}
                },
                "required": ["title", "body"],
                "additionalProperties": false
            }),
        );
        Self { tool, notifier }
    }
}

#[async_trait]
impl ToolHandler for SendPushNotification {
    fn tool(&self) -> &Tool {
        &self.tool
    }

    async fn call(&self, arguments: Value) -> AgentResult<Value> {
        let PushArguments { title, body } = parse_arguments(arguments)?;
        let status = self
            .notifier
            .push(Notification::new(body).with_title(title))
            .await;
        Ok(Value::String(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::notify::RecordingNotifier;

    #[tokio::test]
    async fn test_push_returns_delivery_status() {
        let notifier = Arc::new(RecordingNotifier::default());
        let handler = SendPushNotification::new(notifier.clone());

        let result = handler
            .call(json!({"title": "Top pick", "body": "ACME looks strong"}))
            .await
            .unwrap();

        assert_eq!(result, json!("Notification sent!"));
        let sent = notifier.sent();
        assert_eq!(sent[0].title.as_deref(), Some("Top pick"));
        assert_eq!(sent[0].message, "ACME looks strong");
    }
}
