use super::role::Role;
use super::tool::{ToolRequest, ToolResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
/// Content passed inside a message, which can be both simple content and tool content
pub enum MessageContent {
    Text(TextContent),
    ToolRequest(ToolRequest),
    ToolResponse(ToolResponse),
}

impl MessageContent {
    pub fn text<S: Into<String>>(text: S) -> Self {
        MessageContent::Text(TextContent { text: text.into() })
    }

    pub fn tool_request(request: ToolRequest) -> Self {
        MessageContent::ToolRequest(request)
    }

    pub fn tool_response(response: ToolResponse) -> Self {
        MessageContent::ToolResponse(response)
    }

    pub fn as_tool_request(&self) -> Option<&ToolRequest> {
        if let MessageContent::ToolRequest(ref tool_request) = self {
            Some(tool_request)
        } else {
            None
        }
    }

    pub fn as_tool_response(&self) -> Option<&ToolResponse> {
        if let MessageContent::ToolResponse(ref tool_response) = self {
            Some(tool_response)
        } else {
            None
        }
    }

    /// Get the text content if this is a TextContent variant
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(&text.text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A message to or from an LLM
pub struct Message {
    pub role: Role,
    pub created: i64,
    pub content: Vec<MessageContent>,
}

impl Message {
    fn with_role(role: Role) -> Self {
        Message {
            role,
            created: Utc::now().timestamp(),
            content: Vec::new(),
        }
    }

    /// Create a new user message with the current timestamp
    pub fn user() -> Self {
        Self::with_role(Role::User)
    }

    /// Create a new assistant message with the current timestamp
    pub fn assistant() -> Self {
        Self::with_role(Role::Assistant)
    }

    /// Create a system message, only used when replaying a history that contains one
    pub fn system() -> Self {
        Self::with_role(Role::System)
    }

    /// Create the tool message answering a single tool request
    pub fn tool(response: ToolResponse) -> Self {
        Self::with_role(Role::Tool).with_content(MessageContent::tool_response(response))
    }

    /// Add any MessageContent to the message
    pub fn with_content(mut self, content: MessageContent) -> Self {
        self.content.push(content);
        self
    }

    /// Add text content to the message
    pub fn with_text<S: Into<String>>(self, text: S) -> Self {
        self.with_content(MessageContent::text(text))
    }

    /// Add a tool request to the message
    pub fn with_tool_request(self, request: ToolRequest) -> Self {
        self.with_content(MessageContent::tool_request(request))
    }

    /// All text parts joined together, None when the message carries no text
    pub fn text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|content| content.as_text())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }

    pub fn tool_requests(&self) -> Vec<&ToolRequest> {
        self.content
            .iter()
            .filter_map(|content| content.as_tool_request())
            .collect()
    }

    pub fn has_tool_requests(&self) -> bool {
        self.content
            .iter()
            .any(|content| content.as_tool_request().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_joins_parts() {
        let message = Message::assistant().with_text("Hello").with_text("there");
        assert_eq!(message.text().as_deref(), Some("Hello\nthere"));
        assert_eq!(Message::assistant().text(), None);
    }

    #[test]
    fn test_tool_requests_keep_order() {
        let message = Message::assistant()
            .with_tool_request(ToolRequest::new("1", "first", "{}"))
            .with_text("thinking")
            .with_tool_request(ToolRequest::new("2", "second", "{}"));

        let names: Vec<&str> = message
            .tool_requests()
            .iter()
            .map(|request| request.name.as_str())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
        assert!(message.has_tool_requests());
    }

    #[test]
    fn test_tool_message() {
        let message = Message::tool(ToolResponse::new("1", "echo", json!({"ok": true})));
        assert_eq!(message.role, Role::Tool);
        assert_eq!(message.content[0].as_tool_response().unwrap().name, "echo");
    }
}
