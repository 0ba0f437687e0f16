use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A tool that can be used by a model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// The name of the tool, unique within a registry
    pub name: String,
    /// A description of what the tool does
    pub description: String,
    /// JSON schema of the arguments the tool accepts
    pub parameters: Value,
}

impl Tool {
    /// Create a new tool with the given name and description
    pub fn new<N, D>(name: N, description: D, parameters: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A tool call requested by the model. The arguments are kept exactly as the model
/// produced them and are only decoded when the call is dispatched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolRequest {
    /// Identifier assigned by the model endpoint
    pub id: String,
    /// The name of the tool to execute
    pub name: String,
    /// JSON-encoded arguments
    pub arguments: String,
}

impl ToolRequest {
    pub fn new<I, N, A>(id: I, name: N, arguments: A) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        A: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// The outcome of one dispatched tool call, fed back to the model as a tool message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResponse {
    /// Id of the request this answers
    pub id: String,
    /// Name of the tool that was requested
    pub name: String,
    /// Result payload, `{"error": ...}` when the call failed
    pub content: Value,
}

impl ToolResponse {
    pub fn new<I: Into<String>, N: Into<String>>(id: I, name: N, content: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content,
        }
    }

    pub fn error<I: Into<String>, N: Into<String>>(id: I, name: N, message: impl ToString) -> Self {
        Self::new(id, name, json!({ "error": message.to_string() }))
    }

    pub fn is_error(&self) -> bool {
        self.content.get("error").is_some()
    }
}

/// How the model is allowed to pick tools
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    #[default]
    Auto,
    Required,
    None,
}

impl ToolChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolChoice::Auto => "auto",
            ToolChoice::Required => "required",
            ToolChoice::None => "none",
        }
    }
}
