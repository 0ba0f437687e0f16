use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures of a single tool call. These never abort a conversation: the dispatcher
/// renders them into the tool result that goes back to the model.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidParameters(String),

    #[error("Execution failed: {0}")]
    ExecutionError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AgentResult<T> = Result<T, AgentError>;

/// Errors raised while loading settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("Unknown {kind}: {name}")]
    Unknown { kind: &'static str, name: String },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Convert a dotted settings key into the environment variable that sets it
pub fn to_env_var(field_path: &str) -> String {
    format!(
        "SWITCHBOARD_{}",
        field_path.replace('.', "__").to_uppercase()
    )
}
