use agent_types::AgentError;
use thiserror::Error;

/// Local tool-subsystem error, converted into [`AgentError`] at the boundary.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),

    #[error("invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("tool execution failed: {0}")]
    ExecutionFailed(String),

    #[error("tool timed out: {0}")]
    Timeout(String),

    #[error("duplicate tool registration: {0}")]
    DuplicateRegistration(String),
}

impl From<ToolError> for AgentError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::NotFound(name) => AgentError::ToolNotFound(name),
            ToolError::InvalidArguments(msg) => AgentError::InvalidToolArguments(msg),
            ToolError::ExecutionFailed(msg) => AgentError::ToolExecutionFailed(msg),
            ToolError::Timeout(name) => AgentError::ToolTimeout(name),
            ToolError::DuplicateRegistration(name) => {
                AgentError::InvalidConfig(format!("duplicate tool registration: {name}"))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ToolError>;
