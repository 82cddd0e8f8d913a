//! Sentinel error taxonomy shared by every crate in the workspace.
//!
//! Errors are classified by intent, not by where they were raised:
//! configuration errors are fatal at construction, retryable errors
//! are handled inside the retry wrapper, tool errors are never fatal
//! to the enclosing reasoning loop, and so on. See `is_retryable` and
//! `is_fatal` for the classifier predicates callers should match on
//! instead of string comparison.

use thiserror::Error;

/// Result type alias using [`AgentError`].
pub type Result<T> = std::result::Result<T, AgentError>;

/// The canonical error type for the agent reasoning runtime.
///
/// Every subsystem's local error enum (`ProviderError`, `ToolError`,
/// `ContextError`, ...) converts into this one via `From` so that
/// `Output.error` always carries one error type, and so that wrapping
/// never loses the underlying sentinel's identity.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AgentError {
    // -- Configuration errors: fatal, surfaced at construction --
    /// A configuration value was outside its valid range, or otherwise
    /// malformed (duplicate tool registration, missing model, etc).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The API key supplied to a provider was rejected or missing.
    #[error("invalid api key: {0}")]
    InvalidApiKey(String),

    // -- Retryable transient errors: retried with backoff, surfaced after exhaustion --
    /// The provider rate-limited the request.
    #[error("rate limited")]
    RateLimited,

    /// The request timed out.
    #[error("request timeout")]
    Timeout,

    /// The provider is temporarily unavailable (HTTP 500/502/503).
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    // -- Non-retryable provider errors: surface immediately --
    /// The provider's response could not be parsed or was structurally invalid.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The requested model does not exist on this provider.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The provider does not implement this optional capability (e.g. a
    /// chat-only backend's `embed`).
    #[error("unsupported: {0}")]
    Unsupported(String),

    // -- Context errors: surface immediately, engines return partial trace --
    /// The run was cancelled by the caller.
    #[error("cancelled")]
    Cancelled,

    /// The run's deadline elapsed before completion.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    // -- Tool errors: NOT fatal to a reasoning loop; become Observation steps --
    /// No tool with this name is registered.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// The arguments supplied to a tool failed validation.
    #[error("invalid tool arguments: {0}")]
    InvalidToolArguments(String),

    /// The tool ran but failed.
    #[error("tool execution failed: {0}")]
    ToolExecutionFailed(String),

    /// The tool did not complete within its allotted time.
    #[error("tool timed out: {0}")]
    ToolTimeout(String),

    // -- Control errors: terminal for the run, Output carries the partial trace --
    /// The reasoning loop exceeded its configured `max_iterations`.
    #[error("max iterations exceeded: {0}")]
    MaxIterationsExceeded(u32),

    /// The provider reported that output was truncated by the token budget.
    #[error("max tokens exceeded")]
    MaxTokensExceeded,

    /// Catch-all for errors that don't fit a named variant, with the
    /// original error preserved as `source` so identity isn't lost.
    #[error("{0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AgentError {
    /// Construct an [`AgentError::Other`] from any boxable error.
    pub fn other(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        AgentError::Other(Box::new(err))
    }

    /// `IsRetryable(e)` — true for rate-limited, timeout, and
    /// provider-unavailable errors. These are the errors the retry
    /// wrapper (`agent_provider::retry`) will sleep-and-retry on.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AgentError::RateLimited
                | AgentError::Timeout
                | AgentError::ProviderUnavailable(_)
        )
    }

    /// `IsFatal(e)` — true for invalid api key, model not found, and
    /// invalid config. These surface immediately and never retry.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AgentError::InvalidApiKey(_)
                | AgentError::ModelNotFound(_)
                | AgentError::InvalidConfig(_)
        )
    }

    /// Whether this error represents a tool failure — never fatal to
    /// the enclosing reasoning loop, always converted to an
    /// Observation step instead of propagated.
    pub fn is_tool_error(&self) -> bool {
        matches!(
            self,
            AgentError::ToolNotFound(_)
                | AgentError::InvalidToolArguments(_)
                | AgentError::ToolExecutionFailed(_)
                | AgentError::ToolTimeout(_)
        )
    }

    /// Whether this error represents cancellation or deadline expiry.
    pub fn is_context_error(&self) -> bool {
        matches!(self, AgentError::Cancelled | AgentError::DeadlineExceeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(AgentError::RateLimited.is_retryable());
        assert!(AgentError::Timeout.is_retryable());
        assert!(AgentError::ProviderUnavailable("down".into()).is_retryable());
        assert!(!AgentError::InvalidApiKey("bad".into()).is_retryable());
        assert!(!AgentError::ToolNotFound("x".into()).is_retryable());
    }

    #[test]
    fn fatal_classification() {
        assert!(AgentError::InvalidApiKey("bad".into()).is_fatal());
        assert!(AgentError::ModelNotFound("gpt-9".into()).is_fatal());
        assert!(AgentError::InvalidConfig("bad range".into()).is_fatal());
        assert!(!AgentError::RateLimited.is_fatal());
    }

    #[test]
    fn tool_errors_are_neither_retryable_nor_fatal() {
        let errs = [
            AgentError::ToolNotFound("x".into()),
            AgentError::InvalidToolArguments("x".into()),
            AgentError::ToolExecutionFailed("x".into()),
            AgentError::ToolTimeout("x".into()),
        ];
        for e in errs {
            assert!(e.is_tool_error());
            assert!(!e.is_retryable());
            assert!(!e.is_fatal());
        }
    }

    #[test]
    fn context_errors_classification() {
        assert!(AgentError::Cancelled.is_context_error());
        assert!(AgentError::DeadlineExceeded.is_context_error());
        assert!(!AgentError::RateLimited.is_context_error());
    }

    #[test]
    fn display_messages() {
        assert_eq!(AgentError::RateLimited.to_string(), "rate limited");
        assert_eq!(
            AgentError::ToolNotFound("bash".into()).to_string(),
            "tool not found: bash"
        );
        assert_eq!(
            AgentError::MaxIterationsExceeded(10).to_string(),
            "max iterations exceeded: 10"
        );
    }
}
