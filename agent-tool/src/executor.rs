//! Validate → execute → time → structured-result dispatch.

use std::time::{Duration, Instant};

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::ToolError;
use crate::registry::ToolRegistry;

/// Structured outcome of one tool invocation.
///
/// Both successful and failed invocations are meant to become an
/// `Observation` step upstream — a failure here is never fatal to the
/// enclosing reasoning loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool: String,
    pub success: bool,
    pub result: String,
    pub error: Option<String>,
    pub duration: Duration,
}

impl ToolResult {
    fn ok(tool: impl Into<String>, result: String, duration: Duration) -> Self {
        Self {
            tool: tool.into(),
            success: true,
            result,
            error: None,
            duration,
        }
    }

    fn err(tool: impl Into<String>, error: ToolError, duration: Duration) -> Self {
        Self {
            tool: tool.into(),
            success: false,
            result: String::new(),
            error: Some(error.to_string()),
            duration,
        }
    }

    /// The text fed back to the model as the tool-role message content:
    /// the result on success, `"Error: <message>"` on failure.
    pub fn observation_text(&self) -> String {
        match &self.error {
            Some(msg) => format!("Error: {msg}"),
            None => self.result.clone(),
        }
    }
}

/// Looks up `name` in `registry`, runs its `validate` then `execute`,
/// racing the provided cancellation token, and returns a [`ToolResult`]
/// regardless of outcome — lookup failure, validation failure, execution
/// failure, and cancellation all produce a result rather than propagate.
pub async fn execute_tool(
    registry: &ToolRegistry,
    name: &str,
    args: Value,
    cancel: &CancellationToken,
) -> ToolResult {
    let start = Instant::now();

    let Some(tool) = registry.get(name) else {
        return ToolResult::err(name, ToolError::NotFound(name.to_string()), start.elapsed());
    };

    if let Err(e) = tool.validate(&args) {
        return ToolResult::err(name, e, start.elapsed());
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            ToolResult::err(name, ToolError::Timeout(name.to_string()), start.elapsed())
        }
        outcome = tool.execute(args) => {
            match outcome {
                Ok(text) => ToolResult::ok(name, text, start.elapsed()),
                Err(e) => ToolResult::err(name, e, start.elapsed()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tool::test_support::{EchoTool, FailTool};

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let registry = ToolRegistry::new();
        let cancel = CancellationToken::new();
        let result = execute_tool(&registry, "missing", serde_json::json!({}), &cancel).await;
        assert!(!result.success);
        assert_eq!(result.observation_text(), "Error: tool not found: missing");
    }

    #[tokio::test]
    async fn successful_execution_is_recorded() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();
        let cancel = CancellationToken::new();
        let result = execute_tool(&registry, "echo", serde_json::json!({"a": 1}), &cancel).await;
        assert!(result.success);
        assert_eq!(result.observation_text(), "{\"a\":1}");
    }

    #[tokio::test]
    async fn execution_failure_is_not_fatal_and_formats_as_error() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FailTool)).unwrap();
        let cancel = CancellationToken::new();
        let result = execute_tool(&registry, "fail", serde_json::json!({}), &cancel).await;
        assert!(!result.success);
        assert!(result.observation_text().starts_with("Error: "));
    }

    #[tokio::test]
    async fn cancellation_before_execution_short_circuits() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = execute_tool(&registry, "echo", serde_json::json!({}), &cancel).await;
        assert!(!result.success);
    }
}
