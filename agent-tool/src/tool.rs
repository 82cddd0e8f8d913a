//! Object-safe tool trait and the validate→execute contract.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::error::Result;
use crate::schema::ParameterSchema;

/// Object-safe trait for tool implementations.
///
/// Tools are stored as `Arc<dyn ToolDyn>` in [`crate::registry::ToolRegistry`].
/// Any source — a local function, an MCP server, an HTTP endpoint — can
/// implement this trait and be registered identically.
pub trait ToolDyn: Send + Sync {
    /// The tool's unique name within a registry.
    fn name(&self) -> &str;

    /// Human-readable description surfaced to the model.
    fn description(&self) -> &str;

    /// The JSON-Schema-like parameter description emitted to providers.
    fn parameters(&self) -> &ParameterSchema;

    /// Optional pre-execution validation. The default accepts anything;
    /// override to reject malformed arguments before `execute` runs.
    fn validate(&self, _args: &Value) -> Result<()> {
        Ok(())
    }

    /// Run the tool, returning result text or an execution error.
    fn execute(&self, args: Value) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>>;
}
