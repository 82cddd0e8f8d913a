//! Tool registry and executor: the bridge between LLM-emitted tool calls
//! and local execution results.

pub mod error;
pub mod executor;
pub mod registry;
pub mod schema;
pub mod tool;

pub use error::ToolError;
pub use executor::{execute_tool, ToolResult};
pub use registry::ToolRegistry;
pub use schema::{ParameterSchema, PropertySchema};
pub use tool::ToolDyn;
