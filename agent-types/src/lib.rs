//! Shared types for the agent reasoning runtime: the message model, the
//! reasoning-step trace, run output, agent configuration, and the
//! sentinel error taxonomy every other crate in the workspace wraps.
//!
//! This crate has no async runtime dependency and no I/O.

pub mod config;
pub mod error;
pub mod message;
pub mod step;
pub mod usage;

pub use config::AgentConfig;
pub use error::{AgentError, Result};
pub use message::{Message, Role, ToolCall};
pub use step::ReasoningStep;
pub use usage::TokenUsage;

pub mod output;
pub use output::Output;
