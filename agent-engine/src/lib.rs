//! Reasoning engines: Simple, ReAct, Reflection, and Plan-and-Solve, plus
//! the streaming adapter each one is driven through.
//!
//! Every engine implements the same [`Engine`] trait and is a pure
//! function of an [`Input`] — none of them own conversation history;
//! that's the facade crate's job.

pub mod common;
pub mod config;
pub mod engine;
pub mod input;
pub mod plan_and_solve;
pub mod react;
pub mod reflection;
pub mod simple;
pub mod stream;

#[cfg(test)]
mod test_support;

pub use config::EngineConfig;
pub use engine::Engine;
pub use input::Input;
pub use plan_and_solve::PlanAndSolveEngine;
pub use react::ReactEngine;
pub use reflection::ReflectionEngine;
pub use simple::SimpleEngine;
pub use stream::StreamChunk;
