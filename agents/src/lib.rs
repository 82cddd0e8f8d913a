//! The agent facade: a history-owning [`Agent`] over one of the four
//! reasoning engines, plus environment-driven configuration and
//! provider auto-detection.

pub mod agent;
pub mod config;
pub mod provider_detect;

pub use agent::{Agent, EngineKind};
pub use config::Settings;
pub use provider_detect::detect_providers;
