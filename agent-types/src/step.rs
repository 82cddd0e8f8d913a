//! The typed reasoning trace recorded by every engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry in a run's trace.
///
/// Each variant carries its own timestamp rather than wrapping a shared
/// envelope, since `Plan` and `Reflection` steps exist only for certain
/// engines and a uniform envelope would force an unused field on the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReasoningStep {
    Thought {
        text: String,
        timestamp: DateTime<Utc>,
    },
    Action {
        tool: String,
        args: Value,
        timestamp: DateTime<Utc>,
    },
    Observation {
        tool: String,
        /// The tool's result text, or `"Error: <message>"` on failure.
        result: String,
        is_error: bool,
        timestamp: DateTime<Utc>,
    },
    Plan {
        text: String,
        timestamp: DateTime<Utc>,
    },
    Reflection {
        text: String,
        timestamp: DateTime<Utc>,
    },
}

impl ReasoningStep {
    pub fn thought(text: impl Into<String>) -> Self {
        ReasoningStep::Thought {
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn action(tool: impl Into<String>, args: Value) -> Self {
        ReasoningStep::Action {
            tool: tool.into(),
            args,
            timestamp: Utc::now(),
        }
    }

    pub fn observation(tool: impl Into<String>, result: impl Into<String>, is_error: bool) -> Self {
        ReasoningStep::Observation {
            tool: tool.into(),
            result: result.into(),
            is_error,
            timestamp: Utc::now(),
        }
    }

    pub fn plan(text: impl Into<String>) -> Self {
        ReasoningStep::Plan {
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn reflection(text: impl Into<String>) -> Self {
        ReasoningStep::Reflection {
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ReasoningStep::Thought { timestamp, .. }
            | ReasoningStep::Action { timestamp, .. }
            | ReasoningStep::Observation { timestamp, .. }
            | ReasoningStep::Plan { timestamp, .. }
            | ReasoningStep::Reflection { timestamp, .. } => *timestamp,
        }
    }
}
