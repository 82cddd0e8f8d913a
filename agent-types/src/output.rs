//! The final result of a reasoning run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::step::ReasoningStep;
use crate::usage::TokenUsage;

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u128(d.as_millis())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}

/// The outcome of one engine run.
///
/// Invariant: `error` is `Some` if and only if the run did not complete
/// successfully; `response` may be empty on failure but `trace` is always
/// preserved for inspection either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub response: String,
    pub trace: Vec<ReasoningStep>,
    pub usage: TokenUsage,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Output {
    pub fn success(response: impl Into<String>, trace: Vec<ReasoningStep>, usage: TokenUsage, duration: Duration) -> Self {
        Self {
            response: response.into(),
            trace,
            usage,
            duration,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>, trace: Vec<ReasoningStep>, usage: TokenUsage, duration: Duration) -> Self {
        Self {
            response: String::new(),
            trace,
            usage,
            duration,
            error: Some(error.into()),
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_has_no_error() {
        let out = Output::success("hi", vec![], TokenUsage::new(10, 8, 18), Duration::from_millis(5));
        assert!(out.is_success());
        assert!(!out.has_error());
        assert_eq!(out.response, "hi");
    }

    #[test]
    fn failure_carries_error_and_empty_response() {
        let out = Output::failure("max iterations exceeded: 10", vec![], TokenUsage::default(), Duration::ZERO);
        assert!(out.has_error());
        assert!(out.response.is_empty());
    }

    #[test]
    fn duration_roundtrips_through_json_as_millis() {
        let out = Output::success("x", vec![], TokenUsage::default(), Duration::from_millis(1234));
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["duration"], 1234);
        let back: Output = serde_json::from_value(v).unwrap();
        assert_eq!(back.duration, Duration::from_millis(1234));
    }

    #[test]
    fn error_field_omitted_on_success() {
        let out = Output::success("x", vec![], TokenUsage::default(), Duration::ZERO);
        let v = serde_json::to_value(&out).unwrap();
        assert!(v.get("error").is_none());
    }
}
