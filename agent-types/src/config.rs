//! Per-agent configuration, validated at construction.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

const DEFAULT_MAX_ITERATIONS: u32 = 10;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Validated, defaulted configuration for one agent.
///
/// `max_iterations ∈ [1,100]`, `temperature ∈ [0,2]`, `max_tokens ≥ 1`.
/// A zero value on any of those three fields means "use the default"
/// rather than a validation failure; `timeout = Duration::ZERO` means
/// "no timeout". Everything else is validated strictly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub max_iterations: u32,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: u32,
    #[serde(default, with = "duration_secs_opt")]
    pub timeout: Duration,
    /// Whether this agent's runs emit `tracing` spans. Purely a logging
    /// toggle; does not affect routing or retries.
    #[serde(default = "default_true")]
    pub tracing_enabled: bool,
    /// Labels used only for trace-span fields, not for routing.
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

fn default_true() -> bool {
    true
}

mod duration_secs_opt {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

impl AgentConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_prompt: String::new(),
            max_iterations: 0,
            temperature: 0.0,
            max_tokens: 0,
            timeout: Duration::ZERO,
            tracing_enabled: true,
            provider_name: None,
            model: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_iterations(mut self, n: u32) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    pub fn with_max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = n;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Applies named defaults to zero-valued fields, then checks ranges.
    /// Called from every constructor path; returns `InvalidConfig` on a
    /// range violation (this never mutates `self` in place, callers
    /// should use the returned, defaulted copy).
    pub fn validate(mut self) -> Result<Self> {
        if self.max_iterations == 0 {
            self.max_iterations = DEFAULT_MAX_ITERATIONS;
        }
        if self.temperature == 0.0 {
            self.temperature = DEFAULT_TEMPERATURE;
        }
        if self.max_tokens == 0 {
            self.max_tokens = DEFAULT_MAX_TOKENS;
        }

        if !(1..=100).contains(&self.max_iterations) {
            return Err(AgentError::InvalidConfig(format!(
                "max_iterations must be in [1,100], got {}",
                self.max_iterations
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AgentError::InvalidConfig(format!(
                "temperature must be in [0,2], got {}",
                self.temperature
            )));
        }
        if self.max_tokens < 1 {
            return Err(AgentError::InvalidConfig("max_tokens must be >= 1".into()));
        }
        if self.name.trim().is_empty() {
            return Err(AgentError::InvalidConfig("agent name must not be empty".into()));
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_fields_take_named_defaults() {
        let cfg = AgentConfig::new("a").validate().unwrap();
        assert_eq!(cfg.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(cfg.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(cfg.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn out_of_range_max_iterations_rejected() {
        let cfg = AgentConfig::new("a").with_max_iterations(101);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn out_of_range_temperature_rejected() {
        let cfg = AgentConfig::new("a").with_temperature(2.5);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_max_tokens_defaults_rather_than_errors() {
        let cfg = AgentConfig::new("a").validate().unwrap();
        assert_eq!(cfg.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn empty_name_rejected() {
        let cfg = AgentConfig::new("   ");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn valid_explicit_values_pass_through() {
        let cfg = AgentConfig::new("a")
            .with_max_iterations(5)
            .with_temperature(1.0)
            .with_max_tokens(512)
            .validate()
            .unwrap();
        assert_eq!(cfg.max_iterations, 5);
        assert_eq!(cfg.temperature, 1.0);
        assert_eq!(cfg.max_tokens, 512);
    }
}
