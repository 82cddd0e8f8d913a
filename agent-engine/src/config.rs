//! Engine-facing view of `agent_types::AgentConfig`.

use std::time::Duration;

use agent_types::AgentConfig;

/// The subset of [`AgentConfig`] every engine needs, already validated
/// and defaulted by `AgentConfig::validate`. Kept as its own small type
/// so engines don't reach into the facade crate's config type directly.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub system_prompt: String,
    pub max_iterations: u32,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub model: String,
}

impl From<&AgentConfig> for EngineConfig {
    fn from(cfg: &AgentConfig) -> Self {
        Self {
            system_prompt: cfg.system_prompt.clone(),
            max_iterations: cfg.max_iterations,
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
            timeout: cfg.timeout,
            model: cfg.model.clone().unwrap_or_default(),
        }
    }
}

impl From<AgentConfig> for EngineConfig {
    fn from(cfg: AgentConfig) -> Self {
        EngineConfig::from(&cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_validated_agent_config() {
        let cfg = AgentConfig::new("a")
            .with_max_iterations(5)
            .with_temperature(0.3)
            .with_max_tokens(256)
            .validate()
            .unwrap();
        let engine_cfg = EngineConfig::from(&cfg);
        assert_eq!(engine_cfg.max_iterations, 5);
        assert_eq!(engine_cfg.temperature, 0.3);
        assert_eq!(engine_cfg.max_tokens, 256);
    }
}
