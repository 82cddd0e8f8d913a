//! Validated configuration for the GSSC pipeline.

use agent_types::{AgentError, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_OUTPUT_TEMPLATE: &str = "结论\n依据\n风险与假设\n下一步行动建议";

/// Tunables for a single [`crate::builder::ContextBuilder::build`] call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    pub max_tokens: u32,
    /// Fraction of `max_tokens` withheld for generation, in `[0,1]`.
    pub reserve_ratio: f64,
    pub min_relevance: f64,
    pub relevance_weight: f64,
    pub recency_weight: f64,
    /// Exponential decay constant, in seconds.
    pub recency_tau: f64,
    pub enable_compression: bool,
    pub max_history_messages: usize,
    #[serde(default)]
    pub output_template: Option<String>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            reserve_ratio: 0.25,
            min_relevance: 0.1,
            relevance_weight: 0.6,
            recency_weight: 0.4,
            recency_tau: 3600.0,
            enable_compression: true,
            max_history_messages: 20,
            output_template: None,
        }
    }
}

impl ContextConfig {
    /// `⌊max_tokens·(1−reserve_ratio)⌋`.
    pub fn available_tokens(&self) -> usize {
        ((self.max_tokens as f64) * (1.0 - self.reserve_ratio)).floor().max(0.0) as usize
    }

    pub fn output_template_or_default(&self) -> &str {
        self.output_template.as_deref().unwrap_or(DEFAULT_OUTPUT_TEMPLATE)
    }

    /// Clamps `reserve_ratio`, `min_relevance`, and the two weights into
    /// `[0,1]`; rejects a zero `max_tokens`.
    pub fn validate(mut self) -> Result<Self> {
        if self.max_tokens == 0 {
            return Err(AgentError::InvalidConfig("max_tokens must be >= 1".into()));
        }
        self.reserve_ratio = self.reserve_ratio.clamp(0.0, 1.0);
        self.min_relevance = self.min_relevance.clamp(0.0, 1.0);
        self.relevance_weight = self.relevance_weight.clamp(0.0, 1.0);
        self.recency_weight = self.recency_weight.clamp(0.0, 1.0);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_tokens_matches_formula() {
        let cfg = ContextConfig {
            max_tokens: 100,
            reserve_ratio: 0.25,
            ..Default::default()
        };
        assert_eq!(cfg.available_tokens(), 75);
    }

    #[test]
    fn zero_reserve_ratio_uses_full_budget() {
        let cfg = ContextConfig {
            max_tokens: 20,
            reserve_ratio: 0.0,
            ..Default::default()
        };
        assert_eq!(cfg.available_tokens(), 20);
    }

    #[test]
    fn out_of_range_weights_are_clamped_not_rejected() {
        let cfg = ContextConfig {
            reserve_ratio: 1.5,
            min_relevance: -0.2,
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(cfg.reserve_ratio, 1.0);
        assert_eq!(cfg.min_relevance, 0.0);
    }

    #[test]
    fn zero_max_tokens_is_rejected() {
        let cfg = ContextConfig {
            max_tokens: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn default_output_template_matches_spec_sections() {
        let cfg = ContextConfig::default();
        let t = cfg.output_template_or_default();
        assert!(t.contains("结论"));
        assert!(t.contains("依据"));
        assert!(t.contains("风险与假设"));
        assert!(t.contains("下一步行动建议"));
    }
}
