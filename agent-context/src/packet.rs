//! Prioritized, scored, token-counted units of context.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of a context packet, carrying its fixed priority rank.
/// Lower priority numbers are admitted first and truncated last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketType {
    Instructions,
    Task,
    TaskState,
    Evidence,
    History,
    Custom,
}

impl PacketType {
    /// `P0`..`P4`, matching the priority tiers named in the structurer.
    pub fn priority(self) -> u8 {
        match self {
            PacketType::Instructions => 0,
            PacketType::Task | PacketType::TaskState => 1,
            PacketType::Evidence => 2,
            PacketType::History => 3,
            PacketType::Custom => 4,
        }
    }
}

/// One scored, timestamped unit of context produced by a gatherer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextPacket {
    pub content: String,
    pub packet_type: PacketType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub token_count: usize,
    pub relevance: f64,
    pub recency: f64,
    pub composite: f64,
    pub source: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl ContextPacket {
    /// Constructs a packet with scores left at zero; the selector fills
    /// `relevance`/`recency`/`composite` in during scoring.
    pub fn new(content: impl Into<String>, packet_type: PacketType, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            packet_type,
            timestamp: None,
            token_count: 0,
            relevance: 0.0,
            recency: 0.0,
            composite: 0.0,
            source: source.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance = relevance;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_tiers_match_spec_ordering() {
        assert_eq!(PacketType::Instructions.priority(), 0);
        assert_eq!(PacketType::Task.priority(), 1);
        assert_eq!(PacketType::TaskState.priority(), 1);
        assert_eq!(PacketType::Evidence.priority(), 2);
        assert_eq!(PacketType::History.priority(), 3);
        assert_eq!(PacketType::Custom.priority(), 4);
    }

    #[test]
    fn priorities_are_totally_ordered() {
        let mut types = vec![
            PacketType::Custom,
            PacketType::Instructions,
            PacketType::History,
            PacketType::Evidence,
            PacketType::Task,
        ];
        types.sort_by_key(|t| t.priority());
        assert_eq!(
            types,
            vec![
                PacketType::Instructions,
                PacketType::Task,
                PacketType::Evidence,
                PacketType::History,
                PacketType::Custom,
            ]
        );
    }
}
