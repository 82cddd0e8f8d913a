//! Stage 2: score, filter, and greedily admit packets under budget.

use std::collections::HashSet;

use chrono::Utc;

use crate::config::ContextConfig;
use crate::packet::{ContextPacket, PacketType};
use crate::tokens::TokenCounter;

/// Splits `text` into lowercase runs of alphanumeric or CJK Unified
/// Ideograph characters — the token unit the relevance scorer compares.
fn tokenize(text: &str) -> HashSet<String> {
    let mut tokens = HashSet::new();
    let mut current = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() || is_cjk(c) {
            current.push(c.to_ascii_lowercase());
        } else if !current.is_empty() {
            tokens.insert(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.insert(current);
    }
    tokens
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32, 0x4E00..=0x9FFF)
}

/// Jaccard-like overlap of lowercase tokens between `query` and `content`.
/// Returns `0.0` when either side tokenizes to nothing.
pub fn relevance_score(query: &str, content: &str) -> f64 {
    let q = tokenize(query);
    let c = tokenize(content);
    if q.is_empty() || c.is_empty() {
        return 0.0;
    }
    let intersection = q.intersection(&c).count();
    let union = q.union(&c).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Exponential decay `exp(-Δt/τ)`. Packets without a timestamp score a
/// neutral `0.5`.
pub fn recency_score(packet: &ContextPacket, tau: f64) -> f64 {
    match packet.timestamp {
        None => 0.5,
        Some(ts) => {
            let delta = (Utc::now() - ts).num_milliseconds().max(0) as f64 / 1000.0;
            if tau <= 0.0 {
                0.0
            } else {
                (-delta / tau).exp()
            }
        }
    }
}

/// Scores every packet, drops low-relevance non-anchor packets, sorts
/// the survivors by priority then composite score, and greedily admits
/// under `config.available_tokens()`.
pub fn select(
    query: &str,
    mut packets: Vec<ContextPacket>,
    config: &ContextConfig,
    counter: &dyn TokenCounter,
) -> Vec<ContextPacket> {
    for packet in &mut packets {
        packet.token_count = counter.count_text(&packet.content);
        if packet.relevance == 0.0 {
            packet.relevance = relevance_score(query, &packet.content);
        }
        packet.recency = recency_score(packet, config.recency_tau);
        packet.composite = config.relevance_weight * packet.relevance + config.recency_weight * packet.recency;
    }

    let mut candidates: Vec<ContextPacket> = packets
        .into_iter()
        .filter(|p| {
            let is_anchor = matches!(p.packet_type, PacketType::Instructions | PacketType::Task);
            let bypasses_filter = p.packet_type == PacketType::TaskState;
            is_anchor || bypasses_filter || p.relevance >= config.min_relevance
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.packet_type
            .priority()
            .cmp(&b.packet_type.priority())
            .then(b.composite.partial_cmp(&a.composite).unwrap_or(std::cmp::Ordering::Equal))
    });

    let available = config.available_tokens();
    let mut used = 0usize;
    let mut admitted = Vec::new();
    for packet in candidates {
        if used.saturating_add(packet.token_count) > available {
            continue;
        }
        used += packet.token_count;
        admitted.push(packet);
    }
    admitted
}
