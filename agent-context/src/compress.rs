//! Stage 4: truncate lowest-priority sections first until in budget.

use crate::config::ContextConfig;
use crate::structure::{render, Section};
use crate::tokens::TokenCounter;

const TRUNCATION_MARKER: &str = "[... truncated]";

/// Lowest-priority-first truncation order. `[Role & Policies]` is last,
/// so it survives every budget this side of pathologically small.
const TRUNCATION_ORDER: &[&str] =
    &["[Context]", "[Evidence]", "[State]", "[Output]", "[Task]", "[Role & Policies]"];

/// Passthrough if `enable_compression` is false or already under budget.
/// Otherwise walks [`TRUNCATION_ORDER`], half-truncating each section and
/// dropping it entirely if it still doesn't fit.
pub fn compress(sections: Vec<Section>, config: &ContextConfig, counter: &dyn TokenCounter) -> Vec<Section> {
    let available = config.available_tokens();
    if !config.enable_compression || counter.count_text(&render(&sections)) <= available {
        return sections;
    }

    let mut sections = sections;
    for label in TRUNCATION_ORDER {
        if counter.count_text(&render(&sections)) <= available {
            break;
        }
        let Some(idx) = sections.iter().position(|s| s.label == *label) else {
            continue;
        };
        if sections[idx].is_empty() {
            continue;
        }

        let half_truncated = half_truncate(&sections[idx], counter);
        let mut trial = sections.clone();
        trial[idx] = half_truncated;
        if counter.count_text(&render(&trial)) <= available {
            sections = trial;
        } else {
            sections[idx] = Section::new(sections[idx].label.clone(), String::new());
        }
    }
    sections
}

/// Keeps the header line plus as many subsequent lines as fit within
/// half the section's original token count, appended with a marker.
fn half_truncate(section: &Section, counter: &dyn TokenCounter) -> Section {
    let original_tokens = counter.count_text(&section.body);
    let half_budget = original_tokens / 2;

    let mut lines = section.body.lines();
    let Some(first) = lines.next() else {
        return section.clone();
    };

    let mut kept = String::from(first);
    let mut used = counter.count_text(first);
    for line in lines {
        let line_tokens = counter.count_text(line);
        if used + line_tokens > half_budget {
            break;
        }
        kept.push('\n');
        kept.push_str(line);
        used += line_tokens;
    }
    kept.push('\n');
    kept.push_str(TRUNCATION_MARKER);

    Section::new(section.label.clone(), kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::CharRatioCounter;

    #[test]
    fn disabled_compression_is_a_passthrough() {
        let sections = vec![Section::new("[Context]", "a".repeat(1000))];
        let mut config = ContextConfig { enable_compression: false, ..Default::default() };
        config.max_tokens = 1;
        config.reserve_ratio = 0.0;
        let out = compress(sections.clone(), &config, &CharRatioCounter::default());
        assert_eq!(out, sections);
    }

    #[test]
    fn already_under_budget_is_a_passthrough() {
        let sections = vec![Section::new("[Task]", "short")];
        let config = ContextConfig { max_tokens: 1000, reserve_ratio: 0.0, ..Default::default() };
        let out = compress(sections.clone(), &config, &CharRatioCounter::default());
        assert_eq!(out, sections);
    }

    #[test]
    fn context_is_truncated_before_role_and_policies() {
        let sections = vec![
            Section::new("[Role & Policies]", "policy text ".repeat(5)),
            Section::new("[Task]", "do the task"),
            Section::new("[Context]", "history line one\nhistory line two\nhistory line three".repeat(10)),
        ];
        let config = ContextConfig { max_tokens: 20, reserve_ratio: 0.0, enable_compression: true, ..Default::default() };
        let out = compress(sections, &config, &CharRatioCounter::default());
        let role = out.iter().find(|s| s.label == "[Role & Policies]").unwrap();
        assert!(!role.is_empty());
    }

    #[test]
    fn tight_budget_leaves_only_role_and_policies_or_fits() {
        let sections = vec![
            Section::new("[Role & Policies]", "be a helpful and careful assistant at all times"),
            Section::new("[Task]", "a very long task description ".repeat(20)),
            Section::new("[Evidence]", "事实与引用：\n[来源: doc]\n".to_string() + &"fact ".repeat(50)),
            Section::new("[Context]", "history ".repeat(50)),
        ];
        let config = ContextConfig { max_tokens: 20, reserve_ratio: 0.0, enable_compression: true, ..Default::default() };
        let counter = CharRatioCounter::default();
        let out = compress(sections, &config, &counter);
        let total = counter.count_text(&render(&out));
        let only_role = out.iter().all(|s| s.is_empty() || s.label == "[Role & Policies]");
        assert!(total <= config.available_tokens() || only_role);
    }

    #[test]
    fn half_truncate_keeps_header_and_appends_marker() {
        let section = Section::new("[Context]", "first\nsecond\nthird\nfourth\nfifth");
        let truncated = half_truncate(&section, &CharRatioCounter::default());
        assert!(truncated.body.starts_with("first"));
        assert!(truncated.body.ends_with(TRUNCATION_MARKER));
    }
}
