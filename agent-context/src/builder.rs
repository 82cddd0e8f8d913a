//! Ties gather → select → structure → compress into one pipeline.

use agent_types::{Message, Result};

use crate::gather::{GatherInput, Gatherer};
use crate::select::select;
use crate::structure::{render, Structurer};
use crate::{compress, tokens::TokenCounter};

/// Runs the full GSSC pipeline for one agent.
pub struct ContextBuilder {
    gatherer: Box<dyn Gatherer>,
    structurer: Box<dyn Structurer>,
    counter: Box<dyn TokenCounter>,
}

impl ContextBuilder {
    pub fn new(gatherer: Box<dyn Gatherer>, structurer: Box<dyn Structurer>, counter: Box<dyn TokenCounter>) -> Self {
        Self {
            gatherer,
            structurer,
            counter,
        }
    }

    /// Runs gather → select → structure → compress, returning the final
    /// rendered prompt text.
    pub async fn build(&self, input: &GatherInput) -> Result<String> {
        let gathered = self.gatherer.gather(input).await?;
        let selected = select(&input.query, gathered, &input.config, self.counter.as_ref());
        let sections = self.structurer.structure(&selected, &input.query, input.config.output_template_or_default());
        let compressed = compress::compress(sections, &input.config, self.counter.as_ref());
        Ok(render(&compressed))
    }

    /// Wraps [`Self::build`]'s text as a system message followed by the
    /// user-query message.
    pub async fn build_messages(&self, input: &GatherInput) -> Result<Vec<Message>> {
        let text = self.build(input).await?;
        Ok(vec![Message::system(text), Message::user(input.query.clone())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContextConfig;
    use crate::gather::{CompositeGatherer, GatherMode, HistoryGatherer, InstructionsGatherer, TaskGatherer};
    use crate::structure::DefaultStructurer;
    use crate::tokens::CharRatioCounter;
    use std::sync::Arc;

    fn builder() -> ContextBuilder {
        let gatherer = CompositeGatherer::new(
            vec![Arc::new(InstructionsGatherer), Arc::new(TaskGatherer), Arc::new(HistoryGatherer)],
            GatherMode::Sequential,
        );
        ContextBuilder::new(Box::new(gatherer), Box::new(DefaultStructurer), Box::new(CharRatioCounter::default()))
    }

    #[tokio::test]
    async fn build_produces_fixed_section_order() {
        let input = GatherInput {
            query: "what is ownership".into(),
            system_instructions: "be precise".into(),
            history: vec![],
            config: ContextConfig { max_tokens: 1000, reserve_ratio: 0.0, ..Default::default() },
        };
        let text = builder().build(&input).await.unwrap();
        let role_pos = text.find("[Role & Policies]").unwrap();
        let task_pos = text.find("[Task]").unwrap();
        assert!(role_pos < task_pos);
    }

    #[tokio::test]
    async fn build_messages_wraps_as_system_then_user() {
        let input = GatherInput {
            query: "hello".into(),
            system_instructions: "be kind".into(),
            history: vec![],
            config: ContextConfig::default(),
        };
        let messages = builder().build_messages(&input).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, agent_types::Role::System);
        assert_eq!(messages[1].role, agent_types::Role::User);
        assert_eq!(messages[1].content, "hello");
    }

    #[tokio::test]
    async fn tight_budget_compresses_to_at_most_role_and_policies() {
        let input = GatherInput {
            query: "a very long query ".repeat(20),
            system_instructions: "be precise and careful".into(),
            history: (0..10).map(|i| Message::user(format!("message number {i} with some extra text"))).collect(),
            config: ContextConfig {
                max_tokens: 20,
                reserve_ratio: 0.0,
                enable_compression: true,
                min_relevance: 0.0,
                ..Default::default()
            },
        };
        let text = builder().build(&input).await.unwrap();
        let counter = CharRatioCounter::default();
        let tokens = counter.count_text(&text);
        let only_role = text.trim_start().starts_with("[Role & Policies]")
            && !text.contains("[Context]");
        assert!(tokens <= input.config.available_tokens() || only_role);
    }
}
