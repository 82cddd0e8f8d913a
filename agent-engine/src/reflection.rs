//! The Reflection engine: generate, then critique-and-improve for N rounds.

use std::sync::Arc;
use std::time::Instant;

use agent_provider::provider::Provider;
use agent_provider::types::ProviderRequest;
use agent_types::{Message, Output, ReasoningStep, TokenUsage};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::common::{build_initial_messages, deadline, race};
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::input::Input;
use crate::stream::{replay_trace, StreamChunk};
use futures::stream::BoxStream;

const REFLECTION_PROMPT: &str =
    "reflect on the previous response; identify strengths and flaws; provide an improved version";

/// One initial generation, then `max_iterations - 1` reflection rounds.
/// No tools. Each round appends the last assistant response plus a
/// reflection prompt to a local dialogue; the improved response
/// replaces `current_response` and a `Reflection` step is recorded.
pub struct ReflectionEngine {
    provider: Arc<dyn Provider>,
    config: EngineConfig,
}

impl ReflectionEngine {
    pub fn new(provider: Arc<dyn Provider>, config: EngineConfig) -> Self {
        Self { provider, config }
    }

    fn request(&self, messages: Vec<Message>) -> ProviderRequest {
        ProviderRequest {
            model: self.config.model.clone(),
            messages,
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
            ..Default::default()
        }
    }

    /// Runs to completion, then replays the recorded trace as a stream —
    /// each reflection round only finalizes after its own provider call
    /// returns, so there is nothing meaningful to stream mid-round.
    pub async fn run_stream(&self, input: Input, cancel: CancellationToken) -> BoxStream<'static, StreamChunk> {
        replay_trace(self.run(input, cancel).await)
    }
}

#[async_trait]
impl Engine for ReflectionEngine {
    #[instrument(skip_all, fields(engine = "reflection"))]
    async fn run(&self, input: Input, cancel: CancellationToken) -> Output {
        let start = Instant::now();
        let run_deadline = deadline(self.config.timeout);

        let mut dialogue = build_initial_messages(&self.config.system_prompt, &input.history, &input.query);
        let mut trace: Vec<ReasoningStep> = Vec::new();
        let mut usage = TokenUsage::default();

        let initial = match race(&cancel, run_deadline, self.provider.generate(self.request(dialogue.clone()))).await {
            Ok(response) => response,
            Err(err) => return Output::failure(err.to_string(), trace, usage, start.elapsed()),
        };
        usage = usage + initial.usage;
        let mut current_response = initial.content;

        for round in 1..self.config.max_iterations {
            debug!(iteration = round, "engine step");

            dialogue.push(Message::assistant(current_response.clone()));
            dialogue.push(Message::user(REFLECTION_PROMPT));

            let response = match race(&cancel, run_deadline, self.provider.generate(self.request(dialogue.clone()))).await {
                Ok(response) => response,
                Err(err) => return Output::failure(err.to_string(), trace, usage, start.elapsed()),
            };
            usage = usage + response.usage;
            current_response = response.content;
            trace.push(ReasoningStep::reflection(current_response.clone()));
        }

        Output::success(current_response, trace, usage, start.elapsed())
    }
}
