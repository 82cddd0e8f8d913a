//! The Simple engine: one provider call, no tools.

use std::sync::Arc;
use std::time::Instant;

use agent_provider::provider::Provider;
use agent_provider::types::ProviderRequest;
use agent_types::{Output, TokenUsage};
use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::common::{build_initial_messages, deadline, race};
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::input::Input;
use crate::stream::{forward_provider_stream, StreamChunk};

/// Issues exactly one provider call and returns its content directly —
/// no tools attached, no reasoning trace beyond the empty one.
pub struct SimpleEngine {
    provider: Arc<dyn Provider>,
    config: EngineConfig,
}

impl SimpleEngine {
    pub fn new(provider: Arc<dyn Provider>, config: EngineConfig) -> Self {
        Self { provider, config }
    }

    fn build_request(&self, input: &Input) -> ProviderRequest {
        ProviderRequest {
            model: self.config.model.clone(),
            messages: build_initial_messages(&self.config.system_prompt, &input.history, &input.query),
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
            ..Default::default()
        }
    }

    /// Streaming variant: forwards provider chunks one-to-one, only
    /// accumulating (never committing to history — that's the caller's
    /// job) until the final `done` chunk.
    pub async fn run_stream(&self, input: Input, cancel: CancellationToken) -> BoxStream<'static, StreamChunk> {
        let request = self.build_request(&input);
        if cancel.is_cancelled() {
            return Box::pin(futures::stream::once(async { StreamChunk::Error("cancelled".into()) }));
        }
        match self.provider.generate_stream(request).await {
            Ok(events) => forward_provider_stream(events),
            Err(err) => Box::pin(futures::stream::once(async move { StreamChunk::Error(err.to_string()) })),
        }
    }
}

#[async_trait]
impl Engine for SimpleEngine {
    #[instrument(skip_all, fields(engine = "simple"))]
    async fn run(&self, input: Input, cancel: CancellationToken) -> Output {
        let start = Instant::now();
        let request = self.build_request(&input);
        let deadline = deadline(self.config.timeout);

        match race(&cancel, deadline, self.provider.generate(request)).await {
            Ok(response) => Output::success(response.content, vec![], response.usage, start.elapsed()),
            Err(err) => Output::failure(err.to_string(), vec![], TokenUsage::default(), start.elapsed()),
        }
    }
}
