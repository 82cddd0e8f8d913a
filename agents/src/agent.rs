//! The stateful `Agent`: owns history and configuration behind a
//! reader-writer discipline, and drives one of the four reasoning
//! engines per run.

use std::sync::Arc;

use agent_engine::{Engine, EngineConfig, Input, PlanAndSolveEngine, ReactEngine, ReflectionEngine, SimpleEngine, StreamChunk};
use agent_provider::provider::Provider;
use agent_tool::ToolRegistry;
use agent_types::{AgentConfig, Message, Output, Result};
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Which reasoning strategy an [`Agent`] drives its runs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Simple,
    React,
    Reflection,
    PlanAndSolve,
}

/// One of the four concrete engines, constructed fresh per run from the
/// agent's current config snapshot (mirrors the teacher's resolved-
/// config-per-call merge pattern rather than caching a stale engine).
enum AnyEngine {
    Simple(SimpleEngine),
    React(ReactEngine),
    Reflection(ReflectionEngine),
    PlanAndSolve(PlanAndSolveEngine),
}

impl AnyEngine {
    async fn run(&self, input: Input, cancel: CancellationToken) -> Output {
        match self {
            AnyEngine::Simple(e) => e.run(input, cancel).await,
            AnyEngine::React(e) => e.run(input, cancel).await,
            AnyEngine::Reflection(e) => e.run(input, cancel).await,
            AnyEngine::PlanAndSolve(e) => e.run(input, cancel).await,
        }
    }

    async fn run_stream(&self, input: Input, cancel: CancellationToken) -> BoxStream<'static, StreamChunk> {
        match self {
            AnyEngine::Simple(e) => e.run_stream(input, cancel).await,
            AnyEngine::React(e) => e.run_stream(input, cancel).await,
            AnyEngine::Reflection(e) => e.run_stream(input, cancel).await,
            AnyEngine::PlanAndSolve(e) => e.run_stream(input, cancel).await,
        }
    }
}

/// A stateful actor that converts a user query into a final answer,
/// owning its own history and configuration.
///
/// History and the system prompt are mutated during `run`; concurrent
/// `run`/`get_history`/`clear_history`/`set_system_prompt` calls on the
/// same agent are serialized by a reader-writer lock — reads return a
/// defensively cloned snapshot, writes take the write half.
pub struct Agent {
    config: RwLock<AgentConfig>,
    history: RwLock<Vec<Message>>,
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
    kind: EngineKind,
}

impl Agent {
    pub fn new(config: AgentConfig, provider: Arc<dyn Provider>, tools: ToolRegistry, kind: EngineKind) -> Result<Self> {
        let config = config.validate()?;
        Ok(Self {
            config: RwLock::new(config),
            history: RwLock::new(Vec::new()),
            provider,
            tools,
            kind,
        })
    }

    async fn engine(&self) -> AnyEngine {
        let config = self.config.read().await.clone();
        let engine_config = EngineConfig::from(&config);
        match self.kind {
            EngineKind::Simple => AnyEngine::Simple(SimpleEngine::new(self.provider.clone(), engine_config)),
            EngineKind::React => AnyEngine::React(ReactEngine::new(self.provider.clone(), self.tools.clone(), engine_config)),
            EngineKind::Reflection => AnyEngine::Reflection(ReflectionEngine::new(self.provider.clone(), engine_config)),
            EngineKind::PlanAndSolve => {
                AnyEngine::PlanAndSolve(PlanAndSolveEngine::new(self.provider.clone(), self.tools.clone(), engine_config))
            }
        }
    }

    /// Runs one query to completion. On success, appends exactly the
    /// `(user, assistant)` pair to history, in that order; on
    /// cancellation or any other failure, history is left untouched —
    /// the source commits history only on successful completion.
    pub async fn run(&self, query: impl Into<String>, cancel: CancellationToken) -> Output {
        let query = query.into();
        let history_snapshot = self.history.read().await.clone();
        let engine = self.engine().await;
        let input = Input::new(query.clone()).with_history(history_snapshot);

        let output = engine.run(input, cancel).await;

        if output.is_success() {
            let mut history = self.history.write().await;
            history.push(Message::user(query));
            history.push(Message::assistant(output.response.clone()));
        }

        output
    }

    /// Streaming variant of [`run`](Self::run). Requires `Arc<Self>` so
    /// the returned, independently-owned stream can commit history
    /// itself once the terminal `Done` chunk is produced — matching the
    /// Simple engine's "commit only on the final done chunk" contract,
    /// generalized to every engine's replayed trace.
    pub async fn run_stream(self: &Arc<Self>, query: impl Into<String>, cancel: CancellationToken) -> BoxStream<'static, StreamChunk> {
        let query = query.into();
        let history_snapshot = self.history.read().await.clone();
        let engine = self.engine().await;
        let input = Input::new(query.clone()).with_history(history_snapshot);
        let inner = engine.run_stream(input, cancel).await;

        let agent = self.clone();
        let accumulated = Arc::new(tokio::sync::Mutex::new(String::new()));

        inner
            .then(move |chunk| {
                let agent = agent.clone();
                let accumulated = accumulated.clone();
                let query = query.clone();
                async move {
                    match &chunk {
                        StreamChunk::Text(text) => accumulated.lock().await.push_str(text),
                        StreamChunk::Done { .. } => {
                            let response = accumulated.lock().await.clone();
                            if !response.is_empty() {
                                let mut history = agent.history.write().await;
                                history.push(Message::user(query.clone()));
                                history.push(Message::assistant(response));
                            }
                        }
                        _ => {}
                    }
                    chunk
                }
            })
            .boxed()
    }

    /// A defensive copy of the current history.
    pub async fn get_history(&self) -> Vec<Message> {
        self.history.read().await.clone()
    }

    pub async fn clear_history(&self) {
        self.history.write().await.clear();
    }

    pub async fn set_system_prompt(&self, prompt: impl Into<String>) {
        self.config.write().await.system_prompt = prompt.into();
    }

    pub async fn config_snapshot(&self) -> AgentConfig {
        self.config.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_provider::types::{FinishReason, ProviderRequest, ProviderResponse, ProviderStreamEvent};
    use agent_types::AgentError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockProvider {
        responses: Mutex<VecDeque<Result<ProviderResponse>>>,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(responses: Vec<Result<ProviderResponse>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Provider for MockProvider {
        async fn generate(&self, _request: ProviderRequest) -> Result<ProviderResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AgentError::ProviderUnavailable("mock exhausted".into())))
        }

        async fn generate_stream(&self, request: ProviderRequest) -> Result<BoxStream<'static, Result<ProviderStreamEvent>>> {
            let response = self.generate(request).await?;
            let events = vec![
                Ok(ProviderStreamEvent::TextDelta(response.content.clone())),
                Ok(ProviderStreamEvent::Done {
                    finish_reason: Some(response.finish_reason),
                    usage: Some(response.usage),
                }),
            ];
            Ok(Box::pin(futures::stream::iter(events)))
        }

        fn name(&self) -> &str {
            "mock"
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }

    fn simple_response(text: &str) -> ProviderResponse {
        ProviderResponse {
            content: text.to_string(),
            tool_calls: vec![],
            finish_reason: FinishReason::Stop,
            usage: agent_types::TokenUsage::new(10, 8, 18),
            model: "mock-model".into(),
        }
    }

    fn agent_with(responses: Vec<Result<ProviderResponse>>) -> Agent {
        let provider: Arc<dyn Provider> = Arc::new(MockProvider::new(responses));
        Agent::new(AgentConfig::new("a"), provider, ToolRegistry::new(), EngineKind::Simple).unwrap()
    }

    #[tokio::test]
    async fn simple_round_trip_appends_user_then_assistant() {
        let agent = agent_with(vec![Ok(simple_response("Hello! I'm a helpful assistant."))]);
        let output = agent.run("Hello", CancellationToken::new()).await;

        assert!(output.is_success());
        assert_eq!(output.response, "Hello! I'm a helpful assistant.");

        let history = agent.get_history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, agent_types::Role::User);
        assert_eq!(history[1].role, agent_types::Role::Assistant);
    }

    #[tokio::test]
    async fn failed_run_does_not_mutate_history() {
        let agent = agent_with(vec![Err(AgentError::InvalidApiKey("bad".into()))]);
        let output = agent.run("hi", CancellationToken::new()).await;
        assert!(output.has_error());
        assert!(agent.get_history().await.is_empty());
    }

    #[tokio::test]
    async fn clear_history_empties_it() {
        let agent = agent_with(vec![Ok(simple_response("hi there"))]);
        agent.run("hello", CancellationToken::new()).await;
        assert_eq!(agent.get_history().await.len(), 2);
        agent.clear_history().await;
        assert!(agent.get_history().await.is_empty());
    }

    #[tokio::test]
    async fn set_system_prompt_is_visible_in_config_snapshot() {
        let agent = agent_with(vec![]);
        agent.set_system_prompt("be concise").await;
        assert_eq!(agent.config_snapshot().await.system_prompt, "be concise");
    }

    #[tokio::test]
    async fn run_stream_commits_history_on_done() {
        let agent = Arc::new(agent_with(vec![Ok(simple_response("streamed answer"))]));
        let mut stream = agent.run_stream("hi", CancellationToken::new()).await;
        let mut chunks = Vec::new();
        while let Some(chunk) = stream.next().await {
            chunks.push(chunk);
        }
        assert!(matches!(chunks.last(), Some(StreamChunk::Done { .. })));
        assert_eq!(agent.get_history().await.len(), 2);
    }
}
