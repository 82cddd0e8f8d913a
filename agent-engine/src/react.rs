//! The ReAct engine: a Thought–Action–Observation loop over tools.

use std::sync::Arc;
use std::time::Instant;

use agent_provider::provider::Provider;
use agent_provider::types::{FinishReason, ProviderRequest, ToolChoice, ToolSchema};
use agent_tool::{execute_tool, ToolRegistry};
use agent_types::{AgentError, Message, Output, ReasoningStep, TokenUsage};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::common::{build_initial_messages, deadline, race};
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::input::Input;
use crate::stream::{replay_trace, StreamChunk};
use futures::stream::BoxStream;

/// Model + tools in a reasoning loop: request with tools attached, and
/// either take a tool-free response as the final answer or execute
/// every emitted tool call and feed the observations back in, up to
/// `max_iterations` rounds.
pub struct ReactEngine {
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
    config: EngineConfig,
}

impl ReactEngine {
    pub fn new(provider: Arc<dyn Provider>, tools: ToolRegistry, config: EngineConfig) -> Self {
        Self { provider, tools, config }
    }

    fn tool_schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .all()
            .iter()
            .map(|tool| ToolSchema {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: serde_json::to_value(tool.parameters()).unwrap_or(serde_json::json!({"type": "object"})),
            })
            .collect()
    }

    /// Runs to completion, then replays the recorded trace as a stream —
    /// there is no partial-round streaming for a tool-use loop.
    pub async fn run_stream(&self, input: Input, cancel: CancellationToken) -> BoxStream<'static, StreamChunk> {
        replay_trace(self.run(input, cancel).await)
    }
}

#[async_trait]
impl Engine for ReactEngine {
    #[instrument(skip_all, fields(engine = "react"))]
    async fn run(&self, input: Input, cancel: CancellationToken) -> Output {
        let start = Instant::now();
        let run_deadline = deadline(self.config.timeout);
        let tools = self.tool_schemas();

        let mut dialogue = build_initial_messages(&self.config.system_prompt, &input.history, &input.query);
        let mut trace: Vec<ReasoningStep> = Vec::new();
        let mut usage = TokenUsage::default();

        for iteration in 1..=self.config.max_iterations {
            debug!(iteration, "engine step");

            let request = ProviderRequest {
                model: self.config.model.clone(),
                messages: dialogue.clone(),
                tools: Some(tools.clone()),
                tool_choice: Some(ToolChoice::Auto),
                temperature: Some(self.config.temperature),
                max_tokens: Some(self.config.max_tokens),
                ..Default::default()
            };

            let response = match race(&cancel, run_deadline, self.provider.generate(request)).await {
                Ok(response) => response,
                Err(err) => return Output::failure(err.to_string(), trace, usage, start.elapsed()),
            };
            usage = usage + response.usage;

            match response.finish_reason {
                FinishReason::Length => {
                    return Output::failure(AgentError::MaxTokensExceeded.to_string(), trace, usage, start.elapsed());
                }
                FinishReason::ContentFilter => {
                    return Output::failure(
                        AgentError::InvalidResponse("content filtered".into()).to_string(),
                        trace,
                        usage,
                        start.elapsed(),
                    );
                }
                FinishReason::Stop | FinishReason::ToolCalls => {}
            }

            if response.tool_calls.is_empty() {
                dialogue.push(Message::assistant(response.content.clone()));
                return Output::success(response.content, trace, usage, start.elapsed());
            }

            if !response.content.is_empty() {
                trace.push(ReasoningStep::thought(response.content.clone()));
            }
            dialogue.push(Message::assistant_with_tool_calls(response.content.clone(), response.tool_calls.clone()));

            for call in &response.tool_calls {
                trace.push(ReasoningStep::action(call.name.clone(), call.arguments.clone()));
                let result = execute_tool(&self.tools, &call.name, call.arguments.clone(), &cancel).await;
                trace.push(ReasoningStep::observation(call.name.clone(), result.observation_text(), !result.success));
                dialogue.push(Message::tool(call.id.clone(), call.name.clone(), result.observation_text()));
            }
        }

        Output::failure(
            AgentError::MaxIterationsExceeded(self.config.max_iterations).to_string(),
            trace,
            usage,
            start.elapsed(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{tool_call_response, simple_text_response, AddTool, MockProvider};
    use agent_types::AgentConfig;
    use std::sync::Arc;

    fn engine_with(responses: Vec<agent_types::Result<agent_provider::types::ProviderResponse>>, max_iterations: u32) -> ReactEngine {
        let provider: Arc<dyn Provider> = Arc::new(MockProvider::new(responses));
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(AddTool)).unwrap();
        let config = EngineConfig::from(
            AgentConfig::new("a")
                .with_max_iterations(max_iterations)
                .validate()
                .unwrap(),
        );
        ReactEngine::new(provider, tools, config)
    }

    #[tokio::test]
    async fn react_single_tool_round_trip() {
        let engine = engine_with(
            vec![
                Ok(tool_call_response("call_1", "add", serde_json::json!({"a": 2, "b": 3}))),
                Ok(simple_text_response("The answer is 5.")),
            ],
            10,
        );

        let output = engine.run(Input::new("2+3"), CancellationToken::new()).await;

        assert!(output.is_success());
        assert_eq!(output.response, "The answer is 5.");
        let actions: Vec<_> = output
            .trace
            .iter()
            .filter(|s| matches!(s, ReasoningStep::Action { .. }))
            .collect();
        assert_eq!(actions.len(), 1);
        let observations: Vec<_> = output
            .trace
            .iter()
            .filter_map(|s| match s {
                ReasoningStep::Observation { result, is_error, .. } => Some((result.clone(), *is_error)),
                _ => None,
            })
            .collect();
        assert_eq!(observations, vec![("5".to_string(), false)]);
    }

    #[tokio::test]
    async fn tool_free_response_terminates_immediately() {
        let engine = engine_with(vec![Ok(simple_text_response("no tools needed"))], 10);
        let output = engine.run(Input::new("hi"), CancellationToken::new()).await;
        assert!(output.is_success());
        assert!(output.trace.is_empty());
    }

    #[tokio::test]
    async fn unknown_tool_produces_error_observation_but_loop_continues() {
        let engine = engine_with(
            vec![
                Ok(tool_call_response("call_1", "missing_tool", serde_json::json!({}))),
                Ok(simple_text_response("recovered")),
            ],
            10,
        );
        let output = engine.run(Input::new("use missing"), CancellationToken::new()).await;
        assert!(output.is_success());
        assert!(output.trace.iter().any(|s| matches!(s, ReasoningStep::Observation { is_error: true, .. })));
    }

    #[tokio::test]
    async fn max_iterations_exceeded_is_terminal() {
        let engine = engine_with(
            vec![
                Ok(tool_call_response("c1", "add", serde_json::json!({"a": 1, "b": 1}))),
                Ok(tool_call_response("c2", "add", serde_json::json!({"a": 1, "b": 1}))),
                Ok(simple_text_response("never reached")),
            ],
            2,
        );
        let output = engine.run(Input::new("loop"), CancellationToken::new()).await;
        assert!(output.has_error());
        assert!(output.error.as_deref().unwrap().contains("max iterations"));
    }

    #[tokio::test]
    async fn max_tokens_finish_reason_is_terminal_error() {
        let mut resp = simple_text_response("truncated");
        resp.finish_reason = FinishReason::Length;
        let engine = engine_with(vec![Ok(resp)], 10);
        let output = engine.run(Input::new("hi"), CancellationToken::new()).await;
        assert!(output.has_error());
    }
}
