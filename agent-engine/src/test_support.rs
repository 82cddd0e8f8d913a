//! Mock provider and tool harness shared by every engine's test module,
//! mirroring `neuron-op-react`'s `MockProvider` (queued responses, call
//! counter) since `agent_provider`'s own mock is `pub(crate)` to that
//! crate and not reachable from here.
#![cfg(test)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use agent_provider::provider::Provider;
use agent_provider::types::{FinishReason, ProviderRequest, ProviderResponse, ProviderStreamEvent};
use agent_types::{AgentError, Result, TokenUsage};
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use std::pin::Pin;

pub struct MockProvider {
    pub responses: Mutex<VecDeque<Result<ProviderResponse>>>,
    pub call_count: AtomicUsize,
    pub name: String,
}

impl MockProvider {
    pub fn new(responses: Vec<Result<ProviderResponse>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            call_count: AtomicUsize::new(0),
            name: "mock".into(),
        }
    }

    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn generate(&self, _request: ProviderRequest) -> Result<ProviderResponse> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
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
        &self.name
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

pub fn simple_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        content: text.to_string(),
        tool_calls: vec![],
        finish_reason: FinishReason::Stop,
        usage: TokenUsage::new(10, 8, 18),
        model: "mock-model".into(),
    }
}

pub fn tool_call_response(id: &str, name: &str, args: Value) -> ProviderResponse {
    ProviderResponse {
        content: String::new(),
        tool_calls: vec![agent_types::ToolCall::new(id, name, args)],
        finish_reason: FinishReason::ToolCalls,
        usage: TokenUsage::new(10, 15, 25),
        model: "mock-model".into(),
    }
}

/// A tool that returns the stringified sum of its two integer arguments.
pub struct AddTool;

impl agent_tool::ToolDyn for AddTool {
    fn name(&self) -> &str {
        "add"
    }

    fn description(&self) -> &str {
        "adds two integers"
    }

    fn parameters(&self) -> &agent_tool::ParameterSchema {
        static SCHEMA: std::sync::OnceLock<agent_tool::ParameterSchema> = std::sync::OnceLock::new();
        SCHEMA.get_or_init(agent_tool::ParameterSchema::new)
    }

    fn execute(&self, args: Value) -> Pin<Box<dyn std::future::Future<Output = agent_tool::error::Result<String>> + Send + '_>> {
        Box::pin(async move {
            let a = args.get("a").and_then(Value::as_i64).unwrap_or(0);
            let b = args.get("b").and_then(Value::as_i64).unwrap_or(0);
            Ok((a + b).to_string())
        })
    }
}
