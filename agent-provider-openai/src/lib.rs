//! An adapter for the OpenAI Chat Completions wire format and the family
//! of OpenAI-compatible servers that speak the same dialect with minor
//! payload differences: DeepSeek, Qwen (DashScope's OpenAI-compatible
//! endpoint), and vLLM's OpenAI-compatible server. One struct, one base
//! URL/auth/default-model triple per deployment, rather than one type per
//! vendor.

pub mod wire;

use std::time::Duration;

use agent_provider::provider::Provider;
use agent_provider::types::{FinishReason, ProviderRequest, ProviderResponse, ProviderStreamEvent};
use agent_types::{AgentError, Message, Result, Role, TokenUsage, ToolCall};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::StatusCode;

use wire::{
    ChatChoice, ChatFunction, ChatFunctionCall, ChatMessage, ChatRequest, ChatResponse,
    ChatStreamChunk, ChatTool, ChatToolCall, ChatUsage, EmbeddingResponse,
};

/// Base URL, auth header style, and default model for one deployment of
/// the OpenAI-compatible dialect family.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    name: String,
    api_key: String,
    base_url: String,
    default_model: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// `base_url` is the API root, e.g. `https://api.openai.com/v1`.
    pub fn new(name: impl Into<String>, api_key: impl Into<String>, base_url: impl Into<String>, default_model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            default_model: default_model.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Convenience constructor for the canonical OpenAI endpoint.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new("openai", api_key, "https://api.openai.com/v1", model)
    }

    /// DeepSeek's OpenAI-compatible endpoint.
    pub fn deepseek(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new("deepseek", api_key, "https://api.deepseek.com/v1", model)
    }

    /// Qwen / DashScope's OpenAI-compatible endpoint.
    pub fn qwen(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new("qwen", api_key, "https://dashscope.aliyuncs.com/compatible-mode/v1", model)
    }

    /// A self-hosted vLLM OpenAI-compatible server.
    pub fn vllm(api_key: impl Into<String>, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new("vllm", api_key, base_url, model)
    }

    fn model_or_default(&self, request: &ProviderRequest) -> String {
        if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        }
    }

    fn build_request(&self, request: &ProviderRequest, stream: bool) -> ChatRequest {
        let messages = request.messages.iter().map(message_to_wire).collect();

        let tools: Vec<ChatTool> = request
            .tools
            .iter()
            .flatten()
            .map(|t| ChatTool {
                tool_type: "function".into(),
                function: ChatFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect();

        let tool_choice = request.tool_choice.as_ref().map(|c| {
            serde_json::Value::String(c.as_wire_str().to_string())
        });

        ChatRequest {
            model: self.model_or_default(request),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
            stop: request.stop.clone(),
            tools,
            tool_choice,
            stream: if stream { Some(true) } else { None },
            extra: request.extra.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    fn auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.bearer_auth(&self.api_key)
    }

    async fn map_status_error(response: reqwest::Response) -> AgentError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::InvalidApiKey(body),
            StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited,
            StatusCode::NOT_FOUND => AgentError::ModelNotFound(body),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => AgentError::Timeout,
            s if s.is_server_error() => AgentError::ProviderUnavailable(format!("HTTP {status}: {body}")),
            _ => AgentError::Other(format!("HTTP {status}: {body}").into()),
        }
    }

    fn parse_response(&self, body: ChatResponse) -> Result<ProviderResponse> {
        let choice: ChatChoice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::InvalidResponse("no choices in response".into()))?;

        let content = choice.message.content.unwrap_or_default();

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .into_iter()
            .flatten()
            .map(wire_tool_call_to_tool_call)
            .collect();

        let raw_finish = match choice.finish_reason.as_deref() {
            Some("tool_calls") => FinishReason::ToolCalls,
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Stop,
        };
        let finish_reason = ProviderResponse::normalize_finish_reason(!tool_calls.is_empty(), raw_finish);

        Ok(ProviderResponse {
            content,
            tool_calls,
            finish_reason,
            usage: wire_usage_to_token_usage(&body.usage),
            model: body.model,
        })
    }
}

fn message_to_wire(m: &Message) -> ChatMessage {
    let role = match m.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    let tool_calls = m.tool_calls.as_ref().map(|calls| {
        calls
            .iter()
            .map(|tc| ChatToolCall {
                id: tc.id.clone(),
                call_type: "function".into(),
                function: ChatFunctionCall {
                    name: tc.name.clone(),
                    arguments: serde_json::to_string(&tc.arguments).unwrap_or_default(),
                },
            })
            .collect()
    });

    ChatMessage {
        role: role.into(),
        content: if m.content.is_empty() && tool_calls.is_some() { None } else { Some(m.content.clone()) },
        name: m.name.clone(),
        tool_calls,
        tool_call_id: m.tool_call_id.clone(),
    }
}

fn wire_tool_call_to_tool_call(tc: ChatToolCall) -> ToolCall {
    let arguments = serde_json::from_str(&tc.function.arguments).unwrap_or(serde_json::Value::Null);
    ToolCall::new(tc.id, tc.function.name, arguments)
}

fn wire_usage_to_token_usage(usage: &ChatUsage) -> TokenUsage {
    TokenUsage::new(usage.prompt_tokens, usage.completion_tokens, usage.total_tokens)
}

/// Accumulates `ToolCallArgsDelta` fragments per tool-call index until the
/// stream's terminal chunk, mirroring the accumulate-then-parse-once
/// contract documented on [`ProviderStreamEvent`].
#[derive(Default)]
struct StreamAccumulator {
    started: Vec<bool>,
}

impl StreamAccumulator {
    fn events_for_chunk(&mut self, chunk: ChatStreamChunk) -> Vec<ProviderStreamEvent> {
        let mut events = Vec::new();
        let Some(choice) = chunk.choices.into_iter().next() else {
            return events;
        };

        if let Some(text) = choice.delta.content {
            if !text.is_empty() {
                events.push(ProviderStreamEvent::TextDelta(text));
            }
        }

        for tc in choice.delta.tool_calls.into_iter().flatten() {
            while self.started.len() <= tc.index {
                self.started.push(false);
            }
            if !self.started[tc.index] {
                self.started[tc.index] = true;
                events.push(ProviderStreamEvent::ToolCallStart {
                    index: tc.index,
                    id: tc.id.unwrap_or_default(),
                    name: tc.function.as_ref().and_then(|f| f.name.clone()).unwrap_or_default(),
                });
            }
            if let Some(args) = tc.function.and_then(|f| f.arguments) {
                if !args.is_empty() {
                    events.push(ProviderStreamEvent::ToolCallArgsDelta { index: tc.index, delta: args });
                }
            }
        }

        if let Some(reason) = choice.finish_reason {
            for index in 0..self.started.len() {
                events.push(ProviderStreamEvent::ToolCallEnd { index });
            }
            let finish_reason = match reason.as_str() {
                "tool_calls" => FinishReason::ToolCalls,
                "length" => FinishReason::Length,
                "content_filter" => FinishReason::ContentFilter,
                _ => FinishReason::Stop,
            };
            events.push(ProviderStreamEvent::Done {
                finish_reason: Some(finish_reason),
                usage: chunk.usage.as_ref().map(wire_usage_to_token_usage),
            });
        }

        events
    }
}

/// Splits an SSE byte stream into `data:` payload lines, dropping the
/// terminal `[DONE]` sentinel.
fn sse_lines(bytes: &[u8], carry: &mut String) -> Vec<String> {
    carry.push_str(&String::from_utf8_lossy(bytes));
    let mut complete = Vec::new();
    while let Some(pos) = carry.find('\n') {
        let line = carry[..pos].trim_end_matches('\r').to_string();
        *carry = carry[pos + 1..].to_string();
        if let Some(payload) = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")) {
            let payload = payload.trim();
            if !payload.is_empty() && payload != "[DONE]" {
                complete.push(payload.to_string());
            }
        }
    }
    complete
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn generate(&self, request: ProviderRequest) -> Result<ProviderResponse> {
        let body = self.build_request(&request, false);
        let req = self.auth(self.client.post(self.endpoint("chat/completions")).json(&body));
        let response = req.send().await.map_err(|e| AgentError::Other(e.into()))?;
        if !response.status().is_success() {
            return Err(Self::map_status_error(response).await);
        }
        let parsed: ChatResponse = response.json().await.map_err(|e| AgentError::InvalidResponse(e.to_string()))?;
        self.parse_response(parsed)
    }

    async fn generate_stream(&self, request: ProviderRequest) -> Result<BoxStream<'static, Result<ProviderStreamEvent>>> {
        let body = self.build_request(&request, true);
        let req = self.auth(self.client.post(self.endpoint("chat/completions")).json(&body));
        let response = req.send().await.map_err(|e| AgentError::Other(e.into()))?;
        if !response.status().is_success() {
            return Err(Self::map_status_error(response).await);
        }

        let byte_stream = response.bytes_stream();
        let stream = futures::stream::unfold(
            (byte_stream, String::new(), StreamAccumulator::default(), false),
            move |(mut bytes, mut carry, mut acc, mut done)| async move {
                if done {
                    return None;
                }
                loop {
                    match bytes.next().await {
                        None => {
                            done = true;
                            return None;
                        }
                        Some(Err(e)) => {
                            done = true;
                            return Some((vec![Err(AgentError::Other(e.into()))], (bytes, carry, acc, done)));
                        }
                        Some(Ok(chunk)) => {
                            let lines = sse_lines(&chunk, &mut carry);
                            let mut events = Vec::new();
                            for line in lines {
                                match serde_json::from_str::<ChatStreamChunk>(&line) {
                                    Ok(parsed) => {
                                        if parsed
                                            .choices
                                            .first()
                                            .map(|c| c.finish_reason.is_some())
                                            .unwrap_or(false)
                                        {
                                            done = true;
                                        }
                                        events.extend(acc.events_for_chunk(parsed));
                                    }
                                    Err(e) => {
                                        events.push(Err(AgentError::InvalidResponse(e.to_string())));
                                        done = true;
                                    }
                                }
                            }
                            if !events.is_empty() {
                                let events = events.into_iter().map(Ok).collect::<Vec<_>>();
                                return Some((events, (bytes, carry, acc, done)));
                            }
                            if done {
                                return None;
                            }
                        }
                    }
                }
            },
        )
        .flat_map(futures::stream::iter);

        Ok(Box::pin(stream))
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let payload = serde_json::json!({
            "model": self.default_model,
            "input": texts,
        });
        let req = self.auth(self.client.post(self.endpoint("embeddings")).json(&payload));
        let response = req.send().await.map_err(|e| AgentError::Other(e.into()))?;
        if !response.status().is_success() {
            return Err(Self::map_status_error(response).await);
        }
        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| AgentError::InvalidResponse(e.to_string()))?;
        parsed.data.sort_by_key(|item| item.index);
        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.default_model
    }
}

#[allow(dead_code)]
fn default_health_check_interval() -> Duration {
    Duration::from_secs(30)
}
