//! An adapter for Ollama's local `/api/chat` endpoint: no auth header, no
//! cost accounting, NDJSON streaming instead of SSE, and tool-call ids
//! synthesized locally since Ollama's wire format doesn't assign any.

pub mod wire;

use agent_provider::provider::Provider;
use agent_provider::types::{FinishReason, ProviderRequest, ProviderResponse, ProviderStreamEvent};
use agent_types::{AgentError, Message, Result, Role, TokenUsage, ToolCall};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

use wire::{ChatFunction, ChatFunctionCall, ChatMessage, ChatOptions, ChatRequest, ChatResponseLine, ChatTool, ChatToolCall};

pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    default_model: String,
    keep_alive: Option<String>,
}

impl OllamaProvider {
    /// Defaults to `http://localhost:11434`.
    pub fn new(default_model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: "http://localhost:11434".into(),
            default_model: default_model.into(),
            keep_alive: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// How long Ollama keeps the model loaded after this request
    /// (`"5m"`, `"0"`, `"-1"`).
    pub fn with_keep_alive(mut self, duration: impl Into<String>) -> Self {
        self.keep_alive = Some(duration.into());
        self
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

        let options = if request.temperature.is_some() || request.max_tokens.is_some() || request.top_p.is_some() || request.stop.is_some() {
            Some(ChatOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
                top_p: request.top_p,
                stop: request.stop.clone(),
            })
        } else {
            None
        };

        ChatRequest {
            model: self.model_or_default(request),
            messages,
            stream,
            tools,
            keep_alive: self.keep_alive.clone(),
            options,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }

    async fn map_status_error(response: reqwest::Response) -> AgentError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() {
            AgentError::ProviderUnavailable(format!("HTTP {status}: {body}"))
        } else if status == reqwest::StatusCode::NOT_FOUND {
            AgentError::ModelNotFound(body)
        } else {
            AgentError::Other(format!("HTTP {status}: {body}").into())
        }
    }

    fn parse_line(&self, line: ChatResponseLine) -> ProviderResponse {
        let content = line.message.content.clone();

        let tool_calls: Vec<ToolCall> = line
            .message
            .tool_calls
            .into_iter()
            .flatten()
            .map(|tc| ToolCall::new(format!("ollama_{}", uuid::Uuid::new_v4()), tc.function.name, tc.function.arguments))
            .collect();

        let raw_finish = match line.done_reason.as_deref() {
            Some("length") => FinishReason::Length,
            _ => FinishReason::Stop,
        };
        let finish_reason = ProviderResponse::normalize_finish_reason(!tool_calls.is_empty(), raw_finish);

        ProviderResponse {
            content,
            tool_calls,
            finish_reason,
            usage: TokenUsage::from_parts(line.prompt_eval_count.unwrap_or(0), line.eval_count.unwrap_or(0)),
            model: line.model,
        }
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
                function: ChatFunctionCall {
                    name: tc.name.clone(),
                    arguments: tc.arguments.clone(),
                },
            })
            .collect()
    });

    ChatMessage {
        role: role.into(),
        content: m.content.clone(),
        tool_calls,
    }
}

/// Splits buffered bytes on newlines, returning complete lines and leaving
/// any partial trailing line in `carry` for the next chunk.
fn ndjson_lines(bytes: &[u8], carry: &mut String) -> Vec<String> {
    carry.push_str(&String::from_utf8_lossy(bytes));
    let mut complete = Vec::new();
    while let Some(pos) = carry.find('\n') {
        let line = carry[..pos].trim().to_string();
        *carry = carry[pos + 1..].to_string();
        if !line.is_empty() {
            complete.push(line);
        }
    }
    complete
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn generate(&self, request: ProviderRequest) -> Result<ProviderResponse> {
        let body = self.build_request(&request, false);
        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Other(e.into()))?;
        if !response.status().is_success() {
            return Err(Self::map_status_error(response).await);
        }
        let line: ChatResponseLine = response.json().await.map_err(|e| AgentError::InvalidResponse(e.to_string()))?;
        Ok(self.parse_line(line))
    }

    async fn generate_stream(&self, request: ProviderRequest) -> Result<BoxStream<'static, Result<ProviderStreamEvent>>> {
        let body = self.build_request(&request, true);
        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Other(e.into()))?;
        if !response.status().is_success() {
            return Err(Self::map_status_error(response).await);
        }

        let byte_stream = response.bytes_stream();
        let stream = futures::stream::unfold(
            (byte_stream, String::new(), 0usize, false),
            move |(mut bytes, mut carry, mut next_index, mut done)| async move {
                if done {
                    return None;
                }
                loop {
                    match bytes.next().await {
                        None => return None,
                        Some(Err(e)) => {
                            return Some((vec![Err(AgentError::Other(e.into()))], (bytes, carry, next_index, true)));
                        }
                        Some(Ok(chunk)) => {
                            let lines = ndjson_lines(&chunk, &mut carry);
                            let mut events = Vec::new();
                            for line in lines {
                                match serde_json::from_str::<ChatResponseLine>(&line) {
                                    Ok(parsed) => {
                                        if !parsed.message.content.is_empty() {
                                            events.push(Ok(ProviderStreamEvent::TextDelta(parsed.message.content.clone())));
                                        }
                                        for tc in parsed.message.tool_calls.iter().flatten() {
                                            let id = format!("ollama_{}", uuid::Uuid::new_v4());
                                            events.push(Ok(ProviderStreamEvent::ToolCallStart {
                                                index: next_index,
                                                id,
                                                name: tc.function.name.clone(),
                                            }));
                                            events.push(Ok(ProviderStreamEvent::ToolCallArgsDelta {
                                                index: next_index,
                                                delta: tc.function.arguments.to_string(),
                                            }));
                                            events.push(Ok(ProviderStreamEvent::ToolCallEnd { index: next_index }));
                                            next_index += 1;
                                        }
                                        if parsed.done {
                                            done = true;
                                            let raw_finish = match parsed.done_reason.as_deref() {
                                                Some("length") => FinishReason::Length,
                                                _ => FinishReason::Stop,
                                            };
                                            events.push(Ok(ProviderStreamEvent::Done {
                                                finish_reason: Some(raw_finish),
                                                usage: Some(TokenUsage::from_parts(
                                                    parsed.prompt_eval_count.unwrap_or(0),
                                                    parsed.eval_count.unwrap_or(0),
                                                )),
                                            }));
                                        }
                                    }
                                    Err(e) => {
                                        events.push(Err(AgentError::InvalidResponse(e.to_string())));
                                        done = true;
                                    }
                                }
                            }
                            if !events.is_empty() {
                                return Some((events, (bytes, carry, next_index, done)));
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

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.default_model
    }
}
