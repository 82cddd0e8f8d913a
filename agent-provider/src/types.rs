//! The uniform request/response/stream contract every wire adapter speaks.

use agent_types::{Message, TokenUsage, ToolCall};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool definition as surfaced to a provider, mirroring
/// `agent_tool::ToolDyn`'s name/description/parameters without this
/// crate depending on `agent-tool` directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Which tool, if any, the model should be steered toward calling.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolChoice {
    Auto,
    None,
    Name(String),
}

impl ToolChoice {
    pub fn as_wire_str(&self) -> &str {
        match self {
            ToolChoice::Auto => "auto",
            ToolChoice::None => "none",
            ToolChoice::Name(name) => name.as_str(),
        }
    }
}

impl Serialize for ToolChoice {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire_str())
    }
}

impl<'de> Deserialize<'de> for ToolChoice {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "auto" => ToolChoice::Auto,
            "none" => ToolChoice::None,
            _ => ToolChoice::Name(s),
        })
    }
}

/// One call to a provider, shared verbatim by every wire adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// Vendor-specific extras (`service_tier`, `num_predict`, ...), pulled
    /// out by each adapter's request builder.
    #[serde(default)]
    pub extra: serde_json::Map<String, Value>,
}

/// Normalized finish reason, shared across vendor dialects.
///
/// Presence of tool calls is treated as `ToolCalls` even when the wire
/// itself reports `"stop"` — preserved deliberately so ReAct loops
/// terminate correctly regardless of a vendor's exact finish-reason text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    ToolCalls,
    Length,
    ContentFilter,
}

/// One complete (non-streaming) response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: FinishReason,
    pub usage: TokenUsage,
    pub model: String,
}

impl ProviderResponse {
    /// Applies the finish-reason override: any tool calls present force
    /// `ToolCalls` regardless of what `raw_finish_reason` says.
    pub fn normalize_finish_reason(tool_calls_present: bool, raw: FinishReason) -> FinishReason {
        if tool_calls_present {
            FinishReason::ToolCalls
        } else {
            raw
        }
    }
}

/// One increment of a streaming response.
///
/// The sequence is finite and not restartable; accumulate `ToolCallArgsDelta`
/// fragments per `index` until `ToolCallEnd`, then parse the concatenated
/// JSON once. `Done` is always the final event.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderStreamEvent {
    TextDelta(String),
    ToolCallStart { index: usize, id: String, name: String },
    ToolCallArgsDelta { index: usize, delta: String },
    ToolCallEnd { index: usize },
    Done {
        finish_reason: Option<FinishReason>,
        usage: Option<TokenUsage>,
    },
}
