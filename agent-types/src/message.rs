//! The message model shared by every provider adapter and reasoning engine.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AgentError, Result};

/// The role a [`Message`] was authored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single request to invoke a named tool, emitted by an assistant turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Server-assigned call id, echoed back in the matching tool-role message.
    pub id: String,
    pub name: String,
    /// Free-form structured arguments, parsed from the wire's JSON string.
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// One turn in a conversation.
///
/// Invariant: a `tool`-role message requires a non-empty `tool_call_id`;
/// an `assistant`-role message requires non-empty `content` or at least
/// one tool call. [`Message::validate`] checks both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl Message {
    fn bare(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            tool_calls: None,
            tool_call_id: None,
            timestamp: None,
            metadata: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::bare(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::bare(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::bare(Role::Assistant, content)
    }

    /// An assistant turn carrying tool calls, with optional accompanying text.
    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: Some(tool_calls),
            ..Self::bare(Role::Assistant, content)
        }
    }

    /// A tool-role message carrying the result (or error text) of one call.
    pub fn tool(tool_call_id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            tool_call_id: Some(tool_call_id.into()),
            ..Self::bare(Role::Tool, content)
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Checks the two role invariants, returning `AgentError::InvalidConfig`
    /// (messages are not a configuration concern in the classifier sense,
    /// but this is the only sentinel variant that fits a constructed-value
    /// validation failure) on violation.
    pub fn validate(&self) -> Result<()> {
        match self.role {
            Role::Tool => {
                if self.tool_call_id.as_deref().unwrap_or("").is_empty() {
                    return Err(AgentError::InvalidConfig(
                        "tool-role message requires a non-empty tool_call_id".into(),
                    ));
                }
            }
            Role::Assistant => {
                let has_content = !self.content.is_empty();
                let has_tool_calls = self.tool_calls.as_ref().is_some_and(|c| !c.is_empty());
                if !has_content && !has_tool_calls {
                    return Err(AgentError::InvalidConfig(
                        "assistant message requires content or at least one tool call".into(),
                    ));
                }
            }
            Role::System | Role::User => {}
        }
        Ok(())
    }
}
