//! The caller-supplied input to a reasoning engine.

use std::collections::HashMap;

use agent_types::Message;
use serde_json::Value;

/// A query plus whatever history and session metadata the caller wants
/// the engine to see. Engines never own history themselves — an engine
/// is a stateless function of `Input`; committing the resulting
/// `(query, answer)` pair back into an agent's own history is the
/// facade's job, not the engine's.
#[derive(Debug, Clone, Default)]
pub struct Input {
    pub query: String,
    pub history: Vec<Message>,
    pub session: Option<String>,
    pub metadata: Option<HashMap<String, Value>>,
}

impl Input {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            history: Vec::new(),
            session: None,
            metadata: None,
        }
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_starts_with_empty_history_and_no_session() {
        let input = Input::new("hello");
        assert_eq!(input.query, "hello");
        assert!(input.history.is_empty());
        assert!(input.session.is_none());
    }

    #[test]
    fn with_history_and_session_set_fields() {
        let input = Input::new("hi")
            .with_history(vec![Message::user("earlier")])
            .with_session("sess-1");
        assert_eq!(input.history.len(), 1);
        assert_eq!(input.session.as_deref(), Some("sess-1"));
    }
}
