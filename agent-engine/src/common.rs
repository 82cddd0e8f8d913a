//! Shared plumbing every engine's run loop uses: initial message
//! assembly, cancellation/deadline racing around a provider call, and
//! the scoped per-run deadline derived from `EngineConfig::timeout`.

use std::future::Future;
use std::time::Duration;

use agent_types::{AgentError, Message, Result};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// System prompt + full history + current user query, in that order —
/// the plain assembly every engine uses before its first provider call.
/// (This is deliberately not the GSSC pipeline: GSSC is a separate,
/// pluggable prompt-shaping stage a caller may run first and fold its
/// output into `system_prompt`/`history` before calling an engine.)
pub fn build_initial_messages(system_prompt: &str, history: &[Message], query: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    if !system_prompt.is_empty() {
        messages.push(Message::system(system_prompt));
    }
    messages.extend_from_slice(history);
    messages.push(Message::user(query));
    messages
}

/// `Some(Instant::now() + timeout)` unless `timeout` is zero (meaning
/// "no timeout" per `AgentConfig`'s field doc).
pub fn deadline(timeout: Duration) -> Option<Instant> {
    if timeout.is_zero() {
        None
    } else {
        Some(Instant::now() + timeout)
    }
}

/// Races `fut` against cancellation and the optional deadline. Cancellation
/// is checked up front (pre-cancelled tokens short-circuit before the
/// provider is even called) and raced throughout, matching the retry
/// wrapper's own discipline.
pub async fn race<T>(cancel: &CancellationToken, deadline: Option<Instant>, fut: impl Future<Output = Result<T>>) -> Result<T> {
    if cancel.is_cancelled() {
        return Err(AgentError::Cancelled);
    }
    match deadline {
        Some(d) => {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(AgentError::Cancelled),
                _ = tokio::time::sleep_until(d) => Err(AgentError::DeadlineExceeded),
                res = fut => res,
            }
        }
        None => {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(AgentError::Cancelled),
                res = fut => res,
            }
        }
    }
}
