//! Coalesces provider chunks (or a completed run's trace) into the
//! chunk stream an agent's streaming caller consumes.

use agent_provider::{FinishReason, ProviderStreamEvent};
use agent_types::{Output, ReasoningStep, TokenUsage};
use futures::stream::{self, BoxStream};
use futures::StreamExt;

/// One increment of an engine's streamed output.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    Text(String),
    Step(ReasoningStep),
    Tool { name: String, result: String, is_error: bool },
    Error(String),
    Done {
        finish_reason: Option<FinishReason>,
        usage: Option<TokenUsage>,
    },
}

/// The Simple engine's streaming path: forwards provider text deltas
/// one-to-one, terminating with `Done`. Tool-call stream events never
/// appear here — Simple never attaches tools.
pub fn forward_provider_stream(events: BoxStream<'static, agent_types::Result<ProviderStreamEvent>>) -> BoxStream<'static, StreamChunk> {
    events
        .map(|event| match event {
            Ok(ProviderStreamEvent::TextDelta(text)) => StreamChunk::Text(text),
            Ok(ProviderStreamEvent::Done { finish_reason, usage }) => StreamChunk::Done { finish_reason, usage },
            // Tool-call fragments never reach a no-tools Simple request;
            // surfaced as empty text rather than silently dropped.
            Ok(ProviderStreamEvent::ToolCallStart { .. })
            | Ok(ProviderStreamEvent::ToolCallArgsDelta { .. })
            | Ok(ProviderStreamEvent::ToolCallEnd { .. }) => StreamChunk::Text(String::new()),
            Err(err) => StreamChunk::Error(err.to_string()),
        })
        .boxed()
}

/// ReAct/Reflection/Plan-and-Solve stream by running to completion and
/// replaying the trace: one `Step` chunk per reasoning step, one `Text`
/// chunk for the final response, then `Done`. No mid-run chunk ever
/// arrives early — the whole run already happened by the time this is
/// called.
pub fn replay_trace(output: Output) -> BoxStream<'static, StreamChunk> {
    let mut chunks: Vec<StreamChunk> = output.trace.into_iter().map(StreamChunk::Step).collect();
    match output.error {
        Some(err) => chunks.push(StreamChunk::Error(err)),
        None => chunks.push(StreamChunk::Text(output.response)),
    }
    chunks.push(StreamChunk::Done {
        finish_reason: None,
        usage: Some(output.usage),
    });
    stream::iter(chunks).boxed()
}
