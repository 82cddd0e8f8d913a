//! Stage 1: independently produce packets from a shared input.

use std::collections::HashSet;
use std::sync::Arc;

use agent_types::{AgentError, Message};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use tokio::sync::Mutex;

use crate::config::ContextConfig;
use crate::packet::{ContextPacket, PacketType};

/// Shared input every gatherer reads from; gatherers never mutate it.
#[derive(Debug, Clone)]
pub struct GatherInput {
    pub query: String,
    pub system_instructions: String,
    pub history: Vec<Message>,
    pub config: ContextConfig,
}

/// A source of context packets. Implementations may do network I/O —
/// gathering is a named suspension point.
#[async_trait]
pub trait Gatherer: Send + Sync {
    async fn gather(&self, input: &GatherInput) -> agent_types::Result<Vec<ContextPacket>>;
}

/// Emits one `Instructions` packet from `input.system_instructions`,
/// always fully relevant.
pub struct InstructionsGatherer;

#[async_trait]
impl Gatherer for InstructionsGatherer {
    async fn gather(&self, input: &GatherInput) -> agent_types::Result<Vec<ContextPacket>> {
        if input.system_instructions.is_empty() {
            return Ok(vec![]);
        }
        Ok(vec![ContextPacket::new(
            input.system_instructions.clone(),
            PacketType::Instructions,
            "instructions",
        )
        .with_relevance(1.0)
        .with_timestamp(Utc::now())])
    }
}

/// Emits one `Task` packet from `input.query`, always fully relevant.
pub struct TaskGatherer;

#[async_trait]
impl Gatherer for TaskGatherer {
    async fn gather(&self, input: &GatherInput) -> agent_types::Result<Vec<ContextPacket>> {
        if input.query.is_empty() {
            return Ok(vec![]);
        }
        Ok(vec![ContextPacket::new(input.query.clone(), PacketType::Task, "task")
            .with_relevance(1.0)
            .with_timestamp(Utc::now())])
    }
}

/// Emits one `History` packet per recent message, bounded by
/// `config.max_history_messages`.
pub struct HistoryGatherer;

#[async_trait]
impl Gatherer for HistoryGatherer {
    async fn gather(&self, input: &GatherInput) -> agent_types::Result<Vec<ContextPacket>> {
        let limit = input.config.max_history_messages;
        let skip = input.history.len().saturating_sub(limit);
        Ok(input
            .history
            .iter()
            .skip(skip)
            .map(|m| {
                let content = format!("{:?}: {}", m.role, m.content);
                ContextPacket::new(content, PacketType::History, "history").with_timestamp(Utc::now())
            })
            .collect())
    }
}

/// An external memory-retrieval collaborator. Retrieval happens out of
/// process scope (vector store, key-value memory, whatever) — this
/// gatherer just adapts its output into packets.
pub struct MemoryGatherer<F> {
    retrieve: F,
}

impl<F> MemoryGatherer<F>
where
    F: Fn(&GatherInput) -> agent_types::Result<Vec<(String, bool)>> + Send + Sync,
{
    /// `retrieve` returns `(text, is_task_state)` pairs; task-state
    /// entries are tagged `P1`, the rest `P2` evidence.
    pub fn new(retrieve: F) -> Self {
        Self { retrieve }
    }
}

#[async_trait]
impl<F> Gatherer for MemoryGatherer<F>
where
    F: Fn(&GatherInput) -> agent_types::Result<Vec<(String, bool)>> + Send + Sync,
{
    async fn gather(&self, input: &GatherInput) -> agent_types::Result<Vec<ContextPacket>> {
        let entries = (self.retrieve)(input)?;
        Ok(entries
            .into_iter()
            .map(|(text, is_task_state)| {
                let kind = if is_task_state { PacketType::TaskState } else { PacketType::Evidence };
                ContextPacket::new(text, kind, "memory").with_timestamp(Utc::now())
            })
            .collect())
    }
}

/// An external retrieval-augmented-generation collaborator (chunking,
/// vector search, reranking all live outside this crate).
pub struct RagGatherer<F> {
    retrieve: F,
}

impl<F> RagGatherer<F>
where
    F: Fn(&GatherInput) -> agent_types::Result<Vec<String>> + Send + Sync,
{
    pub fn new(retrieve: F) -> Self {
        Self { retrieve }
    }
}

#[async_trait]
impl<F> Gatherer for RagGatherer<F>
where
    F: Fn(&GatherInput) -> agent_types::Result<Vec<String>> + Send + Sync,
{
    async fn gather(&self, input: &GatherInput) -> agent_types::Result<Vec<ContextPacket>> {
        let chunks = (self.retrieve)(input)?;
        Ok(chunks
            .into_iter()
            .map(|text| ContextPacket::new(text, PacketType::Evidence, "rag").with_timestamp(Utc::now()))
            .collect())
    }
}

/// A single note from an external note store, as fed to [`NoteGatherer`].
#[derive(Debug, Clone)]
pub struct Note {
    pub id: String,
    pub text: String,
    pub kind: NoteKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    Blocker,
    Action,
    Other,
}

/// Wraps an external note store. Prioritizes `blocker`/`action` notes
/// and deduplicates by note id, keeping the first occurrence.
pub struct NoteGatherer<F> {
    fetch: F,
}

impl<F> NoteGatherer<F>
where
    F: Fn(&GatherInput) -> agent_types::Result<Vec<Note>> + Send + Sync,
{
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }
}

#[async_trait]
impl<F> Gatherer for NoteGatherer<F>
where
    F: Fn(&GatherInput) -> agent_types::Result<Vec<Note>> + Send + Sync,
{
    async fn gather(&self, input: &GatherInput) -> agent_types::Result<Vec<ContextPacket>> {
        let mut notes = (self.fetch)(input)?;
        notes.sort_by_key(|n| match n.kind {
            NoteKind::Blocker => 0,
            NoteKind::Action => 1,
            NoteKind::Other => 2,
        });

        let mut seen = HashSet::new();
        let mut packets = Vec::new();
        for note in notes {
            if !seen.insert(note.id.clone()) {
                continue;
            }
            let kind = match note.kind {
                NoteKind::Blocker | NoteKind::Action => PacketType::TaskState,
                NoteKind::Other => PacketType::Evidence,
            };
            packets.push(ContextPacket::new(note.text, kind, "note").with_timestamp(Utc::now()));
        }
        Ok(packets)
    }
}

/// How [`CompositeGatherer`] runs its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatherMode {
    Sequential,
    Parallel,
}

/// Runs child gatherers either in sequence or concurrently, merging
/// their output. Per-child errors are swallowed so one failing source
/// does not starve the rest.
pub struct CompositeGatherer {
    children: Vec<Arc<dyn Gatherer>>,
    mode: GatherMode,
}

impl CompositeGatherer {
    pub fn new(children: Vec<Arc<dyn Gatherer>>, mode: GatherMode) -> Self {
        Self { children, mode }
    }
}

#[async_trait]
impl Gatherer for CompositeGatherer {
    async fn gather(&self, input: &GatherInput) -> agent_types::Result<Vec<ContextPacket>> {
        match self.mode {
            GatherMode::Sequential => {
                let mut packets = Vec::new();
                for child in &self.children {
                    if let Ok(mut p) = child.gather(input).await {
                        packets.append(&mut p);
                    }
                }
                Ok(packets)
            }
            GatherMode::Parallel => {
                let merged = Arc::new(Mutex::new(Vec::new()));
                let tasks = self.children.iter().map(|child| {
                    let merged = Arc::clone(&merged);
                    async move {
                        if let Ok(mut p) = child.gather(input).await {
                            // join_all below is the wait barrier; the mutex
                            // only guards the append itself.
                            merged.lock().await.append(&mut p);
                        }
                    }
                });
                join_all(tasks).await;
                let merged = Arc::try_unwrap(merged)
                    .unwrap_or_else(|_| unreachable!("join_all completed, no other owners remain"))
                    .into_inner();
                Ok(merged)
            }
        }
    }
}
