//! The object-safe provider contract.

use agent_types::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::types::{ProviderRequest, ProviderResponse, ProviderStreamEvent};

/// A capability set, not a class hierarchy: `generate`, `generate_stream`,
/// `embed`, identity, and lifecycle. Vendor adapters are independent —
/// adding one means implementing this trait, nothing else changes.
///
/// This is `#[async_trait]` rather than using return-position `impl
/// Trait` so that `Arc<dyn Provider>` is usable directly — the fallback
/// composite needs to hold a heterogeneous, dynamically-sized list of
/// providers, which an RPITIT-based trait cannot give us.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn generate(&self, request: ProviderRequest) -> Result<ProviderResponse>;

    async fn generate_stream(&self, request: ProviderRequest) -> Result<BoxStream<'static, Result<ProviderStreamEvent>>>;

    /// Batch embedding. Optional — the default implementation reports
    /// `Unsupported`, matching backends with no embeddings endpoint.
    async fn embed(&self, _texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Err(agent_types::AgentError::Unsupported(format!("{} does not support embeddings", self.name())))
    }

    fn name(&self) -> &str;

    fn model(&self) -> &str;

    /// Idempotent lifecycle close. The default is a no-op for adapters
    /// with nothing to release (a pooled `reqwest::Client` needs none).
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
