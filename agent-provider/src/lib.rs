//! The provider contract: a uniform request/response/stream shape,
//! retry-with-backoff, and health-aware fallback routing across
//! heterogeneous LLM backends.

pub mod fallback;
pub mod provider;
pub mod retry;
pub mod types;

pub use fallback::{FallbackComposite, HealthMap};
pub use provider::Provider;
pub use retry::{retry_with_backoff, retry_with_callback, RetryConfig};
pub use types::{FinishReason, ProviderRequest, ProviderResponse, ProviderStreamEvent, ToolChoice, ToolSchema};
