//! The object-safe contract every reasoning strategy implements.

use agent_types::Output;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::input::Input;

/// One reasoning strategy: Simple, ReAct, Reflection, or Plan-and-Solve.
///
/// `run` never returns `Err` — failure is encoded in `Output.error`
/// instead, per the invariant `error.is_some() ⇔ !success`. This mirrors
/// `Output::success`/`Output::failure` rather than a `Result<Output, _>`
/// wrapper, since even a cancelled or max-iterations run still produces
/// a well-formed `Output` carrying the partial trace.
#[async_trait]
pub trait Engine: Send + Sync {
    async fn run(&self, input: Input, cancel: CancellationToken) -> Output;
}
