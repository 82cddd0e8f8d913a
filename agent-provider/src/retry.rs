//! Context-aware exponential backoff around a fallible, retryable call.

use std::future::Future;
use std::time::Duration;

use agent_types::{AgentError, Result};
use tokio_util::sync::CancellationToken;
use tracing::warn;

const MAX_DELAY: Duration = Duration::from_secs(30);

/// `max_retries` additional attempts beyond the first, `base_delay` the
/// starting backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryConfig {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { max_retries, base_delay }
    }

    /// `min(30s, base_delay·2^attempt·1.1)`.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exp = 2u32.saturating_pow(attempt);
        let scaled = self.base_delay.saturating_mul(exp).mul_f64(1.1);
        scaled.min(MAX_DELAY)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

/// Runs `f` for attempts `0..=config.max_retries`. Returns on the first
/// success or the first non-retryable error. Retryable errors sleep for
/// [`RetryConfig::calculate_delay`] and try again; cancellation is
/// observed before each attempt and during each sleep.
pub async fn retry_with_backoff<T, F, Fut>(config: &RetryConfig, cancel: &CancellationToken, f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_with_callback(config, cancel, f, |_, _, _| {}).await
}

/// As [`retry_with_backoff`], but `on_retry(attempt, delay, error)` is
/// invoked before each sleep.
pub async fn retry_with_callback<T, F, Fut>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    mut f: F,
    mut on_retry: impl FnMut(u32, Duration, &AgentError),
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    for attempt in 0..=config.max_retries {
        if cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) if attempt == config.max_retries => return Err(err),
            Err(err) => {
                let delay = config.calculate_delay(attempt);
                warn!(attempt, delay_ms = delay.as_millis() as u64, "retrying");
                on_retry(attempt, delay, &err);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(AgentError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
    unreachable!("loop always returns by the final attempt")
}
