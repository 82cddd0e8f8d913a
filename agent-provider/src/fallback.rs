//! Health-aware routing across a primary provider and ordered fallbacks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use agent_types::{AgentError, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::provider::Provider;
use crate::types::{ProviderRequest, ProviderStreamEvent, ProviderResponse};

#[derive(Debug, Clone, Copy)]
struct HealthRecord {
    healthy: bool,
    last_check: Instant,
}

impl HealthRecord {
    fn healthy_now() -> Self {
        Self { healthy: true, last_check: Instant::now() }
    }
}

/// Per-provider `(healthy, last_check)` pairs, mutex-protected for
/// read-modify-write from routing and from the optional health monitor.
pub struct HealthMap {
    records: Mutex<HashMap<String, HealthRecord>>,
    check_interval: Duration,
}

impl HealthMap {
    pub fn new(check_interval: Duration) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            check_interval,
        }
    }

    async fn mark(&self, provider: &str, healthy: bool) {
        let mut records = self.records.lock().await;
        records.insert(provider.to_string(), HealthRecord { healthy, last_check: Instant::now() });
    }

    /// A provider is available iff healthy, or unhealthy but its last
    /// check is older than `check_interval` (half-open retry).
    async fn is_available(&self, provider: &str) -> bool {
        let records = self.records.lock().await;
        match records.get(provider) {
            None => true,
            Some(r) if r.healthy => true,
            Some(r) => r.last_check.elapsed() > self.check_interval,
        }
    }
}

/// Composes a primary provider with ordered fallbacks, routing around
/// unhealthy backends and retrying them half-open after `check_interval`.
pub struct FallbackComposite {
    members: Vec<Arc<dyn Provider>>,
    health: Arc<HealthMap>,
}

impl FallbackComposite {
    pub fn new(primary: Arc<dyn Provider>, fallbacks: Vec<Arc<dyn Provider>>, check_interval: Duration) -> Self {
        let mut members = vec![primary];
        members.extend(fallbacks);
        Self {
            members,
            health: Arc::new(HealthMap::new(check_interval)),
        }
    }

    /// Ordered list of currently-available providers; if empty, every
    /// member is returned instead (defensive fallback — better to try
    /// everything than to refuse outright).
    async fn available_order(&self) -> Vec<&Arc<dyn Provider>> {
        let mut available = Vec::new();
        for member in &self.members {
            if self.health.is_available(member.name()).await {
                available.push(member);
            }
        }
        if available.is_empty() {
            self.members.iter().collect()
        } else {
            available
        }
    }

    /// Periodically probes every member with a lightweight `generate`
    /// call, updating the same [`HealthMap`] that inline routing
    /// updates. Runs until the returned handle is dropped or aborted.
    pub fn spawn_health_monitor(self: &Arc<Self>, probe: ProviderRequest, period: Duration) -> tokio::task::JoinHandle<()> {
        let composite = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                for member in &composite.members {
                    let ok = member.generate(probe.clone()).await.is_ok();
                    composite.health.mark(member.name(), ok).await;
                }
            }
        })
    }
}

#[async_trait]
impl Provider for FallbackComposite {
    async fn generate(&self, request: ProviderRequest) -> Result<ProviderResponse> {
        let order = self.available_order().await;
        let mut last_error = None;
        for provider in order {
            match provider.generate(request.clone()).await {
                Ok(response) => {
                    self.health.mark(provider.name(), true).await;
                    return Ok(response);
                }
                Err(err) => {
                    warn!(provider = provider.name(), error = %err, "provider failed, trying next");
                    self.health.mark(provider.name(), false).await;
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| AgentError::ProviderUnavailable("all providers failed".into())))
    }

    async fn generate_stream(&self, request: ProviderRequest) -> Result<BoxStream<'static, Result<ProviderStreamEvent>>> {
        let order = self.available_order().await;
        let mut last_error = None;
        for provider in order {
            match provider.generate_stream(request.clone()).await {
                Ok(mut stream) => {
                    use futures::StreamExt;
                    // Peek the first chunk: a stream that errors before
                    // yielding anything is safe to reroute transparently.
                    // Once a chunk has reached the caller, no silent
                    // reroute — surface the error instead.
                    match stream.next().await {
                        None => continue,
                        Some(Ok(first)) => {
                            self.health.mark(provider.name(), true).await;
                            let rest = stream;
                            return Ok(Box::pin(futures::stream::once(async { Ok(first) }).chain(rest)));
                        }
                        Some(Err(err)) => {
                            self.health.mark(provider.name(), false).await;
                            last_error = Some(err);
                            continue;
                        }
                    }
                }
                Err(err) => {
                    self.health.mark(provider.name(), false).await;
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| AgentError::ProviderUnavailable("all providers failed".into())))
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let order = self.available_order().await;
        let mut last_error = None;
        for provider in order {
            match provider.embed(texts.clone()).await {
                Ok(vectors) => {
                    self.health.mark(provider.name(), true).await;
                    return Ok(vectors);
                }
                Err(err) => {
                    self.health.mark(provider.name(), false).await;
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| AgentError::ProviderUnavailable("all providers failed".into())))
    }

    fn name(&self) -> &str {
        "fallback-composite"
    }

    fn model(&self) -> &str {
        self.members.first().map(|p| p.model()).unwrap_or("unknown")
    }

    async fn close(&self) -> Result<()> {
        let mut first_error = None;
        for provider in &self.members {
            if let Err(err) = provider.close().await {
                info!(provider = provider.name(), error = %err, "error closing provider");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::provider::test_support::{simple_text_response, MockProvider};

    fn always_failing(name: &str) -> Arc<MockProvider> {
        Arc::new(MockProvider {
            responses: std::sync::Mutex::new(std::collections::VecDeque::new()),
            call_count: AtomicUsize::new(0),
            name: name.into(),
        })
    }

    fn always_succeeding(name: &str, content: &str) -> Arc<dyn Provider> {
        struct Always { name: String, content: String }
        #[async_trait]
        impl Provider for Always {
            async fn generate(&self, _request: ProviderRequest) -> Result<ProviderResponse> {
                Ok(simple_text_response(&self.content))
            }
            async fn generate_stream(&self, _request: ProviderRequest) -> Result<BoxStream<'static, Result<ProviderStreamEvent>>> {
                Ok(Box::pin(futures::stream::iter(vec![Ok(ProviderStreamEvent::TextDelta(self.content.clone()))])))
            }
            fn name(&self) -> &str { &self.name }
            fn model(&self) -> &str { "mock" }
        }
        Arc::new(Always { name: name.into(), content: content.into() })
    }

    #[tokio::test]
    async fn fallback_routes_around_failing_primary() {
        let primary: Arc<dyn Provider> = always_failing("primary");
        let fallback = always_succeeding("fallback", "ok");
        let composite = FallbackComposite::new(primary, vec![fallback], Duration::from_secs(60));

        let resp = composite.generate(ProviderRequest::default()).await.unwrap();
        assert_eq!(resp.content, "ok");
    }

    #[tokio::test]
    async fn primary_marked_unhealthy_after_failure_and_skipped_before_check_interval() {
        let primary: Arc<dyn Provider> = always_failing("primary");
        let fallback = always_succeeding("fallback", "ok");
        let composite = FallbackComposite::new(primary, vec![fallback], Duration::from_secs(60));

        composite.generate(ProviderRequest::default()).await.unwrap();
        let order = composite.available_order().await;
        assert_eq!(order.len(), 1);
        assert_eq!(order[0].name(), "fallback");
    }

    #[tokio::test]
    async fn all_providers_failing_returns_wrapped_error() {
        let primary: Arc<dyn Provider> = always_failing("primary");
        let fallback: Arc<dyn Provider> = always_failing("fallback");
        let composite = FallbackComposite::new(primary, vec![fallback], Duration::from_secs(60));
        let err = composite.generate(ProviderRequest::default()).await.unwrap_err();
        assert!(matches!(err, AgentError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn close_propagates_to_all_members() {
        let primary = always_succeeding("primary", "ok");
        let fallback = always_succeeding("fallback", "ok");
        let composite = FallbackComposite::new(primary, vec![fallback], Duration::from_secs(60));
        assert!(composite.close().await.is_ok());
    }
}
