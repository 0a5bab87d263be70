//! Multi-source research aggregation with bounded timeouts and retries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry2::{Retry, RetryError, strategy::ExponentialBackoff, strategy::jitter};
use tracing::{instrument, warn};
use vasari_core::{AnalysisDepth, RawItem, ResearchSource};
use vasari_error::{ConfigError, TimeoutError, VasariError, VasariResult};
use vasari_interface::ResearchProvider;

/// Tuning for the aggregation layer.
#[derive(Debug, Clone)]
pub struct ResearchConfig {
    /// Bound on each provider call
    pub call_timeout: Duration,
    /// Retry attempts per source for transient failures
    pub retry_attempts: usize,
    /// Initial backoff delay; grows exponentially with jitter
    pub retry_base_delay: Duration,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            retry_attempts: 2,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

/// Fans a research query out to the configured sources.
///
/// Providers are registered per source. Failure of one source does not fail
/// the stage if at least one other configured source returns data; when
/// every source fails (or only one is configured and it fails), the most
/// specific failure is returned so the workflow error message can name the
/// source.
pub struct ResearchAggregator {
    providers: HashMap<ResearchSource, Arc<dyn ResearchProvider>>,
    config: ResearchConfig,
}

impl ResearchAggregator {
    /// Create an aggregator with no providers registered.
    pub fn new(config: ResearchConfig) -> Self {
        Self {
            providers: HashMap::new(),
            config,
        }
    }

    /// Register a provider for the source it serves.
    pub fn with_provider(mut self, provider: Arc<dyn ResearchProvider>) -> Self {
        self.providers.insert(provider.source(), provider);
        self
    }

    /// Sources with a registered provider.
    pub fn registered_sources(&self) -> Vec<ResearchSource> {
        self.providers.keys().copied().collect()
    }

    /// Collect raw items for `query` from every configured source.
    ///
    /// Items arrive ordered by the configured source order, preserving each
    /// provider's own ordering within a source.
    ///
    /// # Errors
    ///
    /// Returns an error when no source produced data: the failure of the
    /// single configured source, or the first failure when all of several
    /// sources failed. A source without a registered provider is a
    /// configuration error.
    #[instrument(skip(self), fields(sources = sources.len(), query = %query))]
    pub async fn collect(
        &self,
        sources: &[ResearchSource],
        query: &str,
        max_items: u32,
        depth: AnalysisDepth,
    ) -> VasariResult<Vec<RawItem>> {
        if sources.is_empty() {
            return Err(ConfigError::new("no research sources configured").into());
        }

        let mut items = Vec::new();
        let mut failures: Vec<(ResearchSource, VasariError)> = Vec::new();

        for &source in sources {
            match self.collect_one(source, query, max_items, depth).await {
                Ok(batch) => {
                    tracing::info!(source = %source, count = batch.len(), "Source collected");
                    items.extend(batch);
                }
                Err(e) => {
                    warn!(source = %source, error = %e, "Source failed");
                    failures.push((source, e));
                }
            }
        }

        if items.is_empty() {
            // No viable path forward: surface the most specific cause.
            let Some((source, error)) = failures.into_iter().next() else {
                return Err(
                    ConfigError::new("every research source returned zero items").into(),
                );
            };
            tracing::error!(source = %source, "Research collection failed on every source");
            return Err(error);
        }

        if !failures.is_empty() {
            // Redundancy absorbed the failures; they are logged, not fatal.
            warn!(
                absorbed = failures.len(),
                collected = items.len(),
                "Continuing with partial research results"
            );
        }

        Ok(items)
    }

    /// Collect from one source with a bounded timeout and retry policy.
    async fn collect_one(
        &self,
        source: ResearchSource,
        query: &str,
        max_items: u32,
        depth: AnalysisDepth,
    ) -> VasariResult<Vec<RawItem>> {
        let provider = self.providers.get(&source).ok_or_else(|| {
            ConfigError::new(format!("no research provider registered for source {source}"))
        })?;

        let strategy = ExponentialBackoff::from_millis(
            self.config.retry_base_delay.as_millis().max(1) as u64,
        )
        .factor(2)
        .max_delay(Duration::from_secs(10))
        .map(jitter)
        .take(self.config.retry_attempts);

        let timeout = self.config.call_timeout;
        Retry::spawn(strategy, || {
            let provider = Arc::clone(provider);
            async move {
                let result = tokio::time::timeout(
                    timeout,
                    provider.collect(query, max_items, depth),
                )
                .await
                .map_err(|_| {
                    VasariError::from(TimeoutError::new(
                        format!("research collect from {source}"),
                        timeout.as_secs(),
                    ))
                })
                .and_then(|inner| inner);

                match result {
                    Ok(items) => Ok(items),
                    Err(e) if e.is_transient() => {
                        warn!(source = %source, error = %e, "Transient research failure, will retry");
                        Err(RetryError::Transient {
                            err: e,
                            retry_after: None,
                        })
                    }
                    Err(e) => Err(RetryError::Permanent(e)),
                }
            }
        })
        .await
    }
}
