use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use vasari_core::{AnalysisDepth, RawItem, ResearchSource};
use vasari_error::{ProviderError, ProviderErrorKind, VasariResult};
use vasari_interface::ResearchProvider;
use vasari_research::{ResearchAggregator, ResearchConfig};

struct StaticProvider {
    source: ResearchSource,
    titles: Vec<&'static str>,
    calls: AtomicUsize,
}

impl StaticProvider {
    fn new(source: ResearchSource, titles: Vec<&'static str>) -> Self {
        Self {
            source,
            titles,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ResearchProvider for StaticProvider {
    async fn collect(
        &self,
        _query: &str,
        max_items: u32,
        _depth: AnalysisDepth,
    ) -> VasariResult<Vec<RawItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .titles
            .iter()
            .take(max_items as usize)
            .map(|t| RawItem {
                source: self.source,
                title: t.to_string(),
                url: None,
                author: None,
                score: Some(42),
                summary: None,
                published_at: None,
            })
            .collect())
    }

    fn source(&self) -> ResearchSource {
        self.source
    }
}

struct UnreachableProvider {
    source: ResearchSource,
}

#[async_trait]
impl ResearchProvider for UnreachableProvider {
    async fn collect(
        &self,
        _query: &str,
        _max_items: u32,
        _depth: AnalysisDepth,
    ) -> VasariResult<Vec<RawItem>> {
        // Permanent failure: the aggregator must not burn retries on it.
        Err(ProviderError::new(
            self.source.to_string(),
            ProviderErrorKind::Auth("invalid token".into()),
        )
        .into())
    }

    fn source(&self) -> ResearchSource {
        self.source
    }
}

struct FlakyProvider {
    inner: StaticProvider,
    failures_before_success: usize,
}

#[async_trait]
impl ResearchProvider for FlakyProvider {
    async fn collect(
        &self,
        query: &str,
        max_items: u32,
        depth: AnalysisDepth,
    ) -> VasariResult<Vec<RawItem>> {
        let call = self.inner.calls.load(Ordering::SeqCst);
        if call < self.failures_before_success {
            self.inner.calls.fetch_add(1, Ordering::SeqCst);
            return Err(ProviderError::new(
                self.inner.source.to_string(),
                ProviderErrorKind::Unavailable("connection reset".into()),
            )
            .into());
        }
        self.inner.collect(query, max_items, depth).await
    }

    fn source(&self) -> ResearchSource {
        self.inner.source
    }
}

fn config() -> ResearchConfig {
    ResearchConfig {
        call_timeout: std::time::Duration::from_secs(5),
        retry_attempts: 2,
        retry_base_delay: std::time::Duration::from_millis(1),
    }
}

#[tokio::test]
async fn one_failing_source_is_absorbed_when_another_succeeds() {
    let aggregator = ResearchAggregator::new(config())
        .with_provider(Arc::new(StaticProvider::new(
            ResearchSource::TechNews,
            vec!["Rust 2.0 announced", "New async runtime benchmarks"],
        )))
        .with_provider(Arc::new(UnreachableProvider {
            source: ResearchSource::Forum,
        }));

    let items = aggregator
        .collect(
            &[ResearchSource::Forum, ResearchSource::TechNews],
            "rust async",
            10,
            AnalysisDepth::Standard,
        )
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.source == ResearchSource::TechNews));
}

#[tokio::test]
async fn single_unreachable_source_fails_and_names_itself() {
    let aggregator = ResearchAggregator::new(config()).with_provider(Arc::new(
        UnreachableProvider {
            source: ResearchSource::Forum,
        },
    ));

    let err = aggregator
        .collect(&[ResearchSource::Forum], "AI automation", 10, AnalysisDepth::Quick)
        .await
        .unwrap_err();

    assert!(format!("{err}").contains("forum"));
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let aggregator = ResearchAggregator::new(config()).with_provider(Arc::new(FlakyProvider {
        inner: StaticProvider::new(ResearchSource::CodeTrends, vec!["trending repo"]),
        failures_before_success: 1,
    }));

    let items = aggregator
        .collect(&[ResearchSource::CodeTrends], "rust", 5, AnalysisDepth::Standard)
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn max_items_bounds_each_source() {
    let aggregator = ResearchAggregator::new(config()).with_provider(Arc::new(
        StaticProvider::new(ResearchSource::TechNews, vec!["a", "b", "c", "d"]),
    ));

    let items = aggregator
        .collect(&[ResearchSource::TechNews], "anything", 2, AnalysisDepth::Standard)
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn unregistered_source_is_a_config_error() {
    let aggregator = ResearchAggregator::new(config());
    let err = aggregator
        .collect(&[ResearchSource::SearchTrends], "anything", 2, AnalysisDepth::Standard)
        .await
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        vasari_error::VasariErrorKind::Config(_)
    ));
}
