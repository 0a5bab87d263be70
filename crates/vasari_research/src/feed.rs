//! Generic JSON feed adapter for research sources.
//!
//! Most of the named sources (tech-news aggregator, code-hosting trends,
//! search trends) expose a JSON search endpoint of the same rough shape:
//! a query parameter, an item cap, and an array of scored items. This
//! adapter covers that shape; source-specific scraping stays out of scope
//! behind other [`ResearchProvider`] implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use vasari_core::{AnalysisDepth, RawItem, ResearchSource};
use vasari_error::{ProviderError, ProviderErrorKind, VasariResult};
use vasari_interface::ResearchProvider;

/// Connection details for one feed endpoint.
///
/// Injected at construction; the adapter holds no ambient configuration.
#[derive(Debug, Clone)]
pub struct FeedEndpoint {
    /// Base URL of the search endpoint
    pub base_url: String,
    /// Bearer token, for feeds that require one
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    items: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
struct FeedItem {
    title: String,
    url: Option<String>,
    author: Option<String>,
    #[serde(alias = "points", alias = "stars")]
    score: Option<i64>,
    #[serde(alias = "snippet", alias = "description")]
    summary: Option<String>,
    #[serde(alias = "created_at")]
    published_at: Option<DateTime<Utc>>,
}

/// A [`ResearchProvider`] over a JSON search endpoint.
#[derive(Debug, Clone)]
pub struct JsonFeedProvider {
    client: Client,
    endpoint: FeedEndpoint,
    source: ResearchSource,
}

impl JsonFeedProvider {
    /// Create a provider for `source` backed by the given endpoint.
    pub fn new(source: ResearchSource, endpoint: FeedEndpoint) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            source,
        }
    }
}

#[async_trait]
impl ResearchProvider for JsonFeedProvider {
    #[instrument(skip(self), fields(source = %self.source))]
    async fn collect(
        &self,
        query: &str,
        max_items: u32,
        depth: AnalysisDepth,
    ) -> VasariResult<Vec<RawItem>> {
        let source = self.source.to_string();
        debug!(url = %self.endpoint.base_url, "Sending feed request");

        let limit = max_items.to_string();
        let depth = depth.to_string();
        let mut request = self.client.get(&self.endpoint.base_url).query(&[
            ("q", query),
            ("limit", limit.as_str()),
            ("depth", depth.as_str()),
        ]);
        if let Some(key) = &self.endpoint.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            ProviderError::new(&source, ProviderErrorKind::Unavailable(e.to_string()))
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(
                ProviderError::new(&source, ProviderErrorKind::Http { status, message }).into(),
            );
        }

        let feed: FeedResponse = response.json().await.map_err(|e| {
            ProviderError::new(&source, ProviderErrorKind::InvalidResponse(e.to_string()))
        })?;

        let items = feed
            .items
            .into_iter()
            .take(max_items as usize)
            .map(|item| RawItem {
                source: self.source,
                title: item.title,
                url: item.url,
                author: item.author,
                score: item.score,
                summary: item.summary,
                published_at: item.published_at,
            })
            .collect();

        Ok(items)
    }

    fn source(&self) -> ResearchSource {
        self.source
    }
}
