//! Generic HTTP publisher for platform posting gateways.
//!
//! Platform-specific upload flows live behind external posting gateways; the
//! orchestrator only needs a narrow publish/engagement surface per platform.
//! This adapter covers gateways exposing that surface as a small REST API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use vasari_core::{Engagement, Platform, PublishTiming};
use vasari_error::{ProviderError, ProviderErrorKind, VasariResult};
use vasari_interface::{PostReceipt, PostRequest, SocialPublisher};

/// Connection details for one platform's posting gateway.
#[derive(Debug, Clone)]
pub struct PublisherEndpoint {
    /// Base URL of the gateway
    pub base_url: String,
    /// API key sent as a bearer token
    pub api_key: String,
}

#[derive(Debug, Serialize)]
struct PostBody<'a> {
    title: Option<&'a str>,
    content: &'a str,
    media_urls: &'a [String],
    timing: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    publish_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    post_id: String,
    scheduled_for: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct EngagementResponse {
    #[serde(default)]
    views: i64,
    #[serde(default)]
    likes: i64,
    #[serde(default)]
    shares: i64,
    #[serde(default)]
    comments: i64,
}

/// [`SocialPublisher`] over a posting gateway's REST API.
#[derive(Debug, Clone)]
pub struct HttpPublisher {
    client: Client,
    platform: Platform,
    endpoint: PublisherEndpoint,
}

impl HttpPublisher {
    /// Create a publisher for `platform` backed by the given gateway.
    pub fn new(platform: Platform, endpoint: PublisherEndpoint) -> Self {
        Self {
            client: Client::new(),
            platform,
            endpoint,
        }
    }

    fn provider(&self) -> String {
        format!("{}_gateway", self.platform)
    }
}

#[async_trait]
impl SocialPublisher for HttpPublisher {
    #[instrument(skip(self, req), fields(platform = %self.platform))]
    async fn post(&self, req: &PostRequest) -> VasariResult<PostReceipt> {
        let provider = self.provider();
        let (timing, publish_at) = match req.timing {
            PublishTiming::Immediate => ("immediate", None),
            PublishTiming::At(at) => ("fixed", Some(at)),
            PublishTiming::AutoSchedule => ("auto", None),
        };
        let body = PostBody {
            title: req.title.as_deref(),
            content: &req.content,
            media_urls: &req.media_urls,
            timing,
            publish_at,
        };

        let url = format!("{}/v1/posts", self.endpoint.base_url);
        debug!(url = %url, timing, "Publishing post");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.endpoint.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(&provider, ProviderErrorKind::Unavailable(e.to_string()))
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(
                ProviderError::new(&provider, ProviderErrorKind::Http { status, message }).into(),
            );
        }

        let posted: PostResponse = response.json().await.map_err(|e| {
            ProviderError::new(&provider, ProviderErrorKind::InvalidResponse(e.to_string()))
        })?;

        Ok(PostReceipt {
            platform_post_id: posted.post_id,
            platform: self.platform,
            scheduled_for: posted.scheduled_for,
            engagement: None,
        })
    }

    #[instrument(skip(self), fields(platform = %self.platform))]
    async fn fetch_engagement(&self, platform_post_id: &str) -> VasariResult<Engagement> {
        let provider = self.provider();
        let url = format!(
            "{}/v1/posts/{platform_post_id}/engagement",
            self.endpoint.base_url
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.endpoint.api_key)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(&provider, ProviderErrorKind::Unavailable(e.to_string()))
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(
                ProviderError::new(&provider, ProviderErrorKind::Http { status, message }).into(),
            );
        }

        let counters: EngagementResponse = response.json().await.map_err(|e| {
            ProviderError::new(&provider, ProviderErrorKind::InvalidResponse(e.to_string()))
        })?;

        Ok(Engagement {
            views: counters.views,
            likes: counters.likes,
            shares: counters.shares,
            comments: counters.comments,
        })
    }

    fn platform(&self) -> Platform {
        self.platform
    }
}
