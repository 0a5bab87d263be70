//! Per-target fan-out with independent failure domains.

use crate::next_auto_slot;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};
use uuid::Uuid;
use vasari_core::{Engagement, Platform, PublicationRecord, PublishTiming};
use vasari_error::{ConfigError, TimeoutError, ValidationError, VasariResult};
use vasari_interface::{PostRequest, SocialPublisher};

/// Tuning for the publishing layer.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Bound on each provider call
    pub call_timeout: Duration,
    /// Base delay for provider-managed auto-scheduling
    pub auto_schedule_base: Duration,
    /// Jitter applied around the auto-schedule base
    pub auto_schedule_jitter: Duration,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(20),
            auto_schedule_base: Duration::from_secs(4 * 3600),
            auto_schedule_jitter: Duration::from_secs(45 * 60),
        }
    }
}

/// Build a [`PublishTiming`] from the raw request inputs.
///
/// The caller-facing surface accepts a fixed datetime and an auto-schedule
/// flag as separate inputs; specifying both is rejected here, at the
/// boundary, before any dispatch happens.
pub fn resolve_timing(
    publish_at: Option<DateTime<Utc>>,
    auto_schedule: bool,
) -> VasariResult<PublishTiming> {
    match (publish_at, auto_schedule) {
        (Some(_), true) => Err(ValidationError::new(
            "fixed-datetime and auto-schedule timing are mutually exclusive",
        )
        .into()),
        (Some(at), false) => Ok(PublishTiming::At(at)),
        (None, true) => Ok(PublishTiming::AutoSchedule),
        (None, false) => Ok(PublishTiming::Immediate),
    }
}

/// Fans one artifact out to the registered platform publishers.
pub struct PublishDispatcher {
    publishers: HashMap<Platform, Arc<dyn SocialPublisher>>,
    config: PublishConfig,
}

impl PublishDispatcher {
    /// Create a dispatcher with no publishers registered.
    pub fn new(config: PublishConfig) -> Self {
        Self {
            publishers: HashMap::new(),
            config,
        }
    }

    /// Register a publisher for the platform it serves.
    pub fn with_publisher(mut self, publisher: Arc<dyn SocialPublisher>) -> Self {
        self.publishers.insert(publisher.platform(), publisher);
        self
    }

    /// Dispatch the artifact to every target concurrently.
    ///
    /// Returns exactly one record per target. A failure on one target never
    /// blocks or rolls back the others; it shows up as a `Failed` record.
    #[instrument(skip(self, title, content, media_urls), fields(workflow_id = %workflow_id, targets = targets.len()))]
    pub async fn dispatch(
        &self,
        workflow_id: Uuid,
        title: &str,
        content: &str,
        media_urls: &[String],
        targets: &[Platform],
        timing: PublishTiming,
    ) -> VasariResult<Vec<PublicationRecord>> {
        if targets.is_empty() {
            return Err(ValidationError::new("at least one target platform is required").into());
        }

        let attempts = targets.iter().map(|&platform| {
            let request = PostRequest {
                content: content.to_string(),
                title: Some(title.to_string()),
                media_urls: media_urls.to_vec(),
                timing,
            };
            self.attempt(workflow_id, platform, request)
        });

        let records: Vec<PublicationRecord> = join_all(attempts).await;
        let published = records
            .iter()
            .filter(|r| r.status == vasari_core::PublicationStatus::Published)
            .count();
        tracing::info!(
            published,
            failed = records.len() - published,
            "Publishing dispatch finished"
        );
        Ok(records)
    }

    /// One independent publish attempt; always resolves to a record.
    async fn attempt(
        &self,
        workflow_id: Uuid,
        platform: Platform,
        request: PostRequest,
    ) -> PublicationRecord {
        let Some(publisher) = self.publishers.get(&platform) else {
            warn!(platform = %platform, "No publisher registered for target");
            return PublicationRecord::failed(
                workflow_id,
                platform,
                format!("no publisher configured for {platform}"),
            );
        };

        let posted = tokio::time::timeout(self.config.call_timeout, publisher.post(&request))
            .await
            .map_err(|_| {
                vasari_error::VasariError::from(TimeoutError::new(
                    format!("publish to {platform}"),
                    self.config.call_timeout.as_secs(),
                ))
            })
            .and_then(|inner| inner);

        match posted {
            Ok(receipt) => {
                let scheduled_for = match request.timing {
                    PublishTiming::Immediate => None,
                    PublishTiming::At(at) => Some(at),
                    // Provider-managed slot, with a local jittered fallback
                    // when the provider does not report one.
                    PublishTiming::AutoSchedule => receipt.scheduled_for.or_else(|| {
                        Some(next_auto_slot(
                            self.config.auto_schedule_base,
                            self.config.auto_schedule_jitter,
                        ))
                    }),
                };
                let mut record = PublicationRecord::published(
                    workflow_id,
                    platform,
                    receipt.platform_post_id,
                    scheduled_for,
                );
                if let Some(engagement) = receipt.engagement {
                    record.engagement = engagement;
                }
                record
            }
            Err(e) => {
                warn!(platform = %platform, error = %e, "Publish attempt failed");
                PublicationRecord::failed(workflow_id, platform, e.to_string())
            }
        }
    }

    /// Refresh engagement counters for a published record.
    ///
    /// Best-effort and out-of-band: failures surface to the caller but never
    /// touch workflow state.
    #[instrument(skip(self, record), fields(platform = %record.platform))]
    pub async fn refresh_engagement(&self, record: &PublicationRecord) -> VasariResult<Engagement> {
        let publisher = self.publishers.get(&record.platform).ok_or_else(|| {
            ConfigError::new(format!("no publisher configured for {}", record.platform))
        })?;
        let post_id = record.platform_post_id.as_deref().ok_or_else(|| {
            ValidationError::new("publication has no platform post id to refresh")
        })?;

        tokio::time::timeout(self.config.call_timeout, publisher.fetch_engagement(post_id))
            .await
            .map_err(|_| {
                vasari_error::VasariError::from(TimeoutError::new(
                    format!("engagement refresh on {}", record.platform),
                    self.config.call_timeout.as_secs(),
                ))
            })
            .and_then(|inner| inner)
    }
}
