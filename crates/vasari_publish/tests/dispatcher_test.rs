use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use vasari_core::{Engagement, Platform, PublicationStatus, PublishTiming};
use vasari_error::{ProviderError, ProviderErrorKind, VasariResult};
use vasari_interface::{PostReceipt, PostRequest, SocialPublisher};
use vasari_publish::{PublishConfig, PublishDispatcher, resolve_timing};

struct OkPublisher {
    platform: Platform,
}

#[async_trait]
impl SocialPublisher for OkPublisher {
    async fn post(&self, _req: &PostRequest) -> VasariResult<PostReceipt> {
        Ok(PostReceipt {
            platform_post_id: format!("{}-post-1", self.platform),
            platform: self.platform,
            scheduled_for: None,
            engagement: None,
        })
    }

    async fn fetch_engagement(&self, _platform_post_id: &str) -> VasariResult<Engagement> {
        Ok(Engagement {
            views: 1200,
            likes: 87,
            shares: 12,
            comments: 5,
        })
    }

    fn platform(&self) -> Platform {
        self.platform
    }
}

struct DownPublisher {
    platform: Platform,
}

#[async_trait]
impl SocialPublisher for DownPublisher {
    async fn post(&self, _req: &PostRequest) -> VasariResult<PostReceipt> {
        Err(ProviderError::new(
            self.platform.to_string(),
            ProviderErrorKind::Http {
                status: 503,
                message: "upload service unavailable".into(),
            },
        )
        .into())
    }

    async fn fetch_engagement(&self, _platform_post_id: &str) -> VasariResult<Engagement> {
        Err(ProviderError::new(
            self.platform.to_string(),
            ProviderErrorKind::Unavailable("down".into()),
        )
        .into())
    }

    fn platform(&self) -> Platform {
        self.platform
    }
}

fn dispatcher() -> PublishDispatcher {
    PublishDispatcher::new(PublishConfig {
        call_timeout: Duration::from_secs(5),
        ..PublishConfig::default()
    })
    .with_publisher(Arc::new(OkPublisher {
        platform: Platform::Tiktok,
    }))
    .with_publisher(Arc::new(OkPublisher {
        platform: Platform::Youtube,
    }))
    .with_publisher(Arc::new(DownPublisher {
        platform: Platform::X,
    }))
}

#[tokio::test]
async fn partial_failure_yields_one_record_per_target() {
    let workflow_id = Uuid::new_v4();
    let records = dispatcher()
        .dispatch(
            workflow_id,
            "title",
            "body",
            &[],
            &[Platform::Tiktok, Platform::Youtube, Platform::X],
            PublishTiming::Immediate,
        )
        .await
        .unwrap();

    assert_eq!(records.len(), 3);
    let published = records
        .iter()
        .filter(|r| r.status == PublicationStatus::Published)
        .count();
    let failed: Vec<_> = records
        .iter()
        .filter(|r| r.status == PublicationStatus::Failed)
        .collect();
    assert_eq!(published, 2);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].platform, Platform::X);
    assert!(failed[0].error_message.as_ref().unwrap().contains("503"));
}

#[tokio::test]
async fn empty_target_list_is_rejected() {
    let err = dispatcher()
        .dispatch(
            Uuid::new_v4(),
            "t",
            "b",
            &[],
            &[],
            PublishTiming::Immediate,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        vasari_error::VasariErrorKind::Validation(_)
    ));
}

#[tokio::test]
async fn unregistered_target_fails_that_record_only() {
    let dispatcher = PublishDispatcher::new(PublishConfig::default()).with_publisher(Arc::new(
        OkPublisher {
            platform: Platform::Tiktok,
        },
    ));

    let records = dispatcher
        .dispatch(
            Uuid::new_v4(),
            "t",
            "b",
            &[],
            &[Platform::Tiktok, Platform::Instagram],
            PublishTiming::Immediate,
        )
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].status, PublicationStatus::Published);
    assert_eq!(records[1].status, PublicationStatus::Failed);
}

#[tokio::test]
async fn auto_schedule_records_a_slot() {
    let records = dispatcher()
        .dispatch(
            Uuid::new_v4(),
            "t",
            "b",
            &[],
            &[Platform::Tiktok],
            PublishTiming::AutoSchedule,
        )
        .await
        .unwrap();

    let slot = records[0].scheduled_for.expect("auto-schedule slot");
    assert!(slot > Utc::now());
}

#[tokio::test]
async fn engagement_refresh_reads_counters() {
    let workflow_id = Uuid::new_v4();
    let records = dispatcher()
        .dispatch(
            workflow_id,
            "t",
            "b",
            &[],
            &[Platform::Tiktok],
            PublishTiming::Immediate,
        )
        .await
        .unwrap();

    let engagement = dispatcher()
        .refresh_engagement(&records[0])
        .await
        .unwrap();
    assert_eq!(engagement.views, 1200);
}

#[test]
fn fixed_time_and_auto_schedule_are_mutually_exclusive() {
    let err = resolve_timing(Some(Utc::now()), true).unwrap_err();
    assert!(matches!(
        err.kind(),
        vasari_error::VasariErrorKind::Validation(_)
    ));

    assert_eq!(resolve_timing(None, false).unwrap(), PublishTiming::Immediate);
    assert_eq!(
        resolve_timing(None, true).unwrap(),
        PublishTiming::AutoSchedule
    );
    assert!(matches!(
        resolve_timing(Some(Utc::now()), false).unwrap(),
        PublishTiming::At(_)
    ));
}
