//! Publishing targets, timing, and publication records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A social-publishing target platform.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Platform {
    /// TikTok
    Tiktok,
    /// Instagram Reels
    Instagram,
    /// YouTube Shorts
    Youtube,
    /// X
    X,
}

impl Platform {
    /// Caption/body character ceiling enforced before hand-off to publishing.
    pub fn caption_limit(self) -> usize {
        match self {
            Platform::Tiktok => 2200,
            Platform::Instagram => 2200,
            Platform::Youtube => 5000,
            Platform::X => 280,
        }
    }
}

/// When a publication should go out.
///
/// The three modes are mutually exclusive by construction; the request
/// boundary (which accepts separate fixed-time and auto-schedule inputs)
/// rejects combinations before building this value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "mode", content = "at")]
pub enum PublishTiming {
    /// Post as soon as dispatch runs
    #[default]
    Immediate,
    /// Post at a caller-fixed time
    At(DateTime<Utc>),
    /// Let the provider pick the slot
    AutoSchedule,
}

/// Engagement counters for a publication.
///
/// Refreshed asynchronously; never blocks the workflow's terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Engagement {
    /// View count
    pub views: i64,
    /// Like count
    pub likes: i64,
    /// Share count
    pub shares: i64,
    /// Comment count
    pub comments: i64,
}

/// Outcome of one publish attempt on one platform.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PublicationStatus {
    /// The platform accepted the post
    Published,
    /// The attempt failed; the workflow still completes
    Failed,
    /// The post was later removed on the platform side
    Removed,
}

/// One row per (workflow, platform) publish attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationRecord {
    /// Record identifier
    pub id: Uuid,
    /// Parent workflow
    pub workflow_id: Uuid,
    /// Target platform
    pub platform: Platform,
    /// Post identifier assigned by the platform
    pub platform_post_id: Option<String>,
    /// Attempt outcome
    pub status: PublicationStatus,
    /// Most specific cause when the attempt failed
    pub error_message: Option<String>,
    /// Engagement counters, refreshed out of band
    pub engagement: Engagement,
    /// Slot the post was scheduled for, when not immediate
    pub scheduled_for: Option<DateTime<Utc>>,
    /// When the platform confirmed the post
    pub published_at: Option<DateTime<Utc>>,
}

impl PublicationRecord {
    /// Record for a successful attempt.
    pub fn published(
        workflow_id: Uuid,
        platform: Platform,
        platform_post_id: impl Into<String>,
        scheduled_for: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id,
            platform,
            platform_post_id: Some(platform_post_id.into()),
            status: PublicationStatus::Published,
            error_message: None,
            engagement: Engagement::default(),
            scheduled_for,
            published_at: Some(Utc::now()),
        }
    }

    /// Record for a failed attempt.
    pub fn failed(workflow_id: Uuid, platform: Platform, error: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id,
            platform,
            platform_post_id: None,
            status: PublicationStatus::Failed,
            error_message: Some(error.into()),
            engagement: Engagement::default(),
            scheduled_for: None,
            published_at: None,
        }
    }
}
