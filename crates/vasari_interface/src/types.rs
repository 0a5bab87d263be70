//! Data types exchanged across the provider seams.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vasari_core::{AvatarSelection, Engagement, Platform, PublishTiming};

/// A render submission to the video synthesis provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRenderRequest {
    /// The script to render
    pub script: String,
    /// Avatar, voice, and aspect ratio selection
    pub avatar: AvatarSelection,
}

/// Provider-side state of a render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    /// Queued or in progress on the provider side
    Processing,
    /// Asset ready
    Completed,
    /// Render failed on the provider side
    Failed,
}

/// Status report for a submitted render job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRenderStatus {
    /// Provider-side job state
    pub state: RenderState,
    /// URL of the rendered asset, once completed
    pub video_url: Option<String>,
    /// Thumbnail URL, when the provider supplies one
    pub thumbnail_url: Option<String>,
    /// Rendered duration in seconds
    pub duration_secs: Option<f32>,
    /// Provider error description, when failed
    pub error: Option<String>,
}

/// A post submission to a social-publishing provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRequest {
    /// Caption or body text
    pub content: String,
    /// Title or hook line, for platforms that separate it from the body
    pub title: Option<String>,
    /// Media asset URLs to attach
    pub media_urls: Vec<String>,
    /// Delivery timing
    pub timing: PublishTiming,
}

/// The platform's acknowledgement of a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostReceipt {
    /// Post identifier assigned by the platform
    pub platform_post_id: String,
    /// The platform that accepted the post
    pub platform: Platform,
    /// Slot the provider scheduled the post for, when not immediate
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Initial engagement counters, when the platform returns them
    pub engagement: Option<Engagement>,
}
