//! Video synthesis task entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Output aspect ratio for a rendered video.
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
pub enum AspectRatio {
    /// 9:16, the short-form default
    Portrait,
    /// 16:9
    Landscape,
    /// 1:1
    Square,
}

impl AspectRatio {
    /// The ratio in the `w:h` notation render providers expect.
    pub fn as_ratio(self) -> &'static str {
        match self {
            AspectRatio::Portrait => "9:16",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Square => "1:1",
        }
    }
}

/// Avatar and voice selection for a render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarSelection {
    /// Provider avatar identifier
    pub avatar_id: String,
    /// Provider voice identifier
    pub voice_id: String,
    /// Output aspect ratio
    pub aspect_ratio: AspectRatio,
}

/// Lifecycle of a video render task.
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
pub enum VideoTaskStatus {
    /// Submitted, provider has not reported progress yet
    Pending,
    /// Provider reports the render in progress
    Processing,
    /// Asset ready (terminal)
    Completed,
    /// Render failed or timed out (terminal)
    Failed,
}

impl VideoTaskStatus {
    /// Whether this state admits no further polling.
    pub fn is_terminal(self) -> bool {
        matches!(self, VideoTaskStatus::Completed | VideoTaskStatus::Failed)
    }
}

/// One request to the asynchronous video synthesis provider.
///
/// The store enforces at most one non-terminal task per workflow, so a retry
/// after a crash can never double-submit a billed render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoGenerationTask {
    /// Task identifier
    pub id: Uuid,
    /// Parent workflow
    pub workflow_id: Uuid,
    /// The script being rendered
    pub script: String,
    /// Avatar and voice selection
    pub avatar: AvatarSelection,
    /// Identifier the provider assigned at submission
    pub provider_task_id: Option<String>,
    /// Task lifecycle state
    pub status: VideoTaskStatus,
    /// URL of the rendered asset, once completed
    pub video_url: Option<String>,
    /// Thumbnail URL, when the provider supplies one
    pub thumbnail_url: Option<String>,
    /// Rendered duration in seconds
    pub duration_secs: Option<f32>,
    /// Most specific cause when the task failed
    pub error_message: Option<String>,
    /// Submission timestamp (wall-clock deadline is measured from here)
    pub submitted_at: DateTime<Utc>,
    /// Timestamp of the most recent poll, for resumable polling
    pub last_polled_at: Option<DateTime<Utc>>,
}

impl VideoGenerationTask {
    /// Create a new task in `Pending` state.
    pub fn new(workflow_id: Uuid, script: impl Into<String>, avatar: AvatarSelection) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id,
            script: script.into(),
            avatar,
            provider_task_id: None,
            status: VideoTaskStatus::Pending,
            video_url: None,
            thumbnail_url: None,
            duration_secs: None,
            error_message: None,
            submitted_at: Utc::now(),
            last_polled_at: None,
        }
    }
}
