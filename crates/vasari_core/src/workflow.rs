//! The workflow aggregate root.

use crate::{
    AnalysisDepth, AvatarSelection, ContentType, Platform, PublicationRecord, PublishTiming,
    ResearchSource, WorkflowStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller-supplied configuration for one research-to-publish run.
///
/// # Examples
///
/// ```
/// use vasari_core::{Platform, ResearchSource, WorkflowConfigBuilder};
///
/// let config = WorkflowConfigBuilder::default()
///     .topic("AI automation")
///     .platforms(vec![Platform::Tiktok, Platform::X])
///     .sources(vec![ResearchSource::TechNews])
///     .video_requested(true)
///     .build()
///     .unwrap();
/// assert!(config.video_requested());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct WorkflowConfig {
    /// The topic to research and turn into content
    topic: String,
    /// Platforms to publish to
    platforms: Vec<Platform>,
    /// Research sources to collect from
    sources: Vec<ResearchSource>,
    /// Whether a video asset should be rendered
    #[builder(default)]
    #[serde(default)]
    video_requested: bool,
    /// Voice/tone for the synthesized content
    #[builder(default = "default_tone()")]
    #[serde(default = "default_tone")]
    tone: String,
    /// Audience the content is written for
    #[builder(default = "default_audience()")]
    #[serde(default = "default_audience")]
    audience: String,
    /// Kind of content to synthesize
    #[builder(default = "ContentType::SocialPost")]
    #[serde(default = "default_content_type")]
    content_type: ContentType,
    /// Requested research thoroughness
    #[builder(default = "AnalysisDepth::Standard")]
    #[serde(default = "default_depth")]
    depth: AnalysisDepth,
    /// Cost bound on collected items per source
    #[builder(default = "25")]
    #[serde(default = "default_max_items")]
    max_items: u32,
    /// Delivery timing for publishing
    #[builder(default)]
    #[serde(default)]
    timing: PublishTiming,
    /// Whether a human must approve before publishing
    #[builder(default = "true")]
    #[serde(default = "default_require_approval")]
    require_approval: bool,
    /// Avatar/voice selection when a video is requested
    #[builder(default)]
    #[serde(default)]
    avatar: Option<AvatarSelection>,
    /// Text model override for synthesis stages
    #[builder(default)]
    #[serde(default)]
    model: Option<String>,
    /// Requested spoken duration for video scripts
    #[builder(default)]
    #[serde(default)]
    target_duration_secs: Option<u32>,
}

fn default_tone() -> String {
    "informative".to_string()
}

fn default_audience() -> String {
    "general tech audience".to_string()
}

fn default_content_type() -> ContentType {
    ContentType::SocialPost
}

fn default_depth() -> AnalysisDepth {
    AnalysisDepth::Standard
}

fn default_max_items() -> u32 {
    25
}

fn default_require_approval() -> bool {
    true
}

/// Final artifact references for a completed workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResults {
    /// Title of the published content
    pub title: String,
    /// Body of the published content
    pub content: String,
    /// Kind of content that was produced
    pub content_type: ContentType,
    /// Rendered video asset, when one was requested
    pub video_url: Option<String>,
    /// Per-target publish outcomes
    pub publications: Vec<PublicationRecord>,
}

/// One research-to-publish run and its durable state.
///
/// The aggregate root: research sessions, script artifacts, video tasks,
/// approvals, and publication records all reference it and are deleted with
/// it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowExecution {
    /// Caller-visible identifier
    pub id: Uuid,
    /// Owner reference
    pub owner: String,
    /// Human-readable workflow name
    pub name: String,
    /// The run configuration
    pub config: WorkflowConfig,
    /// Current lifecycle state
    pub status: WorkflowStatus,
    /// Optimistic-concurrency counter, bumped on every transition
    pub version: i64,
    /// Most specific cause when the workflow failed
    pub error_message: Option<String>,
    /// Final artifact references, once completed
    pub results: Option<WorkflowResults>,
    /// Creation timestamp
    pub started_at: DateTime<Utc>,
    /// Terminal timestamp
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowExecution {
    /// Create a new workflow in `Pending` state.
    pub fn new(owner: impl Into<String>, name: impl Into<String>, config: WorkflowConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            name: name.into(),
            config,
            status: WorkflowStatus::Pending,
            version: 0,
            error_message: None,
            results: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Progress percentage derived from status; UI feedback only.
    pub fn progress(&self) -> u8 {
        self.status.progress()
    }
}

/// Filter for listing workflows, newest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkflowFilter {
    /// Only workflows in this status
    pub status: Option<WorkflowStatus>,
    /// Only workflows belonging to this owner
    pub owner: Option<String>,
    /// Maximum number of rows to return (0 means no limit)
    pub limit: i64,
}
