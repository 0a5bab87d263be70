//! Script and post-body artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of content a synthesis pass produces.
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
pub enum ContentType {
    /// Spoken-word script for a short-form video
    VideoScript,
    /// Text body for a social post
    SocialPost,
}

/// Synthesized content before it is persisted as a [`ScriptGeneration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptDraft {
    /// Title or hook line
    pub title: String,
    /// The script or post body
    pub content: String,
    /// What kind of content this is
    pub content_type: ContentType,
}

/// A persisted text artifact plus the parameters that produced it.
///
/// Immutable once created. A correction produces a new `ScriptGeneration`
/// rather than mutating the old one, keeping the audit trail append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptGeneration {
    /// Artifact identifier
    pub id: Uuid,
    /// Parent workflow, if the script belongs to one
    pub workflow_id: Option<Uuid>,
    /// Research session the script was derived from, when there was one
    pub session_id: Option<Uuid>,
    /// Title or hook line
    pub title: String,
    /// The script or post body
    pub content: String,
    /// What kind of content this is
    pub content_type: ContentType,
    /// Model that produced the text
    pub model: String,
    /// Target audience the generation was parameterized with
    pub audience: String,
    /// Style/tone the generation was parameterized with
    pub style: String,
    /// Requested spoken duration for video scripts
    pub target_duration_secs: Option<u32>,
    /// Advisory quality score in [0, 1]; never used for control flow
    pub quality_score: f32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ScriptGeneration {
    /// Persistable artifact from a draft plus its generation parameters.
    #[allow(clippy::too_many_arguments)]
    pub fn from_draft(
        draft: ScriptDraft,
        workflow_id: Option<Uuid>,
        session_id: Option<Uuid>,
        model: impl Into<String>,
        audience: impl Into<String>,
        style: impl Into<String>,
        target_duration_secs: Option<u32>,
        quality_score: f32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id,
            session_id,
            title: draft.title,
            content: draft.content,
            content_type: draft.content_type,
            model: model.into(),
            audience: audience.into(),
            style: style.into(),
            target_duration_secs,
            quality_score: quality_score.clamp(0.0, 1.0),
            created_at: Utc::now(),
        }
    }
}
