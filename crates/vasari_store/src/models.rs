//! Diesel row models and their conversions to the core entities.
//!
//! Statuses and enums are stored as text (their strum representations);
//! structured payloads (config, raw items, insights, results) are stored as
//! JSONB. Conversion failures surface as serialization [`StoreError`]s.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::str::FromStr;
use uuid::Uuid;
use vasari_core::{
    AspectRatio, AvatarSelection, ContentType, Engagement, Platform, PublicationRecord,
    PublicationStatus, ResearchSession, ResearchSessionStatus, ScriptGeneration,
    VideoGenerationTask, VideoTaskStatus, WorkflowApproval, WorkflowExecution, WorkflowStatus,
};
use vasari_error::{StoreError, StoreErrorKind, VasariError};

pub(crate) fn bad_value(what: &str, value: impl std::fmt::Display) -> VasariError {
    StoreError::new(StoreErrorKind::Serialization(format!(
        "unrecognized {what}: {value}"
    )))
    .into()
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, VasariError> {
    serde_json::to_value(value)
        .map_err(|e| StoreError::new(StoreErrorKind::Serialization(e.to_string())).into())
}

pub(crate) fn from_json<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
) -> Result<T, VasariError> {
    serde_json::from_value(value)
        .map_err(|e| StoreError::new(StoreErrorKind::Serialization(e.to_string())).into())
}

/// Row for the `workflow_executions` table.
#[derive(Debug, Clone, Queryable, Insertable, Identifiable, Selectable)]
#[diesel(table_name = crate::schema::workflow_executions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkflowRow {
    pub id: Uuid,
    pub owner: String,
    pub name: String,
    pub config: serde_json::Value,
    pub status: String,
    pub version: i64,
    pub error_message: Option<String>,
    pub results: Option<serde_json::Value>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<&WorkflowExecution> for WorkflowRow {
    type Error = VasariError;

    fn try_from(workflow: &WorkflowExecution) -> Result<Self, Self::Error> {
        Ok(Self {
            id: workflow.id,
            owner: workflow.owner.clone(),
            name: workflow.name.clone(),
            config: to_json(&workflow.config)?,
            status: workflow.status.to_string(),
            version: workflow.version,
            error_message: workflow.error_message.clone(),
            results: workflow.results.as_ref().map(to_json).transpose()?,
            started_at: workflow.started_at,
            completed_at: workflow.completed_at,
        })
    }
}

impl TryFrom<WorkflowRow> for WorkflowExecution {
    type Error = VasariError;

    fn try_from(row: WorkflowRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            owner: row.owner,
            name: row.name,
            config: from_json(row.config)?,
            status: WorkflowStatus::from_str(&row.status)
                .map_err(|_| bad_value("workflow status", &row.status))?,
            version: row.version,
            error_message: row.error_message,
            results: row.results.map(from_json).transpose()?,
            started_at: row.started_at,
            completed_at: row.completed_at,
        })
    }
}

/// Row for the `research_sessions` table.
#[derive(Debug, Clone, Queryable, Insertable, Identifiable, Selectable, AsChangeset)]
#[diesel(table_name = crate::schema::research_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ResearchSessionRow {
    pub id: Uuid,
    pub workflow_id: Option<Uuid>,
    pub sources: serde_json::Value,
    pub search_query: String,
    pub max_items: i32,
    pub depth: String,
    pub status: String,
    pub results_count: i32,
    pub raw_data: serde_json::Value,
    pub insights: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&ResearchSession> for ResearchSessionRow {
    type Error = VasariError;

    fn try_from(session: &ResearchSession) -> Result<Self, Self::Error> {
        Ok(Self {
            id: session.id,
            workflow_id: session.workflow_id,
            sources: to_json(&session.sources)?,
            search_query: session.query.clone(),
            max_items: session.max_items as i32,
            depth: session.depth.to_string(),
            status: session.status.to_string(),
            results_count: session.results_count as i32,
            raw_data: to_json(&session.raw_data)?,
            insights: session.insights.as_ref().map(to_json).transpose()?,
            error_message: session.error_message.clone(),
            created_at: session.created_at,
        })
    }
}

impl TryFrom<ResearchSessionRow> for ResearchSession {
    type Error = VasariError;

    fn try_from(row: ResearchSessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            workflow_id: row.workflow_id,
            sources: from_json(row.sources)?,
            query: row.search_query,
            max_items: row.max_items.max(0) as u32,
            depth: vasari_core::AnalysisDepth::from_str(&row.depth)
                .map_err(|_| bad_value("analysis depth", &row.depth))?,
            status: ResearchSessionStatus::from_str(&row.status)
                .map_err(|_| bad_value("session status", &row.status))?,
            results_count: row.results_count.max(0) as u32,
            raw_data: from_json(row.raw_data)?,
            insights: row.insights.map(from_json).transpose()?,
            error_message: row.error_message,
            created_at: row.created_at,
        })
    }
}

/// Row for the `script_generations` table.
#[derive(Debug, Clone, Queryable, Insertable, Identifiable, Selectable)]
#[diesel(table_name = crate::schema::script_generations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ScriptRow {
    pub id: Uuid,
    pub workflow_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub title: String,
    pub content: String,
    pub content_type: String,
    pub model: String,
    pub audience: String,
    pub style: String,
    pub target_duration_secs: Option<i32>,
    pub quality_score: f32,
    pub created_at: DateTime<Utc>,
}

impl From<&ScriptGeneration> for ScriptRow {
    fn from(script: &ScriptGeneration) -> Self {
        Self {
            id: script.id,
            workflow_id: script.workflow_id,
            session_id: script.session_id,
            title: script.title.clone(),
            content: script.content.clone(),
            content_type: script.content_type.to_string(),
            model: script.model.clone(),
            audience: script.audience.clone(),
            style: script.style.clone(),
            target_duration_secs: script.target_duration_secs.map(|d| d as i32),
            quality_score: script.quality_score,
            created_at: script.created_at,
        }
    }
}

impl TryFrom<ScriptRow> for ScriptGeneration {
    type Error = VasariError;

    fn try_from(row: ScriptRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            workflow_id: row.workflow_id,
            session_id: row.session_id,
            title: row.title,
            content: row.content,
            content_type: ContentType::from_str(&row.content_type)
                .map_err(|_| bad_value("content type", &row.content_type))?,
            model: row.model,
            audience: row.audience,
            style: row.style,
            target_duration_secs: row.target_duration_secs.map(|d| d.max(0) as u32),
            quality_score: row.quality_score,
            created_at: row.created_at,
        })
    }
}

/// Row for the `video_generation_tasks` table.
#[derive(Debug, Clone, Queryable, Insertable, Identifiable, Selectable, AsChangeset)]
#[diesel(table_name = crate::schema::video_generation_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VideoTaskRow {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub script: String,
    pub avatar_id: String,
    pub voice_id: String,
    pub aspect_ratio: String,
    pub provider_task_id: Option<String>,
    pub status: String,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_secs: Option<f32>,
    pub error_message: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub last_polled_at: Option<DateTime<Utc>>,
}

impl From<&VideoGenerationTask> for VideoTaskRow {
    fn from(task: &VideoGenerationTask) -> Self {
        Self {
            id: task.id,
            workflow_id: task.workflow_id,
            script: task.script.clone(),
            avatar_id: task.avatar.avatar_id.clone(),
            voice_id: task.avatar.voice_id.clone(),
            aspect_ratio: task.avatar.aspect_ratio.to_string(),
            provider_task_id: task.provider_task_id.clone(),
            status: task.status.to_string(),
            video_url: task.video_url.clone(),
            thumbnail_url: task.thumbnail_url.clone(),
            duration_secs: task.duration_secs,
            error_message: task.error_message.clone(),
            submitted_at: task.submitted_at,
            last_polled_at: task.last_polled_at,
        }
    }
}

impl TryFrom<VideoTaskRow> for VideoGenerationTask {
    type Error = VasariError;

    fn try_from(row: VideoTaskRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            workflow_id: row.workflow_id,
            script: row.script,
            avatar: AvatarSelection {
                avatar_id: row.avatar_id,
                voice_id: row.voice_id,
                aspect_ratio: AspectRatio::from_str(&row.aspect_ratio)
                    .map_err(|_| bad_value("aspect ratio", &row.aspect_ratio))?,
            },
            provider_task_id: row.provider_task_id,
            status: VideoTaskStatus::from_str(&row.status)
                .map_err(|_| bad_value("video task status", &row.status))?,
            video_url: row.video_url,
            thumbnail_url: row.thumbnail_url,
            duration_secs: row.duration_secs,
            error_message: row.error_message,
            submitted_at: row.submitted_at,
            last_polled_at: row.last_polled_at,
        })
    }
}

/// Row for the `workflow_approvals` table.
#[derive(Debug, Clone, Queryable, Insertable, Identifiable, Selectable)]
#[diesel(table_name = crate::schema::workflow_approvals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ApprovalRow {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub title: String,
    pub content: String,
    pub video_url: Option<String>,
    pub artifact_hash: String,
    pub status: String,
    pub approver: Option<String>,
    pub feedback: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<&WorkflowApproval> for ApprovalRow {
    fn from(approval: &WorkflowApproval) -> Self {
        Self {
            id: approval.id,
            workflow_id: approval.workflow_id,
            title: approval.title.clone(),
            content: approval.content.clone(),
            video_url: approval.video_url.clone(),
            artifact_hash: approval.artifact_hash.clone(),
            status: approval.status.to_string(),
            approver: approval.approver.clone(),
            feedback: approval.feedback.clone(),
            requested_at: approval.requested_at,
            resolved_at: approval.resolved_at,
        }
    }
}

impl TryFrom<ApprovalRow> for WorkflowApproval {
    type Error = VasariError;

    fn try_from(row: ApprovalRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            workflow_id: row.workflow_id,
            title: row.title,
            content: row.content,
            video_url: row.video_url,
            artifact_hash: row.artifact_hash,
            status: vasari_core::ApprovalStatus::from_str(&row.status)
                .map_err(|_| bad_value("approval status", &row.status))?,
            approver: row.approver,
            feedback: row.feedback,
            requested_at: row.requested_at,
            resolved_at: row.resolved_at,
        })
    }
}

/// Row for the `publication_records` table.
#[derive(Debug, Clone, Queryable, Insertable, Identifiable, Selectable)]
#[diesel(table_name = crate::schema::publication_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PublicationRow {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub platform: String,
    pub platform_post_id: Option<String>,
    pub status: String,
    pub error_message: Option<String>,
    pub views: i64,
    pub likes: i64,
    pub shares: i64,
    pub comments: i64,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<&PublicationRecord> for PublicationRow {
    fn from(record: &PublicationRecord) -> Self {
        Self {
            id: record.id,
            workflow_id: record.workflow_id,
            platform: record.platform.to_string(),
            platform_post_id: record.platform_post_id.clone(),
            status: record.status.to_string(),
            error_message: record.error_message.clone(),
            views: record.engagement.views,
            likes: record.engagement.likes,
            shares: record.engagement.shares,
            comments: record.engagement.comments,
            scheduled_for: record.scheduled_for,
            published_at: record.published_at,
        }
    }
}

impl TryFrom<PublicationRow> for PublicationRecord {
    type Error = VasariError;

    fn try_from(row: PublicationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            workflow_id: row.workflow_id,
            platform: Platform::from_str(&row.platform)
                .map_err(|_| bad_value("platform", &row.platform))?,
            platform_post_id: row.platform_post_id,
            status: PublicationStatus::from_str(&row.status)
                .map_err(|_| bad_value("publication status", &row.status))?,
            error_message: row.error_message,
            engagement: Engagement {
                views: row.views,
                likes: row.likes,
                shares: row.shares,
                comments: row.comments,
            },
            scheduled_for: row.scheduled_for,
            published_at: row.published_at,
        })
    }
}
