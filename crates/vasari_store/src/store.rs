//! The `WorkflowStore` trait and transition payloads.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use vasari_core::{
    ApprovalStatus, Engagement, PublicationRecord, ResearchSession, ScriptGeneration,
    VideoGenerationTask, WorkflowApproval, WorkflowExecution, WorkflowFilter, WorkflowResults,
    WorkflowStatus,
};
use vasari_error::VasariResult;

/// Payload for one atomic stage transition.
///
/// Carries the target status together with whatever the transition writes
/// alongside it (failure cause, final results), so status can never get
/// ahead of the data it depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct StageTransition {
    /// Target status
    pub to: WorkflowStatus,
    /// Failure cause, written when transitioning to `Failed`
    pub error_message: Option<String>,
    /// Final artifact references, written when transitioning to `Completed`
    pub results: Option<WorkflowResults>,
}

impl StageTransition {
    /// A plain transition to `status`.
    pub fn to(status: WorkflowStatus) -> Self {
        Self {
            to: status,
            error_message: None,
            results: None,
        }
    }

    /// Transition to `Failed` carrying the most specific cause.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            to: WorkflowStatus::Failed,
            error_message: Some(message.into()),
            results: None,
        }
    }

    /// Transition to `Completed` carrying the final artifact references.
    pub fn completed(results: WorkflowResults) -> Self {
        Self {
            to: WorkflowStatus::Completed,
            error_message: None,
            results: Some(results),
        }
    }
}

/// The single source of truth for workflow state.
///
/// Implementations guarantee:
/// - `transition` is a single atomic status-guarded write; a guard miss is a
///   `StaleStateError`, never a partial update
/// - at most one non-terminal video task exists per workflow
///   (`insert_video_task` rejects a second)
/// - `resolve_approval` refuses to touch an already-resolved approval
/// - `delete_workflow` cascades to every child entity
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Persist a new workflow in its initial state.
    async fn create_workflow(&self, workflow: &WorkflowExecution) -> VasariResult<()>;

    /// Fetch a workflow by id.
    async fn get_workflow(&self, id: Uuid) -> VasariResult<WorkflowExecution>;

    /// List workflows matching the filter, newest first.
    async fn list_workflows(&self, filter: &WorkflowFilter) -> VasariResult<Vec<WorkflowExecution>>;

    /// Delete a workflow and all child entities.
    async fn delete_workflow(&self, id: Uuid) -> VasariResult<()>;

    /// Atomically move a workflow from `from` to `change.to`.
    ///
    /// The write is guarded on the current status being exactly `from`; on a
    /// mismatch nothing is written and a `StaleStateError` is returned.
    /// Terminal targets also stamp `completed_at`.
    async fn transition(
        &self,
        id: Uuid,
        from: WorkflowStatus,
        change: StageTransition,
    ) -> VasariResult<WorkflowExecution>;

    /// Persist a new research session.
    async fn insert_research_session(&self, session: &ResearchSession) -> VasariResult<()>;

    /// Overwrite a research session (status, raw data, insights, error).
    async fn update_research_session(&self, session: &ResearchSession) -> VasariResult<()>;

    /// Latest research session for a workflow, if any.
    async fn research_session(&self, workflow_id: Uuid) -> VasariResult<Option<ResearchSession>>;

    /// Persist a new script artifact. Scripts are immutable; corrections
    /// insert a new row.
    async fn insert_script(&self, script: &ScriptGeneration) -> VasariResult<()>;

    /// Most recently created script for a workflow, if any.
    async fn latest_script(&self, workflow_id: Uuid) -> VasariResult<Option<ScriptGeneration>>;

    /// Persist a new video task.
    ///
    /// Rejects the insert with a `StaleStateError` when the workflow already
    /// has a non-terminal task, so a retry can never double-submit a billed
    /// render.
    async fn insert_video_task(&self, task: &VideoGenerationTask) -> VasariResult<()>;

    /// Overwrite a video task (status, urls, poll timestamp, error).
    async fn update_video_task(&self, task: &VideoGenerationTask) -> VasariResult<()>;

    /// The workflow's non-terminal video task, if one exists.
    async fn active_video_task(
        &self,
        workflow_id: Uuid,
    ) -> VasariResult<Option<VideoGenerationTask>>;

    /// Most recently submitted video task for a workflow, if any.
    async fn latest_video_task(
        &self,
        workflow_id: Uuid,
    ) -> VasariResult<Option<VideoGenerationTask>>;

    /// Persist a new pending approval.
    async fn insert_approval(&self, approval: &WorkflowApproval) -> VasariResult<()>;

    /// Fetch an approval by id.
    async fn get_approval(&self, id: Uuid) -> VasariResult<WorkflowApproval>;

    /// The workflow's pending approval, if one exists.
    async fn pending_approval(&self, workflow_id: Uuid) -> VasariResult<Option<WorkflowApproval>>;

    /// Resolve a pending approval.
    ///
    /// Guarded on the approval still being `Pending`; an already-resolved
    /// approval surfaces a `StaleStateError` and changes nothing.
    async fn resolve_approval(
        &self,
        id: Uuid,
        resolution: ApprovalStatus,
        approver: Option<String>,
        feedback: Option<String>,
        resolved_at: DateTime<Utc>,
    ) -> VasariResult<WorkflowApproval>;

    /// Persist one per-target publish outcome.
    async fn insert_publication(&self, record: &PublicationRecord) -> VasariResult<()>;

    /// All publish outcomes for a workflow.
    async fn publications(&self, workflow_id: Uuid) -> VasariResult<Vec<PublicationRecord>>;

    /// Refresh engagement counters on a publication record.
    async fn update_engagement(&self, id: Uuid, engagement: Engagement) -> VasariResult<()>;
}
