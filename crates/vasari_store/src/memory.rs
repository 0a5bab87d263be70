//! In-memory workflow store for tests and single-process deployments.

use crate::{StageTransition, WorkflowStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;
use vasari_core::{
    ApprovalStatus, Engagement, PublicationRecord, ResearchSession, ScriptGeneration,
    VideoGenerationTask, WorkflowApproval, WorkflowExecution, WorkflowFilter, WorkflowStatus,
};
use vasari_error::{
    StaleStateError, StaleStateErrorKind, StoreError, ValidationError, VasariResult,
};

#[derive(Debug, Default)]
struct Inner {
    workflows: HashMap<Uuid, WorkflowExecution>,
    sessions: Vec<ResearchSession>,
    scripts: Vec<ScriptGeneration>,
    video_tasks: Vec<VideoGenerationTask>,
    approvals: HashMap<Uuid, WorkflowApproval>,
    publications: Vec<PublicationRecord>,
}

/// Mutex-guarded in-memory implementation of [`WorkflowStore`].
///
/// Every trait method takes the single lock once, so the status-guarded
/// transition and the one-outstanding-video-task check are atomic exactly
/// like their SQL counterparts.
#[derive(Debug, Default)]
pub struct InMemoryWorkflowStore {
    inner: Mutex<Inner>,
}

impl InMemoryWorkflowStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn create_workflow(&self, workflow: &WorkflowExecution) -> VasariResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.workflows.insert(workflow.id, workflow.clone());
        Ok(())
    }

    async fn get_workflow(&self, id: Uuid) -> VasariResult<WorkflowExecution> {
        let inner = self.inner.lock().unwrap();
        inner
            .workflows
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("workflow {id}")).into())
    }

    async fn list_workflows(
        &self,
        filter: &WorkflowFilter,
    ) -> VasariResult<Vec<WorkflowExecution>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<WorkflowExecution> = inner
            .workflows
            .values()
            .filter(|w| filter.status.is_none_or(|s| w.status == s))
            .filter(|w| filter.owner.as_ref().is_none_or(|o| &w.owner == o))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        if filter.limit > 0 {
            rows.truncate(filter.limit as usize);
        }
        Ok(rows)
    }

    async fn delete_workflow(&self, id: Uuid) -> VasariResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.workflows.remove(&id).is_none() {
            return Err(StoreError::not_found(format!("workflow {id}")).into());
        }
        // Cascade to every child entity.
        inner.sessions.retain(|s| s.workflow_id != Some(id));
        inner.scripts.retain(|s| s.workflow_id != Some(id));
        inner.video_tasks.retain(|t| t.workflow_id != id);
        inner.approvals.retain(|_, a| a.workflow_id != id);
        inner.publications.retain(|p| p.workflow_id != id);
        Ok(())
    }

    async fn transition(
        &self,
        id: Uuid,
        from: WorkflowStatus,
        change: StageTransition,
    ) -> VasariResult<WorkflowExecution> {
        if !from.can_transition_to(change.to) {
            return Err(ValidationError::new(format!(
                "no edge {from} -> {} in the workflow state graph",
                change.to
            ))
            .into());
        }

        let mut inner = self.inner.lock().unwrap();
        let workflow = inner
            .workflows
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(format!("workflow {id}")))?;

        if workflow.status != from {
            return Err(StaleStateError::new(StaleStateErrorKind::TransitionConflict {
                workflow_id: id.to_string(),
                expected: from.to_string(),
                found: workflow.status.to_string(),
            })
            .into());
        }

        workflow.status = change.to;
        workflow.version += 1;
        if change.error_message.is_some() {
            workflow.error_message = change.error_message;
        }
        if change.results.is_some() {
            workflow.results = change.results;
        }
        if change.to.is_terminal() {
            workflow.completed_at = Some(Utc::now());
        }

        tracing::debug!(
            workflow_id = %id,
            from = %from,
            to = %workflow.status,
            version = workflow.version,
            "Workflow transition"
        );

        Ok(workflow.clone())
    }

    async fn insert_research_session(&self, session: &ResearchSession) -> VasariResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.sessions.push(session.clone());
        Ok(())
    }

    async fn update_research_session(&self, session: &ResearchSession) -> VasariResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let slot = inner
            .sessions
            .iter_mut()
            .find(|s| s.id == session.id)
            .ok_or_else(|| StoreError::not_found(format!("research session {}", session.id)))?;
        *slot = session.clone();
        Ok(())
    }

    async fn research_session(&self, workflow_id: Uuid) -> VasariResult<Option<ResearchSession>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .sessions
            .iter()
            .filter(|s| s.workflow_id == Some(workflow_id))
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn insert_script(&self, script: &ScriptGeneration) -> VasariResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.scripts.push(script.clone());
        Ok(())
    }

    async fn latest_script(&self, workflow_id: Uuid) -> VasariResult<Option<ScriptGeneration>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .scripts
            .iter()
            .filter(|s| s.workflow_id == Some(workflow_id))
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn insert_video_task(&self, task: &VideoGenerationTask) -> VasariResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let outstanding = inner
            .video_tasks
            .iter()
            .any(|t| t.workflow_id == task.workflow_id && !t.status.is_terminal());
        if outstanding {
            return Err(StaleStateError::new(StaleStateErrorKind::OutstandingVideoTask(
                task.workflow_id.to_string(),
            ))
            .into());
        }
        inner.video_tasks.push(task.clone());
        Ok(())
    }

    async fn update_video_task(&self, task: &VideoGenerationTask) -> VasariResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let slot = inner
            .video_tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| StoreError::not_found(format!("video task {}", task.id)))?;
        *slot = task.clone();
        Ok(())
    }

    async fn active_video_task(
        &self,
        workflow_id: Uuid,
    ) -> VasariResult<Option<VideoGenerationTask>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .video_tasks
            .iter()
            .find(|t| t.workflow_id == workflow_id && !t.status.is_terminal())
            .cloned())
    }

    async fn latest_video_task(
        &self,
        workflow_id: Uuid,
    ) -> VasariResult<Option<VideoGenerationTask>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .video_tasks
            .iter()
            .filter(|t| t.workflow_id == workflow_id)
            .max_by_key(|t| t.submitted_at)
            .cloned())
    }

    async fn insert_approval(&self, approval: &WorkflowApproval) -> VasariResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.approvals.insert(approval.id, approval.clone());
        Ok(())
    }

    async fn get_approval(&self, id: Uuid) -> VasariResult<WorkflowApproval> {
        let inner = self.inner.lock().unwrap();
        inner
            .approvals
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("approval {id}")).into())
    }

    async fn pending_approval(&self, workflow_id: Uuid) -> VasariResult<Option<WorkflowApproval>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .approvals
            .values()
            .find(|a| a.workflow_id == workflow_id && a.status == ApprovalStatus::Pending)
            .cloned())
    }

    async fn resolve_approval(
        &self,
        id: Uuid,
        resolution: ApprovalStatus,
        approver: Option<String>,
        feedback: Option<String>,
        resolved_at: DateTime<Utc>,
    ) -> VasariResult<WorkflowApproval> {
        let mut inner = self.inner.lock().unwrap();
        let approval = inner
            .approvals
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(format!("approval {id}")))?;

        if approval.status != ApprovalStatus::Pending {
            return Err(StaleStateError::new(StaleStateErrorKind::AlreadyResolved {
                approval_id: id.to_string(),
                resolution: approval.status.to_string(),
            })
            .into());
        }

        approval.status = resolution;
        approval.approver = approver;
        approval.feedback = feedback;
        approval.resolved_at = Some(resolved_at);
        Ok(approval.clone())
    }

    async fn insert_publication(&self, record: &PublicationRecord) -> VasariResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.publications.push(record.clone());
        Ok(())
    }

    async fn publications(&self, workflow_id: Uuid) -> VasariResult<Vec<PublicationRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .publications
            .iter()
            .filter(|p| p.workflow_id == workflow_id)
            .cloned()
            .collect())
    }

    async fn update_engagement(&self, id: Uuid, engagement: Engagement) -> VasariResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .publications
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::not_found(format!("publication {id}")))?;
        record.engagement = engagement;
        Ok(())
    }
}
