//! The workflow state machine.
//!
//! `WorkflowEngine` drives one stage at a time against the state store.
//! [`WorkflowEngine::advance`] is the re-entrant unit of work: it re-reads
//! the durable status, runs (or skips) the stage it names, and records the
//! outcome as one status-guarded transition. Re-invoking a stage whose
//! artifact already exists is a no-op that reuses the stored artifact, so a
//! crashed process resumes exactly where the store says it stopped.
//!
//! Stage outputs are persisted *before* the status moves past them; status
//! is never ahead of the data it depends on.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use vasari_core::{
    ApprovalDecision, ApprovalStatus, Platform, PublicationStatus, ResearchSession,
    ResearchSessionStatus, ScriptGeneration, VideoTaskStatus, WorkflowApproval, WorkflowConfig,
    WorkflowExecution, WorkflowFilter, WorkflowResults, WorkflowStatus, artifact_hash,
};
use vasari_error::{
    ConfigError, ProviderError, ProviderErrorKind, StaleStateError, StaleStateErrorKind,
    StoreError, TimeoutError, ValidationError, VasariError, VasariResult,
};
use vasari_interface::{VasariDriver, VideoSynthesizer};
use vasari_publish::PublishDispatcher;
use vasari_research::ResearchAggregator;
use vasari_store::{StageTransition, WorkflowStore};
use vasari_synthesis::{InsightSynthesizer, ScriptParams, ScriptWriter};
use vasari_video::{VideoConfig, VideoOrchestrator, VideoPoll};

/// Engine tuning.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Bound on each text synthesis call
    pub synthesis_timeout: Duration,
    /// Video orchestration tuning
    pub video: VideoConfig,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            synthesis_timeout: Duration::from_secs(60),
            video: VideoConfig::default(),
        }
    }
}

/// Orchestrates research-to-publish workflows against the state store.
///
/// Many workflows progress independently and concurrently; within one
/// workflow, stages run strictly in sequence. The engine holds no per-
/// workflow state of its own; everything lives in the store, which is what
/// makes `advance` re-entrant.
pub struct WorkflowEngine {
    store: Arc<dyn WorkflowStore>,
    driver: Arc<dyn VasariDriver>,
    aggregator: ResearchAggregator,
    insights: InsightSynthesizer,
    writer: ScriptWriter,
    video: Option<VideoOrchestrator>,
    dispatcher: PublishDispatcher,
    settings: EngineSettings,
}

impl WorkflowEngine {
    /// Create an engine over the given collaborators.
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        driver: Arc<dyn VasariDriver>,
        aggregator: ResearchAggregator,
        dispatcher: PublishDispatcher,
        settings: EngineSettings,
    ) -> Self {
        let insights = InsightSynthesizer::new(Arc::clone(&driver), settings.synthesis_timeout);
        let writer = ScriptWriter::new(Arc::clone(&driver), settings.synthesis_timeout);
        Self {
            store,
            driver,
            aggregator,
            insights,
            writer,
            video: None,
            dispatcher,
            settings,
        }
    }

    /// Attach a video synthesis provider.
    ///
    /// Workflows with `video_requested` fail their video stage if no
    /// provider is attached.
    pub fn with_video_provider(mut self, provider: Arc<dyn VideoSynthesizer>) -> Self {
        self.video = Some(VideoOrchestrator::new(
            provider,
            Arc::clone(&self.store),
            self.settings.video.clone(),
        ));
        self
    }

    /// Start a new workflow.
    ///
    /// Input is validated before any state is created; a rejected request
    /// leaves nothing behind.
    #[instrument(skip(self, config), fields(owner = %owner, name = %name))]
    pub async fn start(
        &self,
        owner: &str,
        name: &str,
        config: WorkflowConfig,
    ) -> VasariResult<WorkflowExecution> {
        validate_config(&config)?;
        let workflow = WorkflowExecution::new(owner, name, config);
        self.store.create_workflow(&workflow).await?;
        info!(workflow_id = %workflow.id, "Workflow created");
        Ok(workflow)
    }

    /// Run one re-entrant step of the workflow.
    ///
    /// Returns the status after the step. `AwaitingApproval` and terminal
    /// states are no-ops; `VideoGeneration` performs a single poll and asks
    /// to be rescheduled by returning the same status.
    #[instrument(skip(self), fields(workflow_id = %id))]
    pub async fn advance(&self, id: Uuid) -> VasariResult<WorkflowStatus> {
        let workflow = self.store.get_workflow(id).await?;
        match workflow.status {
            WorkflowStatus::Pending => {
                self.store
                    .transition(
                        id,
                        WorkflowStatus::Pending,
                        StageTransition::to(WorkflowStatus::Researching),
                    )
                    .await?;
                Ok(WorkflowStatus::Researching)
            }
            WorkflowStatus::Researching => self.stage_research(&workflow).await,
            WorkflowStatus::Analyzing => self.stage_analysis(&workflow).await,
            WorkflowStatus::ScriptGeneration => self.stage_script(&workflow).await,
            WorkflowStatus::VideoGeneration => self.stage_video(&workflow).await,
            WorkflowStatus::AwaitingApproval => Ok(WorkflowStatus::AwaitingApproval),
            WorkflowStatus::Approved => {
                self.store
                    .transition(
                        id,
                        WorkflowStatus::Approved,
                        StageTransition::to(WorkflowStatus::Publishing),
                    )
                    .await?;
                Ok(WorkflowStatus::Publishing)
            }
            WorkflowStatus::Publishing => self.stage_publish(&workflow).await,
            terminal => Ok(terminal),
        }
    }

    /// Advance until the workflow parks at the approval gate or terminates.
    pub async fn run_to_approval(&self, id: Uuid) -> VasariResult<WorkflowStatus> {
        loop {
            let status = self.advance(id).await?;
            match status {
                WorkflowStatus::AwaitingApproval => return Ok(status),
                s if s.is_terminal() => return Ok(s),
                WorkflowStatus::VideoGeneration => {
                    tokio::time::sleep(self.settings.video.poll_interval).await;
                }
                _ => {}
            }
        }
    }

    /// Advance an approved workflow to its terminal state.
    pub async fn resume_after_approval(&self, id: Uuid) -> VasariResult<WorkflowExecution> {
        loop {
            let status = self.advance(id).await?;
            if status.is_terminal() || status == WorkflowStatus::AwaitingApproval {
                // Terminal, or still gated with nothing to resume.
                return self.store.get_workflow(id).await;
            }
            if status == WorkflowStatus::VideoGeneration {
                tokio::time::sleep(self.settings.video.poll_interval).await;
            }
        }
    }

    /// Resolve the pending approval for a workflow.
    ///
    /// Rejects double-resolution and approvals whose artifact no longer
    /// matches the one last generated. Rejection is terminal for the
    /// workflow; re-submission means starting a new workflow.
    #[instrument(skip(self, feedback), fields(approval_id = %approval_id, decision = %decision))]
    pub async fn resolve_approval(
        &self,
        approval_id: Uuid,
        decision: ApprovalDecision,
        approver: Option<String>,
        feedback: Option<String>,
    ) -> VasariResult<WorkflowExecution> {
        let approval = self.store.get_approval(approval_id).await?;
        if approval.status != ApprovalStatus::Pending {
            return Err(StaleStateError::new(StaleStateErrorKind::AlreadyResolved {
                approval_id: approval_id.to_string(),
                resolution: approval.status.to_string(),
            })
            .into());
        }

        let workflow = self.store.get_workflow(approval.workflow_id).await?;
        if workflow.status != WorkflowStatus::AwaitingApproval {
            return Err(StaleStateError::new(StaleStateErrorKind::TransitionConflict {
                workflow_id: workflow.id.to_string(),
                expected: WorkflowStatus::AwaitingApproval.to_string(),
                found: workflow.status.to_string(),
            })
            .into());
        }

        if decision == ApprovalDecision::Approve {
            // Stale-approval protection: the artifact must still be the one
            // the approval was requested for.
            let script = self.require_script(workflow.id).await?;
            let video_url = self.completed_video_url(workflow.id).await?;
            let current = artifact_hash(&script.title, &script.content, video_url.as_deref());
            if current != approval.artifact_hash {
                return Err(StaleStateError::new(StaleStateErrorKind::ArtifactChanged).into());
            }
        }

        let resolution = match decision {
            ApprovalDecision::Approve => ApprovalStatus::Approved,
            ApprovalDecision::Reject => ApprovalStatus::Rejected,
        };
        self.store
            .resolve_approval(approval_id, resolution, approver, feedback, Utc::now())
            .await?;

        let to = match decision {
            ApprovalDecision::Approve => WorkflowStatus::Approved,
            ApprovalDecision::Reject => WorkflowStatus::Rejected,
        };
        let workflow = self
            .store
            .transition(workflow.id, WorkflowStatus::AwaitingApproval, StageTransition::to(to))
            .await?;
        info!(workflow_id = %workflow.id, status = %workflow.status, "Approval resolved");
        Ok(workflow)
    }

    /// Cancel a workflow in any non-terminal state.
    ///
    /// Future stage invocations stop; external jobs already dispatched are
    /// left to finish on the provider side and their results are discarded
    /// on arrival.
    #[instrument(skip(self), fields(workflow_id = %id))]
    pub async fn cancel(&self, id: Uuid) -> VasariResult<WorkflowExecution> {
        let workflow = self.store.get_workflow(id).await?;
        if workflow.status.is_terminal() {
            return Err(StaleStateError::new(StaleStateErrorKind::TransitionConflict {
                workflow_id: id.to_string(),
                expected: "any non-terminal status".to_string(),
                found: workflow.status.to_string(),
            })
            .into());
        }
        self.store
            .transition(
                id,
                workflow.status,
                StageTransition::to(WorkflowStatus::Cancelled),
            )
            .await
    }

    /// Fetch a workflow.
    pub async fn get(&self, id: Uuid) -> VasariResult<WorkflowExecution> {
        self.store.get_workflow(id).await
    }

    /// List workflows, newest first.
    pub async fn list(&self, filter: &WorkflowFilter) -> VasariResult<Vec<WorkflowExecution>> {
        self.store.list_workflows(filter).await
    }

    /// Delete a workflow and everything it owns.
    pub async fn delete(&self, id: Uuid) -> VasariResult<()> {
        self.store.delete_workflow(id).await
    }

    /// The workflow's pending approval, if it is parked at the gate.
    pub async fn pending_approval(&self, workflow_id: Uuid) -> VasariResult<Option<WorkflowApproval>> {
        self.store.pending_approval(workflow_id).await
    }

    /// Refresh engagement counters on every published record of a workflow.
    ///
    /// Best-effort: a provider failure logs a warning and leaves that
    /// record's counters unchanged. Never touches workflow status.
    #[instrument(skip(self), fields(workflow_id = %workflow_id))]
    pub async fn refresh_engagement(&self, workflow_id: Uuid) -> VasariResult<()> {
        let records = self.store.publications(workflow_id).await?;
        for record in records
            .iter()
            .filter(|r| r.status == PublicationStatus::Published)
        {
            match self.dispatcher.refresh_engagement(record).await {
                Ok(engagement) => {
                    self.store.update_engagement(record.id, engagement).await?;
                }
                Err(e) => {
                    warn!(platform = %record.platform, error = %e, "Engagement refresh failed");
                }
            }
        }
        Ok(())
    }

    //
    // ─── STAGES ─────────────────────────────────────────────────────────────
    //

    async fn stage_research(&self, workflow: &WorkflowExecution) -> VasariResult<WorkflowStatus> {
        let id = workflow.id;
        let config = &workflow.config;

        // Re-invocation of a completed stage is a no-op over the stored
        // artifact.
        if let Some(session) = self.store.research_session(id).await? {
            if session.status == ResearchSessionStatus::Completed {
                self.store
                    .transition(
                        id,
                        WorkflowStatus::Researching,
                        StageTransition::to(WorkflowStatus::Analyzing),
                    )
                    .await?;
                return Ok(WorkflowStatus::Analyzing);
            }
        }

        let mut session = ResearchSession::new(
            Some(id),
            config.sources().clone(),
            config.topic().clone(),
            *config.max_items(),
            *config.depth(),
        );
        session.status = ResearchSessionStatus::Running;
        self.store.insert_research_session(&session).await?;

        match self
            .aggregator
            .collect(config.sources(), config.topic(), *config.max_items(), *config.depth())
            .await
        {
            Ok(items) => {
                session.results_count = items.len() as u32;
                session.raw_data = items;
                session.status = ResearchSessionStatus::Completed;
                self.store.update_research_session(&session).await?;
                self.store
                    .transition(
                        id,
                        WorkflowStatus::Researching,
                        StageTransition::to(WorkflowStatus::Analyzing),
                    )
                    .await?;
                Ok(WorkflowStatus::Analyzing)
            }
            Err(e) => {
                session.status = ResearchSessionStatus::Failed;
                session.error_message = Some(e.to_string());
                self.store.update_research_session(&session).await?;
                self.fail(id, WorkflowStatus::Researching, format!("research stage failed: {e}"))
                    .await?;
                Err(e)
            }
        }
    }

    async fn stage_analysis(&self, workflow: &WorkflowExecution) -> VasariResult<WorkflowStatus> {
        let id = workflow.id;
        let mut session = self
            .store
            .research_session(id)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("research session for workflow {id}")))?;

        if session.insights.is_none() {
            match self
                .insights
                .synthesize(
                    workflow.config.topic(),
                    &session.raw_data,
                    *workflow.config.depth(),
                    workflow.config.model().as_deref(),
                )
                .await
            {
                Ok(set) => {
                    session.insights = Some(set);
                    self.store.update_research_session(&session).await?;
                }
                Err(e) => {
                    self.fail(id, WorkflowStatus::Analyzing, format!("analysis stage failed: {e}"))
                        .await?;
                    return Err(e);
                }
            }
        }

        self.store
            .transition(
                id,
                WorkflowStatus::Analyzing,
                StageTransition::to(WorkflowStatus::ScriptGeneration),
            )
            .await?;
        Ok(WorkflowStatus::ScriptGeneration)
    }

    async fn stage_script(&self, workflow: &WorkflowExecution) -> VasariResult<WorkflowStatus> {
        let id = workflow.id;
        let config = &workflow.config;

        if self.store.latest_script(id).await?.is_none() {
            let session = self.store.research_session(id).await?;
            let insights = session.as_ref().and_then(|s| s.insights.clone());
            let params = ScriptParams {
                content_type: *config.content_type(),
                platforms: config.platforms().clone(),
                tone: config.tone().clone(),
                audience: config.audience().clone(),
                target_duration_secs: *config.target_duration_secs(),
                model: config.model().clone(),
            };

            match self.writer.write(config.topic(), insights.as_ref(), &params).await {
                Ok(draft) => {
                    let score = self.writer.score(&draft, insights.as_ref());
                    let script = ScriptGeneration::from_draft(
                        draft,
                        Some(id),
                        session.map(|s| s.id),
                        config
                            .model()
                            .clone()
                            .unwrap_or_else(|| self.driver.model_name().to_string()),
                        config.audience().clone(),
                        config.tone().clone(),
                        *config.target_duration_secs(),
                        score,
                    );
                    self.store.insert_script(&script).await?;
                }
                Err(e) => {
                    self.fail(
                        id,
                        WorkflowStatus::ScriptGeneration,
                        format!("script generation failed: {e}"),
                    )
                    .await?;
                    return Err(e);
                }
            }
        }

        if *config.video_requested() {
            self.store
                .transition(
                    id,
                    WorkflowStatus::ScriptGeneration,
                    StageTransition::to(WorkflowStatus::VideoGeneration),
                )
                .await?;
            Ok(WorkflowStatus::VideoGeneration)
        } else {
            self.enter_gate_or_publish(workflow, WorkflowStatus::ScriptGeneration, None)
                .await
        }
    }

    async fn stage_video(&self, workflow: &WorkflowExecution) -> VasariResult<WorkflowStatus> {
        let id = workflow.id;

        let Some(video) = &self.video else {
            let message = "video generation failed: no video provider attached".to_string();
            self.fail(id, WorkflowStatus::VideoGeneration, message.clone()).await?;
            return Err(ConfigError::new(message).into());
        };

        // Terminal tasks short-circuit the stage on re-entry.
        if let Some(task) = self.store.latest_video_task(id).await? {
            match task.status {
                VideoTaskStatus::Completed => {
                    return self
                        .enter_gate_or_publish(workflow, WorkflowStatus::VideoGeneration, task.video_url)
                        .await;
                }
                VideoTaskStatus::Failed => {
                    return self.fail_video(id, video, &task.error_message).await;
                }
                _ => {}
            }
        }

        let script = self.require_script(id).await?;
        let avatar = workflow.config.avatar().clone().ok_or_else(|| {
            ValidationError::new("avatar selection is required when video is requested")
        })?;

        let task = match video.ensure_submitted(id, &script.content, avatar).await {
            Ok(task) => task,
            Err(e) => {
                self.fail(
                    id,
                    WorkflowStatus::VideoGeneration,
                    format!("video generation failed: {e}"),
                )
                .await?;
                return Err(e);
            }
        };

        match video.poll_step(&task).await? {
            VideoPoll::Pending(_) => Ok(WorkflowStatus::VideoGeneration),
            VideoPoll::Completed(task) => {
                self.enter_gate_or_publish(workflow, WorkflowStatus::VideoGeneration, task.video_url)
                    .await
            }
            VideoPoll::Failed(task) => self.fail_video(id, video, &task.error_message).await,
        }
    }

    async fn stage_publish(&self, workflow: &WorkflowExecution) -> VasariResult<WorkflowStatus> {
        let id = workflow.id;
        let config = &workflow.config;
        let script = self.require_script(id).await?;
        let video_url = self.completed_video_url(id).await?;

        // Re-entry dispatches only the targets without a record yet, so a
        // crash mid-fan-out cannot double-post.
        let existing = self.store.publications(id).await?;
        let attempted: HashSet<Platform> = existing.iter().map(|r| r.platform).collect();
        let remaining: Vec<Platform> = config
            .platforms()
            .iter()
            .copied()
            .filter(|p| !attempted.contains(p))
            .collect();

        if !remaining.is_empty() {
            let media: Vec<String> = video_url.iter().cloned().collect();
            let records = self
                .dispatcher
                .dispatch(id, &script.title, &script.content, &media, &remaining, *config.timing())
                .await?;
            for record in &records {
                self.store.insert_publication(record).await?;
            }
        }

        let publications = self.store.publications(id).await?;
        let results = WorkflowResults {
            title: script.title,
            content: script.content,
            content_type: script.content_type,
            video_url,
            publications,
        };
        self.store
            .transition(id, WorkflowStatus::Publishing, StageTransition::completed(results))
            .await?;
        info!(workflow_id = %id, "Workflow completed");
        Ok(WorkflowStatus::Completed)
    }

    //
    // ─── HELPERS ────────────────────────────────────────────────────────────
    //

    /// Park the workflow at the approval gate, or go straight to publishing
    /// for unattended pipelines.
    async fn enter_gate_or_publish(
        &self,
        workflow: &WorkflowExecution,
        from: WorkflowStatus,
        video_url: Option<String>,
    ) -> VasariResult<WorkflowStatus> {
        let id = workflow.id;
        if *workflow.config.require_approval() {
            // The approval record exists before the status says so.
            if self.store.pending_approval(id).await?.is_none() {
                let script = self.require_script(id).await?;
                let approval =
                    WorkflowApproval::new(id, script.title, script.content, video_url);
                self.store.insert_approval(&approval).await?;
            }
            self.store
                .transition(id, from, StageTransition::to(WorkflowStatus::AwaitingApproval))
                .await?;
            Ok(WorkflowStatus::AwaitingApproval)
        } else {
            self.store
                .transition(id, from, StageTransition::to(WorkflowStatus::Publishing))
                .await?;
            Ok(WorkflowStatus::Publishing)
        }
    }

    async fn fail(&self, id: Uuid, from: WorkflowStatus, message: String) -> VasariResult<()> {
        warn!(workflow_id = %id, stage = %from, message = %message, "Stage failed");
        self.store
            .transition(id, from, StageTransition::failed(message))
            .await?;
        Ok(())
    }

    /// Fail the video stage, keeping timeouts distinguishable from provider
    /// errors so callers know a resubmission is sensible.
    async fn fail_video(
        &self,
        id: Uuid,
        video: &VideoOrchestrator,
        reason: &Option<String>,
    ) -> VasariResult<WorkflowStatus> {
        let reason = reason.clone().unwrap_or_else(|| "render failed".to_string());
        self.fail(
            id,
            WorkflowStatus::VideoGeneration,
            format!("video generation failed: {reason}"),
        )
        .await?;

        let err: VasariError = if reason.starts_with("timeout:") {
            TimeoutError::new("video render", self.settings.video.render_deadline.as_secs()).into()
        } else {
            ProviderError::new(video.provider_name(), ProviderErrorKind::JobFailed(reason)).into()
        };
        Err(err)
    }

    async fn require_script(&self, id: Uuid) -> VasariResult<ScriptGeneration> {
        self.store
            .latest_script(id)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("script for workflow {id}")).into())
    }

    async fn completed_video_url(&self, id: Uuid) -> VasariResult<Option<String>> {
        Ok(self
            .store
            .latest_video_task(id)
            .await?
            .filter(|t| t.status == VideoTaskStatus::Completed)
            .and_then(|t| t.video_url))
    }
}

fn validate_config(config: &WorkflowConfig) -> VasariResult<()> {
    if config.topic().trim().is_empty() {
        return Err(ValidationError::new("topic cannot be empty").into());
    }
    if config.platforms().is_empty() {
        return Err(ValidationError::new("at least one target platform is required").into());
    }
    if config.sources().is_empty() {
        return Err(ValidationError::new("at least one research source is required").into());
    }
    if *config.video_requested() && config.avatar().is_none() {
        return Err(
            ValidationError::new("avatar selection is required when video is requested").into(),
        );
    }
    Ok(())
}
