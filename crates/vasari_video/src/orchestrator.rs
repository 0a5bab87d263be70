//! Submission and resumable polling against the render provider.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};
use uuid::Uuid;
use vasari_core::{AvatarSelection, VideoGenerationTask, VideoTaskStatus};
use vasari_error::{CancelledError, TimeoutError, VasariResult};
use vasari_interface::{RenderState, VideoRenderRequest, VideoSynthesizer};
use vasari_store::WorkflowStore;

/// Tuning for the video orchestration layer.
#[derive(Debug, Clone)]
pub struct VideoConfig {
    /// Bound on each submit/status call to the provider
    pub call_timeout: Duration,
    /// Suggested delay between polls (used by [`VideoOrchestrator::await_completion`])
    pub poll_interval: Duration,
    /// Wall-clock deadline for the whole render, measured from submission
    pub render_deadline: Duration,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(15),
            poll_interval: Duration::from_secs(5),
            // Generous enough for multi-minute renders.
            render_deadline: Duration::from_secs(900),
        }
    }
}

/// Outcome of one resumable polling step.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoPoll {
    /// Provider still rendering; re-invoke after the poll interval
    Pending(VideoGenerationTask),
    /// Asset ready
    Completed(VideoGenerationTask),
    /// Render failed or the deadline passed
    Failed(VideoGenerationTask),
}

/// Drives one workflow's render against the provider through the store.
///
/// The store enforces at most one non-terminal task per workflow, so
/// re-entering submission after a crash can never double-submit a billed
/// render: the reserved task row is found and reused instead.
pub struct VideoOrchestrator {
    provider: Arc<dyn VideoSynthesizer>,
    store: Arc<dyn WorkflowStore>,
    config: VideoConfig,
}

impl VideoOrchestrator {
    /// Create an orchestrator over the given provider and store.
    pub fn new(
        provider: Arc<dyn VideoSynthesizer>,
        store: Arc<dyn WorkflowStore>,
        config: VideoConfig,
    ) -> Self {
        Self {
            provider,
            store,
            config,
        }
    }

    /// The configured poll interval.
    pub fn poll_interval(&self) -> Duration {
        self.config.poll_interval
    }

    /// Name of the underlying render provider, for error attribution.
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Ensure the workflow has a submitted render task, submitting if needed.
    ///
    /// Idempotent: an outstanding task is returned as-is; an outstanding task
    /// whose submission was interrupted before the provider assigned an id is
    /// submitted now. A fresh task row is inserted *before* the provider call
    /// so the single-task invariant is reserved atomically.
    #[instrument(skip(self, script, avatar), fields(workflow_id = %workflow_id))]
    pub async fn ensure_submitted(
        &self,
        workflow_id: Uuid,
        script: &str,
        avatar: AvatarSelection,
    ) -> VasariResult<VideoGenerationTask> {
        if let Some(task) = self.store.active_video_task(workflow_id).await? {
            return if task.provider_task_id.is_some() {
                tracing::debug!(task_id = %task.id, "Reusing outstanding render task");
                Ok(task)
            } else {
                // Crash landed between the row insert and the provider call;
                // no provider job exists yet, so submitting is safe.
                self.submit(task).await
            };
        }

        let task = VideoGenerationTask::new(workflow_id, script, avatar);
        self.store.insert_video_task(&task).await?;
        self.submit(task).await
    }

    async fn submit(&self, mut task: VideoGenerationTask) -> VasariResult<VideoGenerationTask> {
        let request = VideoRenderRequest {
            script: task.script.clone(),
            avatar: task.avatar.clone(),
        };

        let submitted = tokio::time::timeout(self.config.call_timeout, self.provider.submit(&request))
            .await
            .map_err(|_| {
                vasari_error::VasariError::from(TimeoutError::new("video render submit", self.config.call_timeout.as_secs()))
            })
            .and_then(|inner| inner);

        match submitted {
            Ok(provider_task_id) => {
                tracing::info!(
                    task_id = %task.id,
                    provider_task_id = %provider_task_id,
                    "Render submitted"
                );
                task.provider_task_id = Some(provider_task_id);
                self.store.update_video_task(&task).await?;
                Ok(task)
            }
            Err(e) => {
                // Submission never reached the provider; close the task so
                // the single-task slot is released for a retry.
                task.status = VideoTaskStatus::Failed;
                task.error_message = Some(e.to_string());
                self.store.update_video_task(&task).await?;
                Err(e)
            }
        }
    }

    /// One resumable polling step.
    ///
    /// Re-reads the provider state, persists it together with
    /// `last_polled_at`, and reports whether the caller should reschedule.
    /// If the workflow has meanwhile reached a terminal state (cancellation),
    /// the provider result is discarded and nothing is persisted. Exceeding
    /// the wall-clock deadline marks the task failed with a distinguishable
    /// timeout reason so callers can retry submission rather than assume a
    /// permanent provider error.
    #[instrument(skip(self, task), fields(task_id = %task.id, workflow_id = %task.workflow_id))]
    pub async fn poll_step(&self, task: &VideoGenerationTask) -> VasariResult<VideoPoll> {
        let mut task = task.clone();

        if task.status.is_terminal() {
            return Ok(match task.status {
                VideoTaskStatus::Completed => VideoPoll::Completed(task),
                _ => VideoPoll::Failed(task),
            });
        }

        let workflow = self.store.get_workflow(task.workflow_id).await?;
        if workflow.status.is_terminal() {
            // Late result for a dead workflow; discard on arrival.
            warn!(status = %workflow.status, "Discarding render poll for terminal workflow");
            return Err(CancelledError::new(task.workflow_id.to_string()).into());
        }

        let elapsed = Utc::now().signed_duration_since(task.submitted_at);
        if elapsed.num_seconds() >= self.config.render_deadline.as_secs() as i64 {
            task.status = VideoTaskStatus::Failed;
            task.error_message = Some(format!(
                "timeout: render exceeded the {}s deadline",
                self.config.render_deadline.as_secs()
            ));
            task.last_polled_at = Some(Utc::now());
            self.store.update_video_task(&task).await?;
            return Ok(VideoPoll::Failed(task));
        }

        let Some(provider_task_id) = task.provider_task_id.clone() else {
            // Not yet submitted; nothing to poll.
            return Ok(VideoPoll::Pending(task));
        };

        let status = tokio::time::timeout(
            self.config.call_timeout,
            self.provider.status(&provider_task_id),
        )
        .await
        .map_err(|_| {
            vasari_error::VasariError::from(TimeoutError::new(
                "video render poll",
                self.config.call_timeout.as_secs(),
            ))
        })
        .and_then(|inner| inner);

        let status = match status {
            Ok(status) => status,
            Err(e) if e.is_transient() => {
                // One flaky status call is not a failed render; the deadline
                // bounds how long we keep trying.
                warn!(error = %e, "Transient poll failure, keeping task pending");
                task.last_polled_at = Some(Utc::now());
                self.store.update_video_task(&task).await?;
                return Ok(VideoPoll::Pending(task));
            }
            Err(e) => return Err(e),
        };

        task.last_polled_at = Some(Utc::now());
        match status.state {
            RenderState::Processing => {
                task.status = VideoTaskStatus::Processing;
                self.store.update_video_task(&task).await?;
                Ok(VideoPoll::Pending(task))
            }
            RenderState::Completed => {
                task.status = VideoTaskStatus::Completed;
                task.video_url = status.video_url;
                task.thumbnail_url = status.thumbnail_url;
                task.duration_secs = status.duration_secs;
                self.store.update_video_task(&task).await?;
                tracing::info!(task_id = %task.id, "Render completed");
                Ok(VideoPoll::Completed(task))
            }
            RenderState::Failed => {
                task.status = VideoTaskStatus::Failed;
                task.error_message = Some(
                    status
                        .error
                        .unwrap_or_else(|| "provider reported failure without detail".to_string()),
                );
                self.store.update_video_task(&task).await?;
                Ok(VideoPoll::Failed(task))
            }
        }
    }

    /// Poll until the task reaches a terminal state.
    ///
    /// Convenience driver over [`VideoOrchestrator::poll_step`] for callers
    /// that want to wait in-process; the deadline in the poll step bounds the
    /// loop.
    #[instrument(skip(self), fields(workflow_id = %workflow_id))]
    pub async fn await_completion(&self, workflow_id: Uuid) -> VasariResult<VideoGenerationTask> {
        loop {
            let task = self
                .store
                .latest_video_task(workflow_id)
                .await?
                .ok_or_else(|| {
                    vasari_error::StoreError::not_found(format!(
                        "video task for workflow {workflow_id}"
                    ))
                })?;

            match self.poll_step(&task).await? {
                VideoPoll::Completed(task) | VideoPoll::Failed(task) => return Ok(task),
                VideoPoll::Pending(_) => {
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }
    }
}
