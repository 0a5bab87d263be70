use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use vasari_core::{
    AspectRatio, AvatarSelection, Platform, ResearchSource, VideoTaskStatus,
    WorkflowConfigBuilder, WorkflowExecution, WorkflowStatus,
};
use vasari_error::VasariResult;
use vasari_interface::{RenderState, VideoRenderRequest, VideoRenderStatus, VideoSynthesizer};
use vasari_store::{InMemoryWorkflowStore, StageTransition, WorkflowStore};
use vasari_video::{VideoConfig, VideoOrchestrator, VideoPoll};

/// Provider that replays a scripted sequence of render states.
struct ScriptedSynthesizer {
    submissions: Mutex<usize>,
    states: Mutex<Vec<RenderState>>,
}

impl ScriptedSynthesizer {
    fn new(states: Vec<RenderState>) -> Arc<Self> {
        Arc::new(Self {
            submissions: Mutex::new(0),
            states: Mutex::new(states.into_iter().rev().collect()),
        })
    }

    fn submissions(&self) -> usize {
        *self.submissions.lock().unwrap()
    }
}

#[async_trait]
impl VideoSynthesizer for ScriptedSynthesizer {
    async fn submit(&self, _req: &VideoRenderRequest) -> VasariResult<String> {
        let mut count = self.submissions.lock().unwrap();
        *count += 1;
        Ok(format!("render-{count}"))
    }

    async fn status(&self, _task_id: &str) -> VasariResult<VideoRenderStatus> {
        let state = self
            .states
            .lock()
            .unwrap()
            .pop()
            .expect("scripted synthesizer ran out of states");
        Ok(VideoRenderStatus {
            state,
            video_url: matches!(state, RenderState::Completed)
                .then(|| "https://cdn.example/video.mp4".to_string()),
            thumbnail_url: None,
            duration_secs: Some(31.5),
            error: matches!(state, RenderState::Failed).then(|| "render exploded".to_string()),
        })
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

fn avatar() -> AvatarSelection {
    AvatarSelection {
        avatar_id: "ava-1".to_string(),
        voice_id: "voice-1".to_string(),
        aspect_ratio: AspectRatio::Portrait,
    }
}

async fn seeded_store() -> (Arc<InMemoryWorkflowStore>, WorkflowExecution) {
    let store = Arc::new(InMemoryWorkflowStore::new());
    let config = WorkflowConfigBuilder::default()
        .topic("ai agents")
        .platforms(vec![Platform::Tiktok])
        .sources(vec![ResearchSource::TechNews])
        .video_requested(true)
        .build()
        .unwrap();
    let workflow = WorkflowExecution::new("tester", "video-test", config);
    store.create_workflow(&workflow).await.unwrap();
    (store, workflow)
}

fn config() -> VideoConfig {
    VideoConfig {
        call_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(1),
        render_deadline: Duration::from_secs(600),
    }
}

#[tokio::test]
async fn processing_then_completed_is_monotonic_with_one_submission() {
    let (store, workflow) = seeded_store().await;
    let provider = ScriptedSynthesizer::new(vec![
        RenderState::Processing,
        RenderState::Processing,
        RenderState::Completed,
    ]);
    let orchestrator = VideoOrchestrator::new(provider.clone(), store.clone(), config());

    let task = orchestrator
        .ensure_submitted(workflow.id, "say something smart", avatar())
        .await
        .unwrap();
    assert_eq!(task.status, VideoTaskStatus::Pending);

    let mut seen = vec![task.status];
    let mut current = task;
    let done = loop {
        match orchestrator.poll_step(&current).await.unwrap() {
            VideoPoll::Pending(task) => {
                seen.push(task.status);
                current = task;
            }
            VideoPoll::Completed(task) => {
                seen.push(task.status);
                break task;
            }
            VideoPoll::Failed(task) => panic!("unexpected failure: {:?}", task.error_message),
        }
    };

    assert_eq!(
        seen,
        vec![
            VideoTaskStatus::Pending,
            VideoTaskStatus::Processing,
            VideoTaskStatus::Processing,
            VideoTaskStatus::Completed
        ]
    );
    assert_eq!(done.video_url.as_deref(), Some("https://cdn.example/video.mp4"));
    assert_eq!(provider.submissions(), 1);
}

#[tokio::test]
async fn resubmission_reuses_the_outstanding_task() {
    let (store, workflow) = seeded_store().await;
    let provider = ScriptedSynthesizer::new(vec![RenderState::Processing]);
    let orchestrator = VideoOrchestrator::new(provider.clone(), store, config());

    let first = orchestrator
        .ensure_submitted(workflow.id, "script", avatar())
        .await
        .unwrap();
    let second = orchestrator
        .ensure_submitted(workflow.id, "script", avatar())
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(provider.submissions(), 1);
}

#[tokio::test]
async fn provider_failure_marks_the_task_failed() {
    let (store, workflow) = seeded_store().await;
    let provider = ScriptedSynthesizer::new(vec![RenderState::Failed]);
    let orchestrator = VideoOrchestrator::new(provider, store, config());

    orchestrator
        .ensure_submitted(workflow.id, "script", avatar())
        .await
        .unwrap();
    let done = orchestrator.await_completion(workflow.id).await.unwrap();

    assert_eq!(done.status, VideoTaskStatus::Failed);
    assert_eq!(done.error_message.as_deref(), Some("render exploded"));
}

#[tokio::test]
async fn deadline_overrun_fails_with_a_timeout_reason() {
    let (store, workflow) = seeded_store().await;
    let provider = ScriptedSynthesizer::new(vec![RenderState::Processing]);
    let mut cfg = config();
    cfg.render_deadline = Duration::from_secs(0);
    let orchestrator = VideoOrchestrator::new(provider, store, cfg);

    let task = orchestrator
        .ensure_submitted(workflow.id, "script", avatar())
        .await
        .unwrap();
    let poll = orchestrator.poll_step(&task).await.unwrap();

    match poll {
        VideoPoll::Failed(task) => {
            assert_eq!(task.status, VideoTaskStatus::Failed);
            assert!(task.error_message.unwrap().starts_with("timeout:"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn late_results_for_cancelled_workflows_are_discarded() {
    let (store, workflow) = seeded_store().await;
    let provider = ScriptedSynthesizer::new(vec![RenderState::Completed]);
    let orchestrator = VideoOrchestrator::new(provider, store.clone(), config());

    let task = orchestrator
        .ensure_submitted(workflow.id, "script", avatar())
        .await
        .unwrap();

    store
        .transition(
            workflow.id,
            WorkflowStatus::Pending,
            StageTransition::to(WorkflowStatus::Cancelled),
        )
        .await
        .unwrap();

    let err = orchestrator.poll_step(&task).await.unwrap_err();
    assert!(matches!(
        err.kind(),
        vasari_error::VasariErrorKind::Cancelled(_)
    ));

    // The provider result never reached the store.
    let stored = store.latest_video_task(workflow.id).await.unwrap().unwrap();
    assert_eq!(stored.status, VideoTaskStatus::Pending);
}
