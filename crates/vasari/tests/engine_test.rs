//! End-to-end engine tests over scripted fake providers and the in-memory
//! store.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use vasari::{
    AnalysisDepth, ApprovalDecision, AspectRatio, AvatarSelection, Engagement, EngineSettings,
    GenerateRequest, GenerateResponse, InMemoryWorkflowStore, Platform, PostReceipt, PostRequest,
    PublicationStatus, PublishConfig, PublishDispatcher, RawItem, RenderState,
    ResearchAggregator, ResearchConfig, ResearchProvider, ResearchSessionStatus, ResearchSource,
    ScriptGeneration, SocialPublisher, VasariDriver, VasariErrorKind, VasariResult, VideoConfig,
    VideoRenderRequest, VideoRenderStatus, VideoSynthesizer, WorkflowConfig,
    WorkflowConfigBuilder, WorkflowEngine, WorkflowStatus, WorkflowStore,
};

const INSIGHTS_JSON: &str = "{\"summary\": \"agents dominate the discussion\", \
     \"themes\": [\"automation\", \"tooling\"], \"recommendations\": [\"lead with a demo\"]}";
const SCRIPT_JSON: &str =
    "{\"title\": \"Agents are coming\", \"content\": \"Hook, three beats, call to action.\"}";

//
// ─── FAKES ──────────────────────────────────────────────────────────────────
//

struct SeqDriver {
    responses: Mutex<VecDeque<String>>,
}

impl SeqDriver {
    fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
        })
    }

    fn pipeline() -> Arc<Self> {
        Self::new(&[INSIGHTS_JSON, SCRIPT_JSON])
    }
}

#[async_trait]
impl VasariDriver for SeqDriver {
    async fn generate(&self, _req: &GenerateRequest) -> VasariResult<GenerateResponse> {
        let text = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("driver ran out of scripted responses");
        Ok(GenerateResponse {
            text,
            model: "fake-model".to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake_text"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}

struct GoodSource {
    source: ResearchSource,
    calls: AtomicUsize,
}

#[async_trait]
impl ResearchProvider for GoodSource {
    async fn collect(
        &self,
        query: &str,
        _max_items: u32,
        _depth: AnalysisDepth,
    ) -> VasariResult<Vec<RawItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![RawItem {
            source: self.source,
            title: format!("item about {query}"),
            url: None,
            author: None,
            score: Some(100),
            summary: None,
            published_at: None,
        }])
    }

    fn source(&self) -> ResearchSource {
        self.source
    }
}

struct DeadSource {
    source: ResearchSource,
}

#[async_trait]
impl ResearchProvider for DeadSource {
    async fn collect(
        &self,
        _query: &str,
        _max_items: u32,
        _depth: AnalysisDepth,
    ) -> VasariResult<Vec<RawItem>> {
        Err(vasari::ProviderError::new(
            self.source.to_string(),
            vasari::ProviderErrorKind::Auth("source unreachable".into()),
        )
        .into())
    }

    fn source(&self) -> ResearchSource {
        self.source
    }
}

struct GoodPublisher {
    platform: Platform,
}

#[async_trait]
impl SocialPublisher for GoodPublisher {
    async fn post(&self, _req: &PostRequest) -> VasariResult<PostReceipt> {
        Ok(PostReceipt {
            platform_post_id: format!("{}-1", self.platform),
            platform: self.platform,
            scheduled_for: None,
            engagement: None,
        })
    }

    async fn fetch_engagement(&self, _platform_post_id: &str) -> VasariResult<Engagement> {
        Ok(Engagement::default())
    }

    fn platform(&self) -> Platform {
        self.platform
    }
}

struct BrokenPublisher {
    platform: Platform,
}

#[async_trait]
impl SocialPublisher for BrokenPublisher {
    async fn post(&self, _req: &PostRequest) -> VasariResult<PostReceipt> {
        Err(vasari::ProviderError::new(
            self.platform.to_string(),
            vasari::ProviderErrorKind::Http {
                status: 502,
                message: "gateway exploded".into(),
            },
        )
        .into())
    }

    async fn fetch_engagement(&self, _platform_post_id: &str) -> VasariResult<Engagement> {
        Ok(Engagement::default())
    }

    fn platform(&self) -> Platform {
        self.platform
    }
}

struct FakeRenderer {
    submissions: AtomicUsize,
    states: Mutex<VecDeque<RenderState>>,
}

impl FakeRenderer {
    fn new(states: &[RenderState]) -> Arc<Self> {
        Arc::new(Self {
            submissions: AtomicUsize::new(0),
            states: Mutex::new(states.iter().copied().collect()),
        })
    }
}

#[async_trait]
impl VideoSynthesizer for FakeRenderer {
    async fn submit(&self, _req: &VideoRenderRequest) -> VasariResult<String> {
        let n = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("job-{n}"))
    }

    async fn status(&self, _task_id: &str) -> VasariResult<VideoRenderStatus> {
        let state = self
            .states
            .lock()
            .unwrap()
            .pop_front()
            .expect("renderer ran out of scripted states");
        Ok(VideoRenderStatus {
            state,
            video_url: matches!(state, RenderState::Completed)
                .then(|| "https://cdn.example/final.mp4".to_string()),
            thumbnail_url: None,
            duration_secs: Some(28.0),
            error: matches!(state, RenderState::Failed).then(|| "gpu on fire".to_string()),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake_render"
    }
}

//
// ─── WIRING ─────────────────────────────────────────────────────────────────
//

fn research_config() -> ResearchConfig {
    ResearchConfig {
        call_timeout: Duration::from_secs(5),
        retry_attempts: 1,
        retry_base_delay: Duration::from_millis(1),
    }
}

fn settings() -> EngineSettings {
    EngineSettings {
        synthesis_timeout: Duration::from_secs(5),
        video: VideoConfig {
            call_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(1),
            render_deadline: Duration::from_secs(60),
        },
    }
}

struct Harness {
    engine: WorkflowEngine,
    store: Arc<InMemoryWorkflowStore>,
}

fn harness(
    driver: Arc<SeqDriver>,
    sources: Vec<Arc<dyn ResearchProvider>>,
    publishers: Vec<Arc<dyn SocialPublisher>>,
    renderer: Option<Arc<FakeRenderer>>,
) -> Harness {
    let store = Arc::new(InMemoryWorkflowStore::new());

    let mut aggregator = ResearchAggregator::new(research_config());
    for source in sources {
        aggregator = aggregator.with_provider(source);
    }

    let mut dispatcher = PublishDispatcher::new(PublishConfig {
        call_timeout: Duration::from_secs(5),
        ..PublishConfig::default()
    });
    for publisher in publishers {
        dispatcher = dispatcher.with_publisher(publisher);
    }

    let mut engine = WorkflowEngine::new(
        store.clone(),
        driver,
        aggregator,
        dispatcher,
        settings(),
    );
    if let Some(renderer) = renderer {
        engine = engine.with_video_provider(renderer);
    }
    Harness { engine, store }
}

fn tech_news() -> Arc<dyn ResearchProvider> {
    Arc::new(GoodSource {
        source: ResearchSource::TechNews,
        calls: AtomicUsize::new(0),
    })
}

fn two_publishers() -> Vec<Arc<dyn SocialPublisher>> {
    vec![
        Arc::new(GoodPublisher {
            platform: Platform::Tiktok,
        }),
        Arc::new(GoodPublisher {
            platform: Platform::X,
        }),
    ]
}

fn config(platforms: Vec<Platform>, sources: Vec<ResearchSource>) -> WorkflowConfig {
    WorkflowConfigBuilder::default()
        .topic("AI automation")
        .platforms(platforms)
        .sources(sources)
        .build()
        .unwrap()
}

//
// ─── TESTS ──────────────────────────────────────────────────────────────────
//

#[tokio::test]
async fn full_pipeline_without_video_completes_with_results() {
    let h = harness(SeqDriver::pipeline(), vec![tech_news()], two_publishers(), None);

    let workflow = h
        .engine
        .start(
            "tester",
            "no-video",
            config(vec![Platform::Tiktok, Platform::X], vec![ResearchSource::TechNews]),
        )
        .await
        .unwrap();

    let status = h.engine.run_to_approval(workflow.id).await.unwrap();
    assert_eq!(status, WorkflowStatus::AwaitingApproval);
    assert_eq!(h.engine.get(workflow.id).await.unwrap().progress(), 90);

    let approval = h
        .engine
        .pending_approval(workflow.id)
        .await
        .unwrap()
        .expect("pending approval");
    h.engine
        .resolve_approval(
            approval.id,
            ApprovalDecision::Approve,
            Some("reviewer".into()),
            None,
        )
        .await
        .unwrap();

    let done = h.engine.resume_after_approval(workflow.id).await.unwrap();
    assert_eq!(done.status, WorkflowStatus::Completed);
    assert_eq!(done.progress(), 100);

    let results = done.results.expect("results");
    assert_eq!(results.title, "Agents are coming");
    assert!(!results.content.is_empty());
    assert!(results.video_url.is_none());
    assert_eq!(results.publications.len(), 2);
    assert!(
        results
            .publications
            .iter()
            .all(|p| p.status == PublicationStatus::Published)
    );
}

#[tokio::test]
async fn video_disabled_never_enters_the_video_state() {
    let h = harness(SeqDriver::pipeline(), vec![tech_news()], two_publishers(), None);
    let workflow = h
        .engine
        .start(
            "tester",
            "trace",
            config(vec![Platform::X], vec![ResearchSource::TechNews]),
        )
        .await
        .unwrap();

    let mut seen = vec![WorkflowStatus::Pending];
    loop {
        let status = h.engine.advance(workflow.id).await.unwrap();
        seen.push(status);
        if status == WorkflowStatus::AwaitingApproval || status.is_terminal() {
            break;
        }
    }

    assert!(!seen.contains(&WorkflowStatus::VideoGeneration));
    assert_eq!(
        seen,
        vec![
            WorkflowStatus::Pending,
            WorkflowStatus::Researching,
            WorkflowStatus::Analyzing,
            WorkflowStatus::ScriptGeneration,
            WorkflowStatus::AwaitingApproval,
        ]
    );
}

#[tokio::test]
async fn advancing_a_completed_workflow_is_a_no_op() {
    let h = harness(SeqDriver::pipeline(), vec![tech_news()], two_publishers(), None);
    let workflow = h
        .engine
        .start(
            "tester",
            "idempotent",
            config(vec![Platform::Tiktok, Platform::X], vec![ResearchSource::TechNews]),
        )
        .await
        .unwrap();

    h.engine.run_to_approval(workflow.id).await.unwrap();
    let approval = h
        .engine
        .pending_approval(workflow.id)
        .await
        .unwrap()
        .unwrap();
    h.engine
        .resolve_approval(approval.id, ApprovalDecision::Approve, None, None)
        .await
        .unwrap();
    h.engine.resume_after_approval(workflow.id).await.unwrap();

    let before = h.store.publications(workflow.id).await.unwrap().len();
    assert_eq!(h.engine.advance(workflow.id).await.unwrap(), WorkflowStatus::Completed);
    assert_eq!(h.engine.advance(workflow.id).await.unwrap(), WorkflowStatus::Completed);
    let after = h.store.publications(workflow.id).await.unwrap().len();

    assert_eq!(before, after);
    assert!(h.store.latest_video_task(workflow.id).await.unwrap().is_none());
}

#[tokio::test]
async fn resolving_an_already_resolved_approval_is_stale() {
    let h = harness(SeqDriver::pipeline(), vec![tech_news()], two_publishers(), None);
    let workflow = h
        .engine
        .start(
            "tester",
            "double-resolve",
            config(vec![Platform::X], vec![ResearchSource::TechNews]),
        )
        .await
        .unwrap();

    h.engine.run_to_approval(workflow.id).await.unwrap();
    let approval = h
        .engine
        .pending_approval(workflow.id)
        .await
        .unwrap()
        .unwrap();
    h.engine
        .resolve_approval(approval.id, ApprovalDecision::Approve, None, None)
        .await
        .unwrap();
    let settled = h.engine.resume_after_approval(workflow.id).await.unwrap();

    let err = h
        .engine
        .resolve_approval(approval.id, ApprovalDecision::Reject, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), VasariErrorKind::StaleState(_)));

    // The double-submit changed nothing.
    let unchanged = h.engine.get(workflow.id).await.unwrap();
    assert_eq!(unchanged.status, settled.status);
}

#[tokio::test]
async fn partial_publish_failure_still_completes_the_workflow() {
    let publishers: Vec<Arc<dyn SocialPublisher>> = vec![
        Arc::new(GoodPublisher {
            platform: Platform::Tiktok,
        }),
        Arc::new(GoodPublisher {
            platform: Platform::Youtube,
        }),
        Arc::new(BrokenPublisher {
            platform: Platform::X,
        }),
    ];
    let h = harness(SeqDriver::pipeline(), vec![tech_news()], publishers, None);
    let workflow = h
        .engine
        .start(
            "tester",
            "partial",
            config(
                vec![Platform::Tiktok, Platform::Youtube, Platform::X],
                vec![ResearchSource::TechNews],
            ),
        )
        .await
        .unwrap();

    h.engine.run_to_approval(workflow.id).await.unwrap();
    let approval = h
        .engine
        .pending_approval(workflow.id)
        .await
        .unwrap()
        .unwrap();
    h.engine
        .resolve_approval(approval.id, ApprovalDecision::Approve, None, None)
        .await
        .unwrap();
    let done = h.engine.resume_after_approval(workflow.id).await.unwrap();

    assert_eq!(done.status, WorkflowStatus::Completed);
    let records = h.store.publications(workflow.id).await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(
        records
            .iter()
            .filter(|r| r.status == PublicationStatus::Published)
            .count(),
        2
    );
    assert_eq!(
        records
            .iter()
            .filter(|r| r.status == PublicationStatus::Failed)
            .count(),
        1
    );
}

#[tokio::test]
async fn one_dead_source_of_two_still_yields_a_research_session() {
    let sources: Vec<Arc<dyn ResearchProvider>> = vec![
        Arc::new(DeadSource {
            source: ResearchSource::Forum,
        }),
        tech_news(),
    ];
    let h = harness(SeqDriver::pipeline(), sources, two_publishers(), None);
    let workflow = h
        .engine
        .start(
            "tester",
            "redundant",
            config(
                vec![Platform::X],
                vec![ResearchSource::Forum, ResearchSource::TechNews],
            ),
        )
        .await
        .unwrap();

    let status = h.engine.run_to_approval(workflow.id).await.unwrap();
    assert_eq!(status, WorkflowStatus::AwaitingApproval);

    let session = h.store.research_session(workflow.id).await.unwrap().unwrap();
    assert_eq!(session.status, ResearchSessionStatus::Completed);
    assert!(!session.raw_data.is_empty());
    assert!(session.results_count > 0);
}

#[tokio::test]
async fn single_unreachable_source_fails_session_and_workflow() {
    let sources: Vec<Arc<dyn ResearchProvider>> = vec![Arc::new(DeadSource {
        source: ResearchSource::Forum,
    })];
    let h = harness(SeqDriver::new(&[]), sources, two_publishers(), None);
    let workflow = h
        .engine
        .start(
            "tester",
            "dead-forum",
            config(vec![Platform::X], vec![ResearchSource::Forum]),
        )
        .await
        .unwrap();

    assert_eq!(
        h.engine.advance(workflow.id).await.unwrap(),
        WorkflowStatus::Researching
    );
    let err = h.engine.advance(workflow.id).await.unwrap_err();
    assert!(matches!(err.kind(), VasariErrorKind::Provider(_)));

    let session = h.store.research_session(workflow.id).await.unwrap().unwrap();
    assert_eq!(session.status, ResearchSessionStatus::Failed);

    let failed = h.engine.get(workflow.id).await.unwrap();
    assert_eq!(failed.status, WorkflowStatus::Failed);
    assert_eq!(failed.progress(), 0);
    let message = failed.error_message.expect("error message");
    assert!(message.contains("research stage failed"));
    assert!(message.contains("forum"));
}

#[tokio::test]
async fn video_pipeline_renders_once_and_carries_the_asset() {
    let renderer = FakeRenderer::new(&[
        RenderState::Processing,
        RenderState::Processing,
        RenderState::Completed,
    ]);
    let h = harness(
        SeqDriver::pipeline(),
        vec![tech_news()],
        two_publishers(),
        Some(renderer.clone()),
    );

    let config = WorkflowConfigBuilder::default()
        .topic("AI automation")
        .platforms(vec![Platform::Tiktok])
        .sources(vec![ResearchSource::TechNews])
        .video_requested(true)
        .avatar(Some(AvatarSelection {
            avatar_id: "ava-9".into(),
            voice_id: "voice-3".into(),
            aspect_ratio: AspectRatio::Portrait,
        }))
        .build()
        .unwrap();
    let workflow = h.engine.start("tester", "with-video", config).await.unwrap();

    let status = h.engine.run_to_approval(workflow.id).await.unwrap();
    assert_eq!(status, WorkflowStatus::AwaitingApproval);
    assert_eq!(renderer.submissions.load(Ordering::SeqCst), 1);

    let approval = h
        .engine
        .pending_approval(workflow.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        approval.video_url.as_deref(),
        Some("https://cdn.example/final.mp4")
    );

    h.engine
        .resolve_approval(approval.id, ApprovalDecision::Approve, None, None)
        .await
        .unwrap();
    let done = h.engine.resume_after_approval(workflow.id).await.unwrap();

    assert_eq!(done.status, WorkflowStatus::Completed);
    assert_eq!(
        done.results.unwrap().video_url.as_deref(),
        Some("https://cdn.example/final.mp4")
    );
    assert_eq!(renderer.submissions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rejected_workflow_terminates_without_publications() {
    let h = harness(SeqDriver::pipeline(), vec![tech_news()], two_publishers(), None);
    let workflow = h
        .engine
        .start(
            "tester",
            "rejected",
            config(vec![Platform::Tiktok], vec![ResearchSource::TechNews]),
        )
        .await
        .unwrap();

    h.engine.run_to_approval(workflow.id).await.unwrap();
    let approval = h
        .engine
        .pending_approval(workflow.id)
        .await
        .unwrap()
        .unwrap();
    let rejected = h
        .engine
        .resolve_approval(
            approval.id,
            ApprovalDecision::Reject,
            Some("reviewer".into()),
            Some("tone is off".into()),
        )
        .await
        .unwrap();

    assert_eq!(rejected.status, WorkflowStatus::Rejected);
    assert!(h.store.publications(workflow.id).await.unwrap().is_empty());

    // Terminal: advancing is a no-op and nothing ever gets published.
    assert_eq!(
        h.engine.advance(workflow.id).await.unwrap(),
        WorkflowStatus::Rejected
    );
    assert!(h.store.publications(workflow.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn approval_against_a_changed_artifact_is_stale() {
    let h = harness(SeqDriver::pipeline(), vec![tech_news()], two_publishers(), None);
    let workflow = h
        .engine
        .start(
            "tester",
            "stale-artifact",
            config(vec![Platform::X], vec![ResearchSource::TechNews]),
        )
        .await
        .unwrap();

    h.engine.run_to_approval(workflow.id).await.unwrap();
    let approval = h
        .engine
        .pending_approval(workflow.id)
        .await
        .unwrap()
        .unwrap();

    // A correction lands after the approval was requested: new artifact row,
    // old one untouched.
    let script = h.store.latest_script(workflow.id).await.unwrap().unwrap();
    let corrected = ScriptGeneration::from_draft(
        vasari::ScriptDraft {
            title: script.title.clone(),
            content: format!("{} (corrected)", script.content),
            content_type: script.content_type,
        },
        Some(workflow.id),
        script.session_id,
        script.model.clone(),
        script.audience.clone(),
        script.style.clone(),
        None,
        0.9,
    );
    h.store.insert_script(&corrected).await.unwrap();

    let err = h
        .engine
        .resolve_approval(approval.id, ApprovalDecision::Approve, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), VasariErrorKind::StaleState(_)));

    // The gate still holds.
    assert_eq!(
        h.engine.get(workflow.id).await.unwrap().status,
        WorkflowStatus::AwaitingApproval
    );
}

#[tokio::test]
async fn cancelled_workflow_stops_advancing() {
    let h = harness(SeqDriver::pipeline(), vec![tech_news()], two_publishers(), None);
    let workflow = h
        .engine
        .start(
            "tester",
            "cancel-me",
            config(vec![Platform::X], vec![ResearchSource::TechNews]),
        )
        .await
        .unwrap();

    assert_eq!(
        h.engine.advance(workflow.id).await.unwrap(),
        WorkflowStatus::Researching
    );
    let cancelled = h.engine.cancel(workflow.id).await.unwrap();
    assert_eq!(cancelled.status, WorkflowStatus::Cancelled);
    assert_eq!(cancelled.progress(), 0);

    // No further stage invocations happen.
    assert_eq!(
        h.engine.advance(workflow.id).await.unwrap(),
        WorkflowStatus::Cancelled
    );

    // Cancelling twice is stale.
    let err = h.engine.cancel(workflow.id).await.unwrap_err();
    assert!(matches!(err.kind(), VasariErrorKind::StaleState(_)));
}

#[tokio::test]
async fn invalid_requests_leave_no_state_behind() {
    let h = harness(SeqDriver::new(&[]), vec![tech_news()], two_publishers(), None);

    let no_topic = WorkflowConfigBuilder::default()
        .topic("   ")
        .platforms(vec![Platform::X])
        .sources(vec![ResearchSource::TechNews])
        .build()
        .unwrap();
    let err = h.engine.start("tester", "bad", no_topic).await.unwrap_err();
    assert!(matches!(err.kind(), VasariErrorKind::Validation(_)));

    let no_platforms = WorkflowConfigBuilder::default()
        .topic("AI automation")
        .platforms(Vec::<Platform>::new())
        .sources(vec![ResearchSource::TechNews])
        .build()
        .unwrap();
    let err = h
        .engine
        .start("tester", "bad", no_platforms)
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), VasariErrorKind::Validation(_)));

    let video_without_avatar = WorkflowConfigBuilder::default()
        .topic("AI automation")
        .platforms(vec![Platform::X])
        .sources(vec![ResearchSource::TechNews])
        .video_requested(true)
        .build()
        .unwrap();
    let err = h
        .engine
        .start("tester", "bad", video_without_avatar)
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), VasariErrorKind::Validation(_)));

    // Nothing was created for any of the rejected requests.
    let all = h
        .engine
        .list(&vasari::WorkflowFilter::default())
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn unattended_pipeline_skips_the_gate() {
    let h = harness(SeqDriver::pipeline(), vec![tech_news()], two_publishers(), None);
    let config = WorkflowConfigBuilder::default()
        .topic("AI automation")
        .platforms(vec![Platform::X])
        .sources(vec![ResearchSource::TechNews])
        .require_approval(false)
        .build()
        .unwrap();
    let workflow = h.engine.start("tester", "unattended", config).await.unwrap();

    let status = h.engine.run_to_approval(workflow.id).await.unwrap();
    assert_eq!(status, WorkflowStatus::Completed);
    assert!(h.engine.pending_approval(workflow.id).await.unwrap().is_none());
    let done = h.engine.get(workflow.id).await.unwrap();
    assert_eq!(done.results.unwrap().publications.len(), 1);
}

#[tokio::test]
async fn render_failure_fails_the_workflow_with_the_provider_reason() {
    let renderer = FakeRenderer::new(&[RenderState::Failed]);
    let h = harness(
        SeqDriver::pipeline(),
        vec![tech_news()],
        two_publishers(),
        Some(renderer),
    );
    let config = WorkflowConfigBuilder::default()
        .topic("AI automation")
        .platforms(vec![Platform::Tiktok])
        .sources(vec![ResearchSource::TechNews])
        .video_requested(true)
        .avatar(Some(AvatarSelection {
            avatar_id: "ava-9".into(),
            voice_id: "voice-3".into(),
            aspect_ratio: AspectRatio::Portrait,
        }))
        .build()
        .unwrap();
    let workflow = h.engine.start("tester", "render-fails", config).await.unwrap();

    let err = h.engine.run_to_approval(workflow.id).await.unwrap_err();
    assert!(matches!(err.kind(), VasariErrorKind::Provider(_)));

    let failed = h.engine.get(workflow.id).await.unwrap();
    assert_eq!(failed.status, WorkflowStatus::Failed);
    let message = failed.error_message.unwrap();
    assert!(message.contains("video generation failed"));
    assert!(message.contains("gpu on fire"));
}
