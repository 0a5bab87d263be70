//! Vasari - Research-to-Publish Workflow Orchestrator
//!
//! Vasari takes a topic and a target format and drives it through a
//! multi-stage, partially-human-gated pipeline: research collection, insight
//! synthesis, script writing, optional asynchronous video rendering, a
//! manual approval gate, and multi-platform publishing. Every stage records
//! its state durably, so runs can be resumed, audited, and retried
//! independently.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vasari::{
//!     EngineSettings, InMemoryWorkflowStore, PublishConfig, PublishDispatcher,
//!     ResearchAggregator, ResearchConfig, WorkflowConfigBuilder, WorkflowEngine,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = WorkflowEngine::new(
//!         Arc::new(InMemoryWorkflowStore::new()),
//!         my_text_driver(),
//!         ResearchAggregator::new(ResearchConfig::default()).with_provider(my_feed()),
//!         PublishDispatcher::new(PublishConfig::default()).with_publisher(my_gateway()),
//!         EngineSettings::default(),
//!     );
//!
//!     let config = WorkflowConfigBuilder::default()
//!         .topic("AI automation")
//!         .platforms(vec![vasari::Platform::Tiktok])
//!         .sources(vec![vasari::ResearchSource::TechNews])
//!         .build()?;
//!
//!     let workflow = engine.start("me", "ai-automation", config).await?;
//!     engine.run_to_approval(workflow.id).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Vasari is organized as a workspace with focused crates:
//!
//! - `vasari_error` - error taxonomy (validation, provider, timeout,
//!   stale-state, cancellation)
//! - `vasari_core` - the persisted data model and status graph
//! - `vasari_interface` - provider trait seams
//! - `vasari_research` - multi-source collection with partial-failure
//!   absorption
//! - `vasari_synthesis` - insight and script synthesis with constraint
//!   validation
//! - `vasari_video` - asynchronous render orchestration with resumable
//!   polling
//! - `vasari_publish` - concurrent per-target dispatch with independent
//!   failure domains
//! - `vasari_models` - concrete text-generation clients
//! - `vasari_store` - the workflow state store (in-memory and PostgreSQL)
//! - `vasari` - this facade: the engine, configuration, and CLI

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;

pub use config::{
    EngineSection, PublishSection, ResearchSection, VasariConfig, VideoSection,
};
pub use engine::{EngineSettings, WorkflowEngine};

// Core data model
pub use vasari_core::{
    AnalysisDepth, ApprovalDecision, ApprovalStatus, AspectRatio, AvatarSelection, ContentType,
    Engagement, GenerateRequest, GenerateResponse, InsightSet, Message, Platform,
    PublicationRecord, PublicationStatus, PublishTiming, RawItem, ResearchSession,
    ResearchSessionStatus, ResearchSource, Role, ScriptDraft, ScriptGeneration,
    VideoGenerationTask, VideoTaskStatus, WorkflowApproval, WorkflowConfig,
    WorkflowConfigBuilder, WorkflowExecution, WorkflowFilter, WorkflowResults, WorkflowStatus,
    artifact_hash,
};

// Errors
pub use vasari_error::{
    CancelledError, ConfigError, ProviderError, ProviderErrorKind, StaleStateError,
    StaleStateErrorKind, StoreError, StoreErrorKind, TimeoutError, ValidationError, VasariError,
    VasariErrorKind, VasariResult,
};

// Provider seams
pub use vasari_interface::{
    PostReceipt, PostRequest, RenderState, ResearchProvider, SocialPublisher, VasariDriver,
    VideoRenderRequest, VideoRenderStatus, VideoSynthesizer,
};

// Stage components
pub use vasari_models::{ChatClient, ChatEndpoint};
pub use vasari_publish::{
    HttpPublisher, PublishConfig, PublishDispatcher, PublisherEndpoint, next_auto_slot,
    resolve_timing,
};
pub use vasari_research::{FeedEndpoint, JsonFeedProvider, ResearchAggregator, ResearchConfig};
pub use vasari_synthesis::{InsightSynthesizer, ScriptParams, ScriptWriter, caption_ceiling};
pub use vasari_video::{
    RenderClient, RenderEndpoint, VideoConfig, VideoOrchestrator, VideoPoll,
};

// State store
pub use vasari_store::{InMemoryWorkflowStore, StageTransition, WorkflowStore};
#[cfg(feature = "postgres")]
pub use vasari_store::{PostgresWorkflowStore, establish_pool};
