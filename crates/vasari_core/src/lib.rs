//! Core data types for the Vasari workflow orchestrator.
//!
//! This crate defines the entities persisted by the workflow state store and
//! the request/response types exchanged with provider adapters. It carries no
//! behavior beyond pure functions over those types (status transitions,
//! progress mapping, artifact hashing); all I/O lives in the stage crates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod approval;
mod generation;
mod publish;
mod research;
mod script;
mod status;
mod video;
mod workflow;

pub use approval::{ApprovalDecision, ApprovalStatus, WorkflowApproval, artifact_hash};
pub use generation::{GenerateRequest, GenerateResponse, Message, Role};
pub use publish::{
    Engagement, Platform, PublicationRecord, PublicationStatus, PublishTiming,
};
pub use research::{
    AnalysisDepth, InsightSet, RawItem, ResearchSession, ResearchSessionStatus, ResearchSource,
};
pub use script::{ContentType, ScriptDraft, ScriptGeneration};
pub use status::WorkflowStatus;
pub use video::{AspectRatio, AvatarSelection, VideoGenerationTask, VideoTaskStatus};
pub use workflow::{
    WorkflowConfig, WorkflowConfigBuilder, WorkflowExecution, WorkflowFilter, WorkflowResults,
};
