//! The human checkpoint record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Lifecycle of an approval record.
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
pub enum ApprovalStatus {
    /// Waiting on a human decision
    Pending,
    /// Approved; publishing may proceed
    Approved,
    /// Rejected; the workflow terminates
    Rejected,
}

/// A human decision on a pending approval.
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
pub enum ApprovalDecision {
    /// Let publishing proceed
    Approve,
    /// Terminate the workflow; feedback explains why
    Reject,
}

/// Hash of the artifact under review, for stale-approval protection.
///
/// An approval records the hash of exactly the content it was requested for;
/// `resolve` compares it against the hash of the latest generated artifact
/// and rejects the decision if they differ.
pub fn artifact_hash(title: &str, content: &str, video_url: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update([0u8]);
    hasher.update(content.as_bytes());
    hasher.update([0u8]);
    hasher.update(video_url.unwrap_or_default().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// The manual checkpoint between content readiness and publishing.
///
/// Pure state, no polling: the workflow sits in `awaiting_approval` until an
/// external actor resolves this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowApproval {
    /// Approval identifier
    pub id: Uuid,
    /// Parent workflow
    pub workflow_id: Uuid,
    /// Title of the content under review
    pub title: String,
    /// Body of the content under review
    pub content: String,
    /// Rendered video under review, when the workflow produced one
    pub video_url: Option<String>,
    /// Hash of (title, content, video_url) at request time
    pub artifact_hash: String,
    /// Approval lifecycle state
    pub status: ApprovalStatus,
    /// Identity of the human who resolved the approval
    pub approver: Option<String>,
    /// Free-text feedback from the approver
    pub feedback: Option<String>,
    /// When the approval was requested
    pub requested_at: DateTime<Utc>,
    /// When the approval was resolved
    pub resolved_at: Option<DateTime<Utc>>,
}

impl WorkflowApproval {
    /// Create a pending approval for the given artifact.
    pub fn new(
        workflow_id: Uuid,
        title: impl Into<String>,
        content: impl Into<String>,
        video_url: Option<String>,
    ) -> Self {
        let title = title.into();
        let content = content.into();
        let hash = artifact_hash(&title, &content, video_url.as_deref());
        Self {
            id: Uuid::new_v4(),
            workflow_id,
            title,
            content,
            video_url,
            artifact_hash: hash,
            status: ApprovalStatus::Pending,
            approver: None,
            feedback: None,
            requested_at: Utc::now(),
            resolved_at: None,
        }
    }
}
