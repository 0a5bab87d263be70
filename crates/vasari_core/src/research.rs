//! Research collection entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named research source behind the research provider seam.
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
pub enum ResearchSource {
    /// Forum / community discussion threads
    Forum,
    /// Tech-news aggregator front page
    TechNews,
    /// Code-hosting trending repositories feed
    CodeTrends,
    /// Search-trend feed
    SearchTrends,
}

/// Thoroughness requested from a research provider.
///
/// Passed through to the provider, never interpreted by the orchestrator.
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
pub enum AnalysisDepth {
    /// Fast, shallow pass
    Quick,
    /// Default trade-off
    Standard,
    /// Slow, thorough pass
    Comprehensive,
}

/// One raw item pulled from a research source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    /// The source this item came from
    pub source: ResearchSource,
    /// Item title or headline
    pub title: String,
    /// Canonical URL, when the source provides one
    pub url: Option<String>,
    /// Author or submitter handle
    pub author: Option<String>,
    /// Source-native popularity score (votes, stars, trend index)
    pub score: Option<i64>,
    /// Short excerpt or description
    pub summary: Option<String>,
    /// Publication timestamp reported by the source
    pub published_at: Option<DateTime<Utc>>,
}

/// Lifecycle of a research session.
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
pub enum ResearchSessionStatus {
    /// Created, collection not yet begun
    Started,
    /// Collection in flight
    Running,
    /// Collection finished; the session is immutable from here on
    Completed,
    /// Collection failed with no viable path forward
    Failed,
}

/// Structured synthesis output reduced from raw research items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightSet {
    /// One-paragraph summary of the collected material
    pub summary: String,
    /// Recurring themes across items
    pub themes: Vec<String>,
    /// Actionable recommendations for the content angle
    pub recommendations: Vec<String>,
}

/// One research run: the raw items collected for a query plus the insight
/// set synthesized from them.
///
/// Usually a child of a workflow, but usable standalone when research runs
/// outside the full pipeline. The configured source list generalizes the
/// single-source case: a session covers every source configured for the
/// stage, and each [`RawItem`] records which source produced it. Immutable
/// once `Completed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchSession {
    /// Session identifier
    pub id: Uuid,
    /// Parent workflow, if the session belongs to one
    pub workflow_id: Option<Uuid>,
    /// Sources configured for this run
    pub sources: Vec<ResearchSource>,
    /// The research query
    pub query: String,
    /// Cost bound on collected items per source
    pub max_items: u32,
    /// Requested thoroughness
    pub depth: AnalysisDepth,
    /// Session lifecycle state
    pub status: ResearchSessionStatus,
    /// Number of raw items collected
    pub results_count: u32,
    /// Ordered list of collected items
    pub raw_data: Vec<RawItem>,
    /// Synthesis output, once the analyzing stage has run
    pub insights: Option<InsightSet>,
    /// Most specific cause when the session failed
    pub error_message: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ResearchSession {
    /// Create a new session in `Started` state.
    pub fn new(
        workflow_id: Option<Uuid>,
        sources: Vec<ResearchSource>,
        query: impl Into<String>,
        max_items: u32,
        depth: AnalysisDepth,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id,
            sources,
            query: query.into(),
            max_items,
            depth,
            status: ResearchSessionStatus::Started,
            results_count: 0,
            raw_data: Vec::new(),
            insights: None,
            error_message: None,
            created_at: Utc::now(),
        }
    }
}
