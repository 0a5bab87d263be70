//! Command-line surface.

mod run;

pub use run::{build_engine, handle_command};

use clap::{Parser, Subcommand};
use uuid::Uuid;
use vasari_core::{AnalysisDepth, Platform, ResearchSource, WorkflowStatus};
use vasari_error::{StoreErrorKind, VasariError, VasariErrorKind};

/// Research-to-publish workflow orchestrator.
#[derive(Debug, Parser)]
#[command(name = "vasari", version, about)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a workflow and run it up to the approval gate
    Start {
        /// Topic to research and turn into content
        #[arg(long)]
        topic: String,
        /// Target platform (repeatable)
        #[arg(long = "platform", required = true)]
        platforms: Vec<Platform>,
        /// Research source (repeatable)
        #[arg(long = "source", default_values = ["tech_news"])]
        sources: Vec<ResearchSource>,
        /// Render a video asset for the script
        #[arg(long)]
        video: bool,
        /// Avatar id for the render (required with --video)
        #[arg(long)]
        avatar: Option<String>,
        /// Voice id for the render (required with --video)
        #[arg(long)]
        voice: Option<String>,
        /// Voice/tone of the content
        #[arg(long)]
        tone: Option<String>,
        /// Audience the content is written for
        #[arg(long)]
        audience: Option<String>,
        /// Research thoroughness
        #[arg(long)]
        depth: Option<AnalysisDepth>,
        /// Item cap per research source
        #[arg(long)]
        max_items: Option<u32>,
        /// Publish at a fixed RFC 3339 time (exclusive with --auto-schedule)
        #[arg(long)]
        publish_at: Option<String>,
        /// Let the provider pick the posting slot (exclusive with --publish-at)
        #[arg(long)]
        auto_schedule: bool,
        /// Skip the human approval gate
        #[arg(long)]
        no_approval: bool,
        /// Owner reference recorded on the workflow
        #[arg(long, default_value = "cli")]
        owner: String,
        /// Workflow name; defaults to a slug of the topic
        #[arg(long)]
        name: Option<String>,
    },
    /// Show a workflow's status and progress
    Status {
        /// Workflow id
        id: Uuid,
    },
    /// List workflows, newest first
    List {
        /// Only workflows in this status
        #[arg(long)]
        status: Option<WorkflowStatus>,
        /// Maximum rows
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Approve the pending checkpoint and publish
    Approve {
        /// Workflow id
        id: Uuid,
        /// Identity recorded as the approver
        #[arg(long)]
        approver: Option<String>,
        /// Free-text feedback
        #[arg(long)]
        feedback: Option<String>,
    },
    /// Reject the pending checkpoint (terminal)
    Reject {
        /// Workflow id
        id: Uuid,
        /// Identity recorded as the approver
        #[arg(long)]
        approver: Option<String>,
        /// Free-text feedback
        #[arg(long)]
        feedback: Option<String>,
    },
    /// Cancel a running workflow
    Cancel {
        /// Workflow id
        id: Uuid,
    },
    /// Delete a workflow and everything it owns
    Delete {
        /// Workflow id
        id: Uuid,
    },
}

/// Process exit code for an error.
///
/// Distinguishes validation errors (2), missing rows (3), already-resolved
/// or otherwise stale operations (4), and internal/provider failures (5).
pub fn exit_code(err: &VasariError) -> u8 {
    match err.kind() {
        VasariErrorKind::Validation(_) => 2,
        VasariErrorKind::Store(e) if matches!(e.kind, StoreErrorKind::NotFound(_)) => 3,
        VasariErrorKind::StaleState(_) => 4,
        _ => 5,
    }
}
