//! Workflow lifecycle states and the transition graph.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a [`crate::WorkflowExecution`].
///
/// Transitions are monotonic along the defined graph; `Failed` and
/// `Cancelled` are reachable from any non-terminal state and are themselves
/// terminal. A rejected workflow stays rejected: re-submission creates a new
/// workflow so the audit trail stays append-only.
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
pub enum WorkflowStatus {
    /// Created, no stage has run yet
    Pending,
    /// Collecting raw items from the configured research sources
    Researching,
    /// Reducing raw items into a structured insight set
    Analyzing,
    /// Writing the platform-appropriate script or post body
    ScriptGeneration,
    /// Waiting on the asynchronous video render
    VideoGeneration,
    /// Parked at the human checkpoint
    AwaitingApproval,
    /// Approved by a human, ready to dispatch
    Approved,
    /// Rejected at the human checkpoint (terminal)
    Rejected,
    /// Fanning the artifact out to the target platforms
    Publishing,
    /// All targets attempted (terminal)
    Completed,
    /// Unrecoverable error (terminal)
    Failed,
    /// Caller-requested abort (terminal)
    Cancelled,
}

impl WorkflowStatus {
    /// Whether this state admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WorkflowStatus::Rejected
                | WorkflowStatus::Completed
                | WorkflowStatus::Failed
                | WorkflowStatus::Cancelled
        )
    }

    /// Whether the edge `self -> next` exists in the state graph.
    ///
    /// `Failed` and `Cancelled` are reachable from every non-terminal state.
    /// The optional stages (video, approval) make several forward edges out
    /// of `ScriptGeneration` and `VideoGeneration` legal; which one is taken
    /// depends on the workflow configuration, not on this graph.
    pub fn can_transition_to(self, next: WorkflowStatus) -> bool {
        use WorkflowStatus::*;

        if self.is_terminal() {
            return false;
        }
        if matches!(next, Failed | Cancelled) {
            return true;
        }

        matches!(
            (self, next),
            (Pending, Researching)
                | (Researching, Analyzing)
                | (Analyzing, ScriptGeneration)
                | (ScriptGeneration, VideoGeneration)
                | (ScriptGeneration, AwaitingApproval)
                | (ScriptGeneration, Publishing)
                | (VideoGeneration, AwaitingApproval)
                | (VideoGeneration, Publishing)
                | (AwaitingApproval, Approved)
                | (AwaitingApproval, Rejected)
                | (Approved, Publishing)
                | (Publishing, Completed)
        )
    }

    /// Progress percentage for UI feedback.
    ///
    /// Pure function of status, never consulted for control decisions.
    pub fn progress(self) -> u8 {
        match self {
            WorkflowStatus::Pending => 0,
            WorkflowStatus::Researching => 20,
            WorkflowStatus::Analyzing => 40,
            WorkflowStatus::ScriptGeneration => 60,
            WorkflowStatus::VideoGeneration => 80,
            WorkflowStatus::AwaitingApproval => 90,
            WorkflowStatus::Approved => 95,
            WorkflowStatus::Publishing => 98,
            WorkflowStatus::Completed => 100,
            WorkflowStatus::Rejected | WorkflowStatus::Failed | WorkflowStatus::Cancelled => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::WorkflowStatus::*;

    #[test]
    fn forward_edges_follow_the_graph() {
        assert!(Pending.can_transition_to(Researching));
        assert!(Researching.can_transition_to(Analyzing));
        assert!(ScriptGeneration.can_transition_to(VideoGeneration));
        assert!(ScriptGeneration.can_transition_to(AwaitingApproval));
        assert!(VideoGeneration.can_transition_to(AwaitingApproval));
        assert!(AwaitingApproval.can_transition_to(Approved));
        assert!(Approved.can_transition_to(Publishing));
        assert!(Publishing.can_transition_to(Completed));
    }

    #[test]
    fn no_stage_skipping() {
        assert!(!Pending.can_transition_to(Publishing));
        assert!(!Researching.can_transition_to(ScriptGeneration));
        assert!(!Pending.can_transition_to(Completed));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for terminal in [Completed, Failed, Cancelled, Rejected] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(Failed));
            assert!(!terminal.can_transition_to(Pending));
        }
    }

    #[test]
    fn failure_and_cancellation_reachable_from_any_live_state() {
        for live in [
            Pending,
            Researching,
            Analyzing,
            ScriptGeneration,
            VideoGeneration,
            AwaitingApproval,
            Approved,
            Publishing,
        ] {
            assert!(live.can_transition_to(Failed));
            assert!(live.can_transition_to(Cancelled));
        }
    }

    #[test]
    fn progress_matches_the_published_mapping() {
        assert_eq!(Pending.progress(), 0);
        assert_eq!(Researching.progress(), 20);
        assert_eq!(Analyzing.progress(), 40);
        assert_eq!(ScriptGeneration.progress(), 60);
        assert_eq!(VideoGeneration.progress(), 80);
        assert_eq!(AwaitingApproval.progress(), 90);
        assert_eq!(Approved.progress(), 95);
        assert_eq!(Publishing.progress(), 98);
        assert_eq!(Completed.progress(), 100);
        assert_eq!(Failed.progress(), 0);
        assert_eq!(Cancelled.progress(), 0);
    }

    #[test]
    fn status_round_trips_through_text() {
        use std::str::FromStr;
        for status in [Pending, ScriptGeneration, AwaitingApproval, Completed] {
            let text = status.to_string();
            assert_eq!(super::WorkflowStatus::from_str(&text).unwrap(), status);
        }
        assert_eq!(AwaitingApproval.to_string(), "awaiting_approval");
    }
}
