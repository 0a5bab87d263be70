//! Stale state error types.

/// Specific conditions where an operation targeted state that has moved on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StaleStateErrorKind {
    /// The approval was already resolved
    #[display("approval {} is already resolved as {}", approval_id, resolution)]
    AlreadyResolved {
        /// Identifier of the approval record
        approval_id: String,
        /// The resolution it already carries
        resolution: String,
    },
    /// The artifact under approval no longer matches the one last generated
    #[display("artifact under review has changed since the approval was requested")]
    ArtifactChanged,
    /// A status-guarded transition found a different status than expected
    #[display("workflow {} is in status '{}', expected '{}'", workflow_id, found, expected)]
    TransitionConflict {
        /// Identifier of the workflow
        workflow_id: String,
        /// Status the caller expected
        expected: String,
        /// Status actually found
        found: String,
    },
    /// A second non-terminal video task was requested for the same workflow
    #[display("workflow {} already has an outstanding video task", _0)]
    OutstandingVideoTask(String),
}

/// Error for an operation attempted against state that has since moved on.
///
/// # Examples
///
/// ```
/// use vasari_error::{StaleStateError, StaleStateErrorKind};
///
/// let err = StaleStateError::new(StaleStateErrorKind::ArtifactChanged);
/// assert!(format!("{}", err).contains("changed"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Stale State Error: {} at line {} in {}", kind, line, file)]
pub struct StaleStateError {
    /// The specific error condition
    pub kind: StaleStateErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl StaleStateError {
    /// Create a new StaleStateError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StaleStateErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
