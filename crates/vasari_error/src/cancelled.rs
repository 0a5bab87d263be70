//! Cancellation error types.

/// Error for a caller-initiated abort observed mid-stage.
///
/// Cancellation stops future stage invocations; external jobs already
/// dispatched are left to finish on the provider side.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Cancelled: workflow {} at line {} in {}", workflow_id, line, file)]
pub struct CancelledError {
    /// Identifier of the cancelled workflow
    pub workflow_id: String,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl CancelledError {
    /// Create a new CancelledError with automatic location tracking.
    #[track_caller]
    pub fn new(workflow_id: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            workflow_id: workflow_id.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
