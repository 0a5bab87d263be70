//! Timeout error types.

/// Error for a bounded wait that was exceeded.
///
/// Distinguishable from a permanent [`crate::ProviderError`] so callers can
/// decide to retry a submission rather than assume the provider is broken.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Timeout Error: {} exceeded {}s at line {} in {}", operation, limit_secs, line, file)]
pub struct TimeoutError {
    /// The operation that timed out (e.g. "research collect", "video poll")
    pub operation: String,
    /// The configured bound in seconds
    pub limit_secs: u64,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl TimeoutError {
    /// Create a new TimeoutError with automatic location tracking.
    #[track_caller]
    pub fn new(operation: impl Into<String>, limit_secs: u64) -> Self {
        let location = std::panic::Location::caller();
        Self {
            operation: operation.into(),
            limit_secs,
            line: location.line(),
            file: location.file(),
        }
    }
}
