//! Validation error types.

/// Error for input rejected at the boundary, before any workflow state exists.
///
/// # Examples
///
/// ```
/// use vasari_error::ValidationError;
///
/// let err = ValidationError::new("at least one target platform is required");
/// assert!(format!("{}", err).contains("target platform"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Validation Error: {} at line {} in {}", message, line, file)]
pub struct ValidationError {
    /// Description of the rejected input
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ValidationError {
    /// Create a new ValidationError with automatic location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
