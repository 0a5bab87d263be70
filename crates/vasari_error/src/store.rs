//! State store error types.

/// Specific error conditions for workflow state store operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StoreErrorKind {
    /// The requested row does not exist
    #[display("not found: {}", _0)]
    NotFound(String),
    /// Connection to the backing database failed
    #[display("connection failed: {}", _0)]
    Connection(String),
    /// A query failed to execute
    #[display("query failed: {}", _0)]
    Query(String),
    /// A stored value could not be serialized or deserialized
    #[display("serialization failed: {}", _0)]
    Serialization(String),
}

/// Error type for workflow state store operations.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Store Error: {} at line {} in {}", kind, line, file)]
pub struct StoreError {
    /// The specific error condition
    pub kind: StoreErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl StoreError {
    /// Create a new StoreError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoreErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a not-found error.
    #[track_caller]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::NotFound(what.into()))
    }
}

#[cfg(feature = "database")]
impl From<diesel::result::Error> for StoreError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => {
                StoreError::new(StoreErrorKind::NotFound("row not found".to_string()))
            }
            other => StoreError::new(StoreErrorKind::Query(other.to_string())),
        }
    }
}
