//! Provider error types.

/// Specific failure conditions for an external provider call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ProviderErrorKind {
    /// Provider could not be reached or refused the connection
    #[display("provider unreachable: {}", _0)]
    Unavailable(String),
    /// Provider returned a non-success HTTP status
    #[display("HTTP {}: {}", status, message)]
    Http {
        /// HTTP status code returned by the provider
        status: u16,
        /// Response body or status text
        message: String,
    },
    /// Provider rejected the credentials
    #[display("authentication failed: {}", _0)]
    Auth(String),
    /// Provider response could not be parsed into the expected shape
    #[display("invalid response: {}", _0)]
    InvalidResponse(String),
    /// Provider reported the submitted job as failed
    #[display("job failed: {}", _0)]
    JobFailed(String),
    /// Provider signalled rate limiting
    #[display("rate limited: {}", _0)]
    RateLimited(String),
}

impl ProviderErrorKind {
    /// Whether a retry of the same call is sensible for this condition.
    ///
    /// Authentication and malformed-response failures are permanent;
    /// connectivity and rate-limit failures are worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderErrorKind::Unavailable(_)
                | ProviderErrorKind::RateLimited(_)
                | ProviderErrorKind::Http { status: 500..=599, .. }
        )
    }
}

/// Error attributed to a named external provider.
///
/// Every provider failure carries the provider name so workflow error
/// messages can distinguish "research source unavailable" from "video
/// render failed" without inspecting stage internals.
///
/// # Examples
///
/// ```
/// use vasari_error::{ProviderError, ProviderErrorKind};
///
/// let err = ProviderError::new(
///     "tech_news",
///     ProviderErrorKind::Unavailable("connection refused".into()),
/// );
/// assert!(format!("{}", err).contains("tech_news"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error [{}]: {} at line {} in {}", provider, kind, line, file)]
pub struct ProviderError {
    /// Name of the provider that failed
    pub provider: String,
    /// The specific error condition
    pub kind: ProviderErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new ProviderError with automatic location tracking.
    #[track_caller]
    pub fn new(provider: impl Into<String>, kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            provider: provider.into(),
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether a retry of the same call is sensible.
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}
