//! Top-level error wrapper types.

use crate::{
    CancelledError, ConfigError, ProviderError, StaleStateError, StoreError, TimeoutError,
    ValidationError,
};

/// The foundation error enum covering every failure class in the pipeline.
///
/// # Examples
///
/// ```
/// use vasari_error::{VasariError, TimeoutError};
///
/// let timeout = TimeoutError::new("video poll", 600);
/// let err: VasariError = timeout.into();
/// assert!(format!("{}", err).contains("video poll"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum VasariErrorKind {
    /// Bad input, rejected before any stage started
    #[from(ValidationError)]
    Validation(ValidationError),
    /// A named external dependency failed
    #[from(ProviderError)]
    Provider(ProviderError),
    /// A bounded wait was exceeded
    #[from(TimeoutError)]
    Timeout(TimeoutError),
    /// An operation targeted state that has since moved on
    #[from(StaleStateError)]
    StaleState(StaleStateError),
    /// Caller-initiated abort
    #[from(CancelledError)]
    Cancelled(CancelledError),
    /// State store failure
    #[from(StoreError)]
    Store(StoreError),
    /// Configuration failure
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Vasari error with kind discrimination.
///
/// # Examples
///
/// ```
/// use vasari_error::{VasariResult, ValidationError};
///
/// fn might_fail() -> VasariResult<()> {
///     Err(ValidationError::new("missing topic"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Vasari Error: {}", _0)]
pub struct VasariError(Box<VasariErrorKind>);

impl VasariError {
    /// Create a new error from a kind.
    pub fn new(kind: VasariErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &VasariErrorKind {
        &self.0
    }

    /// Whether a retry of the failed call is sensible.
    ///
    /// Timeouts and transient provider failures are retryable; validation,
    /// stale-state, and cancellation failures never are.
    pub fn is_transient(&self) -> bool {
        match self.kind() {
            VasariErrorKind::Timeout(_) => true,
            VasariErrorKind::Provider(e) => e.is_transient(),
            _ => false,
        }
    }
}

#[cfg(feature = "database")]
impl From<diesel::result::Error> for VasariErrorKind {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        VasariErrorKind::Store(StoreError::from(err))
    }
}

// Generic From implementation for any type that converts to VasariErrorKind
impl<T> From<T> for VasariError
where
    T: Into<VasariErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Vasari operations.
pub type VasariResult<T> = std::result::Result<T, VasariError>;
