//! Top-level error wrapper types.

use crate::{BackendError, ConfigError, CreditExhaustedError, StoreError};

/// Every failure the admission-control core can report.
///
/// # Examples
///
/// ```
/// use tollgate_error::{TollgateError, ConfigError};
///
/// let err: TollgateError = ConfigError::new("bad preset").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum TollgateErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Distributed counter backend error
    #[from(BackendError)]
    Backend(BackendError),
    /// Credit store error
    #[from(StoreError)]
    Store(StoreError),
    /// User has no credits left
    #[from(CreditExhaustedError)]
    CreditExhausted(CreditExhaustedError),
}

/// Tollgate error with kind discrimination.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use tollgate_core::Plan;
/// use tollgate_error::{CreditExhaustedError, TollgateError};
///
/// let err: TollgateError = CreditExhaustedError::new(Plan::Pro, Utc::now()).into();
/// assert!(err.is_payment_required());
/// assert_eq!(err.credit_exhausted().map(|e| e.plan), Some(Plan::Pro));
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Tollgate Error: {}", _0)]
pub struct TollgateError(Box<TollgateErrorKind>);

impl TollgateError {
    /// Create a new error from a kind.
    pub fn new(kind: TollgateErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TollgateErrorKind {
        &self.0
    }

    /// Exhaustion payload, if this error is a credit exhaustion.
    pub fn credit_exhausted(&self) -> Option<&CreditExhaustedError> {
        match self.kind() {
            TollgateErrorKind::CreditExhausted(e) => Some(e),
            _ => None,
        }
    }

    /// True when the caller should answer "payment required" rather than a server error.
    pub fn is_payment_required(&self) -> bool {
        self.credit_exhausted().is_some()
    }
}

// Generic From implementation for any type that converts to TollgateErrorKind
impl<T> From<T> for TollgateError
where
    T: Into<TollgateErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for tollgate operations.
pub type TollgateResult<T> = std::result::Result<T, TollgateError>;
