//! Credit store error types.

/// Credit store error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StoreErrorKind {
    /// Connection failed
    #[display("Store connection error: {}", _0)]
    Connection(String),
    /// Query execution failed
    #[display("Store query error: {}", _0)]
    Query(String),
    /// The conditional update matched no row because the balance changed underneath it
    #[display("Balance for '{}' changed concurrently; deduction not applied", _0)]
    Conflict(String),
    /// No balance exists for the user
    #[display("No credit balance for user '{}'", _0)]
    NotFound(String),
    /// Stored values could not be converted to domain values
    #[display("Serialization error: {}", _0)]
    Serialization(String),
}

/// Credit store error with source location tracking.
///
/// # Examples
///
/// ```
/// use tollgate_error::{StoreError, StoreErrorKind};
///
/// let err = StoreError::new(StoreErrorKind::NotFound("user-1".into()));
/// assert!(format!("{}", err).contains("No credit balance"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Store Error: {} at line {} in {}", kind, line, file)]
pub struct StoreError {
    /// The kind of error that occurred
    pub kind: StoreErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
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
}

// Diesel error conversions (only available with database feature)
#[cfg(feature = "database")]
impl From<diesel::result::Error> for StoreError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        StoreError::new(StoreErrorKind::Query(err.to_string()))
    }
}

#[cfg(feature = "database")]
impl From<diesel::ConnectionError> for StoreError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        StoreError::new(StoreErrorKind::Connection(err.to_string()))
    }
}

#[cfg(feature = "database")]
impl From<serde_json::Error> for StoreError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        StoreError::new(StoreErrorKind::Serialization(err.to_string()))
    }
}

/// Result type for credit store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
