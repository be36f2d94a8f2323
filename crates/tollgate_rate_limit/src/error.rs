//! Error types for quota policy validation.

use std::fmt;

/// Error kinds for quota policy validation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RateLimitErrorKind {
    /// A policy that could never admit a request, or never reset.
    InvalidPolicy(String),
    /// Operation class name not recognised.
    UnknownClass(String),
}

impl fmt::Display for RateLimitErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitErrorKind::InvalidPolicy(msg) => write!(f, "Invalid policy: {}", msg),
            RateLimitErrorKind::UnknownClass(name) => {
                write!(f, "Unknown operation class: {}", name)
            }
        }
    }
}

/// Rate limiting error with location tracking.
#[derive(Debug, Clone)]
pub struct RateLimitError {
    kind: RateLimitErrorKind,
    line: u32,
    file: &'static str,
}

impl RateLimitError {
    /// Create a new rate limiting error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RateLimitErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RateLimitErrorKind {
        &self.kind
    }
}

impl fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rate Limit Error: {} at line {} in {}",
            self.kind, self.line, self.file
        )
    }
}

impl std::error::Error for RateLimitError {}

impl From<RateLimitError> for tollgate_error::ConfigError {
    #[track_caller]
    fn from(err: RateLimitError) -> Self {
        tollgate_error::ConfigError::new(err.kind.to_string())
    }
}
