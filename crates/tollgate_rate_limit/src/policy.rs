//! Quota policies and operation classes.

use crate::{RateLimitError, RateLimitErrorKind};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Longest window a policy may declare (one year).
pub(crate) const MAX_WINDOW_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Named category of metered action, each with its own quota preset.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use tollgate_rate_limit::OperationClass;
///
/// assert_eq!(
///     OperationClass::from_str("image-generation").unwrap(),
///     OperationClass::ImageGeneration
/// );
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "kebab-case")]
pub enum OperationClass {
    /// Text generation against an AI provider
    AiGeneration,
    /// Fetching and parsing public store listings
    Scraping,
    /// Image generation against an AI provider
    ImageGeneration,
    /// Read-only polling endpoints
    GenericRead,
}

impl OperationClass {
    /// Whether limits for this class scale with the subscription plan.
    pub fn is_plan_scaled(&self) -> bool {
        !matches!(self, OperationClass::GenericRead)
    }

    /// Parse a class name, reporting unknown names as a rate limit error.
    pub fn parse(name: &str) -> Result<Self, RateLimitError> {
        name.parse()
            .map_err(|_| RateLimitError::new(RateLimitErrorKind::UnknownClass(name.to_string())))
    }
}

/// Static quota: at most `max_requests` per `window_seconds` for one key.
///
/// Keys are `"{prefix}:{subject}"`, so two policies with different prefixes
/// never share a counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuotaPolicy {
    /// Key namespace for this operation class
    pub prefix: String,
    /// Requests admitted per window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_seconds: u64,
}

impl QuotaPolicy {
    /// Create a policy.
    pub fn new(prefix: impl Into<String>, max_requests: u32, window_seconds: u64) -> Self {
        Self {
            prefix: prefix.into(),
            max_requests,
            window_seconds,
        }
    }

    /// Counter key for `subject` under this policy.
    pub fn key(&self, subject: &str) -> String {
        format!("{}:{}", self.prefix, subject)
    }

    /// Window length, clamped to one year.
    pub fn window(&self) -> Duration {
        Duration::seconds(self.window_seconds.min(MAX_WINDOW_SECONDS) as i64)
    }

    /// Reject policies that could never admit a request or never reset.
    ///
    /// # Errors
    ///
    /// Returns an error when `max_requests` is zero, or when
    /// `window_seconds` is zero or longer than a year.
    pub fn validate(&self) -> Result<(), RateLimitError> {
        if self.max_requests == 0 {
            return Err(RateLimitError::new(RateLimitErrorKind::InvalidPolicy(
                format!("{}: max_requests must be at least 1", self.prefix),
            )));
        }
        if self.window_seconds == 0 || self.window_seconds > MAX_WINDOW_SECONDS {
            return Err(RateLimitError::new(RateLimitErrorKind::InvalidPolicy(
                format!(
                    "{}: window_seconds must be in 1..={}, got {}",
                    self.prefix, MAX_WINDOW_SECONDS, self.window_seconds
                ),
            )));
        }
        Ok(())
    }
}
