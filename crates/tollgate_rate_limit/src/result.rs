//! Admission outcome and the headers that advertise it.
//!
//! A rejected request must carry:
//! - `X-RateLimit-Limit`: requests allowed per window
//! - `X-RateLimit-Remaining`: requests left in the current window
//! - `X-RateLimit-Reset`: window reset as Unix epoch milliseconds
//! - `Retry-After`: whole seconds until reset, at least 1

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use serde::{Deserialize, Serialize};

/// `X-RateLimit-Limit` header name.
pub const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
/// `X-RateLimit-Remaining` header name.
pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
/// `X-RateLimit-Reset` header name.
pub const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Outcome of one `acquire` call.
///
/// Denial is a normal outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitResult {
    /// Whether the request was admitted
    pub success: bool,
    /// Requests allowed per window
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// When the current window ends
    pub reset: DateTime<Utc>,
}

impl RateLimitResult {
    /// Admitted with `remaining` requests left.
    pub fn admitted(limit: u32, remaining: u32, reset: DateTime<Utc>) -> Self {
        Self {
            success: true,
            limit,
            remaining,
            reset,
        }
    }

    /// Denied until `reset`.
    pub fn denied(limit: u32, reset: DateTime<Utc>) -> Self {
        Self {
            success: false,
            limit,
            remaining: 0,
            reset,
        }
    }

    /// Reset instant as Unix epoch milliseconds.
    pub fn reset_epoch_ms(&self) -> i64 {
        self.reset.timestamp_millis()
    }

    /// Whole seconds until reset, rounded up, never less than 1.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.reset - now).num_milliseconds();
        if millis <= 0 {
            return 1;
        }
        (millis as u64).div_ceil(1000).max(1)
    }

    /// Rate limit headers for a response.
    ///
    /// `Retry-After` is only included when the request was denied.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::{Duration, Utc};
    /// use tollgate_rate_limit::{RateLimitResult, RATE_LIMIT_REMAINING};
    ///
    /// let now = Utc::now();
    /// let result = RateLimitResult::denied(10, now + Duration::milliseconds(1500));
    /// let headers = result.headers(now);
    /// assert_eq!(headers[RATE_LIMIT_REMAINING], "0");
    /// assert_eq!(headers["retry-after"], "2");
    /// ```
    pub fn headers(&self, now: DateTime<Utc>) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(4);
        headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(self.limit));
        headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(self.remaining));
        headers.insert(RATE_LIMIT_RESET, HeaderValue::from(self.reset_epoch_ms()));
        if !self.success {
            headers.insert(RETRY_AFTER, HeaderValue::from(self.retry_after_secs(now)));
        }
        headers
    }

    /// Parse rate limit headers from a response.
    ///
    /// Returns `None` if the limit, remaining or reset header is missing or
    /// malformed. A present `Retry-After` marks the result as denied.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let limit = parse_header::<u32>(headers, &RATE_LIMIT_LIMIT)?;
        let remaining = parse_header::<u32>(headers, &RATE_LIMIT_REMAINING)?;
        let reset_ms = parse_header::<i64>(headers, &RATE_LIMIT_RESET)?;
        let reset = DateTime::<Utc>::from_timestamp_millis(reset_ms)?;
        Some(Self {
            success: !headers.contains_key(RETRY_AFTER),
            limit,
            remaining,
            reset,
        })
    }
}

/// Helper to parse a numeric header value.
fn parse_header<T: std::str::FromStr>(headers: &HeaderMap, key: &HeaderName) -> Option<T> {
    headers.get(key)?.to_str().ok()?.parse().ok()
}
