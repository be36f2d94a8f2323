//! Credit exhaustion condition.

use chrono::{DateTime, Utc};
use tollgate_core::Plan;

/// The user has no credits left for a metered action.
///
/// Raised before any write is attempted, so an exhausted deduction never
/// changes the stored balance. Carries what the caller needs to render an
/// upgrade or renewal path.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use tollgate_core::Plan;
/// use tollgate_error::CreditExhaustedError;
///
/// let err = CreditExhaustedError::new(Plan::Free, Utc::now());
/// assert_eq!(err.plan, Plan::Free);
/// assert!(format!("{}", err).contains("free"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display(
    "Credits exhausted on {} plan; allowance resets at {} (line {} in {})",
    plan,
    next_reset,
    line,
    file
)]
pub struct CreditExhaustedError {
    /// Plan the user is on
    pub plan: Plan,
    /// When the monthly allowance is next replenished
    pub next_reset: DateTime<Utc>,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl CreditExhaustedError {
    /// Create a new exhaustion error at the current location.
    #[track_caller]
    pub fn new(plan: Plan, next_reset: DateTime<Utc>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            plan,
            next_reset,
            line: location.line(),
            file: location.file(),
        }
    }
}
