//! Injectable time source.
//!
//! Windows, cache entries and credit periods are all compared against
//! `Clock::now()` so tests can move time deterministically.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};

/// Source of the current wall-clock time.
pub trait Clock: Debug + Send + Sync {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same instant, so a test can hand one clone to a
/// component and advance the other.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use tollgate_core::{Clock, ManualClock};
///
/// let clock = ManualClock::new(Utc::now());
/// let start = clock.now();
/// clock.advance(Duration::seconds(30));
/// assert_eq!(clock.now() - start, Duration::seconds(30));
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    /// Jump to an absolute instant.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// First instant of the calendar month following `now`, in UTC.
///
/// Monthly credit allowances are replenished at this boundary.
pub fn next_period_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}
