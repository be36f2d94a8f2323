//! Quota limiter: admission decision per request.

use crate::{
    CoordinationMode, CounterBackend, QuotaPolicy, RateLimitConfig, RateLimitResult, WindowStore,
};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tollgate_core::Clock;
use tollgate_error::BackendError;
use tracing::{debug, instrument, warn};

// Limits how often backend degradation is logged at warn level.
type WarningThrottle = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Decides whether a subject may run an operation under a policy.
///
/// `acquire` never fails: denial is a normal result, and shared-backend
/// failures degrade to the local window store for that call only.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tollgate_core::SystemClock;
/// use tollgate_rate_limit::{QuotaLimiter, QuotaPolicy, RateLimitConfig};
///
/// # #[tokio::main]
/// # async fn main() {
/// let limiter = QuotaLimiter::local(&RateLimitConfig::default(), Arc::new(SystemClock));
/// let policy = QuotaPolicy::new("ratelimit:demo", 2, 60);
///
/// assert_eq!(limiter.acquire("user-1", &policy).await.remaining, 1);
/// assert_eq!(limiter.acquire("user-1", &policy).await.remaining, 0);
/// assert!(!limiter.acquire("user-1", &policy).await.success);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct QuotaLimiter {
    backend: CounterBackend,
    local: WindowStore,
    clock: Arc<dyn Clock>,
    warning_throttle: Arc<WarningThrottle>,
}

impl QuotaLimiter {
    /// Create a limiter around an already selected backend.
    pub fn new(backend: CounterBackend, config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        let quota = Quota::with_period(config.degraded_warning_interval())
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN));

        Self {
            backend,
            local: WindowStore::new(clock.clone(), config.maintenance_interval()),
            clock,
            warning_throttle: Arc::new(GovernorRateLimiter::direct(quota)),
        }
    }

    /// Limiter that only counts in this process.
    pub fn local(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(CounterBackend::Local, config, clock)
    }

    /// Probe `redis_url` once and build a limiter on whichever backend answered.
    pub async fn connect(
        config: &RateLimitConfig,
        redis_url: Option<&str>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let backend = CounterBackend::probe(redis_url, config.probe_attempts).await;
        Self::new(backend, config, clock)
    }

    /// Count one request by `subject` against `policy`.
    #[instrument(skip(self, policy), fields(prefix = %policy.prefix, mode = %self.mode()))]
    pub async fn acquire(&self, subject: &str, policy: &QuotaPolicy) -> RateLimitResult {
        let key = policy.key(subject);

        let result = match &self.backend {
            CounterBackend::Distributed(counter) => {
                match counter.hit(&key, policy, self.clock.now()).await {
                    Ok(result) => result,
                    Err(err) => {
                        self.report_degraded(&err);
                        self.local.hit(&key, policy)
                    }
                }
            }
            CounterBackend::Local => self.local.hit(&key, policy),
        };

        if !result.success {
            debug!(subject, limit = result.limit, reset = %result.reset, "Request denied");
        }
        result
    }

    /// Coordination mode selected at construction.
    pub fn mode(&self) -> CoordinationMode {
        self.backend.mode()
    }

    /// Remove expired local windows now.
    pub fn sweep(&self) -> usize {
        self.local.sweep()
    }

    /// Number of local windows currently tracked.
    pub fn tracked_windows(&self) -> usize {
        self.local.len()
    }

    // Returns whether the failure was logged at warn level.
    fn report_degraded(&self, err: &BackendError) -> bool {
        if self.warning_throttle.check().is_ok() {
            warn!(error = %err, "Counter backend call failed, answering from local windows");
            true
        } else {
            debug!(error = %err, "Counter backend call failed (warning suppressed)");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_core::SystemClock;

    #[test]
    fn degraded_warnings_are_throttled() {
        let limiter = QuotaLimiter::local(&RateLimitConfig::default(), Arc::new(SystemClock));
        let err = BackendError::new("connection reset");

        assert!(limiter.report_degraded(&err));
        for _ in 0..50 {
            assert!(!limiter.report_degraded(&err));
        }
    }

    #[test]
    fn clones_share_the_warning_throttle() {
        let limiter = QuotaLimiter::local(&RateLimitConfig::default(), Arc::new(SystemClock));
        let clone = limiter.clone();
        let err = BackendError::new("connection reset");

        assert!(limiter.report_degraded(&err));
        assert!(!clone.report_degraded(&err));
    }
}
