//! In-process fixed windows.
//!
//! Used directly in local coordination mode and as the per-call fallback
//! when the shared backend fails. Counts are only correct within one process.

use crate::{QuotaPolicy, RateLimitResult};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tollgate_core::Clock;
use tracing::{debug, info};

/// Counter for one `(operation class, subject)` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    /// Requests observed in this window
    pub count: u32,
    /// When the window opened
    pub window_start: DateTime<Utc>,
    /// When the window closes
    pub reset_at: DateTime<Utc>,
}

impl RateWindow {
    fn open(now: DateTime<Utc>, window: Duration) -> Self {
        Self {
            count: 1,
            window_start: now,
            reset_at: now + window,
        }
    }

    /// A window is expired strictly after its reset instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.reset_at
    }
}

#[derive(Debug)]
struct WindowState {
    windows: HashMap<String, RateWindow>,
    last_sweep: DateTime<Utc>,
}

/// Exclusively owned map of local windows.
///
/// Clones share the same map. Each instance is independent, so tests can
/// build one per case.
#[derive(Debug, Clone)]
pub struct WindowStore {
    state: Arc<Mutex<WindowState>>,
    clock: Arc<dyn Clock>,
    maintenance_interval: Duration,
}

impl WindowStore {
    /// Create an empty store that sweeps at most once per `maintenance_interval`.
    pub fn new(clock: Arc<dyn Clock>, maintenance_interval: Duration) -> Self {
        let now = clock.now();
        Self {
            state: Arc::new(Mutex::new(WindowState {
                windows: HashMap::new(),
                last_sweep: now,
            })),
            clock,
            maintenance_interval,
        }
    }

    // Every mutation completes before the guard drops, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count one request against `key`.
    pub fn hit(&self, key: &str, policy: &QuotaPolicy) -> RateLimitResult {
        let now = self.clock.now();
        let mut state = self.lock();
        self.maybe_sweep(&mut state, now);

        let limit = policy.max_requests;
        if limit == 0 {
            return RateLimitResult::denied(0, now + policy.window());
        }

        match state.windows.get_mut(key) {
            Some(window) if !window.is_expired(now) => {
                if window.count < limit {
                    window.count += 1;
                    RateLimitResult::admitted(limit, limit - window.count, window.reset_at)
                } else {
                    debug!(key, count = window.count, limit, "Local window exhausted");
                    RateLimitResult::denied(limit, window.reset_at)
                }
            }
            _ => {
                let window = RateWindow::open(now, policy.window());
                state.windows.insert(key.to_string(), window);
                RateLimitResult::admitted(limit, limit - 1, window.reset_at)
            }
        }
    }

    /// Current window for `key`, if one is tracked.
    pub fn window(&self, key: &str) -> Option<RateWindow> {
        self.lock().windows.get(key).copied()
    }

    /// Remove every expired window now, regardless of the maintenance interval.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.lock();
        Self::sweep_locked(&mut state, now)
    }

    /// Number of tracked windows, expired or not.
    pub fn len(&self) -> usize {
        self.lock().windows.len()
    }

    /// Check if no windows are tracked.
    pub fn is_empty(&self) -> bool {
        self.lock().windows.is_empty()
    }

    fn maybe_sweep(&self, state: &mut WindowState, now: DateTime<Utc>) {
        if now - state.last_sweep >= self.maintenance_interval {
            Self::sweep_locked(state, now);
        }
    }

    fn sweep_locked(state: &mut WindowState, now: DateTime<Utc>) -> usize {
        let before = state.windows.len();
        state.windows.retain(|_, window| !window.is_expired(now));
        state.last_sweep = now;

        let removed = before - state.windows.len();
        if removed > 0 {
            info!(
                removed,
                remaining = state.windows.len(),
                "Swept expired rate windows"
            );
        }
        removed
    }
}
