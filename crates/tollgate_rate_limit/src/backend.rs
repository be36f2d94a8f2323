//! Coordination mode selection.

use crate::DistributedCounter;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::{info, instrument, warn};

/// Where request counters live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum CoordinationMode {
    /// Shared across processes through Redis
    Distributed,
    /// This process only
    Local,
}

/// Counter strategy chosen once at startup.
#[derive(Debug, Clone)]
pub enum CounterBackend {
    /// Redis-backed counters, with per-call local fallback on error
    Distributed(DistributedCounter),
    /// In-process counters only
    Local,
}

impl CounterBackend {
    /// One-time capability probe.
    ///
    /// With no URL, selects local mode without trying anything. Otherwise
    /// connects with a short jittered exponential backoff, making at most
    /// `attempts` tries (minimum one). Failure is logged and selects local
    /// mode; it is never an error.
    #[instrument(skip(url), fields(configured = url.is_some()))]
    pub async fn probe(url: Option<&str>, attempts: u32) -> Self {
        let Some(url) = url else {
            info!("No counter backend configured, using local windows");
            return CounterBackend::Local;
        };

        let strategy = ExponentialBackoff::from_millis(100)
            .factor(2)
            .max_delay(std::time::Duration::from_secs(2))
            .map(jitter)
            .take(attempts.saturating_sub(1) as usize);

        let connected = Retry::spawn(strategy, || async move {
            DistributedCounter::connect(url).await.map_err(|err| {
                warn!(error = %err, "Counter backend probe attempt failed");
                RetryError::Transient {
                    err,
                    retry_after: None,
                }
            })
        })
        .await;

        match connected {
            Ok(counter) => CounterBackend::Distributed(counter),
            Err(err) => {
                warn!(error = %err, "Counter backend unavailable, falling back to local windows");
                CounterBackend::Local
            }
        }
    }

    /// Mode this backend provides.
    pub fn mode(&self) -> CoordinationMode {
        match self {
            CounterBackend::Distributed(_) => CoordinationMode::Distributed,
            CounterBackend::Local => CoordinationMode::Local,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_url_selects_local() {
        let backend = CounterBackend::probe(None, 3).await;
        assert_eq!(backend.mode(), CoordinationMode::Local);
    }

    #[tokio::test]
    async fn malformed_url_selects_local() {
        let backend = CounterBackend::probe(Some("not a url"), 1).await;
        assert_eq!(backend.mode(), CoordinationMode::Local);
    }

    #[test]
    fn modes_display_lowercase() {
        assert_eq!(CoordinationMode::Distributed.to_string(), "distributed");
        assert_eq!(CoordinationMode::Local.to_string(), "local");
    }
}
