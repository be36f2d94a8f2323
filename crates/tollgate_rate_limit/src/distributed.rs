//! Shared fixed-window counters in Redis.

use crate::{QuotaPolicy, RateLimitResult};
use chrono::{DateTime, Duration, Utc};
use redis::aio::MultiplexedConnection;
use std::sync::Arc;
use tollgate_error::BackendError;
use tracing::{debug, info, instrument};

/// Increments the key, starts its expiry on first hit, and returns the count
/// with the remaining lifetime in milliseconds. Runs atomically on the server.
const HIT_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
local ttl = redis.call('PTTL', KEYS[1])
if ttl < 0 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
    ttl = tonumber(ARGV[1])
end
return {count, ttl}
"#;

/// Counter backend shared by every process pointing at the same Redis.
///
/// Windows expire server-side, so no sweep is needed in this mode.
#[derive(Clone)]
pub struct DistributedCounter {
    conn: MultiplexedConnection,
    script: Arc<redis::Script>,
}

impl std::fmt::Debug for DistributedCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributedCounter").finish_non_exhaustive()
    }
}

impl DistributedCounter {
    /// Connect to `url` and confirm the server answers `PING`.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the URL is invalid, the connection fails,
    /// or the server does not answer.
    #[instrument(skip(url))]
    pub async fn connect(url: &str) -> Result<Self, BackendError> {
        let client = redis::Client::open(url)
            .map_err(|e| BackendError::new(format!("Invalid counter backend URL: {}", e)))?;
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                BackendError::new(format!("Failed to connect to counter backend: {}", e))
            })?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| BackendError::new(format!("Counter backend did not answer PING: {}", e)))?;
        info!(reply = %pong, "Connected to distributed counter backend");

        Ok(Self {
            conn,
            script: Arc::new(redis::Script::new(HIT_SCRIPT)),
        })
    }

    /// Count one request against `key` in the shared window.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the script fails or the reply is malformed.
    pub async fn hit(
        &self,
        key: &str,
        policy: &QuotaPolicy,
        now: DateTime<Utc>,
    ) -> Result<RateLimitResult, BackendError> {
        let window_ms = policy.window().num_milliseconds();
        let mut conn = self.conn.clone();

        let (count, ttl_ms): (u64, i64) = self
            .script
            .key(key)
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| BackendError::new(format!("Counter script failed for {}: {}", key, e)))?;

        let reset = now + Duration::milliseconds(ttl_ms.clamp(0, window_ms));
        let limit = policy.max_requests;
        debug!(key, count, limit, ttl_ms, "Shared window hit");

        if count <= u64::from(limit) {
            let remaining = limit - count as u32;
            Ok(RateLimitResult::admitted(limit, remaining, reset))
        } else {
            Ok(RateLimitResult::denied(limit, reset))
        }
    }
}
