//! Response cache implementation.

use crate::{CacheConfig, CacheTier};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tollgate_core::Clock;

/// Longest TTL accepted; longer requests are clamped.
const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Cached value with its expiry.
#[derive(Debug, Clone, Getters)]
pub struct CacheEntry {
    value: JsonValue,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    #[getter(skip)]
    last_access: u64,
}

impl CacheEntry {
    /// Check if this entry is expired at `now`.
    ///
    /// An entry is still valid at exactly `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Get remaining time until expiration.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        (self.expires_at - now).to_std().ok()
    }
}

#[derive(Debug)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    access_tick: u64,
    last_sweep: DateTime<Utc>,
}

/// Short-lived cache of computed or fetched results.
///
/// Clones share the same entries. The cache has no external dependency, so
/// it cannot be "unavailable": a miss is simply `None`.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tollgate_cache::{CacheConfig, ResponseCache};
/// use tollgate_core::SystemClock;
///
/// let cache = ResponseCache::new(CacheConfig::default(), Arc::new(SystemClock));
///
/// cache.set("stats:user-1:2025-06-01", json!({"views": 12}), Duration::from_secs(60));
/// assert_eq!(cache.get("stats:user-1:2025-06-01"), Some(json!({"views": 12})));
///
/// // Zero TTL opts out of caching.
/// cache.set("credits:user-1", json!(40), Duration::ZERO);
/// assert_eq!(cache.get("credits:user-1"), None);
/// ```
#[derive(Debug, Clone)]
pub struct ResponseCache {
    config: CacheConfig,
    state: Arc<Mutex<CacheState>>,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    /// Create an empty cache.
    pub fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        tracing::debug!(
            max_entries = config.max_entries(),
            enabled = config.enabled(),
            "Creating new ResponseCache"
        );
        let now = clock.now();
        Self {
            config,
            state: Arc::new(Mutex::new(CacheState {
                entries: HashMap::new(),
                access_tick: 0,
                last_sweep: now,
            })),
            clock,
        }
    }

    /// Configuration this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // Entries are replaced whole, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a live entry.
    ///
    /// Returns None if:
    /// - Entry doesn't exist
    /// - Entry is expired (it is removed)
    /// - Cache is disabled
    #[tracing::instrument(skip(self))]
    pub fn get(&self, key: &str) -> Option<JsonValue> {
        if !self.config.enabled() {
            return None;
        }

        let now = self.clock.now();
        let mut state = self.lock();
        self.maybe_sweep(&mut state, now);

        let expired = state.entries.get(key)?.is_expired(now);
        if expired {
            tracing::debug!("Cache entry expired, removing");
            state.entries.remove(key);
            return None;
        }

        state.access_tick += 1;
        let tick = state.access_tick;
        let entry = state.entries.get_mut(key)?;
        entry.last_access = tick;

        tracing::debug!(time_remaining = ?entry.time_remaining(now), "Cache hit");
        Some(entry.value.clone())
    }

    /// Look up a live entry and deserialize it.
    ///
    /// An entry that no longer deserializes as `T` is treated as a miss.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                tracing::debug!(key, error = %e, "Cached value has unexpected shape, ignoring");
                None
            }
        }
    }

    /// Store `value` under `key` for `ttl`, replacing any previous entry.
    ///
    /// A zero TTL is an explicit opt-out and stores nothing.
    #[tracing::instrument(
        skip(self, key, value),
        fields(key = %key.as_ref(), ttl_secs = ttl.as_secs())
    )]
    pub fn set(&self, key: impl AsRef<str>, value: JsonValue, ttl: Duration) {
        if !self.config.enabled() {
            tracing::debug!("Cache disabled, skipping insert");
            return;
        }
        if ttl.is_zero() {
            tracing::debug!("Zero TTL, not caching");
            return;
        }

        let key = key.as_ref();
        let now = self.clock.now();
        let ttl = chrono::Duration::from_std(ttl.min(MAX_TTL))
            .unwrap_or_else(|_| chrono::Duration::days(365));

        let mut state = self.lock();
        self.maybe_sweep(&mut state, now);

        if state.entries.len() >= *self.config.max_entries() && !state.entries.contains_key(key) {
            Self::evict_lru(&mut state);
        }

        state.access_tick += 1;
        let entry = CacheEntry {
            value,
            created_at: now,
            expires_at: now + ttl,
            last_access: state.access_tick,
        };
        state.entries.insert(key.to_string(), entry);
    }

    /// Store `value` with the TTL configured for `tier`.
    pub fn set_tier(&self, key: impl AsRef<str>, value: JsonValue, tier: CacheTier) {
        self.set(key, value, self.config.ttl(tier));
    }

    /// Serialize and store `value`.
    ///
    /// Values that fail to serialize are logged and not cached.
    pub fn set_serialized<T: Serialize>(&self, key: impl AsRef<str>, value: &T, ttl: Duration) {
        match serde_json::to_value(value) {
            Ok(json) => self.set(key, json, ttl),
            Err(e) => {
                tracing::warn!(key = key.as_ref(), error = %e, "Value not serializable, skipping")
            }
        }
    }

    /// Remove every entry whose key starts with `prefix`.
    pub fn invalidate(&self, prefix: &str) -> usize {
        let mut state = self.lock();
        let before = state.entries.len();
        state.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - state.entries.len();
        tracing::debug!(prefix, removed, "Invalidated cache entries");
        removed
    }

    /// Remove one entry.
    pub fn remove(&self, key: &str) -> bool {
        self.lock().entries.remove(key).is_some()
    }

    /// Remove expired entries from cache now.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.lock();
        Self::sweep_locked(&mut state, now)
    }

    /// Clear all cache entries.
    pub fn clear(&self) {
        let mut state = self.lock();
        let count = state.entries.len();
        state.entries.clear();
        tracing::info!(cleared = count, "Cleared cache");
    }

    /// Get number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn maybe_sweep(&self, state: &mut CacheState, now: DateTime<Utc>) {
        if now - state.last_sweep >= self.config.sweep_interval() {
            Self::sweep_locked(state, now);
        }
    }

    fn sweep_locked(state: &mut CacheState, now: DateTime<Utc>) -> usize {
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired(now));
        state.last_sweep = now;

        let removed = before - state.entries.len();
        if removed > 0 {
            tracing::info!(
                removed,
                remaining = state.entries.len(),
                "Cleaned up expired cache entries"
            );
        }
        removed
    }

    /// Evict least recently used entry.
    fn evict_lru(state: &mut CacheState) {
        let oldest = state
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            tracing::debug!(key = %key, "Evicting LRU entry");
            state.entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use tollgate_core::ManualClock;

    fn cache_with(config: CacheConfig) -> (ResponseCache, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap());
        (ResponseCache::new(config, Arc::new(clock.clone())), clock)
    }

    #[test]
    fn lru_entry_is_evicted_at_capacity() {
        let (cache, _clock) = cache_with(CacheConfig::default().with_max_entries(2));
        let ttl = Duration::from_secs(60);
        cache.set("a", json!(1), ttl);
        cache.set("b", json!(2), ttl);
        assert!(cache.get("a").is_some());

        cache.set("c", json!(3), ttl);
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn overwrite_at_capacity_does_not_evict() {
        let (cache, _clock) = cache_with(CacheConfig::default().with_max_entries(2));
        let ttl = Duration::from_secs(60);
        cache.set("a", json!(1), ttl);
        cache.set("b", json!(2), ttl);
        cache.set("a", json!(10), ttl);
        assert_eq!(cache.get("a"), Some(json!(10)));
        assert_eq!(cache.get("b"), Some(json!(2)));
    }

    #[test]
    fn disabled_cache_always_misses() {
        let (cache, _clock) = cache_with(CacheConfig::default().with_enabled(false));
        cache.set("a", json!(1), Duration::from_secs(60));
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn expired_entry_is_removed_on_lookup() {
        let (cache, clock) = cache_with(CacheConfig::default());
        cache.set("a", json!(1), Duration::from_secs(5));
        clock.advance(chrono::Duration::seconds(6));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("a").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn time_remaining_counts_down() {
        let (cache, clock) = cache_with(CacheConfig::default());
        cache.set("a", json!(1), Duration::from_secs(30));
        clock.advance(chrono::Duration::seconds(10));
        let state = cache.lock();
        let entry = &state.entries["a"];
        assert_eq!(entry.time_remaining(clock.now()), Some(Duration::from_secs(20)));
        assert_eq!(*entry.value(), json!(1));
    }
}
