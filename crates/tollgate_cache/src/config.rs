//! Response cache configuration.

use crate::CacheTier;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// TTL in seconds for each tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlTiers {
    /// `CacheTier::NoCache`
    #[serde(default)]
    pub no_cache: u64,
    /// `CacheTier::Short`
    #[serde(default = "default_short")]
    pub short: u64,
    /// `CacheTier::Medium`
    #[serde(default = "default_medium")]
    pub medium: u64,
    /// `CacheTier::Long`
    #[serde(default = "default_long")]
    pub long: u64,
}

fn default_short() -> u64 {
    60
}

fn default_medium() -> u64 {
    60 * 60
}

fn default_long() -> u64 {
    24 * 60 * 60
}

impl Default for TtlTiers {
    fn default() -> Self {
        Self {
            no_cache: 0,
            short: default_short(),
            medium: default_medium(),
            long: default_long(),
        }
    }
}

/// Configuration for the response cache, the `[cache]` section of `tollgate.toml`.
///
/// # Example
///
/// ```
/// use tollgate_cache::{CacheConfig, CacheTier};
/// use std::time::Duration;
///
/// let config = CacheConfig::default().with_max_entries(500);
/// assert_eq!(*config.max_entries(), 500);
/// assert_eq!(config.ttl(CacheTier::Short), Duration::from_secs(60));
/// assert_eq!(config.ttl(CacheTier::NoCache), Duration::ZERO);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default)]
pub struct CacheConfig {
    /// Whether caching is enabled
    #[serde(default = "default_enabled")]
    enabled: bool,

    /// Maximum number of entries before least-recently-used eviction
    #[serde(default = "default_max_entries")]
    max_entries: usize,

    /// Minimum seconds between two opportunistic sweeps of expired entries
    #[serde(default = "default_sweep_interval")]
    sweep_interval_secs: u64,

    /// TTL per tier
    #[serde(default)]
    ttl_secs: TtlTiers,
}

fn default_enabled() -> bool {
    true
}

fn default_max_entries() -> usize {
    10_000
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_entries: default_max_entries(),
            sweep_interval_secs: default_sweep_interval(),
            ttl_secs: TtlTiers::default(),
        }
    }
}

impl CacheConfig {
    /// TTL configured for `tier`.
    pub fn ttl(&self, tier: CacheTier) -> Duration {
        let secs = match tier {
            CacheTier::NoCache => self.ttl_secs.no_cache,
            CacheTier::Short => self.ttl_secs.short,
            CacheTier::Medium => self.ttl_secs.medium,
            CacheTier::Long => self.ttl_secs.long,
        };
        Duration::from_secs(secs)
    }

    /// Sweep interval as a duration.
    pub fn sweep_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.sweep_interval_secs.min(i32::MAX as u64) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_unset_fields_with_defaults() {
        let config = CacheConfigBuilder::default()
            .max_entries(2usize)
            .build()
            .unwrap();
        assert_eq!(*config.max_entries(), 2);
        assert!(*config.enabled());
        assert_eq!(config.ttl(CacheTier::Long), Duration::from_secs(86_400));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: CacheConfig = serde_json::from_str(r#"{"enabled": false}"#).unwrap();
        assert!(!*config.enabled());
        assert_eq!(config.ttl(CacheTier::Medium), Duration::from_secs(3600));
    }
}
