//! Quota limiter configuration.

use crate::{PolicyPresets, RateLimitError};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Environment variable naming the shared counter backend.
const REDIS_URL_VAR: &str = "TOLLGATE_REDIS_URL";
/// Fallback variable name used by most hosting platforms.
const REDIS_URL_FALLBACK_VAR: &str = "REDIS_URL";

/// Quota limiter settings, the `[rate_limit]` section of `tollgate.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Minimum seconds between two sweeps of expired local windows
    #[serde(default = "default_maintenance_interval")]
    pub maintenance_interval_secs: u64,

    /// Minimum seconds between two "backend degraded" warnings
    #[serde(default = "default_degraded_warning_interval")]
    pub degraded_warning_interval_secs: u64,

    /// Connection attempts made by the startup capability probe
    #[serde(default = "default_probe_attempts")]
    pub probe_attempts: u32,

    /// Presets per operation class
    #[serde(default)]
    pub policies: PolicyPresets,
}

fn default_maintenance_interval() -> u64 {
    60
}

fn default_degraded_warning_interval() -> u64 {
    10
}

fn default_probe_attempts() -> u32 {
    3
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            maintenance_interval_secs: default_maintenance_interval(),
            degraded_warning_interval_secs: default_degraded_warning_interval(),
            probe_attempts: default_probe_attempts(),
            policies: PolicyPresets::default(),
        }
    }
}

impl RateLimitConfig {
    /// Sweep interval as a duration.
    pub fn maintenance_interval(&self) -> Duration {
        Duration::seconds(self.maintenance_interval_secs.min(i32::MAX as u64) as i64)
    }

    /// Degraded-warning interval as a std duration.
    pub fn degraded_warning_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.degraded_warning_interval_secs)
    }

    /// Validate every preset.
    ///
    /// # Errors
    ///
    /// Returns the first invalid policy.
    pub fn validate(&self) -> Result<(), RateLimitError> {
        self.policies.validate()
    }
}

/// Shared counter backend URL from the environment, if any.
///
/// Reads `TOLLGATE_REDIS_URL`, then `REDIS_URL`. Empty values count as
/// unset. Absence selects local coordination and is not an error.
pub fn distributed_url_from_env() -> Option<String> {
    [REDIS_URL_VAR, REDIS_URL_FALLBACK_VAR]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|url| url.trim().to_string())
        .find(|url| !url.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert_eq!(config.maintenance_interval(), Duration::seconds(60));
        assert_eq!(
            config.degraded_warning_interval(),
            std::time::Duration::from_secs(10)
        );
        assert_eq!(config.probe_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let parsed: RateLimitConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, RateLimitConfig::default());
    }
}
