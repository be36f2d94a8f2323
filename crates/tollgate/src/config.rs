//! Layered configuration for the whole admission-control core.
//!
//! Configuration is loaded with the following precedence (highest first):
//! 1. `./tollgate.toml`
//! 2. `~/.config/tollgate/tollgate.toml`
//! 3. Bundled defaults (include_str! from tollgate.toml)
//!
//! Later sources override individual keys of earlier ones, so a user file
//! only needs the values it changes.

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use tollgate_cache::CacheConfig;
use tollgate_error::{ConfigError, TollgateResult};
use tollgate_ledger::CreditConfig;
use tollgate_rate_limit::RateLimitConfig;
use tracing::debug;

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../tollgate.toml");

/// Settings for the quota limiter, credit ledger and response cache.
///
/// # Example
///
/// ```no_run
/// use tollgate::TollgateConfig;
///
/// let config = TollgateConfig::load().expect("Failed to load configuration");
/// println!("Cache enabled: {}", config.cache.enabled());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TollgateConfig {
    /// `[rate_limit]` section
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// `[credits]` section
    #[serde(default)]
    pub credits: CreditConfig,
    /// `[cache]` section
    #[serde(default)]
    pub cache: CacheConfig,
}

impl TollgateConfig {
    /// Load the bundled defaults merged with any user configuration files.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file cannot be parsed or the merged
    /// result fails validation.
    pub fn load() -> TollgateResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tollgate").join("tollgate.toml");
            debug!(path = %user_config.display(), "Checking user configuration");
            builder = builder.add_source(File::from(user_config).required(false));
        }

        builder = builder.add_source(File::with_name("tollgate").required(false));

        Self::finish(builder.build())
    }

    /// Load one explicit file over the bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, malformed or invalid.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> TollgateResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading configuration from file");

        let built = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path))
            .build();
        Self::finish(built)
    }

    fn finish(built: Result<Config, config::ConfigError>) -> TollgateResult<Self> {
        let config: Self = built
            .and_then(Config::try_deserialize)
            .map_err(|e| ConfigError::new(format!("Failed to load configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid quota preset or an empty cache bound.
    pub fn validate(&self) -> TollgateResult<()> {
        self.rate_limit.validate().map_err(ConfigError::from)?;
        if *self.cache.enabled() && *self.cache.max_entries() == 0 {
            return Err(ConfigError::new(
                "cache.max_entries must be at least 1 when the cache is enabled",
            )
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_defaults_match_code_defaults() {
        let parsed: TollgateConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(parsed, TollgateConfig::default());
    }
}
