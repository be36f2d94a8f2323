//! Tests for layered configuration loading.

use std::io::Write;
use tempfile::NamedTempFile;
use tollgate::{CacheTier, OperationClass, Plan, TollgateConfig};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_file_overrides_only_named_keys() {
    let file = write_config(
        r#"
[rate_limit.policies.image_generation]
prefix = "ratelimit:image"
window_seconds = 120
free = 2
pro = 8
creator = 20

[cache.ttl_secs]
short = 30
"#,
    );

    let config = TollgateConfig::from_file(file.path()).unwrap();
    let policy = config
        .rate_limit
        .policies
        .policy_for(OperationClass::ImageGeneration, Plan::Free);
    assert_eq!(policy.max_requests, 2);
    assert_eq!(policy.window_seconds, 120);

    // Untouched keys keep the bundled defaults.
    let ai = config
        .rate_limit
        .policies
        .policy_for(OperationClass::AiGeneration, Plan::Creator);
    assert_eq!(ai.max_requests, 60);
    assert_eq!(config.cache.ttl(CacheTier::Short).as_secs(), 30);
    assert_eq!(config.cache.ttl(CacheTier::Long).as_secs(), 86_400);
    assert_eq!(config.credits.low_water_mark, 9);
}

#[test]
fn test_invalid_preset_is_rejected() {
    let file = write_config(
        r#"
[rate_limit.policies.scraping]
prefix = "ratelimit:scrape"
window_seconds = 60
free = 0
pro = 15
creator = 30
"#,
    );

    let err = TollgateConfig::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Configuration Error"));
}

#[test]
fn test_decreasing_plan_limits_are_rejected() {
    let file = write_config(
        r#"
[rate_limit.policies.ai_generation]
prefix = "ratelimit:ai"
window_seconds = 60
free = 50
pro = 30
creator = 60
"#,
    );

    assert!(TollgateConfig::from_file(file.path()).is_err());
}

#[test]
fn test_missing_file_is_error() {
    assert!(TollgateConfig::from_file("/nonexistent/tollgate.toml").is_err());
}

#[test]
fn test_malformed_file_is_error() {
    let file = write_config("[cache\nenabled = ");
    assert!(TollgateConfig::from_file(file.path()).is_err());
}
