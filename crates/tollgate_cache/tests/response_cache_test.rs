//! Tests for response cache expiry, invalidation and sweeping.

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tollgate_cache::{CacheConfig, CacheTier, ResponseCache, cache_key};
use tollgate_core::ManualClock;

fn setup() -> (ResponseCache, ManualClock) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
    let cache = ResponseCache::new(CacheConfig::default(), Arc::new(clock.clone()));
    (cache, clock)
}

#[test]
fn test_get_returns_value_within_ttl() {
    let (cache, clock) = setup();
    cache.set("dashboard:user-1", json!({"views": 120}), Duration::from_secs(60));

    clock.advance(ChronoDuration::seconds(59));
    assert_eq!(cache.get("dashboard:user-1"), Some(json!({"views": 120})));

    // Still valid at the exact expiry instant.
    clock.advance(ChronoDuration::seconds(1));
    assert!(cache.get("dashboard:user-1").is_some());
}

#[test]
fn test_get_returns_none_after_ttl() {
    let (cache, clock) = setup();
    cache.set("dashboard:user-1", json!(1), Duration::from_secs(60));

    clock.advance(ChronoDuration::seconds(61));
    assert_eq!(cache.get("dashboard:user-1"), None);
}

#[test]
fn test_zero_ttl_is_never_stored() {
    let (cache, _clock) = setup();
    cache.set("credits:user-1", json!(42), Duration::ZERO);
    cache.set_tier("credits:user-2", json!(42), CacheTier::NoCache);

    assert_eq!(cache.get("credits:user-1"), None);
    assert_eq!(cache.get("credits:user-2"), None);
    assert!(cache.is_empty());
}

#[test]
fn test_set_overwrites_and_restarts_ttl() {
    let (cache, clock) = setup();
    cache.set("feed:user-1", json!("old"), Duration::from_secs(60));
    clock.advance(ChronoDuration::seconds(50));
    cache.set("feed:user-1", json!("new"), Duration::from_secs(60));
    clock.advance(ChronoDuration::seconds(50));

    assert_eq!(cache.get("feed:user-1"), Some(json!("new")));
}

#[test]
fn test_invalidate_removes_prefix_only() {
    let (cache, _clock) = setup();
    let ttl = Duration::from_secs(3600);
    cache.set(cache_key("stats", &["user-1", "day"]), json!(1), ttl);
    cache.set(cache_key("stats", &["user-1", "week"]), json!(2), ttl);
    cache.set(cache_key("stats", &["user-2", "day"]), json!(3), ttl);
    cache.set(cache_key("feed", &["user-1"]), json!(4), ttl);

    let removed = cache.invalidate("stats:user-1:");
    assert_eq!(removed, 2);

    assert_eq!(cache.get("stats:user-1:day"), None);
    assert_eq!(cache.get("stats:user-1:week"), None);
    assert_eq!(cache.get("stats:user-2:day"), Some(json!(3)));
    assert_eq!(cache.get("feed:user-1"), Some(json!(4)));
}

#[test]
fn test_sweep_removes_only_expired() {
    let (cache, clock) = setup();
    cache.set_tier("short", json!("s"), CacheTier::Short);
    cache.set_tier("medium", json!("m"), CacheTier::Medium);
    cache.set_tier("long", json!("l"), CacheTier::Long);

    clock.advance(ChronoDuration::minutes(2));
    assert_eq!(cache.sweep(), 1);
    assert_eq!(cache.len(), 2);

    clock.advance(ChronoDuration::hours(2));
    assert_eq!(cache.sweep(), 1);
    assert_eq!(cache.get("long"), Some(json!("l")));

    // Nothing live is ever swept.
    assert_eq!(cache.sweep(), 0);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_lookups_trigger_periodic_sweep() {
    let (cache, clock) = setup();
    for i in 0..50 {
        cache.set(format!("scrape:{i}"), json!(i), Duration::from_secs(30));
    }
    cache.set("keep", json!(true), Duration::from_secs(3600));
    assert_eq!(cache.len(), 51);

    // One sweep interval later, an unrelated miss clears the stale entries.
    clock.advance(ChronoDuration::seconds(60));
    assert_eq!(cache.get("absent"), None);
    assert_eq!(cache.len(), 1);
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Lookup {
    app: String,
    rank: u32,
}

#[test]
fn test_typed_round_trip() {
    let (cache, _clock) = setup();
    let lookup = Lookup {
        app: "com.example.notes".to_string(),
        rank: 4,
    };
    cache.set_serialized("lookup:notes", &lookup, Duration::from_secs(3600));

    assert_eq!(cache.get_as::<Lookup>("lookup:notes"), Some(lookup));
    // Wrong shape is a miss, not an error.
    assert_eq!(cache.get_as::<Vec<u8>>("lookup:notes"), None);
}

#[test]
fn test_clones_share_entries() {
    let (cache, _clock) = setup();
    let handle = cache.clone();
    handle.set("shared", json!(7), Duration::from_secs(60));
    assert_eq!(cache.get("shared"), Some(json!(7)));

    cache.clear();
    assert!(handle.is_empty());
}
