//! Response memoization with TTL tiers.
//!
//! This crate caches results fetched from external collaborators (store
//! lookups, generated content, dashboard aggregates) for a short time so that
//! repeated requests skip redundant calls. Call sites pick a TTL tier that
//! matches how volatile the underlying data is; real-time data such as credit
//! balances uses `CacheTier::NoCache` and is never stored.

#![warn(missing_docs)]

mod cache;
mod config;
mod key;
mod tier;

pub use cache::{CacheEntry, ResponseCache};
pub use config::{CacheConfig, CacheConfigBuilder, TtlTiers};
pub use key::{cache_key, fingerprint};
pub use tier::CacheTier;
