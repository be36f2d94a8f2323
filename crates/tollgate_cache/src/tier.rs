//! Named TTL tiers.

use serde::{Deserialize, Serialize};

/// How long a cached response may be served, by volatility of its source.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CacheTier {
    /// Real-time data; never stored
    NoCache,
    /// About a minute
    Short,
    /// About an hour
    Medium,
    /// About a day
    Long,
}
