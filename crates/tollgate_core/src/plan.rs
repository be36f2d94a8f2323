//! Subscription plans.

use serde::{Deserialize, Serialize};

/// Subscription plan a user is on.
///
/// The plan selects which quota preset applies and how large the monthly
/// credit allowance is. Higher plans get proportionally higher limits.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use tollgate_core::Plan;
///
/// assert_eq!(Plan::from_str("creator").unwrap(), Plan::Creator);
/// assert_eq!(Plan::Pro.to_string(), "pro");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Plan {
    /// No subscription
    #[default]
    Free,
    /// Paid individual plan
    Pro,
    /// Highest paid plan
    Creator,
}

impl Plan {
    /// Position in the upgrade path, `Free` being 0.
    pub fn rank(&self) -> u8 {
        match self {
            Plan::Free => 0,
            Plan::Pro => 1,
            Plan::Creator => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(Plan::from_str("PRO").unwrap(), Plan::Pro);
        assert!(Plan::from_str("enterprise").is_err());
    }

    #[test]
    fn ranks_follow_upgrade_path() {
        let ranks: Vec<u8> = Plan::iter().map(|p| p.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Plan::Creator).unwrap();
        assert_eq!(json, "\"creator\"");
        let parsed: Plan = serde_json::from_str("\"free\"").unwrap();
        assert_eq!(parsed, Plan::Free);
    }
}
