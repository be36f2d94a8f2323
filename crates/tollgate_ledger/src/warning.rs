//! Low-balance warning classification.

use crate::CreditInfo;
use serde::{Deserialize, Serialize};

/// Remaining credits at or below this count are reported as low.
pub const DEFAULT_LOW_WATER_MARK: u32 = 9;

/// How urgently the user should be told about their balance.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WarningLevel {
    /// Plenty left
    #[default]
    None,
    /// Running low
    Low,
    /// Nothing left
    Critical,
}

/// Classify a balance against `low_water_mark`.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use tollgate_core::Plan;
/// use tollgate_ledger::{CreditInfo, WarningLevel, classify_warning};
///
/// let info = CreditInfo {
///     remaining: 3,
///     monthly: 3,
///     purchased: 0,
///     used: 7,
///     plan: Plan::Free,
///     resets_at: Utc::now(),
/// };
/// assert_eq!(classify_warning(&info, 9), WarningLevel::Low);
/// ```
pub fn classify_warning(info: &CreditInfo, low_water_mark: u32) -> WarningLevel {
    match info.remaining {
        0 => WarningLevel::Critical,
        n if n <= low_water_mark => WarningLevel::Low,
        _ => WarningLevel::None,
    }
}

impl CreditInfo {
    /// Warning level using `DEFAULT_LOW_WATER_MARK`.
    pub fn warning(&self) -> WarningLevel {
        classify_warning(self, DEFAULT_LOW_WATER_MARK)
    }
}
