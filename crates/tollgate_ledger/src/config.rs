//! Credit ledger configuration.

use crate::DEFAULT_LOW_WATER_MARK;
use serde::{Deserialize, Serialize};
use tollgate_core::Plan;

/// Monthly credits granted per plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanAllowances {
    /// Free plan
    pub free: u32,
    /// Pro plan
    pub pro: u32,
    /// Creator plan
    pub creator: u32,
}

impl Default for PlanAllowances {
    fn default() -> Self {
        Self {
            free: 10,
            pro: 100,
            creator: 300,
        }
    }
}

impl PlanAllowances {
    /// Allowance for `plan`.
    pub fn for_plan(&self, plan: Plan) -> u32 {
        match plan {
            Plan::Free => self.free,
            Plan::Pro => self.pro,
            Plan::Creator => self.creator,
        }
    }
}

/// Credit settings, the `[credits]` section of `tollgate.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditConfig {
    /// Remaining credits at or below this are classified as low
    #[serde(default = "default_low_water_mark")]
    pub low_water_mark: u32,

    /// Allowance granted when an account is opened
    #[serde(default)]
    pub monthly_allowance: PlanAllowances,
}

fn default_low_water_mark() -> u32 {
    DEFAULT_LOW_WATER_MARK
}

impl Default for CreditConfig {
    fn default() -> Self {
        Self {
            low_water_mark: default_low_water_mark(),
            monthly_allowance: PlanAllowances::default(),
        }
    }
}
