//! Credit balance and its read-only projection.

use crate::CreditSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tollgate_core::Plan;

/// Authoritative balance for one user, as read from the credit store.
///
/// Instances are request-scoped snapshots; the store owns the real state.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use tollgate_core::Plan;
/// use tollgate_ledger::{CreditBalance, CreditSource};
///
/// let balance = CreditBalance {
///     user_id: "user-1".into(),
///     plan: Plan::Pro,
///     monthly_allowance: 5,
///     monthly_used: 4,
///     purchased_remaining: 3,
///     period_end: Utc::now(),
/// };
/// assert_eq!(balance.remaining(), 4);
///
/// let (next, source) = balance.after_deduction().unwrap();
/// assert_eq!(source, CreditSource::Monthly);
/// assert_eq!((next.monthly_used, next.purchased_remaining), (5, 3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditBalance {
    /// Owner of the balance
    pub user_id: String,
    /// Subscription plan
    pub plan: Plan,
    /// Credits granted for the current period
    pub monthly_allowance: u32,
    /// Credits of the allowance already spent this period
    pub monthly_used: u32,
    /// Bought credits left; these never expire
    pub purchased_remaining: u32,
    /// When the monthly allowance is next replenished
    pub period_end: DateTime<Utc>,
}

impl CreditBalance {
    /// Fresh balance for a new user on `plan`.
    pub fn opening(
        user_id: impl Into<String>,
        plan: Plan,
        monthly_allowance: u32,
        period_end: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            plan,
            monthly_allowance,
            monthly_used: 0,
            purchased_remaining: 0,
            period_end,
        }
    }

    /// Unspent part of the monthly allowance.
    pub fn monthly_remaining(&self) -> u32 {
        self.monthly_allowance.saturating_sub(self.monthly_used)
    }

    /// Total spendable credits, never negative.
    pub fn remaining(&self) -> u32 {
        self.monthly_remaining()
            .saturating_add(self.purchased_remaining)
    }

    /// True when no credit can be spent.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Balance after spending one credit, and which pool paid for it.
    ///
    /// The monthly allowance is always drawn down before purchased credits.
    /// Returns `None` when the balance is exhausted.
    pub fn after_deduction(&self) -> Option<(CreditBalance, CreditSource)> {
        if self.monthly_remaining() > 0 {
            let mut next = self.clone();
            next.monthly_used += 1;
            Some((next, CreditSource::Monthly))
        } else if self.purchased_remaining > 0 {
            let mut next = self.clone();
            next.purchased_remaining -= 1;
            Some((next, CreditSource::Purchased))
        } else {
            None
        }
    }

    /// Read-only projection handed to callers.
    pub fn info(&self) -> CreditInfo {
        CreditInfo {
            remaining: self.remaining(),
            monthly: self.monthly_allowance,
            purchased: self.purchased_remaining,
            used: self.monthly_used,
            plan: self.plan,
            resets_at: self.period_end,
        }
    }
}

/// What a caller sees of a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditInfo {
    /// Total spendable credits
    pub remaining: u32,
    /// Monthly allowance for the current period
    pub monthly: u32,
    /// Purchased credits left
    pub purchased: u32,
    /// Monthly credits spent this period
    pub used: u32,
    /// Subscription plan
    pub plan: Plan,
    /// When the monthly allowance is next replenished
    pub resets_at: DateTime<Utc>,
}
