//! Audit records for balance changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which pool a balance change touched.
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
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CreditSource {
    /// A deduction paid from the monthly allowance
    Monthly,
    /// A deduction paid from purchased credits
    Purchased,
    /// Purchased credits added after a confirmed payment
    Purchase,
}

/// One entry in a user's credit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditTransaction {
    /// Unique record id
    pub id: Uuid,
    /// Owner of the balance
    pub user_id: String,
    /// Signed change: negative for deductions, positive for purchases
    pub amount: i32,
    /// Pool the change applied to
    pub source: CreditSource,
    /// Caller-supplied reason or payment reference
    pub reason: String,
    /// Total remaining credits after the change
    pub balance_after: u32,
    /// When the change was committed
    pub created_at: DateTime<Utc>,
}

impl CreditTransaction {
    /// New record with a fresh id.
    pub fn new(
        user_id: impl Into<String>,
        amount: i32,
        source: CreditSource,
        reason: impl Into<String>,
        balance_after: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            amount,
            source,
            reason: reason.into(),
            balance_after,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn source_round_trips_through_text() {
        for source in [CreditSource::Monthly, CreditSource::Purchased, CreditSource::Purchase] {
            assert_eq!(CreditSource::from_str(source.as_ref()).unwrap(), source);
        }
        assert_eq!(
            serde_json::to_string(&CreditSource::Purchased).unwrap(),
            "\"purchased\""
        );
    }
}
