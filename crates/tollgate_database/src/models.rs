//! Database rows and their conversions to ledger types.

use crate::schema::{credit_balances, credit_transactions};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::str::FromStr;
use tollgate_core::Plan;
use tollgate_error::{StoreError, StoreErrorKind, StoreResult};
use tollgate_ledger::{CreditBalance, CreditSource, CreditTransaction};
use uuid::Uuid;

/// Row of the `credit_balances` table.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = credit_balances)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreditBalanceRow {
    /// Owner of the balance
    pub user_id: String,
    /// Plan name, lowercase
    pub plan: String,
    /// Credits granted for the current period
    pub monthly_allowance: i32,
    /// Credits of the allowance spent this period
    pub monthly_used: i32,
    /// Bought credits left
    pub purchased_remaining: i32,
    /// When the allowance is next replenished
    pub period_end: DateTime<Utc>,
}

/// Row of the `credit_transactions` table.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = credit_transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreditTransactionRow {
    /// Record id
    pub id: Uuid,
    /// Owner of the balance
    pub user_id: String,
    /// Signed change
    pub amount: i32,
    /// Source name, lowercase
    pub source: String,
    /// Reason or payment reference
    pub reason: String,
    /// Remaining credits after the change
    pub balance_after: i32,
    /// Commit time
    pub created_at: DateTime<Utc>,
}

fn to_column(value: u32, column: &str) -> StoreResult<i32> {
    i32::try_from(value).map_err(|_| {
        StoreError::new(StoreErrorKind::Serialization(format!(
            "{} value {} exceeds INTEGER range",
            column, value
        )))
    })
}

fn from_column(value: i32, column: &str) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| {
        StoreError::new(StoreErrorKind::Serialization(format!(
            "{} holds negative value {}",
            column, value
        )))
    })
}

impl TryFrom<CreditBalanceRow> for CreditBalance {
    type Error = StoreError;

    fn try_from(row: CreditBalanceRow) -> StoreResult<Self> {
        let plan = Plan::from_str(&row.plan).map_err(|_| {
            StoreError::new(StoreErrorKind::Serialization(format!(
                "Unknown plan '{}' for user '{}'",
                row.plan, row.user_id
            )))
        })?;
        Ok(CreditBalance {
            monthly_allowance: from_column(row.monthly_allowance, "monthly_allowance")?,
            monthly_used: from_column(row.monthly_used, "monthly_used")?,
            purchased_remaining: from_column(row.purchased_remaining, "purchased_remaining")?,
            user_id: row.user_id,
            plan,
            period_end: row.period_end,
        })
    }
}

impl TryFrom<&CreditBalance> for CreditBalanceRow {
    type Error = StoreError;

    fn try_from(balance: &CreditBalance) -> StoreResult<Self> {
        Ok(CreditBalanceRow {
            user_id: balance.user_id.clone(),
            plan: balance.plan.to_string(),
            monthly_allowance: to_column(balance.monthly_allowance, "monthly_allowance")?,
            monthly_used: to_column(balance.monthly_used, "monthly_used")?,
            purchased_remaining: to_column(balance.purchased_remaining, "purchased_remaining")?,
            period_end: balance.period_end,
        })
    }
}

impl TryFrom<CreditTransactionRow> for CreditTransaction {
    type Error = StoreError;

    fn try_from(row: CreditTransactionRow) -> StoreResult<Self> {
        let source = CreditSource::from_str(&row.source).map_err(|_| {
            StoreError::new(StoreErrorKind::Serialization(format!(
                "Unknown credit source '{}' on transaction {}",
                row.source, row.id
            )))
        })?;
        Ok(CreditTransaction {
            id: row.id,
            balance_after: from_column(row.balance_after, "balance_after")?,
            user_id: row.user_id,
            amount: row.amount,
            source,
            reason: row.reason,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<&CreditTransaction> for CreditTransactionRow {
    type Error = StoreError;

    fn try_from(record: &CreditTransaction) -> StoreResult<Self> {
        Ok(CreditTransactionRow {
            id: record.id,
            user_id: record.user_id.clone(),
            amount: record.amount,
            source: record.source.to_string(),
            reason: record.reason.clone(),
            balance_after: to_column(record.balance_after, "balance_after")?,
            created_at: record.created_at,
        })
    }
}
