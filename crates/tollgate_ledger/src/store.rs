//! System-of-record seam for credit balances.

use crate::{CreditBalance, CreditTransaction};
use async_trait::async_trait;
use std::fmt::Debug;
use tollgate_error::StoreResult;

/// External store holding authoritative balances and their audit trail.
///
/// Every method may fail independently of local invariants; the ledger
/// surfaces those failures instead of retrying them.
#[async_trait]
pub trait CreditStore: Debug + Send + Sync {
    /// Read the current balance for a user.
    ///
    /// # Returns
    /// `None` when the user has no account yet
    ///
    /// # Errors
    /// Returns StoreError if the store cannot be reached or the row is malformed
    async fn load_balance(&self, user_id: &str) -> StoreResult<Option<CreditBalance>>;

    /// Replace `expected` with `updated` and append `record`, atomically.
    ///
    /// The update only applies if the stored balance still equals `expected`;
    /// this is the single conditional write of the deduction protocol.
    ///
    /// # Arguments
    /// * `expected` - Balance as read at the start of the deduction
    /// * `updated` - Balance after one credit was spent
    /// * `record` - Audit record describing the deduction
    ///
    /// # Errors
    /// Returns StoreError if:
    /// - The balance changed since it was read (`StoreErrorKind::Conflict`)
    /// - The account does not exist
    /// - The store cannot be reached
    async fn commit_deduction(
        &self,
        expected: &CreditBalance,
        updated: &CreditBalance,
        record: &CreditTransaction,
    ) -> StoreResult<()>;

    /// Add purchased credits after a confirmed payment.
    ///
    /// The increment is applied by the store, so it is safe under concurrent
    /// deductions. `record.balance_after` is filled in by the store.
    ///
    /// # Returns
    /// The balance after the purchase and the stored record
    ///
    /// # Errors
    /// Returns StoreError if the account does not exist or the store cannot be reached
    async fn credit_purchase(
        &self,
        amount: u32,
        record: CreditTransaction,
    ) -> StoreResult<(CreditBalance, CreditTransaction)>;

    /// Create a balance unless one already exists.
    ///
    /// # Returns
    /// The stored balance, which is the existing one if the user already had an account
    async fn open_account(&self, balance: CreditBalance) -> StoreResult<CreditBalance>;

    /// Audit records for a user, newest first.
    async fn list_transactions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<CreditTransaction>>;
}
