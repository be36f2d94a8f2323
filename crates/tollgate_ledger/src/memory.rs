//! Process-local credit store.

use crate::{CreditBalance, CreditStore, CreditTransaction};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tollgate_error::{StoreError, StoreErrorKind, StoreResult};

#[derive(Debug)]
struct Account {
    balance: CreditBalance,
    transactions: Vec<CreditTransaction>,
}

/// Credit store kept in memory.
///
/// Suitable for tests and single-process deployments. Clones share the same
/// accounts. Balance updates and audit appends happen under one lock, so they
/// are atomic with respect to each other.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCreditStore {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
}

impl InMemoryCreditStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `balances`.
    pub fn with_balances(balances: impl IntoIterator<Item = CreditBalance>) -> Self {
        let accounts = balances
            .into_iter()
            .map(|balance| {
                (
                    balance.user_id.clone(),
                    Account {
                        balance,
                        transactions: Vec::new(),
                    },
                )
            })
            .collect();
        Self {
            accounts: Arc::new(Mutex::new(accounts)),
        }
    }

    /// Overwrite a balance directly, bypassing the audit trail.
    ///
    /// Stands in for the external period-reset job and for plan changes.
    pub fn put_balance(&self, balance: CreditBalance) {
        let mut accounts = self.lock();
        match accounts.get_mut(&balance.user_id) {
            Some(account) => account.balance = balance,
            None => {
                accounts.insert(
                    balance.user_id.clone(),
                    Account {
                        balance,
                        transactions: Vec::new(),
                    },
                );
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Account>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CreditStore for InMemoryCreditStore {
    async fn load_balance(&self, user_id: &str) -> StoreResult<Option<CreditBalance>> {
        Ok(self.lock().get(user_id).map(|a| a.balance.clone()))
    }

    async fn commit_deduction(
        &self,
        expected: &CreditBalance,
        updated: &CreditBalance,
        record: &CreditTransaction,
    ) -> StoreResult<()> {
        let mut accounts = self.lock();
        let account = accounts
            .get_mut(&expected.user_id)
            .ok_or_else(|| StoreError::new(StoreErrorKind::NotFound(expected.user_id.clone())))?;

        if account.balance.monthly_used != expected.monthly_used
            || account.balance.purchased_remaining != expected.purchased_remaining
        {
            return Err(StoreError::new(StoreErrorKind::Conflict(
                expected.user_id.clone(),
            )));
        }

        account.balance.monthly_used = updated.monthly_used;
        account.balance.purchased_remaining = updated.purchased_remaining;
        account.transactions.push(record.clone());
        Ok(())
    }

    async fn credit_purchase(
        &self,
        amount: u32,
        mut record: CreditTransaction,
    ) -> StoreResult<(CreditBalance, CreditTransaction)> {
        let mut accounts = self.lock();
        let account = accounts
            .get_mut(&record.user_id)
            .ok_or_else(|| StoreError::new(StoreErrorKind::NotFound(record.user_id.clone())))?;

        account.balance.purchased_remaining = account
            .balance
            .purchased_remaining
            .checked_add(amount)
            .ok_or_else(|| {
                StoreError::new(StoreErrorKind::Serialization(format!(
                    "purchased balance overflows adding {}",
                    amount
                )))
            })?;
        record.balance_after = account.balance.remaining();
        account.transactions.push(record.clone());
        Ok((account.balance.clone(), record))
    }

    async fn open_account(&self, balance: CreditBalance) -> StoreResult<CreditBalance> {
        let mut accounts = self.lock();
        let account = accounts
            .entry(balance.user_id.clone())
            .or_insert_with(|| Account {
                balance,
                transactions: Vec::new(),
            });
        Ok(account.balance.clone())
    }

    async fn list_transactions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<CreditTransaction>> {
        Ok(self
            .lock()
            .get(user_id)
            .map(|a| a.transactions.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
