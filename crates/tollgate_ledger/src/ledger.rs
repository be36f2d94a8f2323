//! Deduction protocol over a credit store.

use crate::{
    CreditBalance, CreditConfig, CreditInfo, CreditSource, CreditStore, CreditTransaction,
    WarningLevel, classify_warning,
};
use std::sync::Arc;
use tollgate_core::{Clock, Plan, next_period_start};
use tollgate_error::{CreditExhaustedError, StoreError, StoreErrorKind, TollgateResult};

/// Meters credits for a user against the external credit store.
///
/// The ledger holds no balances itself: every call reads the store afresh.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tollgate_core::{Plan, SystemClock};
/// use tollgate_ledger::{CreditConfig, CreditLedger, InMemoryCreditStore, WarningLevel};
///
/// # #[tokio::main]
/// # async fn main() -> tollgate_error::TollgateResult<()> {
/// let ledger = CreditLedger::new(
///     Arc::new(InMemoryCreditStore::new()),
///     CreditConfig::default(),
///     Arc::new(SystemClock),
/// );
/// ledger.open_account("user-1", Plan::Free).await?;
///
/// let info = ledger.deduct("user-1", "image generation").await?;
/// assert_eq!(info.remaining, 9);
/// assert_eq!(ledger.classify(&info), WarningLevel::Low);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CreditLedger {
    store: Arc<dyn CreditStore>,
    config: CreditConfig,
    clock: Arc<dyn Clock>,
}

impl CreditLedger {
    /// Create a ledger over `store`.
    pub fn new(store: Arc<dyn CreditStore>, config: CreditConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    /// Ledger settings.
    pub fn config(&self) -> &CreditConfig {
        &self.config
    }

    async fn load(&self, user_id: &str) -> TollgateResult<CreditBalance> {
        let balance = self
            .store
            .load_balance(user_id)
            .await?
            .ok_or_else(|| StoreError::new(StoreErrorKind::NotFound(user_id.to_string())))?;
        Ok(balance)
    }

    /// Spend one credit.
    ///
    /// Reads the balance, fails with `CreditExhaustedError` if nothing is
    /// left, then issues exactly one conditional write of the new balance
    /// together with its audit record.
    ///
    /// # Errors
    ///
    /// - `CreditExhausted` when the balance is zero; nothing is written.
    /// - `Store` when the read or the write fails, including a `Conflict`
    ///   when a concurrent deduction changed the balance first. The call
    ///   is not retried.
    #[tracing::instrument(skip(self))]
    pub async fn deduct(&self, user_id: &str, reason: &str) -> TollgateResult<CreditInfo> {
        let balance = self.load(user_id).await?;

        let Some((updated, source)) = balance.after_deduction() else {
            tracing::debug!(plan = %balance.plan, "Credits exhausted");
            return Err(CreditExhaustedError::new(balance.plan, balance.period_end).into());
        };

        let record = CreditTransaction::new(
            user_id,
            -1,
            source,
            reason,
            updated.remaining(),
            self.clock.now(),
        );

        if let Err(e) = self
            .store
            .commit_deduction(&balance, &updated, &record)
            .await
        {
            tracing::error!(error = %e, "Failed to commit credit deduction");
            return Err(e.into());
        }

        let info = updated.info();
        tracing::debug!(remaining = info.remaining, %source, "Deducted one credit");
        Ok(info)
    }

    /// Current balance without changing it.
    #[tracing::instrument(skip(self))]
    pub async fn peek(&self, user_id: &str) -> TollgateResult<CreditInfo> {
        Ok(self.load(user_id).await?.info())
    }

    /// Provision a new user with their plan's monthly allowance.
    ///
    /// Opening an account that already exists returns it unchanged.
    #[tracing::instrument(skip(self))]
    pub async fn open_account(&self, user_id: &str, plan: Plan) -> TollgateResult<CreditInfo> {
        let opening = CreditBalance::opening(
            user_id,
            plan,
            self.config.monthly_allowance.for_plan(plan),
            next_period_start(self.clock.now()),
        );
        let stored = self.store.open_account(opening).await?;
        tracing::info!(
            plan = %stored.plan,
            remaining = stored.remaining(),
            "Opened credit account"
        );
        Ok(stored.info())
    }

    /// Add purchased credits once the payment provider confirms payment.
    ///
    /// `reference` identifies the payment in the audit trail.
    ///
    /// # Errors
    ///
    /// Returns a `Serialization` store error for a zero amount or one that
    /// does not fit the audit record, and passes through store failures.
    #[tracing::instrument(skip(self))]
    pub async fn credit_purchase(
        &self,
        user_id: &str,
        amount: u32,
        reference: &str,
    ) -> TollgateResult<CreditInfo> {
        let signed = i32::try_from(amount)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                StoreError::new(StoreErrorKind::Serialization(format!(
                    "purchase amount {} out of range",
                    amount
                )))
            })?;
        let record = CreditTransaction::new(
            user_id,
            signed,
            CreditSource::Purchase,
            reference,
            0,
            self.clock.now(),
        );

        match self.store.credit_purchase(amount, record).await {
            Ok((balance, _)) => {
                tracing::info!(amount, remaining = balance.remaining(), "Credited purchase");
                Ok(balance.info())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to credit purchase");
                Err(e.into())
            }
        }
    }

    /// Most recent audit records, newest first.
    pub async fn history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> TollgateResult<Vec<CreditTransaction>> {
        Ok(self.store.list_transactions(user_id, limit).await?)
    }

    /// Warning level using the configured low-water mark.
    pub fn classify(&self, info: &CreditInfo) -> WarningLevel {
        classify_warning(info, self.config.low_water_mark)
    }
}
