//! PostgreSQL implementation of the credit store.

use crate::schema::{credit_balances, credit_transactions};
use crate::{
    CreditBalanceRow, CreditTransactionRow, PgPool, database_url_from_env, establish_pool,
    run_migrations,
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use tollgate_error::{StoreError, StoreErrorKind, StoreResult};
use tollgate_ledger::{CreditBalance, CreditStore, CreditTransaction};
use tracing::{debug, instrument};

const DEFAULT_POOL_SIZE: u32 = 10;

/// Credit store backed by PostgreSQL.
///
/// Each call checks out a pooled connection on the blocking thread pool.
/// The deduction is a single conditional `UPDATE` plus the audit `INSERT`
/// inside one database transaction, so concurrent deductions for the same
/// user are serialized by PostgreSQL.
///
/// # Example
///
/// ```no_run
/// use tollgate_database::PostgresCreditStore;
///
/// // Requires DATABASE_URL=postgresql://localhost/tollgate in environment
/// let store = PostgresCreditStore::from_env().expect("Failed to create store");
/// store.migrate().expect("Failed to migrate");
/// ```
#[derive(Debug, Clone)]
pub struct PostgresCreditStore {
    pool: PgPool,
}

impl PostgresCreditStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect using `DATABASE_URL` with the default pool size.
    pub fn from_env() -> StoreResult<Self> {
        let url = database_url_from_env()?;
        Ok(Self::new(establish_pool(&url, DEFAULT_POOL_SIZE)?))
    }

    /// Apply pending migrations on a pooled connection.
    pub fn migrate(&self) -> StoreResult<()> {
        let mut conn = self.pool.get().map_err(pool_error)?;
        run_migrations(&mut conn)
    }

    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(pool_error)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| {
            StoreError::new(StoreErrorKind::Connection(format!(
                "Task join error: {}",
                e
            )))
        })?
    }
}

fn pool_error(e: diesel::r2d2::PoolError) -> StoreError {
    StoreError::new(StoreErrorKind::Connection(format!(
        "Failed to get connection from pool: {}",
        e
    )))
}

fn find_balance(conn: &mut PgConnection, user_id: &str) -> StoreResult<Option<CreditBalance>> {
    credit_balances::table
        .find(user_id)
        .select(CreditBalanceRow::as_select())
        .first::<CreditBalanceRow>(conn)
        .optional()?
        .map(CreditBalance::try_from)
        .transpose()
}

#[async_trait]
impl CreditStore for PostgresCreditStore {
    #[instrument(skip(self))]
    async fn load_balance(&self, user_id: &str) -> StoreResult<Option<CreditBalance>> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| find_balance(conn, &user_id)).await
    }

    #[instrument(skip(self, expected, updated, record), fields(user_id = %expected.user_id))]
    async fn commit_deduction(
        &self,
        expected: &CreditBalance,
        updated: &CreditBalance,
        record: &CreditTransaction,
    ) -> StoreResult<()> {
        let expected = CreditBalanceRow::try_from(expected)?;
        let updated = CreditBalanceRow::try_from(updated)?;
        let record = CreditTransactionRow::try_from(record)?;

        self.with_conn(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let matched = diesel::update(
                    credit_balances::table
                        .filter(credit_balances::user_id.eq(&expected.user_id))
                        .filter(credit_balances::monthly_used.eq(expected.monthly_used))
                        .filter(
                            credit_balances::purchased_remaining.eq(expected.purchased_remaining),
                        ),
                )
                .set((
                    credit_balances::monthly_used.eq(updated.monthly_used),
                    credit_balances::purchased_remaining.eq(updated.purchased_remaining),
                    credit_balances::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)?;

                if matched == 0 {
                    let exists = find_balance(conn, &expected.user_id)?.is_some();
                    let kind = if exists {
                        StoreErrorKind::Conflict(expected.user_id.clone())
                    } else {
                        StoreErrorKind::NotFound(expected.user_id.clone())
                    };
                    return Err(StoreError::new(kind));
                }

                diesel::insert_into(credit_transactions::table)
                    .values(&record)
                    .execute(conn)?;
                debug!(source = %record.source, "Committed deduction");
                Ok(())
            })
        })
        .await
    }

    #[instrument(skip(self, record), fields(user_id = %record.user_id))]
    async fn credit_purchase(
        &self,
        amount: u32,
        record: CreditTransaction,
    ) -> StoreResult<(CreditBalance, CreditTransaction)> {
        let increment = i32::try_from(amount).map_err(|_| {
            StoreError::new(StoreErrorKind::Serialization(format!(
                "purchase amount {} exceeds INTEGER range",
                amount
            )))
        })?;

        self.with_conn(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let row = diesel::update(credit_balances::table.find(&record.user_id))
                    .set((
                        credit_balances::purchased_remaining
                            .eq(credit_balances::purchased_remaining + increment),
                        credit_balances::updated_at.eq(diesel::dsl::now),
                    ))
                    .returning(CreditBalanceRow::as_returning())
                    .get_result::<CreditBalanceRow>(conn)
                    .optional()?
                    .ok_or_else(|| {
                        StoreError::new(StoreErrorKind::NotFound(record.user_id.clone()))
                    })?;
                let balance = CreditBalance::try_from(row)?;

                let mut record = record;
                record.balance_after = balance.remaining();
                diesel::insert_into(credit_transactions::table)
                    .values(&CreditTransactionRow::try_from(&record)?)
                    .execute(conn)?;
                Ok((balance, record))
            })
        })
        .await
    }

    #[instrument(skip(self, balance), fields(user_id = %balance.user_id))]
    async fn open_account(&self, balance: CreditBalance) -> StoreResult<CreditBalance> {
        let row = CreditBalanceRow::try_from(&balance)?;

        self.with_conn(move |conn| {
            let inserted = diesel::insert_into(credit_balances::table)
                .values(&row)
                .on_conflict(credit_balances::user_id)
                .do_nothing()
                .execute(conn)?;
            debug!(inserted, "Opened credit account");

            find_balance(conn, &row.user_id)?
                .ok_or_else(|| StoreError::new(StoreErrorKind::NotFound(row.user_id.clone())))
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_transactions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<CreditTransaction>> {
        let user_id = user_id.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.with_conn(move |conn| {
            credit_transactions::table
                .filter(credit_transactions::user_id.eq(&user_id))
                .order(credit_transactions::created_at.desc())
                .limit(limit)
                .select(CreditTransactionRow::as_select())
                .load::<CreditTransactionRow>(conn)?
                .into_iter()
                .map(CreditTransaction::try_from)
                .collect()
        })
        .await
    }
}
