//! PostgreSQL credit store for tollgate.
//!
//! Implements [`tollgate_ledger::CreditStore`] with Diesel over an r2d2
//! connection pool. Blocking database work runs on tokio's blocking thread
//! pool so callers can await it from async handlers.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tollgate_core::SystemClock;
//! use tollgate_database::PostgresCreditStore;
//! use tollgate_ledger::{CreditConfig, CreditLedger};
//!
//! let store = PostgresCreditStore::from_env()?;
//! store.migrate()?;
//! let ledger = CreditLedger::new(Arc::new(store), CreditConfig::default(), Arc::new(SystemClock));
//! let info = ledger.deduct("user-42", "image generation").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod connection;
mod models;
mod store;

/// Diesel table definitions.
#[allow(missing_docs)]
pub mod schema;

pub use connection::{PgPool, database_url_from_env, establish_pool, run_migrations};
pub use models::{CreditBalanceRow, CreditTransactionRow};
pub use store::PostgresCreditStore;
