//! Credit ledger accessor.
//!
//! Tracks a per-user consumable balance made of a monthly allowance and
//! purchased top-ups. The authoritative balance lives in an external store
//! behind the [`CreditStore`] trait; this crate owns the deduction protocol
//! and the warning classification.
//!
//! A deduction reads the balance, refuses with a credit-exhaustion error
//! before any write when nothing is left, and otherwise issues one
//! conditional write that spends the monthly allowance before purchased
//! credits. Write failures are returned to the caller, never swallowed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod credit;
mod ledger;
mod memory;
mod store;
mod transaction;
mod warning;

pub use config::{CreditConfig, PlanAllowances};
pub use credit::{CreditBalance, CreditInfo};
pub use ledger::CreditLedger;
pub use memory::InMemoryCreditStore;
pub use store::CreditStore;
pub use transaction::{CreditSource, CreditTransaction};
pub use warning::{DEFAULT_LOW_WATER_MARK, WarningLevel, classify_warning};
