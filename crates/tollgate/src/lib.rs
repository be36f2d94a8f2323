//! Admission control for metered SaaS operations.
//!
//! Tollgate decides, per request, whether a caller may proceed and what it
//! costs:
//!
//! - [`QuotaLimiter`] counts requests per subject in fixed windows, shared
//!   through Redis when available and per process otherwise.
//! - [`CreditLedger`] spends one credit per metered action, monthly
//!   allowance first, and classifies the remaining balance.
//! - [`ResponseCache`] memoizes results so repeated requests skip the work.
//!
//! [`Gatekeeper`] sequences the three for a typical handler.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tollgate::{
//!     Admission, Gatekeeper, InMemoryCreditStore, MeteredRequest, OperationClass, Plan,
//!     SystemClock, TollgateConfig, TollgateError,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), TollgateError> {
//! let store = InMemoryCreditStore::new();
//! let config = TollgateConfig::default();
//! let gate = Gatekeeper::connect(&config, Arc::new(store), Arc::new(SystemClock)).await;
//! gate.ledger().open_account("user-1", Plan::Free).await?;
//!
//! let request = MeteredRequest::new("user-1", OperationClass::AiGeneration, "caption");
//! let outcome = gate
//!     .metered(&request, || async { Ok::<_, TollgateError>("a caption".to_string()) })
//!     .await?;
//! assert!(matches!(outcome, Admission::Completed { .. }));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cli;
mod config;
mod gate;

pub use cli::{Cli, Commands};
pub use config::TollgateConfig;
pub use gate::{Admission, Gatekeeper, MeteredRequest};

// Re-export the component crates' public surface
pub use tollgate_cache::{CacheConfig, CacheTier, ResponseCache, cache_key, fingerprint};
pub use tollgate_core::{
    Clock, ManualClock, Plan, SystemClock, init_telemetry, shutdown_telemetry,
};
pub use tollgate_error::{
    CreditExhaustedError, StoreError, StoreErrorKind, TollgateError, TollgateErrorKind,
    TollgateResult,
};
pub use tollgate_ledger::{
    CreditBalance, CreditConfig, CreditInfo, CreditLedger, CreditStore, CreditTransaction,
    InMemoryCreditStore, WarningLevel, classify_warning,
};
pub use tollgate_rate_limit::{
    CoordinationMode, CounterBackend, OperationClass, PolicyPresets, QuotaLimiter, QuotaPolicy,
    RateLimitConfig, RateLimitResult,
};

#[cfg(feature = "database")]
pub use tollgate_database::PostgresCreditStore;
