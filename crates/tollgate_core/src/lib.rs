//! Core data types for the tollgate admission-control core.
//!
//! This crate provides the vocabulary shared by the quota limiter, the credit
//! ledger and the response cache: subscription plans, an injectable clock,
//! and telemetry bootstrap.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod plan;
mod telemetry;

pub use clock::{Clock, ManualClock, SystemClock, next_period_start};
pub use plan::Plan;
pub use telemetry::{init_telemetry, shutdown_telemetry};
