//! Error types for the tollgate admission-control core.
//!
//! This crate provides the foundation error types used throughout the tollgate workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Credit exhaustion is its own variant so callers can route it to a
//! "payment required" outcome instead of treating it as an infrastructure failure.
//!
//! # Examples
//!
//! ```
//! use tollgate_error::{TollgateResult, StoreError, StoreErrorKind};
//!
//! fn load() -> TollgateResult<u32> {
//!     Err(StoreError::new(StoreErrorKind::Connection("refused".into())))?
//! }
//!
//! match load() {
//!     Ok(n) => println!("Got: {}", n),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod credit;
mod error;
mod store;

pub use backend::BackendError;
pub use config::ConfigError;
pub use credit::CreditExhaustedError;
pub use error::{TollgateError, TollgateErrorKind, TollgateResult};
pub use store::{StoreError, StoreErrorKind, StoreResult};
