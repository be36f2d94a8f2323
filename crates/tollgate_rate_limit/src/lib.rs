//! Per-subject request quotas.
//!
//! The quota limiter decides, per request, whether a subject (user id or IP)
//! may run an operation of a given class. Counting is a fixed-window
//! approximation of a sliding window: one counter and one reset instant per
//! `(operation class, subject)` key.
//!
//! ## Coordination modes
//!
//! - **Distributed**: counters live in Redis and are shared by every process.
//! - **Local**: counters live in this process only.
//!
//! The mode is chosen once by a capability probe at startup. In distributed
//! mode a failed call to Redis is logged and answered from the local store
//! for that call only.
//!
//! ```rust,ignore
//! use tollgate_rate_limit::{
//!     OperationClass, QuotaLimiter, RateLimitConfig, distributed_url_from_env,
//! };
//!
//! let config = RateLimitConfig::default();
//! let redis_url = distributed_url_from_env();
//! let limiter = QuotaLimiter::connect(&config, redis_url.as_deref(), clock).await;
//! let policy = config.policies.policy_for(OperationClass::ImageGeneration, plan);
//! let result = limiter.acquire("user-42", &policy).await;
//! if !result.success {
//!     return reject(result.headers(clock.now()));
//! }
//! ```

mod backend;
mod config;
mod distributed;
mod error;
mod limiter;
mod policy;
mod presets;
mod result;
mod window;

pub use backend::{CoordinationMode, CounterBackend};
pub use config::{RateLimitConfig, distributed_url_from_env};
pub use distributed::DistributedCounter;
pub use error::{RateLimitError, RateLimitErrorKind};
pub use limiter::QuotaLimiter;
pub use policy::{OperationClass, QuotaPolicy};
pub use presets::{ClassPolicy, PolicyPresets};
pub use result::{
    RateLimitResult, RATE_LIMIT_LIMIT, RATE_LIMIT_REMAINING, RATE_LIMIT_RESET,
};
pub use window::{RateWindow, WindowStore};
