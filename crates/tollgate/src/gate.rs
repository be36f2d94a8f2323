//! Request admission across quota, cache and credits.

use crate::TollgateConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use tollgate_cache::{CacheTier, ResponseCache};
use tollgate_core::{Clock, Plan};
use tollgate_error::TollgateError;
use tollgate_ledger::{CreditInfo, CreditLedger, CreditStore, WarningLevel};
use tollgate_rate_limit::{
    OperationClass, PolicyPresets, QuotaLimiter, RateLimitResult, distributed_url_from_env,
};
use tracing::{debug, instrument};

/// A metered operation to run on behalf of a user.
///
/// # Example
///
/// ```
/// use tollgate::{CacheTier, MeteredRequest, OperationClass};
///
/// let request = MeteredRequest::new("user-42", OperationClass::ImageGeneration, "thumbnail")
///     .cached("thumbnail:user-42:sunset", CacheTier::Long);
/// assert_eq!(request.cache_key.as_deref(), Some("thumbnail:user-42:sunset"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeteredRequest {
    /// User the quota and credits belong to
    pub user_id: String,
    /// Operation class selecting the quota preset
    pub class: OperationClass,
    /// Reason recorded in the credit history
    pub reason: String,
    /// Memoization key, if results may be reused
    pub cache_key: Option<String>,
    /// How long a result may be reused
    pub tier: CacheTier,
}

impl MeteredRequest {
    /// Uncached request.
    pub fn new(
        user_id: impl Into<String>,
        class: OperationClass,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            class,
            reason: reason.into(),
            cache_key: None,
            tier: CacheTier::NoCache,
        }
    }

    /// Reuse results stored under `key` for the duration of `tier`.
    pub fn cached(mut self, key: impl Into<String>, tier: CacheTier) -> Self {
        self.cache_key = Some(key.into());
        self.tier = tier;
        self
    }

    fn memo_key(&self) -> Option<&str> {
        match self.tier {
            CacheTier::NoCache => None,
            _ => self.cache_key.as_deref(),
        }
    }
}

/// Outcome of a metered request that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission<T> {
    /// Quota exhausted; nothing ran and no credit was spent
    Denied(RateLimitResult),
    /// Served from the response cache; no credit was spent
    Cached {
        /// Memoized result
        value: T,
        /// Quota state after this request
        rate: RateLimitResult,
    },
    /// The operation ran and one credit was spent
    Completed {
        /// Fresh result
        value: T,
        /// Quota state after this request
        rate: RateLimitResult,
        /// Balance after the deduction
        credits: CreditInfo,
        /// Warning to show alongside the result
        warning: WarningLevel,
    },
}

impl<T> Admission<T> {
    /// Quota state, whatever the outcome.
    pub fn rate(&self) -> &RateLimitResult {
        match self {
            Admission::Denied(rate) => rate,
            Admission::Cached { rate, .. } => rate,
            Admission::Completed { rate, .. } => rate,
        }
    }

    /// The result value, unless the request was denied.
    pub fn into_value(self) -> Option<T> {
        match self {
            Admission::Denied(_) => None,
            Admission::Cached { value, .. } | Admission::Completed { value, .. } => Some(value),
        }
    }
}

/// Runs the admission flow: quota, then memo lookup, then credit deduction.
///
/// The three components stay independent; the gatekeeper only sequences
/// calls to them.
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    limiter: QuotaLimiter,
    cache: ResponseCache,
    ledger: CreditLedger,
    policies: PolicyPresets,
}

impl Gatekeeper {
    /// Assemble a gatekeeper from already constructed components.
    pub fn new(
        limiter: QuotaLimiter,
        cache: ResponseCache,
        ledger: CreditLedger,
        policies: PolicyPresets,
    ) -> Self {
        Self {
            limiter,
            cache,
            ledger,
            policies,
        }
    }

    /// Build every component from `config`.
    ///
    /// The distributed counter backend is probed once, using
    /// `TOLLGATE_REDIS_URL` or `REDIS_URL` when set.
    pub async fn connect(
        config: &TollgateConfig,
        store: Arc<dyn CreditStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let redis_url = distributed_url_from_env();
        let limiter =
            QuotaLimiter::connect(&config.rate_limit, redis_url.as_deref(), clock.clone()).await;
        let cache = ResponseCache::new(config.cache.clone(), clock.clone());
        let ledger = CreditLedger::new(store, config.credits.clone(), clock);
        Self::new(limiter, cache, ledger, config.rate_limit.policies.clone())
    }

    /// Quota limiter.
    pub fn limiter(&self) -> &QuotaLimiter {
        &self.limiter
    }

    /// Response cache.
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Credit ledger.
    pub fn ledger(&self) -> &CreditLedger {
        &self.ledger
    }

    /// Count one request of `class` by `subject` on `plan`.
    ///
    /// For unmetered endpoints, where the subject may be an IP address.
    pub async fn admit(&self, subject: &str, class: OperationClass, plan: Plan) -> RateLimitResult {
        let policy = self.policies.policy_for(class, plan);
        self.limiter.acquire(subject, &policy).await
    }

    /// Admit, memoize and meter one operation.
    ///
    /// The user's plan is read first to select the quota preset. A denied
    /// request stops there. A cache hit returns the stored value without
    /// spending a credit. Otherwise one credit is deducted before `op` runs,
    /// and its result is stored under the request's cache key.
    ///
    /// # Errors
    ///
    /// - Credit exhaustion, with `is_payment_required()` set; `op` never ran.
    /// - Store failures while reading or deducting credits; `op` never ran.
    /// - Whatever `op` returns. The credit is already spent at that point.
    #[instrument(
        skip(self, request, op),
        fields(user_id = %request.user_id, class = %request.class)
    )]
    pub async fn metered<T, E, F, Fut>(
        &self,
        request: &MeteredRequest,
        op: F,
    ) -> Result<Admission<T>, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<TollgateError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let plan = self.ledger.peek(&request.user_id).await?.plan;

        let rate = self.admit(&request.user_id, request.class, plan).await;
        if !rate.success {
            return Ok(Admission::Denied(rate));
        }

        if let Some(key) = request.memo_key() {
            if let Some(value) = self.cache.get_as::<T>(key) {
                debug!(key, "Serving memoized result");
                return Ok(Admission::Cached { value, rate });
            }
        }

        let credits = self.ledger.deduct(&request.user_id, &request.reason).await?;
        let value = op().await?;

        if let Some(key) = request.memo_key() {
            self.cache
                .set_serialized(key, &value, self.cache.config().ttl(request.tier));
        }

        let warning = self.ledger.classify(&credits);
        Ok(Admission::Completed {
            value,
            rate,
            credits,
            warning,
        })
    }
}
