//! Plan-scaled quota presets per operation class.
//!
//! Metered classes (AI generation, scraping, image generation) scale their
//! limit with the subscription plan; read-only polling uses one flat limit.

use crate::{OperationClass, QuotaPolicy, RateLimitError, RateLimitErrorKind};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tollgate_core::Plan;

/// Preset for one operation class.
///
/// ```toml
/// [rate_limit.policies.image_generation]
/// prefix = "ratelimit:image"
/// window_seconds = 60
/// free = 5
/// pro = 15
/// creator = 30
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassPolicy {
    /// Key namespace
    pub prefix: String,
    /// Window length in seconds, shared by every plan
    pub window_seconds: u64,
    /// Requests per window on the free plan
    pub free: u32,
    /// Requests per window on the pro plan
    pub pro: u32,
    /// Requests per window on the creator plan
    pub creator: u32,
}

impl ClassPolicy {
    /// Preset whose limit scales with the plan.
    pub fn scaled(prefix: &str, window_seconds: u64, free: u32, pro: u32, creator: u32) -> Self {
        Self {
            prefix: prefix.to_string(),
            window_seconds,
            free,
            pro,
            creator,
        }
    }

    /// Preset with the same limit on every plan.
    pub fn flat(prefix: &str, window_seconds: u64, max_requests: u32) -> Self {
        Self::scaled(prefix, window_seconds, max_requests, max_requests, max_requests)
    }

    /// Requests per window for `plan`.
    pub fn max_requests(&self, plan: Plan) -> u32 {
        match plan {
            Plan::Free => self.free,
            Plan::Pro => self.pro,
            Plan::Creator => self.creator,
        }
    }

    /// Concrete policy for `plan`.
    pub fn for_plan(&self, plan: Plan) -> QuotaPolicy {
        QuotaPolicy::new(
            self.prefix.clone(),
            self.max_requests(plan),
            self.window_seconds,
        )
    }
}

/// Presets for every operation class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyPresets {
    /// Text generation
    pub ai_generation: ClassPolicy,
    /// Store listing scraping
    pub scraping: ClassPolicy,
    /// Image generation
    pub image_generation: ClassPolicy,
    /// Read-only polling
    pub generic_read: ClassPolicy,
}

impl Default for PolicyPresets {
    fn default() -> Self {
        Self {
            ai_generation: ClassPolicy::scaled("ratelimit:ai", 60, 10, 30, 60),
            scraping: ClassPolicy::scaled("ratelimit:scrape", 60, 5, 15, 30),
            image_generation: ClassPolicy::scaled("ratelimit:image", 60, 5, 15, 30),
            generic_read: ClassPolicy::flat("ratelimit:read", 60, 60),
        }
    }
}

impl PolicyPresets {
    /// Preset for `class`.
    pub fn class(&self, class: OperationClass) -> &ClassPolicy {
        match class {
            OperationClass::AiGeneration => &self.ai_generation,
            OperationClass::Scraping => &self.scraping,
            OperationClass::ImageGeneration => &self.image_generation,
            OperationClass::GenericRead => &self.generic_read,
        }
    }

    /// Policy that applies to `plan` for `class`.
    ///
    /// # Example
    ///
    /// ```
    /// use tollgate_core::Plan;
    /// use tollgate_rate_limit::{OperationClass, PolicyPresets};
    ///
    /// let presets = PolicyPresets::default();
    /// let free = presets.policy_for(OperationClass::AiGeneration, Plan::Free);
    /// let pro = presets.policy_for(OperationClass::AiGeneration, Plan::Pro);
    /// assert!(pro.max_requests > free.max_requests);
    /// ```
    pub fn policy_for(&self, class: OperationClass, plan: Plan) -> QuotaPolicy {
        self.class(class).for_plan(plan)
    }

    /// Check every derived policy, and that higher plans never get less.
    ///
    /// # Errors
    ///
    /// Returns the first invalid policy found.
    pub fn validate(&self) -> Result<(), RateLimitError> {
        for class in OperationClass::iter() {
            let preset = self.class(class);
            for plan in Plan::iter() {
                preset.for_plan(plan).validate()?;
            }
            if preset.free > preset.pro || preset.pro > preset.creator {
                return Err(RateLimitError::new(RateLimitErrorKind::InvalidPolicy(
                    format!("{}: limits must not decrease with plan", preset.prefix),
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PolicyPresets::default().validate().is_ok());
    }

    #[test]
    fn generic_read_is_flat_across_plans() {
        let presets = PolicyPresets::default();
        let limits: Vec<u32> = Plan::iter()
            .map(|p| presets.policy_for(OperationClass::GenericRead, p).max_requests)
            .collect();
        assert_eq!(limits, vec![60, 60, 60]);
    }

    #[test]
    fn higher_plans_get_more_image_generations() {
        let presets = PolicyPresets::default();
        let free = presets.policy_for(OperationClass::ImageGeneration, Plan::Free);
        let creator = presets.policy_for(OperationClass::ImageGeneration, Plan::Creator);
        assert_eq!(free.prefix, creator.prefix);
        assert_eq!(free.window_seconds, creator.window_seconds);
        assert!(creator.max_requests > free.max_requests);
    }

    #[test]
    fn decreasing_limits_are_rejected() {
        let mut presets = PolicyPresets::default();
        presets.scraping = ClassPolicy::scaled("ratelimit:scrape", 60, 20, 10, 30);
        assert!(presets.validate().is_err());
    }
}
