use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota as GovernorQuota, RateLimiter};

use crate::provider_policy::{ProviderPolicy, Quota};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Client-side call budget for a provider quota.
///
/// Never waits: an exhausted budget is reported to the caller together with
/// the interval at which the budget replenishes one call.
#[derive(Clone)]
pub struct RateBudget {
    limiter: Option<Arc<DirectRateLimiter>>,
    replenish: Duration,
}

impl RateBudget {
    pub fn new(quota: Quota) -> Self {
        Self {
            limiter: Some(Arc::new(RateLimiter::direct(governor_quota(quota)))),
            replenish: replenish_period(quota),
        }
    }

    pub fn unlimited() -> Self {
        Self {
            limiter: None,
            replenish: Duration::ZERO,
        }
    }

    pub fn from_policy(policy: &ProviderPolicy) -> Self {
        policy.quota.map_or_else(Self::unlimited, Self::new)
    }

    /// Consume one call from the budget, or return the replenish interval.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };

        limiter.check().map_err(|_| self.replenish)
    }
}

impl std::fmt::Debug for RateBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateBudget")
            .field("limited", &self.limiter.is_some())
            .finish()
    }
}

fn replenish_period(quota: Quota) -> Duration {
    let seconds_per_cell = (quota.window.as_secs_f64() / f64::from(quota.limit.max(1))).max(0.001);
    Duration::from_secs_f64(seconds_per_cell)
}

fn governor_quota(quota: Quota) -> GovernorQuota {
    let burst = NonZeroU32::new(quota.limit.max(1)).unwrap_or(NonZeroU32::MIN);

    GovernorQuota::with_period(replenish_period(quota))
        .unwrap_or_else(|| GovernorQuota::per_second(burst))
        .allow_burst(burst)
}
