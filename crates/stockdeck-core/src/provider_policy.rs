use std::time::Duration;

use crate::http_client::DEFAULT_TIMEOUT_MS;
use crate::ProviderId;

/// Per-provider request budget and timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    /// `None` when the provider publishes no hard quota.
    pub quota: Option<Quota>,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub window: Duration,
    pub limit: u32,
}

impl ProviderPolicy {
    pub fn yahoo_default() -> Self {
        Self {
            provider_id: ProviderId::Yahoo,
            quota: None,
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Free tier: 5 calls per minute.
    pub fn alphavantage_default() -> Self {
        Self {
            provider_id: ProviderId::Alphavantage,
            quota: Some(Quota {
                window: Duration::from_secs(60),
                limit: 5,
            }),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Basic plan: 5 calls per minute.
    pub fn polygon_default() -> Self {
        Self {
            provider_id: ProviderId::Polygon,
            quota: Some(Quota {
                window: Duration::from_secs(60),
                limit: 5,
            }),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn default_for(provider_id: ProviderId) -> Self {
        match provider_id {
            ProviderId::Yahoo => Self::yahoo_default(),
            ProviderId::Alphavantage => Self::alphavantage_default(),
            ProviderId::Polygon => Self::polygon_default(),
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}
