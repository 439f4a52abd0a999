//! # Provider Contracts
//!
//! One trait per data shape the pipeline consumes. Each provider client
//! implements exactly one of them:
//!
//! | Trait | Implemented by | Data |
//! |-------|----------------|------|
//! | [`PriceSource`] | [`YahooClient`](crate::YahooClient) | daily bars, dividends, splits |
//! | [`FundamentalsSource`] | [`AlphaVantageClient`](crate::AlphaVantageClient) | annual statements |
//! | [`NewsSource`] | [`PolygonClient`](crate::PolygonClient) | raw news payload |
//!
//! Methods return boxed futures so the traits stay object safe and sources can
//! be shared as `Arc<dyn ...>`.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{CorporateAction, PriceBar, ProviderId, RawStatement, StatementKind, Symbol};

/// Boxed future returned by every source method.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Error categories reported by provider clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorKind {
    /// Valid request, but the provider holds nothing for it.
    NoData,
    /// Transport failure, timeout or non-success status.
    Unavailable,
    RateLimited,
    /// Body could not be parsed into the expected shape.
    Malformed,
    /// Rejected before reaching the network.
    InvalidRequest,
}

/// Provider call failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    provider: ProviderId,
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn new(provider: ProviderId, kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            provider,
            kind,
            message: message.into(),
        }
    }

    pub fn no_data(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::new(provider, SourceErrorKind::NoData, message)
    }

    pub fn unavailable(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::new(provider, SourceErrorKind::Unavailable, message)
    }

    pub fn rate_limited(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::new(provider, SourceErrorKind::RateLimited, message)
    }

    pub fn malformed(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::new(provider, SourceErrorKind::Malformed, message)
    }

    pub fn invalid_request(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::new(provider, SourceErrorKind::InvalidRequest, message)
    }

    pub const fn provider(&self) -> ProviderId {
        self.provider
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::NoData => "source.no_data",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Malformed => "source.malformed",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.provider, self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Daily prices and corporate actions.
pub trait PriceSource: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Daily bars dated within `start..=end`, ascending and unique per date.
    ///
    /// # Errors
    ///
    /// [`SourceErrorKind::NoData`] when the provider returns no bars for the
    /// range or does not know the symbol.
    fn fetch_prices<'a>(
        &'a self,
        symbol: &'a Symbol,
        start: Date,
        end: Date,
    ) -> SourceFuture<'a, Vec<PriceBar>>;

    /// Full dividend history, unfiltered.
    fn fetch_dividends<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, Vec<CorporateAction>>;

    /// Full split history, unfiltered.
    fn fetch_splits<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, Vec<CorporateAction>>;
}

/// Annual financial statements.
pub trait FundamentalsSource: Send + Sync {
    fn id(&self) -> ProviderId;

    /// One statement transposed into label rows, period labels first.
    fn fetch_statement<'a>(
        &'a self,
        symbol: &'a Symbol,
        kind: StatementKind,
    ) -> SourceFuture<'a, RawStatement>;
}

/// Recent news for a ticker.
pub trait NewsSource: Send + Sync {
    fn id(&self) -> ProviderId;

    /// The provider's response body, parsed but otherwise untouched.
    fn fetch_news<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, serde_json::Value>;
}
