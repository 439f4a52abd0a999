//! # Stockdeck Core
//!
//! Aggregation pipeline for a single equity ticker: daily prices and corporate
//! actions from Yahoo Finance, annual statements from Alpha Vantage and news
//! from Polygon.io, reconciled into stable in-memory tables.
//!
//! ## Overview
//!
//! - **Provider clients** behind three small traits ([`PriceSource`],
//!   [`FundamentalsSource`], [`NewsSource`])
//! - **Normalization** of the price series with a trailing moving average and
//!   close-to-close percent change
//! - **Statement reshaping** into `metric -> period -> value` tables
//! - **News digest** bounded to the first five articles
//! - **Pipeline** that isolates failures per section
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Yahoo, Alpha Vantage and Polygon clients |
//! | [`domain`] | Domain models (bars, actions, statements, news) |
//! | [`envelope`] | JSON envelope with metadata and structured errors |
//! | [`error`] | Validation, section and export errors |
//! | [`export`] | CSV rendering |
//! | [`http_client`] | HTTP transport seam |
//! | [`news`] | News digest |
//! | [`normalize`] | Price canonicalization and derived columns |
//! | [`pipeline`] | Aggregation pipeline |
//! | [`provider`] | Source traits and provider errors |
//! | [`provider_policy`] | Per-provider quotas and timeouts |
//! | [`source`] | Provider identifiers |
//! | [`statements`] | Statement reshaping |
//! | [`throttling`] | Client-side call budgets |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use stockdeck_core::{
//!     AggregationPipeline, AlphaVantageClient, PolygonClient, ReqwestHttpClient, TickerRequest,
//!     YahooClient,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http = Arc::new(ReqwestHttpClient::new());
//!     let pipeline = AggregationPipeline::new(
//!         Arc::new(YahooClient::new(http.clone())),
//!         Arc::new(AlphaVantageClient::new(http.clone(), "alpha-key")),
//!         Arc::new(PolygonClient::new(http, "polygon-key")),
//!     );
//!
//!     let request = TickerRequest::parse("AAPL", "2024-01-01", "2024-06-30", 20)?;
//!     let result = pipeline.run(&request).await;
//!
//!     if let Some(fatal) = result.fatal_error() {
//!         eprintln!("{fatal}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Provider clients report [`SourceError`]s. The pipeline converts them into
//! [`SectionError`]s stored per section, so one failing provider never blanks
//! out unrelated data. Only a price failure is fatal:
//!
//! ```rust
//! use stockdeck_core::SectionError;
//!
//! fn banner(error: &SectionError) -> String {
//!     match error {
//!         SectionError::StatementUnavailable { kind, reason, .. } => {
//!             format!("{} unavailable ({reason})", kind.title())
//!         }
//!         other => other.to_string(),
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - Credentials are constructor arguments; this crate never reads the environment
//! - API keys are never logged

pub mod adapters;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod export;
pub mod http_client;
pub mod news;
pub mod normalize;
pub mod pipeline;
pub mod provider;
pub mod provider_policy;
pub mod source;
pub mod statements;
pub mod throttling;

// Provider clients
pub use adapters::{AlphaVantageClient, PolygonClient, YahooClient};

// Domain models
pub use domain::{
    filter_to_range, parse_date, CorporateAction, CorporateActionKind, CorporateActions,
    DerivedSeries, NewsItem, PriceBar, PricePoint, RawRow, RawStatement, StatementKind,
    StatementLine, StatementTable, StatementValue, Symbol, TickerRequest, MAX_MA_WINDOW,
    MIN_MA_WINDOW, NOT_AVAILABLE,
};

// Envelope types
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta, ReportData, StatementData};

// Error types
pub use error::{ExportError, SectionError, StatementFailure, ValidationError};

// CSV export
pub use export::{export_result, CsvExport, ExportTable};

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

// Pipeline stages
pub use news::{digest, MAX_NEWS_ITEMS};
pub use normalize::{canonicalize, normalize};
pub use pipeline::{AggregationPipeline, AggregationResult, ExecutionMode, Section, Statements};
pub use statements::reshape;

// Provider contracts
pub use provider::{
    FundamentalsSource, NewsSource, PriceSource, SourceError, SourceErrorKind, SourceFuture,
};
pub use provider_policy::{ProviderPolicy, Quota};
pub use source::ProviderId;
pub use throttling::RateBudget;
