use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::Date;

use crate::provider::{SourceError, SourceErrorKind};
use crate::{ProviderId, StatementKind, Symbol};

/// Validation and contract errors exposed by `stockdeck-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid source '{value}', expected one of yahoo, alphavantage, polygon")]
    InvalidSource { value: String },

    #[error("end date {end} is before start date {start}")]
    InvertedDateRange { start: Date, end: Date },
    #[error("date must be YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("moving average window {value} is outside {min}..={max}")]
    WindowOutOfRange { value: usize, min: usize, max: usize },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("bar high must be >= low")]
    InvalidBarRange,
}

/// Failure while serializing a table to delimited text.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv buffer was not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("csv writer could not be flushed: {0}")]
    Flush(String),
}

/// Why a statement section came back without a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementFailure {
    /// Provider quota exhausted, locally or upstream.
    RateLimited,
    /// Transport failure, timeout or rejected request.
    Upstream,
    /// The provider answered but reported nothing for the symbol.
    Empty,
    /// The payload did not have the expected table shape.
    Schema,
}

impl StatementFailure {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::Upstream => "upstream",
            Self::Empty => "empty",
            Self::Schema => "schema",
        }
    }
}

impl Display for StatementFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SourceErrorKind> for StatementFailure {
    fn from(kind: SourceErrorKind) -> Self {
        match kind {
            SourceErrorKind::RateLimited => Self::RateLimited,
            SourceErrorKind::NoData => Self::Empty,
            SourceErrorKind::Malformed => Self::Schema,
            SourceErrorKind::Unavailable | SourceErrorKind::InvalidRequest => Self::Upstream,
        }
    }
}

/// Failure marker stored in a result section in place of its data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SectionError {
    #[error("no price data for {symbol} between {start} and {end}")]
    NoData { symbol: Symbol, start: Date, end: Date },

    #[error("{provider} request failed: {message}")]
    Fetch { provider: ProviderId, message: String },

    #[error("{kind} unavailable ({reason}): {message}")]
    StatementUnavailable {
        kind: StatementKind,
        reason: StatementFailure,
        message: String,
    },

    #[error("news unavailable: {message}")]
    NewsUnavailable { message: String },
}

impl SectionError {
    pub fn fetch(error: &SourceError) -> Self {
        Self::Fetch {
            provider: error.provider(),
            message: error.message().to_owned(),
        }
    }

    pub fn statement(kind: StatementKind, error: &SourceError) -> Self {
        Self::StatementUnavailable {
            kind,
            reason: error.kind().into(),
            message: error.message().to_owned(),
        }
    }

    pub fn statement_schema(kind: StatementKind, message: impl Into<String>) -> Self {
        Self::StatementUnavailable {
            kind,
            reason: StatementFailure::Schema,
            message: message.into(),
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoData { .. } => "section.no_data",
            Self::Fetch { .. } => "section.fetch_failed",
            Self::StatementUnavailable { .. } => "section.statement_unavailable",
            Self::NewsUnavailable { .. } => "section.news_unavailable",
        }
    }
}
