use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::pipeline::{AggregationResult, Section};
use crate::{
    CorporateAction, NewsItem, PricePoint, ProviderId, SectionError, StatementKind,
    StatementTable, Symbol,
};

/// Version of the machine-readable report layout.
pub const SCHEMA_VERSION: &str = "v1.0.0";

/// Standard wrapper for every `stockdeck` machine-readable output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub meta: EnvelopeMeta,
    pub data: T,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<EnvelopeError>,
}

impl Envelope<ReportData> {
    /// Render a pipeline result; failed sections become `null` data plus an
    /// entry in `errors`.
    pub fn from_result(result: &AggregationResult, latency_ms: u64) -> Self {
        let errors = result
            .errors()
            .into_iter()
            .map(|(section, error)| EnvelopeError::from_section(section, error))
            .collect();

        Self {
            meta: EnvelopeMeta::new(result.providers.clone(), latency_ms),
            data: ReportData::from_result(result),
            errors,
        }
    }
}

/// Metadata attached to every envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeMeta {
    pub request_id: String,
    pub schema_version: String,
    /// RFC 3339, UTC.
    pub generated_at: String,
    pub source_chain: Vec<ProviderId>,
    pub latency_ms: u64,
}

impl EnvelopeMeta {
    pub fn new(source_chain: Vec<ProviderId>, latency_ms: u64) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            schema_version: String::from(SCHEMA_VERSION),
            generated_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            source_chain,
            latency_ms,
        }
    }
}

/// Structured error for one failed section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub section: String,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ProviderId>,
}

impl EnvelopeError {
    pub fn from_section(section: &str, error: &SectionError) -> Self {
        let source = match error {
            SectionError::Fetch { provider, .. } => Some(*provider),
            SectionError::NoData { .. } => Some(ProviderId::Yahoo),
            SectionError::StatementUnavailable { .. } => Some(ProviderId::Alphavantage),
            SectionError::NewsUnavailable { .. } => Some(ProviderId::Polygon),
        };

        Self {
            section: section.to_owned(),
            code: error.code().to_owned(),
            message: error.to_string(),
            source,
        }
    }
}

/// Report payload: request echo plus each section's data, `None` when failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    pub symbol: Symbol,
    pub start: Date,
    pub end: Date,
    pub ma_window: usize,
    pub prices: Option<Vec<PricePoint>>,
    pub dividends: Option<Vec<CorporateAction>>,
    pub splits: Option<Vec<CorporateAction>>,
    pub statements: StatementData,
    pub news: Option<Vec<NewsItem>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementData {
    pub balance_sheet: Option<StatementTable>,
    pub income_statement: Option<StatementTable>,
    pub cash_flow: Option<StatementTable>,
}

impl ReportData {
    fn from_result(result: &AggregationResult) -> Self {
        let request = &result.request;
        let actions = result.actions.as_ref().ok();
        let statement =
            |kind: StatementKind| -> Option<StatementTable> { ok_clone(result.statements.get(kind)) };

        Self {
            symbol: request.symbol().clone(),
            start: request.start(),
            end: request.end(),
            ma_window: request.ma_window(),
            prices: ok_clone(&result.prices),
            dividends: actions.map(|actions| actions.dividends.clone()),
            splits: actions.map(|actions| actions.splits.clone()),
            statements: StatementData {
                balance_sheet: statement(StatementKind::BalanceSheet),
                income_statement: statement(StatementKind::IncomeStatement),
                cash_flow: statement(StatementKind::CashFlow),
            },
            news: ok_clone(&result.news),
        }
    }
}

fn ok_clone<T: Clone>(section: &Section<T>) -> Option<T> {
    section.as_ref().ok().cloned()
}
