use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::http_client::{HttpClient, HttpRequest};
use crate::provider::{FundamentalsSource, SourceError, SourceFuture};
use crate::provider_policy::ProviderPolicy;
use crate::throttling::RateBudget;
use crate::{ProviderId, RawRow, RawStatement, StatementKind, StatementValue, Symbol};

const QUERY_URL: &str = "https://www.alphavantage.co/query";

/// Field naming the reporting period of each annual report.
const PERIOD_FIELD: &str = "fiscalDateEnding";
/// Provider metadata kept as the second header row.
const METADATA_FIELD: &str = "reportedCurrency";

/// Alpha Vantage fundamentals client for annual statements.
#[derive(Clone)]
pub struct AlphaVantageClient {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    policy: ProviderPolicy,
    budget: RateBudget,
}

impl AlphaVantageClient {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        let policy = ProviderPolicy::alphavantage_default();
        Self {
            http_client,
            api_key: api_key.into(),
            budget: RateBudget::from_policy(&policy),
            policy,
        }
    }

    /// Replace the policy, resetting the call budget to its quota.
    pub fn with_policy(mut self, policy: ProviderPolicy) -> Self {
        self.budget = RateBudget::from_policy(&policy);
        self.policy = policy;
        self
    }

    async fn fetch_annual_reports(
        &self,
        symbol: &Symbol,
        kind: StatementKind,
    ) -> Result<RawStatement, SourceError> {
        if self.api_key.trim().is_empty() {
            return Err(SourceError::invalid_request(
                ProviderId::Alphavantage,
                "alphavantage api key is not configured",
            ));
        }

        if let Err(replenish) = self.budget.try_acquire() {
            return Err(SourceError::rate_limited(
                ProviderId::Alphavantage,
                format!(
                    "alphavantage free-tier limit exceeded; retry in {:.0}s",
                    replenish.as_secs_f64()
                ),
            ));
        }

        let function = statement_function(kind);
        debug!(function, symbol = %symbol, "alphavantage statement request");

        let request = HttpRequest::get(QUERY_URL)
            .with_query("function", function)
            .with_query("symbol", symbol.as_str())
            .with_query("apikey", self.api_key.as_str())
            .with_timeout_ms(self.policy.timeout_ms());

        let response = self.http_client.execute(request).await.map_err(|e| {
            SourceError::unavailable(
                ProviderId::Alphavantage,
                format!("alphavantage transport error: {}", e.message()),
            )
        })?;

        if response.status == 429 {
            return Err(SourceError::rate_limited(
                ProviderId::Alphavantage,
                "alphavantage returned status 429",
            ));
        }
        if !response.is_success() {
            return Err(SourceError::unavailable(
                ProviderId::Alphavantage,
                format!("alphavantage returned status {}", response.status),
            ));
        }

        let body = serde_json::from_str::<Value>(&response.body).map_err(|e| {
            SourceError::malformed(
                ProviderId::Alphavantage,
                format!("failed to parse alphavantage {function} response: {e}"),
            )
        })?;

        transpose_reports(symbol, &body)
    }
}

impl FundamentalsSource for AlphaVantageClient {
    fn id(&self) -> ProviderId {
        ProviderId::Alphavantage
    }

    fn fetch_statement<'a>(
        &'a self,
        symbol: &'a Symbol,
        kind: StatementKind,
    ) -> SourceFuture<'a, RawStatement> {
        Box::pin(self.fetch_annual_reports(symbol, kind))
    }
}

fn statement_function(kind: StatementKind) -> &'static str {
    match kind {
        StatementKind::BalanceSheet => "BALANCE_SHEET",
        StatementKind::IncomeStatement => "INCOME_STATEMENT",
        StatementKind::CashFlow => "CASH_FLOW",
    }
}

/// Turn `annualReports` (one object per period) into one row per field, with
/// the period and currency rows leading.
fn transpose_reports(symbol: &Symbol, body: &Value) -> Result<RawStatement, SourceError> {
    // Throttling and quota notices arrive as 200 responses with a single message key.
    for key in ["Note", "Information"] {
        if let Some(notice) = body.get(key).and_then(Value::as_str) {
            return Err(SourceError::rate_limited(ProviderId::Alphavantage, notice));
        }
    }
    if let Some(message) = body.get("Error Message").and_then(Value::as_str) {
        return Err(SourceError::no_data(ProviderId::Alphavantage, message));
    }

    let reports = match body.get("annualReports") {
        Some(Value::Array(reports)) => reports
            .iter()
            .map(|report| {
                report.as_object().ok_or_else(|| {
                    SourceError::malformed(
                        ProviderId::Alphavantage,
                        "annual report entry is not an object",
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(SourceError::malformed(
                ProviderId::Alphavantage,
                "annualReports is not an array",
            ))
        }
        None if body.as_object().is_some_and(Map::is_empty) => {
            return Err(SourceError::no_data(
                ProviderId::Alphavantage,
                format!("alphavantage has no statements for {symbol}"),
            ))
        }
        None => {
            return Err(SourceError::malformed(
                ProviderId::Alphavantage,
                "response has no annualReports",
            ))
        }
    };

    if reports.is_empty() {
        return Err(SourceError::no_data(
            ProviderId::Alphavantage,
            format!("alphavantage reports no annual statements for {symbol}"),
        ));
    }

    let mut fields = vec![PERIOD_FIELD, METADATA_FIELD];
    for report in &reports {
        for key in report.keys() {
            if !fields.contains(&key.as_str()) {
                fields.push(key.as_str());
            }
        }
    }

    let rows = fields
        .into_iter()
        .map(|field| {
            let values = reports
                .iter()
                .map(|report| statement_value(report.get(field)))
                .collect();
            RawRow::new(field, values)
        })
        .collect();

    Ok(RawStatement { rows })
}

/// Alpha Vantage writes absent figures as the string `"None"`.
fn statement_value(value: Option<&Value>) -> StatementValue {
    match value {
        Some(Value::Number(number)) => number
            .as_f64()
            .map_or(StatementValue::Missing, StatementValue::Number),
        Some(Value::String(text)) if text == "None" || text.is_empty() => StatementValue::Missing,
        Some(Value::String(text)) => StatementValue::Text(text.clone()),
        Some(Value::Bool(flag)) => StatementValue::Text(flag.to_string()),
        _ => StatementValue::Missing,
    }
}
