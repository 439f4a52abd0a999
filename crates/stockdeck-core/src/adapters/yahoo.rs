use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use time::{Date, OffsetDateTime};
use tracing::debug;

use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::normalize::canonicalize;
use crate::provider::{PriceSource, SourceError, SourceFuture};
use crate::provider_policy::ProviderPolicy;
use crate::{CorporateAction, PriceBar, ProviderId, Symbol};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance chart API client for daily bars and corporate actions.
#[derive(Clone)]
pub struct YahooClient {
    http_client: Arc<dyn HttpClient>,
    policy: ProviderPolicy,
}

impl YahooClient {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            policy: ProviderPolicy::yahoo_default(),
        }
    }

    pub fn with_policy(mut self, policy: ProviderPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn chart_request(&self, symbol: &Symbol) -> HttpRequest {
        HttpRequest::get(format!(
            "{CHART_URL}/{}",
            urlencoding::encode(symbol.as_str())
        ))
        .with_header("referer", "https://finance.yahoo.com/")
        .with_timeout_ms(self.policy.timeout_ms())
    }

    async fn fetch_chart(&self, request: HttpRequest) -> Result<ChartResult, SourceError> {
        debug!(url = %request.url, "yahoo chart request");

        let response = self.http_client.execute(request).await.map_err(|e| {
            SourceError::unavailable(
                ProviderId::Yahoo,
                format!("yahoo transport error: {}", e.message()),
            )
        })?;

        parse_chart(&response)
    }

    async fn fetch_bars(
        &self,
        symbol: &Symbol,
        start: Date,
        end: Date,
    ) -> Result<Vec<PriceBar>, SourceError> {
        let period2 = end.next_day().unwrap_or(end);
        let request = self
            .chart_request(symbol)
            .with_query("period1", unix_midnight(start).to_string())
            .with_query("period2", unix_midnight(period2).to_string())
            .with_query("interval", "1d")
            .with_query("events", "history");

        let chart = self.fetch_chart(request).await?;
        let bars = chart_bars(&chart)?
            .into_iter()
            .filter(|bar| start <= bar.date && bar.date <= end)
            .collect::<Vec<_>>();

        if bars.is_empty() {
            return Err(SourceError::no_data(
                ProviderId::Yahoo,
                format!("no price data for {symbol} between {start} and {end}"),
            ));
        }

        Ok(canonicalize(bars))
    }

    async fn fetch_events(&self, symbol: &Symbol) -> Result<ChartResult, SourceError> {
        let request = self
            .chart_request(symbol)
            .with_query("range", "max")
            .with_query("interval", "1mo")
            .with_query("events", "div|split");

        self.fetch_chart(request).await
    }
}

impl PriceSource for YahooClient {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn fetch_prices<'a>(
        &'a self,
        symbol: &'a Symbol,
        start: Date,
        end: Date,
    ) -> SourceFuture<'a, Vec<PriceBar>> {
        Box::pin(self.fetch_bars(symbol, start, end))
    }

    fn fetch_dividends<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, Vec<CorporateAction>> {
        Box::pin(async move {
            let chart = self.fetch_events(symbol).await?;
            chart_dividends(&chart)
        })
    }

    fn fetch_splits<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, Vec<CorporateAction>> {
        Box::pin(async move {
            let chart = self.fetch_events(symbol).await?;
            chart_splits(&chart)
        })
    }
}

fn parse_chart(response: &HttpResponse) -> Result<ChartResult, SourceError> {
    let parsed = serde_json::from_str::<ChartResponse>(&response.body);

    // Unknown symbols come back as a 404 whose body still carries a chart error.
    if let Ok(ChartResponse {
        chart: ChartEnvelope {
            error: Some(error), ..
        },
    }) = &parsed
    {
        return Err(chart_error(error));
    }

    if response.status == 429 {
        return Err(SourceError::rate_limited(
            ProviderId::Yahoo,
            "yahoo returned status 429",
        ));
    }
    if !response.is_success() {
        return Err(SourceError::unavailable(
            ProviderId::Yahoo,
            format!("yahoo returned status {}", response.status),
        ));
    }

    let response = parsed.map_err(|e| {
        SourceError::malformed(ProviderId::Yahoo, format!("failed to parse yahoo chart: {e}"))
    })?;

    response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| SourceError::no_data(ProviderId::Yahoo, "yahoo chart has no result"))
}

fn chart_error(error: &ChartError) -> SourceError {
    let message = format!(
        "yahoo chart error: {} ({})",
        error.description.as_deref().unwrap_or("no description"),
        error.code
    );

    if error.code.eq_ignore_ascii_case("Not Found") {
        SourceError::no_data(ProviderId::Yahoo, message)
    } else {
        SourceError::unavailable(ProviderId::Yahoo, message)
    }
}

fn chart_bars(chart: &ChartResult) -> Result<Vec<PriceBar>, SourceError> {
    let Some(timestamps) = &chart.timestamp else {
        return Ok(Vec::new());
    };
    let Some(quote) = chart.indicators.quote.first() else {
        return Err(SourceError::malformed(
            ProviderId::Yahoo,
            "yahoo chart has timestamps but no quote indicators",
        ));
    };

    let offset = chart.meta.gmtoffset;
    let mut bars = Vec::with_capacity(timestamps.len());

    for (i, &timestamp) in timestamps.iter().enumerate() {
        // Bars with a missing OHLC cell are holidays or halted sessions.
        let (Some(open), Some(high), Some(low), Some(close)) = (
            cell(&quote.open, i),
            cell(&quote.high, i),
            cell(&quote.low, i),
            cell(&quote.close, i),
        ) else {
            continue;
        };
        let volume = quote
            .volume
            .get(i)
            .copied()
            .flatten()
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(0);

        let date = exchange_date(timestamp, offset)?;
        match PriceBar::new(date, open, high, low, close, volume) {
            Ok(bar) => bars.push(bar),
            Err(error) => debug!(%date, "skipping invalid yahoo bar: {error}"),
        }
    }

    Ok(bars)
}

fn chart_dividends(chart: &ChartResult) -> Result<Vec<CorporateAction>, SourceError> {
    let Some(events) = chart.events.as_ref() else {
        return Ok(Vec::new());
    };

    let mut dividends = Vec::with_capacity(events.dividends.len());
    for event in events.dividends.values() {
        dividends.push(corporate_action(
            exchange_date(event.date, chart.meta.gmtoffset)?,
            event.amount,
        )?);
    }
    dividends.sort_by_key(|action| action.date);
    Ok(dividends)
}

fn chart_splits(chart: &ChartResult) -> Result<Vec<CorporateAction>, SourceError> {
    let Some(events) = chart.events.as_ref() else {
        return Ok(Vec::new());
    };

    let mut splits = Vec::with_capacity(events.splits.len());
    for event in events.splits.values() {
        if event.denominator == 0.0 {
            debug!(date = event.date, "skipping split with zero denominator");
            continue;
        }
        splits.push(corporate_action(
            exchange_date(event.date, chart.meta.gmtoffset)?,
            event.numerator / event.denominator,
        )?);
    }
    splits.sort_by_key(|action| action.date);
    Ok(splits)
}

fn corporate_action(date: Date, value: f64) -> Result<CorporateAction, SourceError> {
    CorporateAction::new(date, value)
        .map_err(|e| SourceError::malformed(ProviderId::Yahoo, format!("invalid event: {e}")))
}

fn cell(values: &[Option<f64>], index: usize) -> Option<f64> {
    values.get(index).copied().flatten()
}

/// Calendar date at the exchange for a UTC timestamp.
fn exchange_date(timestamp: i64, gmtoffset: i64) -> Result<Date, SourceError> {
    OffsetDateTime::from_unix_timestamp(timestamp.saturating_add(gmtoffset))
        .map(OffsetDateTime::date)
        .map_err(|e| {
            SourceError::malformed(ProviderId::Yahoo, format!("invalid timestamp {timestamp}: {e}"))
        })
}

fn unix_midnight(date: Date) -> i64 {
    date.midnight().assume_utc().unix_timestamp()
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: ChartIndicators,
    #[serde(default)]
    events: Option<ChartEvents>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Default, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartEvents {
    #[serde(default)]
    dividends: BTreeMap<String, DividendEvent>,
    #[serde(default)]
    splits: BTreeMap<String, SplitEvent>,
}

#[derive(Debug, Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
struct SplitEvent {
    date: i64,
    numerator: f64,
    denominator: f64,
}
