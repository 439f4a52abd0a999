//! # Aggregation Pipeline
//!
//! Runs one ticker request against the three sources and assembles an
//! [`AggregationResult`] whose sections fail independently.
//!
//! ```text
//! prices (required) ──▶ normalize
//!        │
//!        ├─ fatal on error: every section carries the same error
//!        ▼
//! ┌──────────┬────────────────────────────┬──────┐
//! │ actions  │ balance / income / cash    │ news │   optional, concurrent or sequential
//! └──────────┴────────────────────────────┴──────┘
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::http_client::DEFAULT_TIMEOUT_MS;
use crate::news::digest;
use crate::normalize::{canonicalize, normalize};
use crate::provider::{
    FundamentalsSource, NewsSource, PriceSource, SourceError, SourceErrorKind,
};
use crate::statements::reshape;
use crate::{
    CorporateActions, NewsItem, PricePoint, ProviderId, SectionError, StatementKind,
    StatementTable, TickerRequest,
};

/// A result slice that is either data or the reason it is missing.
pub type Section<T> = Result<T, SectionError>;

/// How the optional sections are scheduled once prices are in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Poll every optional call at once within the calling task.
    #[default]
    Concurrent,
    /// One call after another, in section order.
    Sequential,
}

/// The three annual statements, each failing on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Statements {
    pub balance_sheet: Section<StatementTable>,
    pub income_statement: Section<StatementTable>,
    pub cash_flow: Section<StatementTable>,
}

impl Statements {
    fn from_fn(mut section: impl FnMut(StatementKind) -> Section<StatementTable>) -> Self {
        Self {
            balance_sheet: section(StatementKind::BalanceSheet),
            income_statement: section(StatementKind::IncomeStatement),
            cash_flow: section(StatementKind::CashFlow),
        }
    }

    pub fn get(&self, kind: StatementKind) -> &Section<StatementTable> {
        match kind {
            StatementKind::BalanceSheet => &self.balance_sheet,
            StatementKind::IncomeStatement => &self.income_statement,
            StatementKind::CashFlow => &self.cash_flow,
        }
    }

    /// Sections in [`StatementKind::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (StatementKind, &Section<StatementTable>)> {
        StatementKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }
}

/// Everything one pipeline run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResult {
    pub request: TickerRequest,
    pub prices: Section<Vec<PricePoint>>,
    pub actions: Section<CorporateActions>,
    pub statements: Statements,
    pub news: Section<Vec<NewsItem>>,
    /// Providers called during the run, in call order.
    pub providers: Vec<ProviderId>,
}

impl AggregationResult {
    fn failed(request: TickerRequest, fatal: SectionError, providers: Vec<ProviderId>) -> Self {
        Self {
            request,
            prices: Err(fatal.clone()),
            actions: Err(fatal.clone()),
            statements: Statements::from_fn(|_| Err(fatal.clone())),
            news: Err(fatal),
            providers,
        }
    }

    /// The price error that aborted the run, if any.
    pub fn fatal_error(&self) -> Option<&SectionError> {
        self.prices.as_ref().err()
    }

    pub fn is_fatal(&self) -> bool {
        self.prices.is_err()
    }

    /// Every failed section as `(section name, error)`, in section order.
    pub fn errors(&self) -> Vec<(&'static str, &SectionError)> {
        let mut errors = Vec::new();
        if let Err(error) = &self.prices {
            errors.push(("prices", error));
        }
        if let Err(error) = &self.actions {
            errors.push(("actions", error));
        }
        for (kind, section) in self.statements.iter() {
            if let Err(error) = section {
                errors.push((kind.as_str(), error));
            }
        }
        if let Err(error) = &self.news {
            errors.push(("news", error));
        }
        errors
    }
}

/// Orchestrates the price, fundamentals and news sources for one request.
#[derive(Clone)]
pub struct AggregationPipeline {
    prices: Arc<dyn PriceSource>,
    fundamentals: Arc<dyn FundamentalsSource>,
    news: Arc<dyn NewsSource>,
    mode: ExecutionMode,
    call_timeout: Duration,
}

impl AggregationPipeline {
    pub fn new(
        prices: Arc<dyn PriceSource>,
        fundamentals: Arc<dyn FundamentalsSource>,
        news: Arc<dyn NewsSource>,
    ) -> Self {
        Self {
            prices,
            fundamentals,
            news,
            mode: ExecutionMode::default(),
            call_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Upper bound on each provider call, transport timeout aside.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub const fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub const fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Run the request. Never fails as a whole: failures live in the sections.
    pub async fn run(&self, request: &TickerRequest) -> AggregationResult {
        let prices = match self.price_section(request).await {
            Ok(points) => points,
            Err(fatal) => {
                error!(
                    symbol = %request.symbol(),
                    code = fatal.code(),
                    "price fetch failed, aborting run: {fatal}"
                );
                return AggregationResult::failed(request.clone(), fatal, vec![self.prices.id()]);
            }
        };

        let (actions, statements, news) = match self.mode {
            ExecutionMode::Concurrent => {
                let (actions, (balance_sheet, income_statement, cash_flow), news) = tokio::join!(
                    self.actions_section(request),
                    async {
                        tokio::join!(
                            self.statement_section(request, StatementKind::BalanceSheet),
                            self.statement_section(request, StatementKind::IncomeStatement),
                            self.statement_section(request, StatementKind::CashFlow),
                        )
                    },
                    self.news_section(request),
                );
                let statements = Statements {
                    balance_sheet,
                    income_statement,
                    cash_flow,
                };
                (actions, statements, news)
            }
            ExecutionMode::Sequential => {
                let actions = self.actions_section(request).await;
                let statements = Statements {
                    balance_sheet: self
                        .statement_section(request, StatementKind::BalanceSheet)
                        .await,
                    income_statement: self
                        .statement_section(request, StatementKind::IncomeStatement)
                        .await,
                    cash_flow: self
                        .statement_section(request, StatementKind::CashFlow)
                        .await,
                };
                let news = self.news_section(request).await;
                (actions, statements, news)
            }
        };

        AggregationResult {
            request: request.clone(),
            prices: Ok(prices),
            actions,
            statements,
            news,
            providers: vec![self.prices.id(), self.fundamentals.id(), self.news.id()],
        }
    }

    async fn price_section(&self, request: &TickerRequest) -> Section<Vec<PricePoint>> {
        let no_data = || SectionError::NoData {
            symbol: request.symbol().clone(),
            start: request.start(),
            end: request.end(),
        };

        let bars = self
            .guarded(
                self.prices.id(),
                self.prices
                    .fetch_prices(request.symbol(), request.start(), request.end()),
            )
            .await
            .map_err(|error| match error.kind() {
                SourceErrorKind::NoData => no_data(),
                _ => SectionError::fetch(&error),
            })?;

        let bars = canonicalize(bars)
            .into_iter()
            .filter(|bar| request.contains(bar.date))
            .collect::<Vec<_>>();
        if bars.is_empty() {
            return Err(no_data());
        }

        debug!(symbol = %request.symbol(), bars = bars.len(), "prices normalized");
        Ok(normalize(bars, request.ma_window()))
    }

    async fn actions_section(&self, request: &TickerRequest) -> Section<CorporateActions> {
        let symbol = request.symbol();
        let provider = self.prices.id();

        let (dividends, splits) = match self.mode {
            ExecutionMode::Concurrent => {
                tokio::join!(
                    self.guarded(provider, self.prices.fetch_dividends(symbol)),
                    self.guarded(provider, self.prices.fetch_splits(symbol)),
                )
            }
            ExecutionMode::Sequential => (
                self.guarded(provider, self.prices.fetch_dividends(symbol))
                    .await,
                self.guarded(provider, self.prices.fetch_splits(symbol))
                    .await,
            ),
        };

        let section = dividends
            .and_then(|dividends| splits.map(|splits| (dividends, splits)))
            .map(|(dividends, splits)| {
                CorporateActions::within(dividends, splits, request.start(), request.end())
            })
            .map_err(|error| SectionError::fetch(&error));

        match &section {
            Ok(actions) => debug!(
                dividends = actions.dividends.len(),
                splits = actions.splits.len(),
                "corporate actions filtered"
            ),
            Err(error) => warn!(section = "actions", code = error.code(), "{error}"),
        }
        section
    }

    async fn statement_section(
        &self,
        request: &TickerRequest,
        kind: StatementKind,
    ) -> Section<StatementTable> {
        let section = self
            .guarded(
                self.fundamentals.id(),
                self.fundamentals.fetch_statement(request.symbol(), kind),
            )
            .await
            .map_err(|error| SectionError::statement(kind, &error))
            .and_then(|raw| reshape(kind, raw));

        match &section {
            Ok(table) => debug!(statement = %kind, metrics = table.len(), "statement reshaped"),
            Err(error) => warn!(section = kind.as_str(), code = error.code(), "{error}"),
        }
        section
    }

    async fn news_section(&self, request: &TickerRequest) -> Section<Vec<NewsItem>> {
        let section = self
            .guarded(self.news.id(), self.news.fetch_news(request.symbol()))
            .await
            .map_err(|error| SectionError::NewsUnavailable {
                message: error.message().to_owned(),
            })
            .and_then(|payload| digest(&payload));

        match &section {
            Ok(items) => debug!(articles = items.len(), "news digested"),
            Err(error) => warn!(section = "news", code = error.code(), "{error}"),
        }
        section
    }

    /// Bound a provider call by the pipeline timeout.
    async fn guarded<T>(
        &self,
        provider: ProviderId,
        call: impl Future<Output = Result<T, SourceError>>,
    ) -> Result<T, SourceError> {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::unavailable(
                provider,
                format!(
                    "{provider} call timed out after {}ms",
                    self.call_timeout.as_millis()
                ),
            )),
        }
    }
}
