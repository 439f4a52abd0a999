//! Runtime configuration resolved from flags and environment.

use std::sync::Arc;
use std::time::Duration;

use stockdeck_core::{
    AggregationPipeline, AlphaVantageClient, ExecutionMode, HttpClient, PolygonClient,
    ProviderId, ProviderPolicy, ReqwestHttpClient, YahooClient,
};
use tracing::warn;

use crate::cli::Cli;
use crate::error::CliError;

/// Headroom on top of the transport timeout before the pipeline gives up on a call.
const CALL_TIMEOUT_SLACK: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub alphavantage_key: String,
    pub polygon_key: String,
    pub request_timeout: Duration,
    pub mode: ExecutionMode,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.timeout_ms == 0 {
            return Err(CliError::Config(String::from(
                "--timeout-ms must be greater than zero",
            )));
        }

        Ok(Self {
            alphavantage_key: resolve_key(
                cli.alphavantage_key.as_deref(),
                ProviderId::Alphavantage,
            ),
            polygon_key: resolve_key(cli.polygon_key.as_deref(), ProviderId::Polygon),
            request_timeout: Duration::from_millis(cli.timeout_ms),
            mode: if cli.sequential {
                ExecutionMode::Sequential
            } else {
                ExecutionMode::Concurrent
            },
        })
    }

    pub fn pipeline(&self) -> AggregationPipeline {
        self.pipeline_with(Arc::new(ReqwestHttpClient::new()))
    }

    /// Build the three provider clients over `http_client`.
    pub fn pipeline_with(&self, http_client: Arc<dyn HttpClient>) -> AggregationPipeline {
        let policy = |provider: ProviderId| {
            ProviderPolicy::default_for(provider).with_request_timeout(self.request_timeout)
        };

        let prices =
            YahooClient::new(Arc::clone(&http_client)).with_policy(policy(ProviderId::Yahoo));
        let fundamentals =
            AlphaVantageClient::new(Arc::clone(&http_client), self.alphavantage_key.clone())
                .with_policy(policy(ProviderId::Alphavantage));
        let news = PolygonClient::new(http_client, self.polygon_key.clone())
            .with_policy(policy(ProviderId::Polygon));

        AggregationPipeline::new(Arc::new(prices), Arc::new(fundamentals), Arc::new(news))
            .with_mode(self.mode)
            .with_call_timeout(self.request_timeout + CALL_TIMEOUT_SLACK)
    }
}

fn resolve_key(value: Option<&str>, provider: ProviderId) -> String {
    let key = value.map(str::trim).unwrap_or_default();
    if key.is_empty() {
        warn!(%provider, "no api key configured; its sections will be unavailable");
    }
    key.to_owned()
}
