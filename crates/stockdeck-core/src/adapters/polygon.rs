use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::http_client::{HttpClient, HttpRequest};
use crate::provider::{NewsSource, SourceError, SourceFuture};
use crate::provider_policy::ProviderPolicy;
use crate::throttling::RateBudget;
use crate::{ProviderId, Symbol};

const NEWS_URL: &str = "https://api.polygon.io/v2/reference/news";

/// Polygon.io reference news client.
#[derive(Clone)]
pub struct PolygonClient {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    policy: ProviderPolicy,
    budget: RateBudget,
}

impl PolygonClient {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        let policy = ProviderPolicy::polygon_default();
        Self {
            http_client,
            api_key: api_key.into(),
            budget: RateBudget::from_policy(&policy),
            policy,
        }
    }

    pub fn with_policy(mut self, policy: ProviderPolicy) -> Self {
        self.budget = RateBudget::from_policy(&policy);
        self.policy = policy;
        self
    }

    async fn fetch_payload(&self, symbol: &Symbol) -> Result<Value, SourceError> {
        if self.api_key.trim().is_empty() {
            return Err(SourceError::invalid_request(
                ProviderId::Polygon,
                "polygon api key is not configured",
            ));
        }

        if let Err(replenish) = self.budget.try_acquire() {
            return Err(SourceError::rate_limited(
                ProviderId::Polygon,
                format!(
                    "polygon call budget exhausted; retry in {:.0}s",
                    replenish.as_secs_f64()
                ),
            ));
        }

        debug!(symbol = %symbol, "polygon news request");

        let request = HttpRequest::get(NEWS_URL)
            .with_query("ticker", symbol.as_str())
            .with_query("apiKey", self.api_key.as_str())
            .with_timeout_ms(self.policy.timeout_ms());

        let response = self.http_client.execute(request).await.map_err(|e| {
            SourceError::unavailable(
                ProviderId::Polygon,
                format!("polygon transport error: {}", e.message()),
            )
        })?;

        if response.status == 429 {
            return Err(SourceError::rate_limited(
                ProviderId::Polygon,
                "polygon returned status 429",
            ));
        }
        if !response.is_success() {
            let detail = serde_json::from_str::<Value>(&response.body)
                .ok()
                .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_owned));
            let message = match detail {
                Some(detail) => format!("polygon returned status {}: {detail}", response.status),
                None => format!("polygon returned status {}", response.status),
            };
            return Err(SourceError::unavailable(ProviderId::Polygon, message));
        }

        serde_json::from_str(&response.body).map_err(|e| {
            SourceError::malformed(
                ProviderId::Polygon,
                format!("failed to parse polygon news: {e}"),
            )
        })
    }
}

impl NewsSource for PolygonClient {
    fn id(&self) -> ProviderId {
        ProviderId::Polygon
    }

    fn fetch_news<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, Value> {
        Box::pin(self.fetch_payload(symbol))
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use super::*;
    use crate::http_client::{HttpError, HttpResponse};
    use crate::provider::SourceErrorKind;

    struct RecordingHttpClient {
        response: HttpResponse,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingHttpClient {
        fn responding(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                response: HttpResponse::new(status, body),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for RecordingHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self.response.clone();
            Box::pin(async move { Ok(response) })
        }
    }

    fn aapl() -> Symbol {
        Symbol::parse("AAPL").expect("valid symbol")
    }

    #[tokio::test]
    async fn returns_the_parsed_payload_untouched() {
        let body = r#"{"results": [{"title": "Apple ships"}], "status": "OK", "count": 1}"#;
        let http = RecordingHttpClient::responding(200, body);
        let client = PolygonClient::new(http.clone(), "secret");

        let payload = client.fetch_news(&aapl()).await.expect("payload parses");

        assert_eq!(payload["results"][0]["title"], "Apple ships");
        let request = &http.recorded_requests()[0];
        assert_eq!(request.url, NEWS_URL);
        assert_eq!(request.query_value("ticker"), Some("AAPL"));
        assert_eq!(request.query_value("apiKey"), Some("secret"));
    }

    #[tokio::test]
    async fn status_429_is_rate_limited() {
        let client = PolygonClient::new(RecordingHttpClient::responding(429, ""), "secret");

        let error = client.fetch_news(&aapl()).await.expect_err("throttled");
        assert_eq!(error.kind(), SourceErrorKind::RateLimited);
    }

    #[tokio::test]
    async fn auth_failure_carries_provider_detail() {
        let body = r#"{"status": "ERROR", "request_id": "abc", "error": "Unknown API Key"}"#;
        let client = PolygonClient::new(RecordingHttpClient::responding(401, body), "wrong");

        let error = client.fetch_news(&aapl()).await.expect_err("rejected");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
        assert_eq!(error.message(), "polygon returned status 401: Unknown API Key");
    }

    #[tokio::test]
    async fn unparseable_body_is_malformed() {
        let client = PolygonClient::new(RecordingHttpClient::responding(200, "<html/>"), "secret");

        let error = client.fetch_news(&aapl()).await.expect_err("garbage");
        assert_eq!(error.kind(), SourceErrorKind::Malformed);
    }

    #[tokio::test]
    async fn empty_api_key_never_reaches_the_network() {
        let http = RecordingHttpClient::responding(200, "{}");
        let client = PolygonClient::new(http.clone(), "");

        let error = client.fetch_news(&aapl()).await.expect_err("missing key");
        assert_eq!(error.kind(), SourceErrorKind::InvalidRequest);
        assert!(http.recorded_requests().is_empty());
    }
}
