//! Contract tests for the provider clients against recorded payload shapes,
//! wired through the real pipeline.

use std::sync::Arc;

use stockdeck_core::{
    AggregationPipeline, AlphaVantageClient, FundamentalsSource, HttpError, NewsSource,
    PolygonClient, PriceSource, ProviderId, SectionError, SourceErrorKind, StatementFailure,
    StatementKind, StatementValue, Symbol, TickerRequest, YahooClient,
};
use stockdeck_tests::ScriptedHttpClient;
use time::macros::date;

// 2024-01-02 .. 2024-01-08 trading days at 14:30 UTC, exchange offset -5h.
const DAILY_CHART: &str = r#"{
  "chart": {
    "result": [{
      "meta": {"currency": "USD", "symbol": "AAPL", "exchangeName": "NMS", "gmtoffset": -18000, "timezone": "EST"},
      "timestamp": [1704205800, 1704292200, 1704378600, 1704465000, 1704724200],
      "indicators": {"quote": [{
        "open":   [187.15, 184.22, 182.15, 181.99, 182.09],
        "high":   [188.44, 185.88, 183.09, 182.76, 185.60],
        "low":    [183.89, 183.43, 180.88, 180.17, 181.50],
        "close":  [185.64, 184.25, 181.91, 181.18, 185.56],
        "volume": [82488700, 58414500, 71983600, 62303300, 59144500]
      }]}
    }],
    "error": null
  }
}"#;

const EVENTS_CHART: &str = r#"{
  "chart": {
    "result": [{
      "meta": {"symbol": "AAPL", "gmtoffset": -18000},
      "timestamp": [1701388800, 1704067200],
      "indicators": {"quote": [{"open": [190.3, 187.1], "high": [199.6, 188.4], "low": [187.4, 180.2], "close": [192.5, 184.4], "volume": [1, 1]}]},
      "events": {
        "dividends": {
          "1699626600": {"amount": 0.24, "date": 1699626600},
          "1707489000": {"amount": 0.24, "date": 1707489000}
        },
        "splits": {
          "1598880600": {"date": 1598880600, "numerator": 4, "denominator": 1, "splitRatio": "4:1"}
        }
      }
    }],
    "error": null
  }
}"#;

const BALANCE_SHEET: &str = r#"{
  "symbol": "AAPL",
  "annualReports": [
    {"fiscalDateEnding": "2023-09-30", "reportedCurrency": "USD", "totalAssets": "352583000000", "totalCurrentAssets": "143566000000", "goodwill": "None"},
    {"fiscalDateEnding": "2022-09-30", "reportedCurrency": "USD", "totalAssets": "352755000000", "totalCurrentAssets": "135405000000", "goodwill": "None"}
  ]
}"#;

const CASH_FLOW: &str = r#"{
  "symbol": "AAPL",
  "annualReports": [
    {"fiscalDateEnding": "2023-09-30", "reportedCurrency": "USD", "operatingCashflow": "110543000000"}
  ]
}"#;

const AV_NOTE: &str = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute and 500 calls per day."}"#;

const NEWS: &str = r#"{
  "results": [
    {
      "id": "a1",
      "publisher": {"name": "The Motley Fool", "homepage_url": "https://www.fool.com/"},
      "title": "Apple Stock: Buy, Sell, or Hold?",
      "published_utc": "2024-01-08T14:05:00Z",
      "article_url": "https://www.fool.com/apple",
      "image_url": "https://g.foolcdn.com/apple.png",
      "description": "Apple faces a slow year.",
      "insights": [{"ticker": "AAPL", "sentiment": "neutral", "sentiment_reasoning": "mixed"}]
    },
    {
      "id": "a2",
      "publisher": {"name": "Benzinga"},
      "title": "Apple price target raised",
      "published_utc": "2024-01-07T09:00:00Z",
      "article_url": "https://www.benzinga.com/apple"
    }
  ],
  "status": "OK",
  "count": 2
}"#;

fn aapl() -> Symbol {
    Symbol::parse("AAPL").expect("valid symbol")
}

fn recorded_world() -> ScriptedHttpClient {
    ScriptedHttpClient::new()
        .route("period1=", 200, DAILY_CHART)
        .route("range=max", 200, EVENTS_CHART)
        .route("function=BALANCE_SHEET", 200, BALANCE_SHEET)
        .route("function=INCOME_STATEMENT", 200, AV_NOTE)
        .route("function=CASH_FLOW", 200, CASH_FLOW)
        .route("v2/reference/news", 200, NEWS)
}

fn pipeline(http: Arc<ScriptedHttpClient>) -> AggregationPipeline {
    AggregationPipeline::new(
        Arc::new(YahooClient::new(http.clone())),
        Arc::new(AlphaVantageClient::new(http.clone(), "av-key")),
        Arc::new(PolygonClient::new(http, "polygon-key")),
    )
}

#[tokio::test]
async fn recorded_payloads_flow_through_the_whole_pipeline() {
    let http = Arc::new(recorded_world());
    let request =
        TickerRequest::parse("aapl", "2024-01-01", "2024-02-29", 5).expect("valid request");

    let result = pipeline(http.clone()).run(&request).await;

    let prices = result.prices.as_ref().expect("prices populated");
    let dates = prices.iter().map(|p| p.bar.date).collect::<Vec<_>>();
    assert_eq!(
        dates,
        vec![
            date!(2024 - 01 - 02),
            date!(2024 - 01 - 03),
            date!(2024 - 01 - 04),
            date!(2024 - 01 - 05),
            date!(2024 - 01 - 08),
        ]
    );
    assert_eq!(prices[1].derived.pct_change, -0.75);
    let ma = prices[4].derived.moving_average.expect("five bars seen");
    assert!((ma - 183.708).abs() < 1e-9);

    let actions = result.actions.as_ref().expect("actions populated");
    assert_eq!(actions.dividends.len(), 1);
    assert_eq!(actions.dividends[0].date, date!(2024 - 02 - 09));
    assert!(actions.splits.is_empty());

    let balance_sheet = result
        .statements
        .balance_sheet
        .as_ref()
        .expect("balance sheet populated");
    assert_eq!(balance_sheet.periods, vec!["2023-09-30", "2022-09-30"]);
    assert_eq!(balance_sheet.len(), 3);
    assert_eq!(
        balance_sheet.get("totalAssets", "2023-09-30"),
        Some(&StatementValue::Text(String::from("352583000000")))
    );
    assert_eq!(
        balance_sheet.get("goodwill", "2022-09-30"),
        Some(&StatementValue::Missing)
    );

    assert!(matches!(
        &result.statements.income_statement,
        Err(SectionError::StatementUnavailable {
            kind: StatementKind::IncomeStatement,
            reason: StatementFailure::RateLimited,
            message,
        }) if message.contains("5 calls per minute")
    ));
    assert_eq!(
        result.statements.cash_flow.as_ref().map(|t| t.len()),
        Ok(1)
    );

    let news = result.news.as_ref().expect("news populated");
    assert_eq!(news.len(), 2);
    assert_eq!(news[0].source_name, "The Motley Fool");
    assert_eq!(news[0].sentiment, "neutral");
    assert_eq!(news[1].sentiment, "N/A");
    assert_eq!(news[1].image_url, None);
    assert_eq!(
        news[1].article_url.as_deref(),
        Some("https://www.benzinga.com/apple")
    );

    // one price call, dividends and splits share the events endpoint
    assert_eq!(http.requests_matching("period1="), 1);
    assert_eq!(http.requests_matching("range=max"), 2);
    assert_eq!(http.requests_matching("alphavantage.co"), 3);
    assert_eq!(http.requests_matching("polygon.io"), 1);
}

#[tokio::test]
async fn unknown_ticker_stops_the_run_before_other_providers() {
    let http = Arc::new(
        ScriptedHttpClient::new()
            .route(
                "v8/finance/chart",
                404,
                r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
            )
            .route("alphavantage.co", 200, BALANCE_SHEET)
            .route("polygon.io", 200, NEWS),
    );
    let request =
        TickerRequest::parse("NOPE", "2024-01-01", "2024-02-29", 20).expect("valid request");

    let result = pipeline(http.clone()).run(&request).await;

    assert!(matches!(result.fatal_error(), Some(SectionError::NoData { .. })));
    assert_eq!(http.recorded_requests().len(), 1);
}

#[tokio::test]
async fn yahoo_client_reports_transport_failures_as_unavailable() {
    let http = Arc::new(
        ScriptedHttpClient::new()
            .route_error("v8/finance/chart", HttpError::connect("connection refused")),
    );
    let client = YahooClient::new(http);

    let error = client
        .fetch_prices(&aapl(), date!(2024 - 01 - 01), date!(2024 - 01 - 31))
        .await
        .expect_err("transport down");

    assert_eq!(error.provider(), ProviderId::Yahoo);
    assert_eq!(error.kind(), SourceErrorKind::Unavailable);
    assert!(error.message().contains("connection refused"));
}

#[tokio::test]
async fn alphavantage_client_sends_function_symbol_and_key() {
    let http = Arc::new(recorded_world());
    let client = AlphaVantageClient::new(http.clone(), "av-key");

    client
        .fetch_statement(&aapl(), StatementKind::CashFlow)
        .await
        .expect("cash flow parses");

    let request = &http.recorded_requests()[0];
    assert_eq!(request.url, "https://www.alphavantage.co/query");
    assert_eq!(request.query_value("function"), Some("CASH_FLOW"));
    assert_eq!(request.query_value("symbol"), Some("AAPL"));
    assert_eq!(request.query_value("apikey"), Some("av-key"));
}

#[tokio::test]
async fn polygon_client_returns_payload_for_digest() {
    let http = Arc::new(recorded_world());
    let client = PolygonClient::new(http.clone(), "polygon-key");

    let payload = client.fetch_news(&aapl()).await.expect("news parses");

    assert_eq!(payload["count"], 2);
    let request = &http.recorded_requests()[0];
    assert_eq!(request.query_value("ticker"), Some("AAPL"));
    assert_eq!(request.query_value("apiKey"), Some("polygon-key"));
}

#[tokio::test]
async fn clients_identify_their_provider() {
    let http = Arc::new(ScriptedHttpClient::new());

    assert_eq!(YahooClient::new(http.clone()).id(), ProviderId::Yahoo);
    assert_eq!(
        AlphaVantageClient::new(http.clone(), "k").id(),
        ProviderId::Alphavantage
    );
    assert_eq!(PolygonClient::new(http, "k").id(), ProviderId::Polygon);
}
