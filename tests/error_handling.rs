//! Behavior-driven tests for error handling.
//!
//! These tests verify how invalid input, slow providers and exhausted quotas
//! surface to the user: as validation errors before any call, or as
//! section-local markers that never blank out unrelated data.

use std::sync::Arc;
use std::time::Duration;

use stockdeck_core::{
    AggregationPipeline, AlphaVantageClient, ExecutionMode, FundamentalsSource, PolygonClient,
    ProviderId, SectionError, StatementFailure, StatementKind, Symbol, TickerRequest,
    ValidationError,
};
use stockdeck_tests::{
    daily_bars, news_payload, request, FakeFundamentals, FakeNews, FakePrices, ScriptedHttpClient,
};

// =============================================================================
// Input validation
// =============================================================================

#[test]
fn when_symbol_is_blank_user_receives_validation_error() {
    let error = TickerRequest::parse("   ", "2024-01-01", "2024-02-01", 20).expect_err("blank");
    assert_eq!(error, ValidationError::EmptySymbol);
}

#[test]
fn when_symbol_has_shell_metacharacters_it_is_rejected() {
    for input in ["AAPL;rm", "AAPL/../x", "AA PL", "$(id)"] {
        assert!(
            Symbol::parse(input).is_err(),
            "'{input}' should not be a valid symbol"
        );
    }
}

#[test]
fn when_range_is_inverted_user_receives_validation_error() {
    let error =
        TickerRequest::parse("AAPL", "2024-12-31", "2023-01-01", 20).expect_err("inverted");
    assert!(matches!(error, ValidationError::InvertedDateRange { .. }));
    assert_eq!(
        error.to_string(),
        "end date 2023-01-01 is before start date 2024-12-31"
    );
}

#[test]
fn when_window_is_outside_slider_bounds_user_receives_validation_error() {
    let error = TickerRequest::parse("AAPL", "2024-01-01", "2024-02-01", 60).expect_err("window");
    assert_eq!(
        error,
        ValidationError::WindowOutOfRange {
            value: 60,
            min: 5,
            max: 50
        }
    );
}

// =============================================================================
// Timeouts
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_news_provider_hangs_only_the_news_section_times_out() {
    // Given: a news provider that never answers within the budget
    let news = Arc::new(FakeNews::with_payload(news_payload(3)).delayed(Duration::from_secs(120)));
    let pipeline = AggregationPipeline::new(
        Arc::new(FakePrices::with_bars(daily_bars(6))),
        Arc::new(FakeFundamentals::healthy(&["totalAssets"])),
        news,
    )
    .with_call_timeout(Duration::from_secs(15));

    // When: the pipeline runs
    let result = pipeline.run(&request()).await;

    // Then: news fails with a timeout and everything else is intact
    match &result.news {
        Err(SectionError::NewsUnavailable { message }) => {
            assert!(message.contains("timed out after 15000ms"), "{message}");
        }
        other => panic!("expected a news timeout, got {other:?}"),
    }
    assert!(result.prices.is_ok());
    assert!(result.statements.iter().all(|(_, section)| section.is_ok()));
}

#[tokio::test(start_paused = true)]
async fn when_price_provider_hangs_the_run_is_fatal() {
    let prices = FakePrices::with_bars(daily_bars(6)).delayed(Duration::from_secs(60));
    let fundamentals = Arc::new(FakeFundamentals::healthy(&["totalAssets"]));
    let pipeline = AggregationPipeline::new(
        Arc::new(prices),
        fundamentals.clone(),
        Arc::new(FakeNews::with_payload(news_payload(1))),
    )
    .with_call_timeout(Duration::from_secs(10));

    let result = pipeline.run(&request()).await;

    assert!(matches!(
        result.fatal_error(),
        Some(SectionError::Fetch { provider: ProviderId::Yahoo, message })
            if message.contains("timed out")
    ));
    assert_eq!(fundamentals.log.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_statements_time_out_identically_in_both_modes() {
    let run = |mode: ExecutionMode| async move {
        AggregationPipeline::new(
            Arc::new(FakePrices::with_bars(daily_bars(6))),
            Arc::new(FakeFundamentals::healthy(&["totalAssets"]).delayed(Duration::from_secs(30))),
            Arc::new(FakeNews::with_payload(news_payload(2))),
        )
        .with_mode(mode)
        .with_call_timeout(Duration::from_secs(5))
        .run(&request())
        .await
    };

    let concurrent = run(ExecutionMode::Concurrent).await;
    let sequential = run(ExecutionMode::Sequential).await;

    assert_eq!(concurrent, sequential);
    assert!(matches!(
        concurrent.statements.cash_flow,
        Err(SectionError::StatementUnavailable {
            reason: StatementFailure::Upstream,
            ..
        })
    ));
}

// =============================================================================
// Rate limits and credentials
// =============================================================================

#[tokio::test]
async fn when_fundamentals_budget_runs_out_later_statements_are_rate_limited() {
    // Given: an Alpha Vantage client that already spent four of five calls
    let http = Arc::new(ScriptedHttpClient::new().route(
        "alphavantage.co",
        200,
        r#"{"annualReports": [{"fiscalDateEnding": "2023-12-31", "reportedCurrency": "USD", "totalAssets": "1"}]}"#,
    ));
    let fundamentals = Arc::new(AlphaVantageClient::new(http.clone(), "av-key"));
    let symbol = Symbol::parse("IBM").expect("valid symbol");
    for _ in 0..4 {
        fundamentals
            .fetch_statement(&symbol, StatementKind::BalanceSheet)
            .await
            .expect("within budget");
    }

    // When: a full run needs three more statements
    let pipeline = AggregationPipeline::new(
        Arc::new(FakePrices::with_bars(daily_bars(6))),
        fundamentals,
        Arc::new(FakeNews::with_payload(news_payload(1))),
    )
    .with_mode(ExecutionMode::Sequential);
    let result = pipeline.run(&request()).await;

    // Then: the first is served and the rest are marked rate limited locally
    assert!(result.statements.balance_sheet.is_ok());
    for section in [
        &result.statements.income_statement,
        &result.statements.cash_flow,
    ] {
        assert!(matches!(
            section,
            Err(SectionError::StatementUnavailable {
                reason: StatementFailure::RateLimited,
                ..
            })
        ));
    }
    assert_eq!(http.recorded_requests().len(), 5);
    assert!(result.news.is_ok());
}

#[tokio::test]
async fn when_news_key_is_missing_news_fails_without_a_request() {
    let http = Arc::new(ScriptedHttpClient::new().route("polygon.io", 200, "{}"));
    let pipeline = AggregationPipeline::new(
        Arc::new(FakePrices::with_bars(daily_bars(6))),
        Arc::new(FakeFundamentals::healthy(&["totalAssets"])),
        Arc::new(PolygonClient::new(http.clone(), "")),
    );

    let result = pipeline.run(&request()).await;

    assert!(matches!(
        &result.news,
        Err(SectionError::NewsUnavailable { message }) if message.contains("api key")
    ));
    assert!(http.recorded_requests().is_empty());
}
