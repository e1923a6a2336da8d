//! Kite adapter tests against a mocked REST server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use oi_tracker::infrastructure::kite::RetryConfig;
use oi_tracker::{KiteConfig, KiteQuoteSource, QuoteSourceError, QuoteSourcePort};
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer, max_attempts: u32) -> KiteConfig {
    KiteConfig::new("api_key".to_string(), "access_token".to_string())
        .with_base_url(server.uri())
        .with_timeout(Duration::from_secs(2))
        .with_retry(RetryConfig {
            max_attempts,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(50),
            multiplier: 2.0,
        })
}

fn source(server: &MockServer, max_attempts: u32) -> KiteQuoteSource {
    KiteQuoteSource::new(&config(server, max_attempts)).unwrap()
}

#[tokio::test]
async fn last_price_sends_kite_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote/ltp"))
        .and(query_param("i", "NSE:NIFTY 50"))
        .and(header("X-Kite-Version", "3"))
        .and(header("Authorization", "token api_key:access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {"NSE:NIFTY 50": {"instrument_token": 256265, "last_price": 25230.4}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let price = source(&server, 3).last_price("NSE:NIFTY 50").await.unwrap();

    assert_eq!(price, Decimal::new(252_304, 1));
}

#[tokio::test]
async fn last_price_missing_instrument() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote/ltp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {}
        })))
        .mount(&server)
        .await;

    let err = source(&server, 3).last_price("NSE:NIFTY 50").await.unwrap_err();

    assert_eq!(
        err,
        QuoteSourceError::MissingPrice {
            instrument: "NSE:NIFTY 50".to_string()
        }
    );
}

#[tokio::test]
async fn batch_quote_reads_open_interest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote"))
        .and(query_param("i", "NFO:NIFTY2620325200CE"))
        .and(query_param("i", "NFO:NIFTY2620325200PE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {
                "NFO:NIFTY2620325200CE": {"instrument_token": 1, "last_price": 180.5, "volume": 1000, "oi": 5_250_000},
                "NFO:NIFTY2620325200PE": {"instrument_token": 2, "last_price": 95.0, "volume": 800, "oi": 4_100_000}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let instruments = vec![
        "NFO:NIFTY2620325200CE".to_string(),
        "NFO:NIFTY2620325200PE".to_string(),
    ];
    let quotes = source(&server, 3).batch_quote(&instruments).await.unwrap();

    assert_eq!(quotes.len(), 2);
    assert_eq!(quotes["NFO:NIFTY2620325200CE"].open_interest, 5_250_000);
    assert_eq!(quotes["NFO:NIFTY2620325200PE"].open_interest, 4_100_000);
}

#[tokio::test]
async fn batch_quote_empty_request_skips_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let quotes = source(&server, 3).batch_quote(&[]).await.unwrap();

    assert!(quotes.is_empty());
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote/ltp"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/quote/ltp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {"NSE:NIFTY 50": {"last_price": 25000}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let price = source(&server, 3).last_price("NSE:NIFTY 50").await.unwrap();

    assert_eq!(price, Decimal::from(25_000));
}

#[tokio::test]
async fn retries_exhausted_is_connection_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(502))
        .expect(2)
        .mount(&server)
        .await;

    let err = source(&server, 2)
        .batch_quote(&["NFO:NIFTY2620325200CE".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, QuoteSourceError::Connection { .. }));
}

#[tokio::test]
async fn rate_limit_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "status": "error",
            "message": "Too many requests",
            "error_type": "NetworkException"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = source(&server, 1).last_price("NSE:NIFTY 50").await.unwrap_err();

    assert!(matches!(err, QuoteSourceError::RateLimited { .. }));
}

#[tokio::test]
async fn long_retry_after_is_capped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "3600")
                .set_body_json(json!({
                    "status": "error",
                    "message": "Too many requests",
                    "error_type": "NetworkException"
                })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/quote/ltp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {"NSE:NIFTY 50": {"last_price": 25100}}
        })))
        .mount(&server)
        .await;

    let price = tokio::time::timeout(
        Duration::from_secs(5),
        source(&server, 3).last_price("NSE:NIFTY 50"),
    )
    .await
    .expect("Retry-After must be capped at max_backoff")
    .unwrap();

    assert_eq!(price, Decimal::from(25100));
}

#[tokio::test]
async fn token_exception_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "status": "error",
            "message": "Incorrect `api_key` or `access_token`.",
            "error_type": "TokenException"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = source(&server, 3).last_price("NSE:NIFTY 50").await.unwrap_err();

    assert_eq!(err, QuoteSourceError::Authentication);
}

#[tokio::test]
async fn input_exception_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": "error",
            "message": "Invalid `i` parameter",
            "error_type": "InputException"
        })))
        .mount(&server)
        .await;

    let err = source(&server, 3)
        .batch_quote(&["BAD".to_string()])
        .await
        .unwrap_err();

    assert_eq!(
        err,
        QuoteSourceError::Api {
            message: "InputException: Invalid `i` parameter".to_string()
        }
    );
}

#[tokio::test]
async fn malformed_body_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = source(&server, 3).last_price("NSE:NIFTY 50").await.unwrap_err();

    assert!(matches!(err, QuoteSourceError::MalformedResponse { .. }));
}
