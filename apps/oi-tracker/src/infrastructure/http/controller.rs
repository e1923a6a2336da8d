//! HTTP Controller (Driver Adapter)
//!
//! Axum routes for the query surface, health probes and metrics.
//!
//! # Endpoints
//!
//! - `GET /strikes` - Tracked symbols in lexical order
//! - `POST /get_multi_oi` - Series for a JSON array of symbols
//! - `GET /health` - JSON health status
//! - `GET /healthz` - Liveness probe (simple OK)
//! - `GET /readyz` - Readiness probe (symbols tracked)
//! - `GET /metrics` - Prometheus metrics in text format

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;

use crate::application::services::{OiTracker, TrackerError};
use crate::domain::chain::Symbol;
use crate::domain::series::Observation;
use crate::infrastructure::metrics::get_metrics_handle;

use super::response::{ApiErrorResponse, HealthResponse, HealthStatus};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Tracker service.
    pub tracker: Arc<OiTracker>,
    /// Application version.
    pub version: String,
    /// Process start time.
    pub started_at: Instant,
}

impl AppState {
    /// Create state for a tracker.
    #[must_use]
    pub fn new(tracker: Arc<OiTracker>, version: impl Into<String>) -> Self {
        Self {
            tracker,
            version: version.into(),
            started_at: Instant::now(),
        }
    }
}

/// Create the HTTP router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/strikes", get(list_symbols))
        .route("/get_multi_oi", post(get_series))
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn list_symbols(State(state): State<AppState>) -> Response {
    match state.tracker.list_symbols().await {
        Ok(symbols) => Json(symbols).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn get_series(
    State(state): State<AppState>,
    Json(symbols): Json<Vec<Symbol>>,
) -> Json<BTreeMap<Symbol, Vec<Observation>>> {
    Json(state.tracker.get_series(&symbols))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let tracker = state.tracker.status();
    let status = HealthStatus::from_tracker(&tracker);
    let response = HealthResponse {
        status,
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        tracker,
    };
    let status_code = match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(response))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.tracker.tracked_set().is_empty() {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    } else {
        (StatusCode::OK, "READY")
    }
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                handle.render(),
            )
        },
    )
}

fn error_response(err: &TrackerError) -> Response {
    let (status, code) = match err {
        TrackerError::ServiceUnavailable { .. }
        | TrackerError::BootstrapFailed { .. }
        | TrackerError::UpstreamUnavailable(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
        }
        TrackerError::InvalidConfiguration(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INVALID_CONFIGURATION")
        }
    };
    tracing::warn!(error = %err, "Query failed");
    (status, Json(ApiErrorResponse::new(code, err.to_string()))).into_response()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use rust_decimal::Decimal;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use super::*;
    use crate::application::ports::{MockQuoteSourcePort, QuoteSourceError};
    use crate::application::services::TrackerSettings;
    use crate::domain::chain::ChainSpec;

    fn state(mock: MockQuoteSourcePort) -> AppState {
        let settings = TrackerSettings {
            chain: ChainSpec::new("NFO:NIFTY", "26203", 50, 50).unwrap(),
            reference_instrument: "NSE:NIFTY 50".to_string(),
            fetch_interval: Duration::from_secs(180),
        };
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let tracker = Arc::new(OiTracker::new(settings, Arc::new(mock), shutdown));
        AppState::new(tracker, "0.1.0-test")
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn strikes_returns_sorted_symbols() {
        let mut mock = MockQuoteSourcePort::new();
        mock.expect_last_price().returning(|_| Ok(Decimal::from(25230)));
        mock.expect_batch_quote().returning(|_| Ok(HashMap::new()));

        let response = create_router(state(mock))
            .oneshot(Request::builder().uri("/strikes").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!(["25200CE", "25200PE", "25250CE", "25250PE", "25300CE", "25300PE"])
        );
    }

    #[tokio::test]
    async fn strikes_bootstrap_failure_is_503() {
        let mut mock = MockQuoteSourcePort::new();
        mock.expect_last_price()
            .returning(|_| Err(QuoteSourceError::Authentication));

        let response = create_router(state(mock))
            .oneshot(Request::builder().uri("/strikes").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn get_multi_oi_returns_requested_series() {
        let state = state(MockQuoteSourcePort::new());
        state.tracker.store().append("25250CE", Observation::now(1_200));

        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/get_multi_oi")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"["25250CE","UNKNOWN"]"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["25250CE"][0][1], 1_200);
        assert!(body["25250CE"][0][0].as_str().unwrap().contains(':'));
        assert_eq!(body["UNKNOWN"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn get_multi_oi_rejects_malformed_body() {
        let response = create_router(state(MockQuoteSourcePort::new()))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/get_multi_oi")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"symbols": 3}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn readiness_follows_tracked_set() {
        let mut mock = MockQuoteSourcePort::new();
        mock.expect_last_price().returning(|_| Ok(Decimal::from(25230)));
        let state = state(mock);
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.tracker.regenerate().await.unwrap();

        let response = app
            .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_reports_tracker_status() {
        let response = create_router(state(MockQuoteSourcePort::new()))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["version"], "0.1.0-test");
        assert_eq!(body["tracker"]["tracked_symbols"], 0);
    }

    #[tokio::test]
    async fn liveness_is_ok() {
        let response = create_router(state(MockQuoteSourcePort::new()))
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
