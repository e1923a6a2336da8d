//! OI Tracker Binary
//!
//! Starts the open-interest sampler and its HTTP query surface.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin oi-tracker
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `KITE_API_KEY`: Kite Connect API key
//! - `KITE_ACCESS_TOKEN`: Kite Connect access token
//! - `OI_EXPIRY`: Expiry token in instrument names (e.g. 26203)
//!
//! ## Optional
//! - `KITE_BASE_URL`: REST base URL (default: <https://api.kite.trade>)
//! - `KITE_TIMEOUT_SECS`: Per-request timeout (default: 10)
//! - `KITE_MAX_ATTEMPTS`: Attempts per call (default: 3)
//! - `OI_INSTRUMENT_PREFIX`: Instrument prefix (default: NFO:NIFTY)
//! - `OI_REFERENCE_INSTRUMENT`: Reference price instrument (default: NSE:NIFTY 50)
//! - `OI_STRIKE_RANGE`: Half-width of the strike band (default: 500)
//! - `OI_STRIKE_STEP`: Strike spacing (default: 50)
//! - `OI_FETCH_INTERVAL_SECS`: Sampling interval (default: 180)
//! - `OI_HTTP_PORT`: HTTP port (default: 5000)
//! - `OI_EAGER_START`: Start sampling at boot (default: true)
//! - `OTEL_ENABLED`: Enable OpenTelemetry export (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: oi-tracker)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use oi_tracker::infrastructure::telemetry;
use oi_tracker::{
    AppState, HttpServer, KiteConfig, KiteQuoteSource, OiTracker, PrometheusMetrics,
    TrackerConfig, init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    // Initialize telemetry (tracing + optional OpenTelemetry)
    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting OI Tracker");

    let _metrics_handle = init_metrics().context("failed to install metrics recorder")?;

    let config = TrackerConfig::from_env().context("invalid configuration")?;
    log_config(&config);

    let settings = config
        .tracker_settings()
        .context("invalid chain configuration")?;

    let shutdown_token = CancellationToken::new();

    let kite_config = KiteConfig::from_settings(&config.credentials, &config.kite);
    let quote_source =
        Arc::new(KiteQuoteSource::new(&kite_config).context("failed to create Kite client")?);

    let tracker = Arc::new(
        OiTracker::new(settings, quote_source, shutdown_token.clone())
            .with_metrics(Arc::new(PrometheusMetrics)),
    );

    let http_server = HttpServer::bind(
        config.server.http_port,
        AppState::new(Arc::clone(&tracker), env!("CARGO_PKG_VERSION")),
        shutdown_token.clone(),
    )
    .await
    .context("failed to start HTTP server")?;

    if config.sampler.eager_start {
        if let Err(e) = tracker.ensure_tracked().await {
            tracing::warn!(error = %e, "Eager bootstrap failed, sampler will retry");
        }
        tracker.ensure_started();
    } else {
        tracing::info!("Sampler will start on first /strikes request");
    }

    let server_token = shutdown_token.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = http_server.run().await {
            tracing::error!(error = %e, "HTTP server error");
            server_token.cancel();
        }
    });

    tracing::info!("OI Tracker ready");

    await_shutdown(shutdown_token).await;

    if tokio::time::timeout(SHUTDOWN_TIMEOUT, server_handle)
        .await
        .is_err()
    {
        tracing::warn!("HTTP server did not stop within the shutdown timeout");
    }

    tracing::info!("OI Tracker stopped");
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &TrackerConfig) {
    tracing::info!(
        instrument_prefix = %config.chain.instrument_prefix,
        expiry = %config.chain.expiry,
        reference = %config.chain.reference_instrument,
        strike_range = config.chain.strike_range,
        strike_step = config.chain.strike_step,
        interval_secs = config.sampler.fetch_interval.as_secs(),
        http_port = config.server.http_port,
        "Configuration loaded"
    );
    tracing::debug!(
        base_url = %config.kite.base_url,
        timeout_secs = config.kite.timeout.as_secs(),
        max_attempts = config.kite.max_attempts,
        "Kite endpoint"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for SIGTERM, SIGINT, or an internal cancellation.
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
        () = shutdown_token.cancelled() => {
            tracing::warn!("Internal shutdown requested");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
