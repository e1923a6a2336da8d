//! Prometheus Metrics Module
//!
//! Exposes sampler metrics via Prometheus format for monitoring.
//!
//! # Metrics
//!
//! - `oi_tracker_samples_total{outcome}`: Sampling iterations by outcome
//! - `oi_tracker_observations_total`: Observations appended to the store
//! - `oi_tracker_bootstrap_total{outcome}`: Symbol set generations
//! - `oi_tracker_tracked_symbols`: Size of the tracked set
//! - `oi_tracker_fetch_duration_seconds`: Batch quote latency
//!
//! `PrometheusMetrics` implements the tracker's metrics port; recording is a
//! no-op until `init_metrics` installs the recorder.
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the HTTP server port.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::application::ports::{SampleOutcome, TrackerMetricsPort};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Subsequent calls return the handle installed by the first one.
///
/// # Errors
///
/// Returns an error if the global recorder cannot be installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();

    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "oi_tracker_samples_total",
        "Sampling iterations by outcome"
    );
    describe_counter!(
        "oi_tracker_observations_total",
        "Observations appended to the time-series store"
    );
    describe_counter!(
        "oi_tracker_bootstrap_total",
        "Symbol set generation attempts by outcome"
    );
    describe_gauge!(
        "oi_tracker_tracked_symbols",
        "Number of symbols in the tracked set"
    );
    describe_histogram!(
        "oi_tracker_fetch_duration_seconds",
        "Latency of the batch quote request"
    );
}

// =============================================================================
// Metric Recording
// =============================================================================

/// Prometheus-backed tracker metrics.
///
/// Recording is a no-op until `init_metrics` installs the recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusMetrics;

impl TrackerMetricsPort for PrometheusMetrics {
    fn record_sample(&self, outcome: SampleOutcome) {
        counter!("oi_tracker_samples_total", "outcome" => outcome.as_str()).increment(1);
    }

    fn record_observations(&self, count: usize) {
        counter!("oi_tracker_observations_total").increment(count as u64);
    }

    fn record_fetch_duration(&self, duration: Duration) {
        histogram!("oi_tracker_fetch_duration_seconds").record(duration.as_secs_f64());
    }

    fn record_bootstrap(&self, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        counter!("oi_tracker_bootstrap_total", "outcome" => outcome).increment(1);
    }

    #[allow(clippy::cast_precision_loss)]
    fn set_tracked_symbols(&self, count: usize) {
        gauge!("oi_tracker_tracked_symbols").set(count as f64);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_noop() {
        let metrics = PrometheusMetrics;
        metrics.record_sample(SampleOutcome::Success);
        metrics.record_observations(42);
        metrics.record_bootstrap(false);
        metrics.set_tracked_symbols(42);
        metrics.record_fetch_duration(Duration::from_millis(120));
    }

    #[test]
    fn rendered_output_includes_sample_counter() {
        let handle = init_metrics().unwrap();
        PrometheusMetrics.record_sample(SampleOutcome::IncompleteBatch);

        let rendered = handle.render();
        assert!(rendered.contains("oi_tracker_samples_total"));
        assert!(rendered.contains("outcome=\"incomplete_batch\""));
    }
}
