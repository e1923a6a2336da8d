//! Sampler Loop
//!
//! Background task that samples open interest for every tracked symbol at a
//! fixed interval. One iteration is all-or-nothing: either every tracked
//! symbol receives one observation or none does. Failures are logged and the
//! loop continues after the usual pause.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tokio_util::sync::CancellationToken;

use crate::application::ports::{QuoteSourceError, SampleOutcome};
use crate::domain::chain::InstrumentId;
use crate::domain::series::Observation;

use super::tracker::{OiTracker, TrackerError};

/// Sampling iteration error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SampleError {
    /// The tracked set was empty and could not be generated.
    #[error(transparent)]
    Bootstrap(TrackerError),

    /// The batch quote request failed.
    #[error("batch quote failed: {0}")]
    Upstream(#[source] QuoteSourceError),

    /// The batch response omitted tracked instruments.
    #[error("batch response missing {} tracked instruments", .missing.len())]
    IncompleteBatch {
        /// Instruments absent from the response.
        missing: Vec<InstrumentId>,
    },
}

impl SampleError {
    /// Metric label for this failure.
    #[must_use]
    pub const fn outcome(&self) -> SampleOutcome {
        match self {
            Self::Bootstrap(_) => SampleOutcome::BootstrapFailed,
            Self::Upstream(_) => SampleOutcome::UpstreamFailed,
            Self::IncompleteBatch { .. } => SampleOutcome::IncompleteBatch,
        }
    }
}

/// Result of a successful iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleReport {
    /// Timestamp shared by every observation of the iteration.
    pub at: DateTime<Local>,
    /// Observations appended.
    pub appended: usize,
    /// Time spent waiting on the batch request.
    pub fetch_duration: Duration,
}

/// Run one sampling iteration.
///
/// Bootstraps the tracked set if needed, fetches every tracked instrument in
/// one batch and appends one observation per symbol. Nothing is appended
/// unless the response covers the whole set.
///
/// # Errors
///
/// Returns `SampleError` if bootstrap, the batch request, or response
/// coverage fails.
pub async fn sample_once(tracker: &OiTracker) -> Result<SampleReport, SampleError> {
    let tracked = tracker.ensure_tracked().await.map_err(SampleError::Bootstrap)?;
    let instruments = tracked.instruments();

    let started = Instant::now();
    let quotes = tracker
        .quote_source()
        .batch_quote(&instruments)
        .await
        .map_err(SampleError::Upstream)?;
    let fetch_duration = started.elapsed();

    let at = Local::now();
    let mut batch = Vec::with_capacity(tracked.len());
    let mut missing = Vec::new();

    for (symbol, instrument) in tracked.iter() {
        match quotes.get(instrument) {
            Some(quote) => batch.push((symbol.clone(), Observation::new(at, quote.open_interest))),
            None => missing.push(instrument.clone()),
        }
    }

    if !missing.is_empty() {
        return Err(SampleError::IncompleteBatch { missing });
    }

    let appended = tracker.store().append_batch(batch);

    Ok(SampleReport {
        at,
        appended,
        fetch_duration,
    })
}

/// Periodic sampler bound to one tracker.
pub struct SamplerLoop {
    tracker: Arc<OiTracker>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl SamplerLoop {
    /// Create a loop using the tracker's interval and shutdown token.
    #[must_use]
    pub fn new(tracker: Arc<OiTracker>) -> Self {
        let interval = tracker.settings().fetch_interval;
        let shutdown = tracker.shutdown_token().clone();
        Self {
            tracker,
            interval,
            shutdown,
        }
    }

    /// Run until the shutdown token is cancelled.
    ///
    /// The first iteration runs immediately; each later one starts a full
    /// interval after the previous one finished.
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Sampler loop started"
        );

        loop {
            self.tick().await;

            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                () = self.shutdown.cancelled() => {
                    tracing::info!("Sampler loop shutting down");
                    break;
                }
            }
        }
    }

    async fn tick(&self) {
        let metrics = self.tracker.metrics();
        match sample_once(&self.tracker).await {
            Ok(report) => {
                metrics.record_sample(SampleOutcome::Success);
                metrics.record_observations(report.appended);
                metrics.record_fetch_duration(report.fetch_duration);
                self.tracker.record_success(report.at);
                tracing::info!(
                    appended = report.appended,
                    fetch_ms = report.fetch_duration.as_millis(),
                    at = %report.at.format("%H:%M"),
                    "Sampled open interest"
                );
            }
            Err(e) => {
                metrics.record_sample(e.outcome());
                if let SampleError::IncompleteBatch { missing } = &e {
                    tracing::warn!(missing = ?missing, "Batch response incomplete, iteration skipped");
                }
                tracing::error!(error = %e, "Sampling iteration failed");
                self.tracker.record_failure(e.to_string());
            }
        }
    }
}
