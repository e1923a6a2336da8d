//! OI Tracker Service
//!
//! Lifecycle-scoped owner of the tracked symbol set, the time-series store
//! and the sampler start guard. Constructed once at process start and shared
//! (via `Arc`) between the sampler loop and the query surface.
//!
//! # Bootstrap
//!
//! The tracked set starts empty. The first caller of `ensure_tracked` (the
//! sampler loop or a `list_symbols` request) fetches the reference price and
//! generates the set. Concurrent callers queue behind one async mutex and
//! re-check, so a burst of requests triggers a single generation. A failed
//! bootstrap leaves the set empty and is retried by the next caller.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Local};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    NoopMetrics, QuoteSourceError, QuoteSourcePort, TrackerMetricsPort,
};
use crate::domain::chain::{ChainError, ChainSpec, Symbol, TrackedSet, generate};
use crate::domain::series::{Observation, TimeSeriesStore};

use super::sampler::SamplerLoop;

// =============================================================================
// Settings
// =============================================================================

/// Tracker settings derived from process configuration.
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    /// Strike band description.
    pub chain: ChainSpec,
    /// Instrument whose price anchors the band (e.g. `NSE:NIFTY 50`).
    pub reference_instrument: String,
    /// Pause between sampling iterations.
    pub fetch_interval: Duration,
}

// =============================================================================
// Errors
// =============================================================================

/// Tracker errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TrackerError {
    /// The reference price could not be fetched.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(#[source] QuoteSourceError),

    /// The chain could not be generated from the configuration.
    #[error(transparent)]
    InvalidConfiguration(#[from] ChainError),

    /// Symbol generation failed during lazy bootstrap.
    #[error("bootstrap failed: {reason}")]
    BootstrapFailed {
        /// Underlying failure.
        reason: String,
    },

    /// The query could not be served because bootstrap failed.
    #[error("service unavailable: {message}")]
    ServiceUnavailable {
        /// Message surfaced to the caller.
        message: String,
    },
}

// =============================================================================
// Status
// =============================================================================

/// Point-in-time view of the tracker for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerStatus {
    /// Whether the sampler loop has been spawned.
    pub sampler_started: bool,
    /// Number of tracked symbols.
    pub tracked_symbols: usize,
    /// ATM strike of the current band.
    pub atm_strike: Option<i64>,
    /// Number of stored series.
    pub series: usize,
    /// Total stored observations.
    pub observations: usize,
    /// Sampling iterations run.
    pub iterations: u64,
    /// Sampling iterations that failed.
    pub failed_iterations: u64,
    /// Failures since the last successful iteration.
    pub consecutive_failures: u64,
    /// Time of the last successful iteration.
    pub last_success_at: Option<DateTime<Local>>,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct SamplerStats {
    iterations: AtomicU64,
    failures: AtomicU64,
    consecutive_failures: AtomicU64,
    last_success_at: Mutex<Option<DateTime<Local>>>,
    last_error: Mutex<Option<String>>,
}

// =============================================================================
// Tracker
// =============================================================================

/// Open-interest tracker service.
pub struct OiTracker {
    settings: TrackerSettings,
    quotes: Arc<dyn QuoteSourcePort>,
    metrics: Arc<dyn TrackerMetricsPort>,
    tracked: RwLock<Arc<TrackedSet>>,
    store: TimeSeriesStore,
    bootstrap: tokio::sync::Mutex<()>,
    started: AtomicBool,
    stats: SamplerStats,
    shutdown: CancellationToken,
}

impl OiTracker {
    /// Create a tracker with an empty symbol set and store.
    ///
    /// Metrics are discarded unless a sink is attached with `with_metrics`.
    #[must_use]
    pub fn new(
        settings: TrackerSettings,
        quotes: Arc<dyn QuoteSourcePort>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            settings,
            quotes,
            metrics: Arc::new(NoopMetrics),
            tracked: RwLock::new(Arc::new(TrackedSet::empty())),
            store: TimeSeriesStore::new(),
            bootstrap: tokio::sync::Mutex::new(()),
            started: AtomicBool::new(false),
            stats: SamplerStats::default(),
            shutdown,
        }
    }

    /// Attach a metrics sink.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn TrackerMetricsPort>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Tracker settings.
    #[must_use]
    pub const fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// Time-series store.
    #[must_use]
    pub const fn store(&self) -> &TimeSeriesStore {
        &self.store
    }

    /// Quote source used for prices and batches.
    #[must_use]
    pub fn quote_source(&self) -> &dyn QuoteSourcePort {
        self.quotes.as_ref()
    }

    /// Metrics sink.
    #[must_use]
    pub fn metrics(&self) -> &dyn TrackerMetricsPort {
        self.metrics.as_ref()
    }

    /// Token that stops the sampler loop when cancelled.
    #[must_use]
    pub const fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Current tracked set (possibly empty).
    #[must_use]
    pub fn tracked_set(&self) -> Arc<TrackedSet> {
        Arc::clone(&self.tracked.read())
    }

    /// Whether the sampler loop has been spawned.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Fetch the reference price and replace the tracked set.
    ///
    /// The previous set is discarded, not merged. Stored series are kept.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::UpstreamUnavailable` if the price cannot be
    /// fetched, or `TrackerError::InvalidConfiguration` if it cannot be
    /// anchored to a strike.
    pub async fn regenerate(&self) -> Result<Arc<TrackedSet>, TrackerError> {
        let reference = &self.settings.reference_instrument;
        let price = self
            .quotes
            .last_price(reference)
            .await
            .map_err(TrackerError::UpstreamUnavailable)?;

        let set = Arc::new(generate(price, &self.settings.chain)?);
        *self.tracked.write() = Arc::clone(&set);

        self.metrics.set_tracked_symbols(set.len());
        tracing::info!(
            reference = %reference,
            price = %price,
            atm = ?set.anchor(),
            symbols = set.len(),
            "Generated option symbols"
        );

        Ok(set)
    }

    /// Return the tracked set, generating it first if it is empty.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::BootstrapFailed` if generation fails or yields
    /// no symbols.
    pub async fn ensure_tracked(&self) -> Result<Arc<TrackedSet>, TrackerError> {
        let current = self.tracked_set();
        if !current.is_empty() {
            return Ok(current);
        }

        let _guard = self.bootstrap.lock().await;

        let current = self.tracked_set();
        if !current.is_empty() {
            return Ok(current);
        }

        let result = match self.regenerate().await {
            Ok(set) if set.is_empty() => Err(TrackerError::BootstrapFailed {
                reason: "no strikes in the configured band".to_string(),
            }),
            Ok(set) => Ok(set),
            Err(e) => Err(TrackerError::BootstrapFailed {
                reason: e.to_string(),
            }),
        };

        self.metrics.record_bootstrap(result.is_ok());
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Symbol bootstrap failed");
        }
        result
    }

    /// Spawn the sampler loop unless it is already running.
    ///
    /// Safe to call concurrently; only the first call spawns. Returns `true`
    /// for the call that started the loop. Must be called from within a
    /// Tokio runtime.
    pub fn ensure_started(self: &Arc<Self>) -> bool {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let sampler = SamplerLoop::new(Arc::clone(self));
        tokio::spawn(sampler.run());
        true
    }

    /// Tracked symbols in lexical order, bootstrapping on first use.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::ServiceUnavailable` if the symbol set cannot be
    /// generated.
    pub async fn list_symbols(self: &Arc<Self>) -> Result<Vec<Symbol>, TrackerError> {
        self.ensure_started();

        self.ensure_tracked()
            .await
            .map(|set| set.symbols())
            .map_err(|e| TrackerError::ServiceUnavailable {
                message: e.to_string(),
            })
    }

    /// Stored series for each requested symbol.
    ///
    /// Symbols that were never sampled map to an empty series; no error is
    /// raised for unknown symbols.
    #[must_use]
    pub fn get_series(&self, symbols: &[Symbol]) -> BTreeMap<Symbol, Vec<Observation>> {
        self.store.get_many(symbols.iter().map(String::as_str))
    }

    /// Snapshot of tracker state.
    #[must_use]
    pub fn status(&self) -> TrackerStatus {
        let tracked = self.tracked_set();
        TrackerStatus {
            sampler_started: self.is_started(),
            tracked_symbols: tracked.len(),
            atm_strike: tracked.anchor(),
            series: self.store.len(),
            observations: self.store.observation_count(),
            iterations: self.stats.iterations.load(Ordering::Relaxed),
            failed_iterations: self.stats.failures.load(Ordering::Relaxed),
            consecutive_failures: self.stats.consecutive_failures.load(Ordering::Relaxed),
            last_success_at: *self.stats.last_success_at.lock(),
            last_error: self.stats.last_error.lock().clone(),
        }
    }

    pub(crate) fn record_success(&self, at: DateTime<Local>) {
        self.stats.iterations.fetch_add(1, Ordering::Relaxed);
        self.stats.consecutive_failures.store(0, Ordering::Relaxed);
        *self.stats.last_success_at.lock() = Some(at);
    }

    pub(crate) fn record_failure(&self, message: String) {
        self.stats.iterations.fetch_add(1, Ordering::Relaxed);
        self.stats.failures.fetch_add(1, Ordering::Relaxed);
        self.stats.consecutive_failures.fetch_add(1, Ordering::Relaxed);
        *self.stats.last_error.lock() = Some(message);
    }
}

// =============================================================================
// Tests
// =============================================================================
