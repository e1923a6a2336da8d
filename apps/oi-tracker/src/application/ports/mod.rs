//! Port Interfaces
//!
//! Defines the interfaces (ports) for external systems following
//! the Hexagonal Architecture pattern.
//!
//! ## Driven Ports (Outbound)
//!
//! - `QuoteSourcePort`: reference prices and batched open-interest quotes
//! - `TrackerMetricsPort`: sampler and bootstrap counters

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::chain::InstrumentId;

/// Quote fields the tracker consumes for one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstrumentQuote {
    /// Open interest.
    pub open_interest: u64,
}

impl InstrumentQuote {
    /// Quote carrying only open interest.
    #[must_use]
    pub const fn with_open_interest(open_interest: u64) -> Self {
        Self { open_interest }
    }
}

/// Quote source error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuoteSourceError {
    /// Network or transport failure.
    #[error("quote source connection error: {message}")]
    Connection {
        /// Error details.
        message: String,
    },

    /// Credentials were rejected.
    #[error("quote source authentication failed")]
    Authentication,

    /// Request was throttled.
    #[error("quote source rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// The source answered with an error.
    #[error("quote source API error: {message}")]
    Api {
        /// Error details.
        message: String,
    },

    /// The response could not be interpreted.
    #[error("malformed quote source response: {message}")]
    MalformedResponse {
        /// Error details.
        message: String,
    },

    /// The reference instrument was absent from the response.
    #[error("no price for instrument: {instrument}")]
    MissingPrice {
        /// The requested instrument.
        instrument: String,
    },
}

/// Port for reading prices and open interest from a market data provider.
///
/// A batch call either succeeds with a map for the requested instruments or
/// fails as a whole; implementations never return partial results alongside
/// an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteSourcePort: Send + Sync {
    /// Current price of a reference instrument (e.g. `NSE:NIFTY 50`).
    async fn last_price(&self, instrument: &str) -> Result<Decimal, QuoteSourceError>;

    /// Quotes for a batch of instruments in a single request.
    async fn batch_quote(
        &self,
        instruments: &[InstrumentId],
    ) -> Result<HashMap<InstrumentId, InstrumentQuote>, QuoteSourceError>;
}

/// Outcome of a sampling iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Every tracked symbol received an observation.
    Success,
    /// The tracked set could not be generated.
    BootstrapFailed,
    /// The batch request failed.
    UpstreamFailed,
    /// The batch response did not cover the tracked set.
    IncompleteBatch,
}

impl SampleOutcome {
    /// Stable label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::BootstrapFailed => "bootstrap_failed",
            Self::UpstreamFailed => "upstream_failed",
            Self::IncompleteBatch => "incomplete_batch",
        }
    }
}

/// Port for recording tracker and sampler metrics.
#[cfg_attr(test, mockall::automock)]
pub trait TrackerMetricsPort: Send + Sync {
    /// A sampling iteration finished.
    fn record_sample(&self, outcome: SampleOutcome);

    /// Observations appended by one iteration.
    fn record_observations(&self, count: usize);

    /// Latency of one batch quote request.
    fn record_fetch_duration(&self, duration: Duration);

    /// A symbol set generation attempt finished.
    fn record_bootstrap(&self, success: bool);

    /// Size of the tracked set after regeneration.
    fn set_tracked_symbols(&self, count: usize);
}

/// Metrics sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl TrackerMetricsPort for NoopMetrics {
    fn record_sample(&self, _outcome: SampleOutcome) {}
    fn record_observations(&self, _count: usize) {}
    fn record_fetch_duration(&self, _duration: Duration) {}
    fn record_bootstrap(&self, _success: bool) {}
    fn set_tracked_symbols(&self, _count: usize) {}
}
