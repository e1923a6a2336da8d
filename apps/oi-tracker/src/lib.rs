#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! OI Tracker - Option Open-Interest Sampler
//!
//! Periodically samples open interest for option contracts around the
//! at-the-money strike of a reference index, keeps each contract's history
//! in memory, and serves it over HTTP.
//!
//! # Layers (inside -> outside)
//!
//! - **Domain**: Pure types with no I/O
//!   - `chain`: Strike band and symbol set generation
//!   - `series`: Observations and the append-only time-series store
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Quote source and metrics interfaces
//!   - `services`: Tracker service and sampler loop
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `kite`: Kite Connect REST quote source
//!   - `http`: Query surface, health probes, metrics endpoint
//!   - `config`: Environment configuration
//!   - `metrics` / `telemetry`: Prometheus and tracing setup
//!
//! # Data Flow
//!
//! ```text
//!                  reference price
//! Kite REST ──────────────────────────► Symbol Set ─┐
//!     ▲                                             │ tracked symbols
//!     │ batch quote (every interval)                ▼
//!     └──────────────────────────────────── Sampler Loop
//!                                                   │ append_batch
//!                                                   ▼
//! HTTP /strikes, /get_multi_oi ◄──────────── Time-Series Store
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Chain generation and observation storage.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::chain::{ChainError, ChainSpec, InstrumentId, OptionSide, Symbol, TrackedSet};
pub use domain::series::{Observation, TimeSeriesStore};

// Ports and services
pub use application::ports::{
    InstrumentQuote, NoopMetrics, QuoteSourceError, QuoteSourcePort, SampleOutcome,
    TrackerMetricsPort,
};
pub use application::services::{
    OiTracker, SampleError, SampleReport, SamplerLoop, TrackerError, TrackerSettings,
    TrackerStatus,
};

// Infrastructure config
pub use infrastructure::config::{
    ChainSettings, ConfigError, Credentials, KiteSettings, SamplerSettings, ServerSettings,
    TrackerConfig,
};

// HTTP server
pub use infrastructure::http::{AppState, HttpServer, HttpServerError, create_router};

// Kite adapter
pub use infrastructure::kite::{KiteConfig, KiteError, KiteQuoteSource};

// Metrics
pub use infrastructure::metrics::{PrometheusMetrics, init_metrics};

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
