//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer, plus process-level concerns.

/// Configuration loading.
pub mod config;

/// HTTP query surface, health probes and metrics endpoint.
pub mod http;

/// Kite Connect REST adapter.
pub mod kite;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// OpenTelemetry tracing integration.
pub mod telemetry;
