//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the tracker service, the sampler loop and the port
//! through which they reach the market data provider.

/// Port interfaces for external systems.
pub mod ports;

/// Tracker service and sampler loop.
pub mod services;
