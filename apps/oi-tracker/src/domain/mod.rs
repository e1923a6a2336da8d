//! Domain Layer - Option chain and open-interest series types.
//!
//! Pure types with no I/O: strike band generation and the append-only
//! observation store.

/// Strike band and symbol set generation.
pub mod chain;

/// Open-interest observations and the time-series store.
pub mod series;
