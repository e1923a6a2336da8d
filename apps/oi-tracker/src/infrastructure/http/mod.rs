//! HTTP/REST API adapter.
//!
//! Inbound adapter exposing the tracker's query operations, health probes
//! and Prometheus metrics.

mod controller;
mod response;
mod server;

pub use controller::{AppState, create_router};
pub use response::{ApiErrorResponse, HealthResponse, HealthStatus};
pub use server::{HttpServer, HttpServerError};
