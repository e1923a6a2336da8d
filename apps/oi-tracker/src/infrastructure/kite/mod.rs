//! Kite Connect Adapter
//!
//! REST adapter implementing `QuoteSourcePort` against Kite Connect v3.
//!
//! - `GET /quote/ltp?i=<instrument>` for the reference price
//! - `GET /quote?i=<a>&i=<b>...` for a batch of option quotes
//!
//! Requests carry `X-Kite-Version: 3` and
//! `Authorization: token <api_key>:<access_token>`. Transient failures
//! (network, 408, 429, 5xx) are retried with exponential backoff inside a
//! single call. The login flow that issues the access token is not handled
//! here.

mod adapter;
mod api_types;
mod config;
mod error;
mod http_client;

pub use adapter::KiteQuoteSource;
pub use config::{KITE_API_VERSION, KiteConfig, RetryConfig};
pub use error::KiteError;
pub use http_client::KiteHttpClient;
