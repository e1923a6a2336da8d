//! Kite-specific error types.

use thiserror::Error;

use crate::application::ports::QuoteSourceError;

/// Errors from the Kite adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KiteError {
    /// HTTP client could not be built.
    #[error("HTTP error: {0}")]
    Http(String),

    /// API returned an error.
    #[error("API error: {error_type} - {message}")]
    Api {
        /// Kite exception class (e.g. `InputException`).
        error_type: String,
        /// Error message from the API.
        message: String,
    },

    /// Credentials were rejected or the session expired.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Rate limited.
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Suggested retry delay in seconds.
        retry_after_secs: u64,
    },

    /// Network error (retryable).
    #[error("Network error: {0}")]
    Network(String),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(String),

    /// Max retries exceeded.
    #[error("Max retries exceeded after {attempts} attempts")]
    MaxRetriesExceeded {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// Requested instrument absent from a price response.
    #[error("Instrument not in response: {0}")]
    MissingInstrument(String),
}

impl From<KiteError> for QuoteSourceError {
    fn from(err: KiteError) -> Self {
        match err {
            KiteError::Http(message) | KiteError::Network(message) => Self::Connection { message },
            KiteError::MaxRetriesExceeded { attempts } => Self::Connection {
                message: format!("max retries exceeded after {attempts} attempts"),
            },
            KiteError::Api {
                error_type,
                message,
            } => Self::Api {
                message: format!("{error_type}: {message}"),
            },
            KiteError::AuthenticationFailed => Self::Authentication,
            KiteError::RateLimited { retry_after_secs } => Self::RateLimited { retry_after_secs },
            KiteError::JsonParse(message) => Self::MalformedResponse { message },
            KiteError::MissingInstrument(instrument) => Self::MissingPrice { instrument },
        }
    }
}
