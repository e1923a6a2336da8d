//! HTTP client wrapper with retry logic.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use super::api_types::{KiteEnvelope, KiteErrorResponse};
use super::config::{KITE_API_VERSION, KiteConfig, RetryConfig};
use super::error::KiteError;

/// HTTP client for the Kite Connect REST API with retry logic.
#[derive(Debug, Clone)]
pub struct KiteHttpClient {
    client: Client,
    authorization: String,
    base_url: String,
    retry_config: RetryConfig,
}

impl KiteHttpClient {
    /// Create a new HTTP client from config.
    ///
    /// # Errors
    ///
    /// Returns `KiteError::AuthenticationFailed` if credentials are empty, or
    /// `KiteError::Http` if the client cannot be built.
    pub fn new(config: &KiteConfig) -> Result<Self, KiteError> {
        if config.api_key.is_empty() || config.access_token.is_empty() {
            return Err(KiteError::AuthenticationFailed);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| KiteError::Http(e.to_string()))?;

        Ok(Self {
            client,
            authorization: config.authorization(),
            base_url: config.base_url.clone(),
            retry_config: config.retry.clone(),
        })
    }

    /// GET `path` with repeated query pairs and unwrap the response envelope.
    ///
    /// # Errors
    ///
    /// Returns `KiteError` once retries are exhausted or on a non-retryable
    /// failure.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, KiteError> {
        let url = format!("{}{path}", self.base_url);
        let mut backoff = ExponentialBackoff::new(&self.retry_config);

        loop {
            let request = self
                .client
                .get(&url)
                .query(query)
                .header("X-Kite-Version", KITE_API_VERSION)
                .header("Authorization", &self.authorization);

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) => {
                    if let Some(delay) = backoff.next_backoff() {
                        tracing::warn!(
                            error = %e,
                            path,
                            delay_ms = delay.as_millis(),
                            attempt = backoff.attempt,
                            "Network error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(if backoff.attempt > 1 {
                        KiteError::MaxRetriesExceeded {
                            attempts: backoff.attempt,
                        }
                    } else {
                        KiteError::Network(e.to_string())
                    });
                }
            };

            let status = response.status();

            if status.is_success() {
                let text = response
                    .text()
                    .await
                    .map_err(|e| KiteError::Network(e.to_string()))?;
                let envelope: KiteEnvelope<T> =
                    serde_json::from_str(&text).map_err(|e| KiteError::JsonParse(e.to_string()))?;
                return envelope.into_data();
            }

            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());

            let error_body = response.text().await.unwrap_or_default();

            let (error_type, error_message) =
                match serde_json::from_str::<KiteErrorResponse>(&error_body) {
                    Ok(err) => (
                        err.error_type.unwrap_or_else(|| status.as_u16().to_string()),
                        err.message,
                    ),
                    Err(_) => (status.as_u16().to_string(), error_body),
                };

            match categorize_status(status) {
                ErrorCategory::RateLimited => {
                    if let Some(delay) = backoff.next_rate_limit_backoff(retry_after) {
                        tracing::warn!(
                            path,
                            delay_ms = delay.as_millis(),
                            "Rate limited, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(KiteError::RateLimited {
                        retry_after_secs: retry_after.unwrap_or(1),
                    });
                }
                ErrorCategory::Retryable => {
                    if let Some(delay) = backoff.next_backoff() {
                        tracing::warn!(
                            path,
                            code = %error_type,
                            message = %error_message,
                            delay_ms = delay.as_millis(),
                            "Retryable error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(KiteError::MaxRetriesExceeded {
                        attempts: backoff.attempt,
                    });
                }
                ErrorCategory::NonRetryable => {
                    return match status {
                        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                            Err(KiteError::AuthenticationFailed)
                        }
                        _ if error_type == "TokenException" => Err(KiteError::AuthenticationFailed),
                        _ => Err(KiteError::Api {
                            error_type,
                            message: error_message,
                        }),
                    };
                }
            }
        }
    }
}

/// Error category for determining retry behavior.
enum ErrorCategory {
    RateLimited,
    Retryable,
    NonRetryable,
}

/// Categorize HTTP status code for retry handling.
const fn categorize_status(status: StatusCode) -> ErrorCategory {
    match status.as_u16() {
        429 => ErrorCategory::RateLimited,
        408 | 500 | 502 | 503 | 504 => ErrorCategory::Retryable,
        _ => ErrorCategory::NonRetryable,
    }
}

/// Exponential backoff calculator.
struct ExponentialBackoff {
    attempt: u32,
    max_attempts: u32,
    current_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
}

impl ExponentialBackoff {
    const fn new(config: &RetryConfig) -> Self {
        Self {
            attempt: 0,
            max_attempts: config.max_attempts,
            current_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
            multiplier: config.multiplier,
        }
    }

    /// Delay before the next attempt, or `None` once attempts are used up.
    fn next_backoff(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt >= self.max_attempts {
            return None;
        }

        let backoff = self.current_backoff;
        self.current_backoff = Duration::from_secs_f64(
            (self.current_backoff.as_secs_f64() * self.multiplier)
                .min(self.max_backoff.as_secs_f64()),
        );

        Some(backoff)
    }

    /// Delay before retrying a rate-limited call.
    ///
    /// Honors `Retry-After` when present, never exceeding `max_backoff`.
    fn next_rate_limit_backoff(&mut self, retry_after_secs: Option<u64>) -> Option<Duration> {
        let delay = self.next_backoff()?;
        Some(
            retry_after_secs
                .map_or(delay, Duration::from_secs)
                .min(self.max_backoff),
        )
    }
}
