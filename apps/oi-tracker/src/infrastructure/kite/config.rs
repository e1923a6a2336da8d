//! Kite adapter configuration.

use std::time::Duration;

use crate::infrastructure::config::{Credentials, KiteSettings};

/// Kite Connect API version sent with every request.
pub const KITE_API_VERSION: &str = "3";

/// Configuration for the Kite quote adapter.
#[derive(Clone)]
pub struct KiteConfig {
    /// API key.
    pub api_key: String,
    /// Access token issued by the login flow.
    pub access_token: String,
    /// REST base URL.
    pub base_url: String,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Retry policy configuration.
    pub retry: RetryConfig,
}

impl KiteConfig {
    /// Create a configuration against the production API.
    #[must_use]
    pub fn new(api_key: String, access_token: String) -> Self {
        let defaults = KiteSettings::default();
        Self {
            api_key,
            access_token,
            base_url: defaults.base_url,
            timeout: defaults.timeout,
            retry: RetryConfig::default(),
        }
    }

    /// Build from loaded process settings.
    #[must_use]
    pub fn from_settings(credentials: &Credentials, settings: &KiteSettings) -> Self {
        Self::new(
            credentials.api_key().to_string(),
            credentials.access_token().to_string(),
        )
        .with_base_url(settings.base_url.clone())
        .with_timeout(settings.timeout)
        .with_retry(RetryConfig {
            max_attempts: settings.max_attempts,
            ..RetryConfig::default()
        })
    }

    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry configuration.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Value of the `Authorization` header.
    #[must_use]
    pub fn authorization(&self) -> String {
        format!("token {}:{}", self.api_key, self.access_token)
    }
}

impl std::fmt::Debug for KiteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KiteConfig")
            .field("api_key", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum attempts per call, including the first.
    pub max_attempts: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_header_format() {
        let config = KiteConfig::new("abc".to_string(), "xyz".to_string());
        assert_eq!(config.authorization(), "token abc:xyz");
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let config =
            KiteConfig::new("k".to_string(), "t".to_string()).with_base_url("http://localhost:1/");
        assert_eq!(config.base_url, "http://localhost:1");
    }

    #[test]
    fn from_settings_carries_attempts_and_timeout() {
        let credentials = Credentials::new("k".to_string(), "t".to_string());
        let settings = KiteSettings {
            base_url: "http://kite.test".to_string(),
            timeout: Duration::from_secs(3),
            max_attempts: 5,
        };

        let config = KiteConfig::from_settings(&credentials, &settings);

        assert_eq!(config.base_url, "http://kite.test");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = KiteConfig::new("key123".to_string(), "token456".to_string());
        let debug = format!("{config:?}");
        assert!(!debug.contains("key123"));
        assert!(!debug.contains("token456"));
    }
}
