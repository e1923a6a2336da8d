//! Tracker Configuration Settings
//!
//! Configuration types for the OI tracker, loaded from environment variables.
//! Loading goes through a lookup function so tests can supply values without
//! touching the process environment.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::application::services::TrackerSettings;
use crate::domain::chain::{ChainError, ChainSpec};

/// Kite Connect API credentials.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    access_token: String,
}

impl Credentials {
    /// Create new credentials.
    #[must_use]
    pub const fn new(api_key: String, access_token: String) -> Self {
        Self {
            api_key,
            access_token,
        }
    }

    /// Get the API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Kite REST client settings.
#[derive(Debug, Clone)]
pub struct KiteSettings {
    /// REST base URL.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Attempts per call, including the first.
    pub max_attempts: u32,
}

impl Default for KiteSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.kite.trade".to_string(),
            timeout: Duration::from_secs(10),
            max_attempts: 3,
        }
    }
}

/// Option chain settings.
#[derive(Debug, Clone)]
pub struct ChainSettings {
    /// Instrument identifier prefix (exchange and underlying).
    pub instrument_prefix: String,
    /// Expiry token inserted between prefix and strike.
    pub expiry: String,
    /// Instrument whose price anchors the band.
    pub reference_instrument: String,
    /// Half-width of the strike band.
    pub strike_range: i64,
    /// Strike spacing.
    pub strike_step: i64,
}

/// Sampler settings.
#[derive(Debug, Clone)]
pub struct SamplerSettings {
    /// Pause between iterations.
    pub fetch_interval: Duration,
    /// Bootstrap and start sampling at process start.
    pub eager_start: bool,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            fetch_interval: Duration::from_secs(180),
            eager_start: true,
        }
    }
}

/// Server port settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Query surface HTTP port.
    pub http_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { http_port: 5000 }
    }
}

/// Complete tracker configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// API credentials.
    pub credentials: Credentials,
    /// Kite client settings.
    pub kite: KiteSettings,
    /// Option chain settings.
    pub chain: ChainSettings,
    /// Sampler settings.
    pub sampler: SamplerSettings,
    /// Server port settings.
    pub server: ServerSettings,
}

impl TrackerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or any value is
    /// invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if required keys are missing or any value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = required(&lookup, "KITE_API_KEY")?;
        let access_token = required(&lookup, "KITE_ACCESS_TOKEN")?;

        let kite_defaults = KiteSettings::default();
        let kite = KiteSettings {
            base_url: lookup("KITE_BASE_URL")
                .filter(|v| !v.is_empty())
                .unwrap_or(kite_defaults.base_url),
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "KITE_TIMEOUT_SECS",
                kite_defaults.timeout.as_secs(),
            )?),
            max_attempts: parse_or(&lookup, "KITE_MAX_ATTEMPTS", kite_defaults.max_attempts)?,
        };
        if kite.max_attempts == 0 {
            return Err(ConfigError::invalid("KITE_MAX_ATTEMPTS", "0", "must be at least 1"));
        }

        let chain = ChainSettings {
            instrument_prefix: lookup("OI_INSTRUMENT_PREFIX")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "NFO:NIFTY".to_string()),
            expiry: required(&lookup, "OI_EXPIRY")?,
            reference_instrument: lookup("OI_REFERENCE_INSTRUMENT")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "NSE:NIFTY 50".to_string()),
            strike_range: parse_or(&lookup, "OI_STRIKE_RANGE", 500)?,
            strike_step: parse_or(&lookup, "OI_STRIKE_STEP", 50)?,
        };
        if chain.strike_range < 0 {
            return Err(ConfigError::invalid(
                "OI_STRIKE_RANGE",
                chain.strike_range,
                "must not be negative",
            ));
        }
        if chain.strike_step <= 0 {
            return Err(ConfigError::invalid(
                "OI_STRIKE_STEP",
                chain.strike_step,
                "must be positive",
            ));
        }

        let sampler_defaults = SamplerSettings::default();
        let interval_secs: u64 = parse_or(
            &lookup,
            "OI_FETCH_INTERVAL_SECS",
            sampler_defaults.fetch_interval.as_secs(),
        )?;
        if interval_secs == 0 {
            return Err(ConfigError::invalid(
                "OI_FETCH_INTERVAL_SECS",
                "0",
                "must be positive",
            ));
        }
        let sampler = SamplerSettings {
            fetch_interval: Duration::from_secs(interval_secs),
            eager_start: parse_bool_or(&lookup, "OI_EAGER_START", sampler_defaults.eager_start)?,
        };

        let server = ServerSettings {
            http_port: parse_or(&lookup, "OI_HTTP_PORT", ServerSettings::default().http_port)?,
        };

        Ok(Self {
            credentials: Credentials::new(api_key, access_token),
            kite,
            chain,
            sampler,
            server,
        })
    }

    /// Build the tracker settings from this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the chain description is invalid.
    pub fn tracker_settings(&self) -> Result<TrackerSettings, ConfigError> {
        let chain = ChainSpec::new(
            self.chain.instrument_prefix.clone(),
            self.chain.expiry.clone(),
            self.chain.strike_range,
            self.chain.strike_step,
        )?;

        Ok(TrackerSettings {
            chain,
            reference_instrument: self.chain.reference_instrument.clone(),
            fetch_interval: self.sampler.fetch_interval,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),

    /// Environment variable could not be parsed or is out of range.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Chain settings were rejected.
    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl ConfigError {
    fn invalid(key: &str, value: impl Display, reason: impl Display) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))?;
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyValue(key.to_string()));
    }
    Ok(value)
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::invalid(key, &raw, e)),
        _ => Ok(default),
    }
}

fn parse_bool_or<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key).filter(|v| !v.trim().is_empty()) else {
        return Ok(default);
    };
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::invalid(key, &raw, "expected true or false")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("KITE_API_KEY", "key123"),
        ("KITE_ACCESS_TOKEN", "token456"),
        ("OI_EXPIRY", "26203"),
    ];

    fn with_required(extra: &[(&'static str, &'static str)]) -> Result<TrackerConfig, ConfigError> {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend_from_slice(extra);
        TrackerConfig::from_lookup(lookup_from(&pairs))
    }

    #[test]
    fn defaults_applied() {
        let config = with_required(&[]).unwrap();

        assert_eq!(config.credentials.api_key(), "key123");
        assert_eq!(config.credentials.access_token(), "token456");
        assert_eq!(config.kite.base_url, "https://api.kite.trade");
        assert_eq!(config.kite.timeout, Duration::from_secs(10));
        assert_eq!(config.kite.max_attempts, 3);
        assert_eq!(config.chain.instrument_prefix, "NFO:NIFTY");
        assert_eq!(config.chain.expiry, "26203");
        assert_eq!(config.chain.reference_instrument, "NSE:NIFTY 50");
        assert_eq!(config.chain.strike_range, 500);
        assert_eq!(config.chain.strike_step, 50);
        assert_eq!(config.sampler.fetch_interval, Duration::from_secs(180));
        assert!(config.sampler.eager_start);
        assert_eq!(config.server.http_port, 5000);
    }

    #[test]
    fn overrides_applied() {
        let config = with_required(&[
            ("KITE_BASE_URL", "http://localhost:9999"),
            ("OI_INSTRUMENT_PREFIX", "NFO:BANKNIFTY"),
            ("OI_STRIKE_RANGE", "1000"),
            ("OI_STRIKE_STEP", "100"),
            ("OI_FETCH_INTERVAL_SECS", "60"),
            ("OI_HTTP_PORT", "8080"),
            ("OI_EAGER_START", "false"),
        ])
        .unwrap();

        assert_eq!(config.kite.base_url, "http://localhost:9999");
        assert_eq!(config.chain.instrument_prefix, "NFO:BANKNIFTY");
        assert_eq!(config.chain.strike_range, 1000);
        assert_eq!(config.chain.strike_step, 100);
        assert_eq!(config.sampler.fetch_interval, Duration::from_secs(60));
        assert_eq!(config.server.http_port, 8080);
        assert!(!config.sampler.eager_start);
    }

    #[test]
    fn missing_required_variable() {
        let err = TrackerConfig::from_lookup(lookup_from(&[("KITE_API_KEY", "k")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "KITE_ACCESS_TOKEN"));
    }

    #[test]
    fn empty_required_variable() {
        let err = TrackerConfig::from_lookup(lookup_from(&[
            ("KITE_API_KEY", "k"),
            ("KITE_ACCESS_TOKEN", "t"),
            ("OI_EXPIRY", "  "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyValue(ref key) if key == "OI_EXPIRY"));
    }

    #[test]
    fn unparsable_integer_is_rejected() {
        let err = with_required(&[("OI_STRIKE_RANGE", "wide")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "OI_STRIKE_RANGE"));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for (key, value) in [
            ("OI_STRIKE_STEP", "0"),
            ("OI_STRIKE_STEP", "-50"),
            ("OI_STRIKE_RANGE", "-1"),
            ("OI_FETCH_INTERVAL_SECS", "0"),
            ("KITE_MAX_ATTEMPTS", "0"),
            ("OI_EAGER_START", "maybe"),
        ] {
            let err = with_required(&[(key, value)]).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { key: ref k, .. } if k == key),
                "{key}={value} gave {err}"
            );
        }
    }

    #[test]
    fn tracker_settings_built_from_config() {
        let config = with_required(&[("OI_STRIKE_RANGE", "100")]).unwrap();
        let settings = config.tracker_settings().unwrap();

        assert_eq!(settings.chain.instrument_prefix(), "NFO:NIFTY");
        assert_eq!(settings.chain.expiry(), "26203");
        assert_eq!(settings.chain.range(), 100);
        assert_eq!(settings.reference_instrument, "NSE:NIFTY 50");
        assert_eq!(settings.fetch_interval, Duration::from_secs(180));
    }

    #[test]
    fn credentials_redacted_debug() {
        let creds = Credentials::new("key123".to_string(), "secret456".to_string());
        let debug = format!("{creds:?}");
        assert!(!debug.contains("key123"));
        assert!(!debug.contains("secret456"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn config_debug_does_not_leak_token() {
        let config = with_required(&[]).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("token456"));
    }
}
