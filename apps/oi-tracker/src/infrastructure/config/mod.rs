//! Configuration Module
//!
//! Configuration loading for the tracker service.

mod settings;

pub use settings::{
    ChainSettings, ConfigError, Credentials, KiteSettings, SamplerSettings, ServerSettings,
    TrackerConfig,
};
