//! HTTP response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::services::TrackerStatus;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: HealthStatus,
    /// Service version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Tracker and sampler state.
    pub tracker: TrackerStatus,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Tracking and the last iteration succeeded.
    Healthy,
    /// Tracking, but sampling is failing or has not run yet.
    Degraded,
    /// No symbols tracked and bootstrap is failing.
    Unhealthy,
}

impl HealthStatus {
    /// Derive the overall status from a tracker snapshot.
    #[must_use]
    pub const fn from_tracker(status: &TrackerStatus) -> Self {
        if status.tracked_symbols == 0 {
            return if status.consecutive_failures > 0 {
                Self::Unhealthy
            } else {
                Self::Degraded
            };
        }
        if status.consecutive_failures > 0 || status.last_success_at.is_none() {
            Self::Degraded
        } else {
            Self::Healthy
        }
    }
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
}

impl ApiErrorResponse {
    /// Create an error response.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
