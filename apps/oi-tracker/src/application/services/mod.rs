//! Application Services
//!
//! - `OiTracker`: Owns the tracked set and store, serves queries
//! - `SamplerLoop`: Periodic all-or-nothing open-interest sampling

pub mod sampler;
pub mod tracker;

pub use sampler::{SampleError, SampleReport, SamplerLoop, sample_once};
pub use tracker::{OiTracker, TrackerError, TrackerSettings, TrackerStatus};
