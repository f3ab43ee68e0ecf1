//! Replay configuration
//!
//! Everything the original tooling kept in process-wide statics is passed in
//! explicitly through [`ScanConfig`].

use mscan_common::MAX_CPUS;
use serde::Deserialize;

use crate::domain::ReplayError;

/// Default number of tolerated unlabel misses per label kind
pub const DEFAULT_MISS_TOLERANCE: u64 = 200;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Unlabel events without a live object that are absorbed per kind
    /// before the replay is declared corrupt
    pub miss_tolerance: u64,

    /// Number of guest CPUs the per-CPU context tables are sized for
    pub max_cpus: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { miss_tolerance: DEFAULT_MISS_TOLERANCE, max_cpus: MAX_CPUS }
    }
}

impl ScanConfig {
    /// Parse a JSON configuration; missing fields keep their defaults
    ///
    /// # Errors
    /// Returns `ReplayError::Config` if the JSON is malformed or names unknown fields
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(json)?)
    }
}
