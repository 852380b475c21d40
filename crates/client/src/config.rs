//! Client configuration

use std::path::PathBuf;
use std::time::Duration;

/// Client configuration for talking to a catalog server
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "http://localhost:3000")
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Where the local cache (document + pending operations) is persisted
    pub cache_path: PathBuf,

    /// How old the cached document may get before `refresh_if_stale` refetches
    pub max_staleness: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: 10,
            cache_path: cache_path.into(),
            max_staleness: Duration::from_secs(60),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = secs;
        self
    }

    /// Set the staleness window
    pub fn with_max_staleness(mut self, max: Duration) -> Self {
        self.max_staleness = max;
        self
    }
}
