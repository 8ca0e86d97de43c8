//! Startup configuration.
//!
//! Values come from CLI flags (with environment fallbacks, see `main.rs`),
//! are validated once, and stay fixed for the lifetime of the process.

use serde::Serialize;
use std::time::Duration;

/// Default port the JADX plugin's HTTP server listens on.
pub const DEFAULT_BACKEND_PORT: u16 = 8656;
/// Default backend host (loopback only).
pub const DEFAULT_BACKEND_HOST: &str = "127.0.0.1";
/// Default per-request timeout for backend calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// Payloads with at least this many units are cached and paged.
pub const DEFAULT_CACHE_THRESHOLD: usize = 200;
/// Maximum number of keyed cache entries before oldest-first eviction.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;
/// Page size used when a caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendConfig {
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
}

impl BackendConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BACKEND_HOST.to_string(),
            port: DEFAULT_BACKEND_PORT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheConfig {
    pub threshold: usize,
    pub max_entries: usize,
    pub default_page_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CACHE_THRESHOLD,
            max_entries: DEFAULT_CACHE_CAPACITY,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid configuration: {field} must be at least 1")]
pub struct ConfigError {
    pub field: &'static str,
}

impl Config {
    /// Reject values that would make the cache or the gateway unusable.
    pub fn validate(self) -> Result<Self, ConfigError> {
        let checks: [(&'static str, u64); 5] = [
            ("port", self.backend.port as u64),
            ("timeout_secs", self.backend.timeout_secs),
            ("cache_threshold", self.cache.threshold as u64),
            ("cache_capacity", self.cache.max_entries as u64),
            ("page_size", self.cache.default_page_size as u64),
        ];
        for (field, value) in checks {
            if value == 0 {
                return Err(ConfigError { field });
            }
        }
        Ok(self)
    }
}
