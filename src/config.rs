//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// TTL in milliseconds applied to proxied responses
    pub default_ttl_ms: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Base URL requests are forwarded to on a miss
    pub upstream_base_url: String,
    /// Upstream request timeout in milliseconds
    pub upstream_timeout_ms: u64,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// Unset or unparsable variables fall back to their defaults.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 500)
    /// - `DEFAULT_TTL_MS` - Cache TTL in milliseconds (default: 30000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `UPSTREAM_BASE_URL` - Upstream API base URL (default: http://127.0.0.1:8080)
    /// - `UPSTREAM_TIMEOUT_MS` - Upstream timeout in milliseconds (default: 10000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            default_ttl_ms: env_or("DEFAULT_TTL_MS", defaults.default_ttl_ms),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            upstream_base_url: env::var("UPSTREAM_BASE_URL")
                .unwrap_or(defaults.upstream_base_url),
            upstream_timeout_ms: env_or("UPSTREAM_TIMEOUT_MS", defaults.upstream_timeout_ms),
        }
    }

    /// Rejects values the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(CacheError::InvalidConfig(
                "MAX_ENTRIES must be at least 1".to_string(),
            ));
        }
        if self.upstream_timeout_ms == 0 {
            return Err(CacheError::InvalidConfig(
                "UPSTREAM_TIMEOUT_MS must be greater than 0".to_string(),
            ));
        }
        if self.upstream_base_url.trim().is_empty() {
            return Err(CacheError::InvalidConfig(
                "UPSTREAM_BASE_URL must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 500,
            default_ttl_ms: 30_000,
            server_port: 3000,
            upstream_base_url: "http://127.0.0.1:8080".to_string(),
            upstream_timeout_ms: 10_000,
        }
    }
}
