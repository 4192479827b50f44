//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Cross-origin settings.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Accounts served by the in-memory store.
    pub accounts: Vec<AccountConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:4000").
    pub bind_address: String,

    /// Deployment environment (development, staging, production).
    pub environment: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4000".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Longest accepted pause between janitor sweeps.
pub const MAX_SWEEP_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Longest accepted idle time before eviction.
pub const MAX_EVICTION_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Tokens refilled per second per client.
    pub requests_per_second: f64,

    /// Bucket capacity.
    pub burst: u32,

    /// Seconds between janitor sweeps.
    pub sweep_interval_secs: u64,

    /// Idle seconds before a client is evicted. Defaults to three sweep intervals.
    pub eviction_window_secs: Option<u64>,
}

impl RateLimitConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn eviction_window(&self) -> Duration {
        match self.eviction_window_secs {
            Some(secs) => Duration::from_secs(secs),
            None => self.sweep_interval().saturating_mul(3),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: 2.0,
            burst: 4,
            sweep_interval_secs: 60,
            eviction_window_secs: None,
        }
    }
}

/// Cross-origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to read responses.
    pub trusted_origins: Vec<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// An account with one authentication token.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
    pub id: i64,

    /// Plaintext authentication token.
    pub token: String,

    #[serde(default)]
    pub activated: bool,

    #[serde(default)]
    pub permissions: Vec<String>,
}
