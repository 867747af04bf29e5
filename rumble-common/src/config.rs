//! Configuration loading
//!
//! Bootstrap configuration for the Rumble API server, read from an optional
//! TOML file. Every field has a compiled default, so a partial file (or no
//! file at all) is valid.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments
//! 2. Environment variables (`RUMBLE_*`)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! Levels 1 and 2 are applied by the server binary on top of the value
//! produced here.

use crate::time::millis_to_duration;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Largest accepted upload (15 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 15 * 1024 * 1024;

/// Delay between analysis settling and removal of the uploaded file
pub const DEFAULT_CLEANUP_DELAY_SECS: u64 = 300;

/// Server bootstrap configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RumbleConfig {
    /// Socket address the HTTP server binds to
    pub bind_address: String,

    /// Directory holding uploaded audio until cleanup
    pub upload_dir: PathBuf,

    /// Upload size cap in bytes
    pub max_upload_bytes: usize,

    /// Seconds after analysis settles before the upload is deleted
    pub cleanup_delay_secs: u64,

    /// Simulated latency of the placeholder tempo detector
    pub tempo_latency_ms: u64,

    /// Simulated latency of the placeholder energy detector
    pub energy_latency_ms: u64,

    /// Origin allowed by CORS (the web frontend)
    pub cors_origin: String,

    pub rate_limit: RateLimitConfig,

    pub logging: LoggingConfig,
}

/// Per-client request quotas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per window across the whole API
    pub api_requests: u32,
    pub api_window_secs: u64,
    /// Uploads allowed per window
    pub upload_requests: u32,
    pub upload_window_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for RumbleConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3001".to_string(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cleanup_delay_secs: DEFAULT_CLEANUP_DELAY_SECS,
            tempo_latency_ms: 1000,
            energy_latency_ms: 1500,
            cors_origin: "http://localhost:5173".to_string(),
            rate_limit: RateLimitConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            api_requests: 100,
            api_window_secs: 15 * 60,
            upload_requests: 10,
            upload_window_secs: 60 * 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RumbleConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// A missing file is not an error: a warning is logged and defaults are
    /// returned. An unreadable or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reject values that would make the server unusable
    pub fn validate(&self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            return Err(Error::Config("max_upload_bytes must be positive".to_string()));
        }
        let limits = &self.rate_limit;
        if limits.api_requests == 0 || limits.upload_requests == 0 {
            return Err(Error::Config(
                "rate_limit request counts must be positive".to_string(),
            ));
        }
        if limits.api_window_secs == 0 || limits.upload_window_secs == 0 {
            return Err(Error::Config(
                "rate_limit windows must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn cleanup_delay(&self) -> Duration {
        Duration::from_secs(self.cleanup_delay_secs)
    }

    pub fn tempo_latency(&self) -> Duration {
        millis_to_duration(self.tempo_latency_ms)
    }

    pub fn energy_latency(&self) -> Duration {
        millis_to_duration(self.energy_latency_ms)
    }
}

impl RateLimitConfig {
    pub fn api_window(&self) -> Duration {
        Duration::from_secs(self.api_window_secs)
    }

    pub fn upload_window(&self) -> Duration {
        Duration::from_secs(self.upload_window_secs)
    }
}
