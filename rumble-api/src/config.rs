//! Command-line and environment overrides for the server
//!
//! [`Args::resolve`] layers flags and `RUMBLE_*` variables over the TOML
//! file, which itself layers over the built-in defaults.

use clap::Parser;
use rumble_common::config::RumbleConfig;
use std::path::PathBuf;

/// Default TOML location when neither `--config` nor `RUMBLE_CONFIG` is set
pub const DEFAULT_CONFIG_PATH: &str = "rumble.toml";

/// Command-line arguments for rumble-api
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "rumble-api")]
#[command(about = "Song analysis and boxing combo service for Rumble")]
#[command(version)]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "RUMBLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on (e.g. 127.0.0.1:3001)
    #[arg(short, long, env = "RUMBLE_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// Directory for uploaded audio
    #[arg(short, long, env = "RUMBLE_UPLOAD_DIR")]
    pub upload_dir: Option<PathBuf>,

    /// Seconds to keep an upload after analysis settles
    #[arg(long, env = "RUMBLE_CLEANUP_DELAY_SECS")]
    pub cleanup_delay_secs: Option<u64>,

    /// Origin allowed by CORS
    #[arg(long, env = "RUMBLE_CORS_ORIGIN")]
    pub cors_origin: Option<String>,

    /// Log level or filter directive (overridden by RUST_LOG)
    #[arg(long, env = "RUMBLE_LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl Args {
    /// Load the TOML file and apply every override that was given
    pub fn resolve(&self) -> rumble_common::Result<RumbleConfig> {
        let path = self
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut config = RumbleConfig::load(&path)?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut RumbleConfig) {
        if let Some(bind_address) = &self.bind_address {
            config.bind_address = bind_address.clone();
        }
        if let Some(upload_dir) = &self.upload_dir {
            config.upload_dir = upload_dir.clone();
        }
        if let Some(secs) = self.cleanup_delay_secs {
            config.cleanup_delay_secs = secs;
        }
        if let Some(origin) = &self.cors_origin {
            config.cors_origin = origin.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}
