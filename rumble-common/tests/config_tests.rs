//! Unit tests for configuration loading and graceful degradation
//!
//! - Missing TOML files fall back to defaults
//! - Partial TOML files keep defaults for omitted fields
//! - Malformed or invalid TOML is an error

use rumble_common::config::{RumbleConfig, DEFAULT_CLEANUP_DELAY_SECS, DEFAULT_MAX_UPLOAD_BYTES};
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_defaults_match_service_contract() {
    let config = RumbleConfig::default();

    assert_eq!(config.bind_address, "127.0.0.1:3001");
    assert_eq!(config.upload_dir, PathBuf::from("uploads"));
    assert_eq!(config.max_upload_bytes, 15 * 1024 * 1024);
    assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    assert_eq!(config.cleanup_delay(), Duration::from_secs(300));
    assert_eq!(config.cleanup_delay_secs, DEFAULT_CLEANUP_DELAY_SECS);
    assert_eq!(config.tempo_latency(), Duration::from_millis(1000));
    assert_eq!(config.energy_latency(), Duration::from_millis(1500));
    assert_eq!(config.cors_origin, "http://localhost:5173");
    assert_eq!(config.rate_limit.api_requests, 100);
    assert_eq!(config.rate_limit.api_window(), Duration::from_secs(900));
    assert_eq!(config.rate_limit.upload_requests, 10);
    assert_eq!(config.rate_limit.upload_window(), Duration::from_secs(3600));
    assert_eq!(config.logging.level, "info");
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_file_uses_defaults() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("does-not-exist.toml");

    let config = RumbleConfig::load(&path).expect("missing file should not fail");
    assert_eq!(config, RumbleConfig::default());
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("rumble.toml");
    std::fs::write(
        &path,
        r#"
bind_address = "0.0.0.0:8080"
cleanup_delay_secs = 5

[rate_limit]
upload_requests = 3

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = RumbleConfig::load(&path).unwrap();
    assert_eq!(config.bind_address, "0.0.0.0:8080");
    assert_eq!(config.cleanup_delay(), Duration::from_secs(5));
    assert_eq!(config.rate_limit.upload_requests, 3);
    assert_eq!(config.rate_limit.api_requests, 100);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
}

#[test]
fn test_malformed_file_is_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("rumble.toml");
    std::fs::write(&path, "bind_address = [not toml").unwrap();

    let err = RumbleConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
}

#[test]
fn test_zero_limits_rejected() {
    assert!(RumbleConfig::from_toml_str("max_upload_bytes = 0").is_err());
    assert!(RumbleConfig::from_toml_str("[rate_limit]\napi_requests = 0").is_err());
    assert!(RumbleConfig::from_toml_str("[rate_limit]\nupload_window_secs = 0").is_err());
}

#[test]
fn test_config_round_trips_through_toml() {
    let mut config = RumbleConfig::default();
    config.upload_dir = PathBuf::from("/var/tmp/rumble");
    let text = toml::to_string(&config).unwrap();
    assert_eq!(RumbleConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn test_latency_settings_convert_from_millis() {
    let config = RumbleConfig::from_toml_str("tempo_latency_ms = 0\nenergy_latency_ms = 250\n").unwrap();

    assert_eq!(config.tempo_latency(), Duration::ZERO);
    assert_eq!(config.energy_latency(), Duration::from_millis(250));
}
