//! Tempo and energy detection
//!
//! [`AudioAnalyzer`] is the seam where real signal processing plugs in. The
//! shipped [`PlaceholderAnalyzer`] returns fixed results after a simulated
//! delay.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rumble_common::api::{EnergyLevel, EnergySegment};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Tempo assumed by the placeholder detectors
pub const PLACEHOLDER_BPM: f64 = 128.0;

/// Track length assumed by the placeholder detectors (3:30)
pub const PLACEHOLDER_DURATION: f64 = 210.0;

/// Tempo detection result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoEstimate {
    pub bpm: f64,
    /// Tempo drifts noticeably across the track
    pub variable_bpm: bool,
}

/// Energy detection result
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyEstimate {
    pub energy_profile: Vec<EnergySegment>,
    /// Track duration in seconds
    pub duration: f64,
}

/// Audio analysis backend
///
/// Both detectors are independent suspension points and may fail; a failure
/// moves the song's analysis to `failed`.
#[async_trait]
pub trait AudioAnalyzer: Send + Sync {
    /// Backend identifier for logging
    fn name(&self) -> &'static str;

    async fn detect_tempo(&self, file_path: &Path) -> Result<TempoEstimate>;

    async fn detect_energy(&self, file_path: &Path) -> Result<EnergyEstimate>;
}

/// Fixed energy profile: intro, build-up, drop, breakdown, finale
pub fn placeholder_energy_profile() -> Vec<EnergySegment> {
    vec![
        EnergySegment::new(0.0, 30.0, EnergyLevel::Low),
        EnergySegment::new(30.0, 90.0, EnergyLevel::Medium),
        EnergySegment::new(90.0, 150.0, EnergyLevel::High),
        EnergySegment::new(150.0, 180.0, EnergyLevel::Medium),
        EnergySegment::new(180.0, 210.0, EnergyLevel::High),
    ]
}

/// Stand-in detectors with fixed output
///
/// The uploaded file must still be readable; otherwise detection fails.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderAnalyzer {
    tempo_latency: Duration,
    energy_latency: Duration,
}

impl PlaceholderAnalyzer {
    pub fn new(tempo_latency: Duration, energy_latency: Duration) -> Self {
        Self {
            tempo_latency,
            energy_latency,
        }
    }

    /// No simulated delay
    pub fn instant() -> Self {
        Self::default()
    }

    async fn ensure_readable(file_path: &Path) -> Result<()> {
        let metadata = tokio::fs::metadata(file_path)
            .await
            .with_context(|| format!("Cannot read uploaded file {}", file_path.display()))?;
        if !metadata.is_file() {
            anyhow::bail!("Uploaded path is not a file: {}", file_path.display());
        }
        Ok(())
    }
}

#[async_trait]
impl AudioAnalyzer for PlaceholderAnalyzer {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    async fn detect_tempo(&self, file_path: &Path) -> Result<TempoEstimate> {
        Self::ensure_readable(file_path).await?;
        tokio::time::sleep(self.tempo_latency).await;
        debug!(file = %file_path.display(), bpm = PLACEHOLDER_BPM, "Tempo detected");

        Ok(TempoEstimate {
            bpm: PLACEHOLDER_BPM,
            variable_bpm: false,
        })
    }

    async fn detect_energy(&self, file_path: &Path) -> Result<EnergyEstimate> {
        Self::ensure_readable(file_path).await?;
        tokio::time::sleep(self.energy_latency).await;

        let energy_profile = placeholder_energy_profile();
        debug!(
            file = %file_path.display(),
            segments = energy_profile.len(),
            "Energy profile detected"
        );

        Ok(EnergyEstimate {
            energy_profile,
            duration: PLACEHOLDER_DURATION,
        })
    }
}
