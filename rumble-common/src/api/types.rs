//! Shared API request/response types
//!
//! Field names follow the camelCase JSON contract consumed by the web and
//! terminal clients. Optional analysis fields are omitted when absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

// ========================================
// Energy
// ========================================

/// Coarse intensity of a track region
///
/// Serialized as the bare integer `1`, `2` or `3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EnergyLevel {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl EnergyLevel {
    /// Inclusive punch-count range for combos targeting this level
    pub fn punch_range(self) -> (usize, usize) {
        match self {
            EnergyLevel::Low => (2, 4),
            EnergyLevel::Medium => (3, 5),
            EnergyLevel::High => (4, 6),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for EnergyLevel {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(EnergyLevel::Low),
            2 => Ok(EnergyLevel::Medium),
            3 => Ok(EnergyLevel::High),
            other => Err(Error::InvalidInput(format!(
                "energy level must be 1, 2 or 3 (got {})",
                other
            ))),
        }
    }
}

impl From<EnergyLevel> for u8 {
    fn from(level: EnergyLevel) -> Self {
        level.as_u8()
    }
}

impl fmt::Display for EnergyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EnergyLevel::Low => "low",
            EnergyLevel::Medium => "medium",
            EnergyLevel::High => "high",
        };
        f.write_str(label)
    }
}

/// Half-open interval `[startTime, endTime)` of a track with its energy level
///
/// Segments are expected to be contiguous and ordered by start time. Nothing
/// enforces this.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergySegment {
    pub start_time: f64,
    pub end_time: f64,
    pub level: EnergyLevel,
}

impl EnergySegment {
    pub fn new(start_time: f64, end_time: f64, level: EnergyLevel) -> Self {
        Self {
            start_time,
            end_time,
            level,
        }
    }

    /// Segment length in seconds
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

// ========================================
// Analysis
// ========================================

/// Analysis lifecycle state
///
/// `pending → processing → {completed, failed}`; the last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Per-song tempo/energy detection progress and results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub song_id: String,
    pub status: AnalysisStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_bpm: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_profile: Option<Vec<EnergySegment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl AnalysisRecord {
    /// Fresh record with no results yet
    pub fn pending(song_id: impl Into<String>) -> Self {
        Self {
            song_id: song_id.into(),
            status: AnalysisStatus::Pending,
            bpm: None,
            variable_bpm: None,
            energy_profile: None,
            duration: None,
            error: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// BPM, energy profile and duration when all three are present
    ///
    /// A zero (or NaN) BPM or duration counts as missing. An empty energy
    /// profile does not.
    pub fn generation_inputs(&self) -> Option<(f64, &[EnergySegment], f64)> {
        match (self.bpm, self.energy_profile.as_deref(), self.duration) {
            (Some(bpm), Some(profile), Some(duration)) if bpm > 0.0 && duration > 0.0 => {
                Some((bpm, profile, duration))
            }
            _ => None,
        }
    }
}

// ========================================
// Combos
// ========================================

/// The six punch types, numbered 1..=6 in boxing notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punch {
    Jab = 1,
    Cross = 2,
    LeadHook = 3,
    RearHook = 4,
    LeadUppercut = 5,
    RearUppercut = 6,
}

impl Punch {
    pub const ALL: [Punch; 6] = [
        Punch::Jab,
        Punch::Cross,
        Punch::LeadHook,
        Punch::RearHook,
        Punch::LeadUppercut,
        Punch::RearUppercut,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Punch::Jab => "Jab",
            Punch::Cross => "Cross",
            Punch::LeadHook => "Lead hook",
            Punch::RearHook => "Rear hook",
            Punch::LeadUppercut => "Lead uppercut",
            Punch::RearUppercut => "Rear uppercut",
        }
    }

    pub fn from_index(index: u8) -> Result<Self> {
        Punch::ALL
            .get(usize::from(index).wrapping_sub(1))
            .copied()
            .ok_or_else(|| Error::InvalidInput(format!("punch index must be 1-6 (got {})", index)))
    }
}

/// A generated punch sequence timed to one energy segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Combo {
    pub id: String,
    /// Dash-joined punch indices, e.g. `1-2-3`
    pub sequence: String,
    /// Punch names in sequence order
    pub notation: Vec<String>,
    pub energy_level: EnergyLevel,
    pub bpm: f64,
    /// Start of the originating segment in seconds
    pub time: f64,
    pub duration: f64,
    pub created_at: DateTime<Utc>,
}

impl Combo {
    /// Parse `sequence` back into punches
    pub fn punches(&self) -> Result<Vec<Punch>> {
        self.sequence
            .split('-')
            .map(|part| {
                part.parse::<u8>()
                    .map_err(|e| Error::InvalidInput(format!("bad punch index '{}': {}", part, e)))
                    .and_then(Punch::from_index)
            })
            .collect()
    }
}

/// POST /songs/:id/combos/regenerate body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateRequest {
    #[serde(default)]
    pub exclude_combo_ids: Vec<String>,
}

// ========================================
// Songs
// ========================================

/// Public projection of an uploaded song (no storage path)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDetails {
    pub id: String,
    pub originalname: String,
    pub mimetype: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// 202 response to an upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAccepted {
    pub song_id: String,
    pub status: AnalysisStatus,
}

// ========================================
// Error Response Types
// ========================================

/// `{ "error": { "message": ..., "code": ... } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    pub code: String,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                code: code.into(),
            },
        }
    }
}
