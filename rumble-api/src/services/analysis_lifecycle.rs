//! Analysis lifecycle
//!
//! Drives a song's [`AnalysisRecord`] through
//! `pending → processing → {completed, failed}`:
//!
//! 1. `trigger` stores a `pending` record and spawns the analysis task
//! 2. the task writes a `processing` record pre-filled with placeholder
//!    results so clients can render something early
//! 3. tempo then energy detection run; both must succeed
//! 4. success: `completed` and initial combos generated; failure: `failed`
//!    with the error message. Either way the record is terminal
//! 5. the uploaded file is deleted after the cleanup delay
//!
//! Within one song each step awaits the previous one. The initial combos
//! are built from the finished record and stored before that record is
//! published as `completed`; file cleanup comes after either outcome.
//! Nothing is retried and nothing can be cancelled.

use chrono::Utc;
use rumble_common::api::{AnalysisRecord, AnalysisStatus};
use rumble_common::events::{EventBus, RumbleEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::audio_analyzer::{
    placeholder_energy_profile, AudioAnalyzer, EnergyEstimate, TempoEstimate, PLACEHOLDER_BPM,
    PLACEHOLDER_DURATION,
};
use super::combo_generator::ComboGenerator;
use super::song_registry::SongRegistry;
use crate::store::MemoryStore;

/// Handle to a spawned analysis task
///
/// Dropping the handle detaches the task; it still runs to completion.
pub struct AnalysisHandle {
    song_id: String,
    task: JoinHandle<Option<AnalysisStatus>>,
}

impl AnalysisHandle {
    pub fn song_id(&self) -> &str {
        &self.song_id
    }

    /// Wait for the terminal status
    ///
    /// `None` when the song was unknown (analysis aborted) or the task panicked.
    pub async fn wait(self) -> Option<AnalysisStatus> {
        match self.task.await {
            Ok(status) => status,
            Err(e) => {
                error!(song_id = %self.song_id, error = %e, "Analysis task did not finish");
                None
            }
        }
    }
}

#[derive(Clone)]
pub struct AnalysisLifecycle {
    songs: SongRegistry,
    analyses: MemoryStore<AnalysisRecord>,
    combos: ComboGenerator,
    analyzer: Arc<dyn AudioAnalyzer>,
    event_bus: EventBus,
    cleanup_delay: Duration,
}

impl AnalysisLifecycle {
    pub fn new(
        songs: SongRegistry,
        analyses: MemoryStore<AnalysisRecord>,
        combos: ComboGenerator,
        analyzer: Arc<dyn AudioAnalyzer>,
        event_bus: EventBus,
        cleanup_delay: Duration,
    ) -> Self {
        Self {
            songs,
            analyses,
            combos,
            analyzer,
            event_bus,
            cleanup_delay,
        }
    }

    /// Point-in-time copy of a song's analysis record
    pub async fn get_analysis(&self, song_id: &str) -> Option<AnalysisRecord> {
        self.analyses.get(song_id).await
    }

    /// Start analysis without waiting for it
    ///
    /// Known songs get a `pending` record before this returns.
    pub async fn trigger(&self, song_id: &str) -> AnalysisHandle {
        if self.songs.get_song(song_id).await.is_some() {
            self.analyses
                .insert(song_id, AnalysisRecord::pending(song_id))
                .await;
        }

        let lifecycle = self.clone();
        let id = song_id.to_string();
        let task = tokio::spawn(async move { lifecycle.perform_full_analysis(&id).await });

        AnalysisHandle {
            song_id: song_id.to_string(),
            task,
        }
    }

    /// Run the whole lifecycle for one song
    ///
    /// Returns the terminal status, or `None` if the song is not registered.
    pub async fn perform_full_analysis(&self, song_id: &str) -> Option<AnalysisStatus> {
        let Some(song) = self.songs.get_song(song_id).await else {
            error!(song_id = %song_id, "Song not found for analysis");
            return None;
        };

        self.analyses
            .insert(song_id, processing_record(song_id))
            .await;
        self.event_bus.emit_lossy(RumbleEvent::AnalysisStarted {
            song_id: song_id.to_string(),
            timestamp: Utc::now(),
        });
        info!(
            song_id = %song_id,
            analyzer = self.analyzer.name(),
            file = %song.file_path.display(),
            "Analysis started"
        );

        let status = match self.detect(song_id, &song.file_path).await {
            Ok(energy) => self.complete(song_id, energy).await,
            Err(e) => self.fail(song_id, &e).await,
        };

        self.schedule_cleanup(song_id, song.file_path);
        Some(status)
    }

    /// Tempo then energy; tempo results are written as soon as they exist
    async fn detect(&self, song_id: &str, file_path: &Path) -> anyhow::Result<EnergyEstimate> {
        let TempoEstimate { bpm, variable_bpm } = self.analyzer.detect_tempo(file_path).await?;
        self.analyses
            .update(song_id, |record| {
                record.bpm = Some(bpm);
                record.variable_bpm = Some(variable_bpm);
            })
            .await;

        self.analyzer.detect_energy(file_path).await
    }

    /// Combos are stored before the `completed` record becomes visible, so a
    /// reader that sees `completed` never races the initial batch.
    async fn complete(&self, song_id: &str, energy: EnergyEstimate) -> AnalysisStatus {
        let Some(mut record) = self.analyses.get(song_id).await else {
            warn!(song_id = %song_id, "Analysis record vanished before completion");
            return AnalysisStatus::Failed;
        };
        record.energy_profile = Some(energy.energy_profile);
        record.duration = Some(energy.duration);
        record.status = AnalysisStatus::Completed;
        record.completed_at = Some(Utc::now());

        let combos = self.combos.generate_initial_combos(song_id, &record).await;
        self.analyses.insert(song_id, record.clone()).await;

        let bpm = record.bpm.unwrap_or_default();
        let segment_count = record.energy_profile.as_ref().map_or(0, Vec::len);
        info!(
            song_id = %song_id,
            bpm,
            segments = segment_count,
            combos = combos.len(),
            "Analysis completed"
        );
        self.event_bus.emit_lossy(RumbleEvent::AnalysisCompleted {
            song_id: song_id.to_string(),
            bpm,
            segment_count,
            combo_count: combos.len(),
            timestamp: Utc::now(),
        });

        AnalysisStatus::Completed
    }

    async fn fail(&self, song_id: &str, cause: &anyhow::Error) -> AnalysisStatus {
        let message = format!("{:#}", cause);
        error!(song_id = %song_id, error = %message, "Analysis failed");

        self.analyses
            .update(song_id, |record| {
                record.status = AnalysisStatus::Failed;
                record.error = Some(message.clone());
                record.completed_at = Some(Utc::now());
            })
            .await;

        self.event_bus.emit_lossy(RumbleEvent::AnalysisFailed {
            song_id: song_id.to_string(),
            error: message,
            timestamp: Utc::now(),
        });

        AnalysisStatus::Failed
    }

    /// Delete the uploaded file after `cleanup_delay`; errors are only logged
    fn schedule_cleanup(&self, song_id: &str, file_path: PathBuf) {
        let delay = self.cleanup_delay;
        let event_bus = self.event_bus.clone();
        let song_id = song_id.to_string();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match tokio::fs::remove_file(&file_path).await {
                Ok(()) => {
                    info!(song_id = %song_id, file = %file_path.display(), "Deleted temporary file");
                    event_bus.emit_lossy(RumbleEvent::UploadPurged {
                        song_id,
                        timestamp: Utc::now(),
                    });
                }
                Err(e) => {
                    error!(
                        song_id = %song_id,
                        file = %file_path.display(),
                        error = %e,
                        "Error deleting file"
                    );
                }
            }
        });
    }
}

/// `processing` record pre-filled with placeholder results
fn processing_record(song_id: &str) -> AnalysisRecord {
    AnalysisRecord {
        status: AnalysisStatus::Processing,
        bpm: Some(PLACEHOLDER_BPM),
        variable_bpm: Some(false),
        energy_profile: Some(placeholder_energy_profile()),
        duration: Some(PLACEHOLDER_DURATION),
        ..AnalysisRecord::pending(song_id)
    }
}
