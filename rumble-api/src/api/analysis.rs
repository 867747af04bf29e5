//! Analysis status API handler
//!
//! GET /api/v1/songs/:song_id/analysis

use axum::{
    extract::{Path, State},
    Json,
};
use rumble_common::api::AnalysisRecord;
use tracing::{debug, warn};

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

/// GET /api/v1/songs/:song_id/analysis
///
/// Current analysis record. Clients poll this until the status is terminal.
pub async fn get_analysis_status(
    State(state): State<AppState>,
    Path(song_id): Path<String>,
) -> ApiResult<Json<AnalysisRecord>> {
    if state.songs.get_song(&song_id).await.is_none() {
        warn!(song_id = %song_id, "Song not found");
        return Err(ApiError::SongNotFound);
    }

    let analysis = state.lifecycle.get_analysis(&song_id).await.ok_or_else(|| {
        warn!(song_id = %song_id, "Analysis not found");
        ApiError::AnalysisNotFound
    })?;

    debug!(
        song_id = %song_id,
        status = %analysis.status,
        bpm = ?analysis.bpm,
        segments = analysis.energy_profile.as_ref().map_or(0, Vec::len),
        "Returning analysis"
    );

    Ok(Json(analysis))
}
