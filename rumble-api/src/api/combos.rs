//! Combo API handlers
//!
//! GET /api/v1/songs/:song_id/combos, POST /api/v1/songs/:song_id/combos/regenerate

use axum::{
    extract::{Path, State},
    Json,
};
use rumble_common::api::{AnalysisRecord, AnalysisStatus, Combo, RegenerateRequest};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

/// Song must exist (404) and its analysis must be completed (400)
async fn completed_analysis(state: &AppState, song_id: &str) -> ApiResult<AnalysisRecord> {
    if state.songs.get_song(song_id).await.is_none() {
        return Err(ApiError::SongNotFound);
    }

    match state.lifecycle.get_analysis(song_id).await {
        Some(analysis) if analysis.status == AnalysisStatus::Completed => Ok(analysis),
        _ => Err(ApiError::AnalysisNotCompleted),
    }
}

/// GET /api/v1/songs/:song_id/combos
///
/// Generates an initial batch on first request if none is stored yet.
pub async fn get_combos(
    State(state): State<AppState>,
    Path(song_id): Path<String>,
) -> ApiResult<Json<Vec<Combo>>> {
    let analysis = completed_analysis(&state, &song_id).await?;

    let combos = state.combos.get_combos(&song_id).await;
    if combos.is_empty() {
        let combos = state.combos.generate_initial_combos(&song_id, &analysis).await;
        return Ok(Json(combos));
    }

    Ok(Json(combos))
}

/// POST /api/v1/songs/:song_id/combos/regenerate
///
/// Body `{ "excludeComboIds": [...] }`; a missing or unparsable body
/// excludes nothing.
pub async fn regenerate_combos(
    State(state): State<AppState>,
    Path(song_id): Path<String>,
    payload: Option<Json<RegenerateRequest>>,
) -> ApiResult<Json<Vec<Combo>>> {
    let analysis = completed_analysis(&state, &song_id).await?;
    let request = payload.map(|Json(request)| request).unwrap_or_default();

    let combos = state
        .combos
        .regenerate_combos(&song_id, &analysis, &request.exclude_combo_ids)
        .await;

    info!(
        song_id = %song_id,
        excluded = request.exclude_combo_ids.len(),
        total = combos.len(),
        "Combos regenerated"
    );
    Ok(Json(combos))
}
