//! Song upload and lookup handlers
//!
//! POST /api/v1/songs accepts a multipart form with the audio in a field
//! named `file`, stores it under the upload directory and kicks off
//! analysis in the background.

use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::StatusCode,
    Json,
};
use rumble_common::api::{AnalysisStatus, SongDetails, UploadAccepted};
use std::path::{Path as FsPath, PathBuf};
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::{
    error::{ApiError, ApiResult},
    services::NewSong,
    AppState, UploadSettings,
};

/// Multipart field carrying the audio
pub const UPLOAD_FIELD: &str = "file";

const NO_FILE: &str = "No file uploaded";
const NOT_MP3: &str = "Only MP3 files are allowed";

/// POST /api/v1/songs
///
/// Responds 202 as soon as the file is stored; analysis continues after
/// the response.
pub async fn upload_song(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<UploadAccepted>)> {
    let mut multipart = multipart.map_err(|e| {
        warn!(error = %e, "Upload is not a multipart form");
        ApiError::FileMissing(NO_FILE.to_string())
    })?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = ?field.name(), "Skipping multipart field");
            continue;
        }

        let song = store_upload(&state.uploads, field).await?;
        let originalname = song.originalname.clone();
        let size = song.size;

        let song_id = state.songs.add_song(song).await;
        // Analysis outlives the request; the handle is not awaited here
        let _handle = state.lifecycle.trigger(&song_id).await;

        info!(
            song_id = %song_id,
            file = %originalname,
            size,
            "Upload accepted, analysis started"
        );

        return Ok((
            StatusCode::ACCEPTED,
            Json(UploadAccepted {
                song_id,
                status: AnalysisStatus::Processing,
            }),
        ));
    }

    warn!("Upload request carried no file field");
    Err(ApiError::FileMissing(NO_FILE.to_string()))
}

/// GET /api/v1/songs/:song_id
pub async fn get_song(
    State(state): State<AppState>,
    Path(song_id): Path<String>,
) -> ApiResult<Json<SongDetails>> {
    let song = state.songs.get_song(&song_id).await.ok_or_else(|| {
        warn!(song_id = %song_id, "Song not found");
        ApiError::SongNotFound
    })?;

    Ok(Json(song.details(&song_id)))
}

/// MP3 by declared type or by file extension
pub fn is_mp3(originalname: &str, mimetype: &str) -> bool {
    matches!(mimetype, "audio/mpeg" | "audio/mp3")
        || originalname.to_ascii_lowercase().ends_with(".mp3")
}

/// Fresh UUID file name that keeps the original extension
///
/// Only the extension of the client-supplied name is used, so the stored
/// path never leaves the upload directory.
pub fn stored_file_name(originalname: &str) -> String {
    let ext = FsPath::new(originalname)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    format!("{}{}", rumble_common::uuid_utils::generate(), ext)
}

async fn store_upload(settings: &UploadSettings, mut field: Field<'_>) -> ApiResult<NewSong> {
    let originalname = field.file_name().unwrap_or_default().to_string();
    let mimetype = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    if !is_mp3(&originalname, &mimetype) {
        warn!(file = %originalname, mimetype = %mimetype, "Rejected non-MP3 upload");
        return Err(ApiError::FileMissing(NOT_MP3.to_string()));
    }

    let file_path: PathBuf = settings.dir.join(stored_file_name(&originalname));
    let mut file = File::create(&file_path).await?;

    match copy_field(&mut field, &mut file, settings.max_bytes).await {
        Ok(size) => {
            debug!(path = %file_path.display(), size, "Upload written");
            Ok(NewSong {
                originalname,
                mimetype,
                size,
                file_path,
            })
        }
        Err(e) => {
            drop(file);
            if let Err(remove_err) = tokio::fs::remove_file(&file_path).await {
                warn!(
                    path = %file_path.display(),
                    error = %remove_err,
                    "Failed to remove partial upload"
                );
            }
            Err(e)
        }
    }
}

async fn copy_field(field: &mut Field<'_>, file: &mut File, max_bytes: usize) -> ApiResult<u64> {
    let mut size: u64 = 0;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        size += chunk.len() as u64;
        if size > max_bytes as u64 {
            warn!(max_bytes, "Upload exceeds size limit");
            return Err(too_large(max_bytes));
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(size)
}

fn too_large(max_bytes: usize) -> ApiError {
    ApiError::FileMissing(format!(
        "File exceeds the {} MB upload limit",
        max_bytes / (1024 * 1024)
    ))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!("Upload body exceeds request size limit");
        ApiError::FileMissing("File exceeds the upload size limit".to_string())
    } else {
        warn!(error = %err.body_text(), "Malformed multipart upload");
        ApiError::FileMissing(NO_FILE.to_string())
    }
}
