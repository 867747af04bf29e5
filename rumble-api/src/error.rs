//! Error types for rumble-api
//!
//! Client-correctable failures (not found, precondition, bad upload, rate
//! limit) map to 4xx with a stable error code. Everything else is a 500
//! whose detail is logged, not returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rumble_common::api::ErrorBody;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown song id (404)
    #[error("Song not found")]
    SongNotFound,

    /// Song exists but has no analysis record (404)
    #[error("Analysis not found")]
    AnalysisNotFound,

    /// Combos requested before analysis completed (400)
    #[error("Analysis not completed")]
    AnalysisNotCompleted,

    /// Upload missing, not an MP3, oversize or malformed (400)
    #[error("{0}")]
    FileMissing(String),

    /// General API quota exhausted (429)
    #[error("Too many requests, please try again later.")]
    RateLimited,

    /// Upload quota exhausted (429)
    #[error("Too many upload requests, please try again later.")]
    UploadRateLimited,

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error (500)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::SongNotFound | ApiError::AnalysisNotFound => StatusCode::NOT_FOUND,
            ApiError::AnalysisNotCompleted | ApiError::FileMissing(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited | ApiError::UploadRateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::SongNotFound => "SONG_NOT_FOUND",
            ApiError::AnalysisNotFound => "ANALYSIS_NOT_FOUND",
            ApiError::AnalysisNotCompleted => "ANALYSIS_NOT_COMPLETED",
            ApiError::FileMissing(_) => "FILE_MISSING",
            ApiError::RateLimited => "RATE_LIMIT_EXCEEDED",
            ApiError::UploadRateLimited => "UPLOAD_LIMIT_EXCEEDED",
            ApiError::Internal(_) | ApiError::Io(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody::new(self.code(), message))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let (status, body) = render(ApiError::SongNotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "SONG_NOT_FOUND");
        assert_eq!(body["error"]["message"], "Song not found");
    }

    #[tokio::test]
    async fn test_precondition_and_validation_are_400() {
        let (status, body) = render(ApiError::AnalysisNotCompleted).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "ANALYSIS_NOT_COMPLETED");

        let (status, body) = render(ApiError::FileMissing("Only MP3 files are allowed".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "FILE_MISSING");
        assert_eq!(body["error"]["message"], "Only MP3 files are allowed");
    }

    #[tokio::test]
    async fn test_rate_limits_are_429() {
        let (status, body) = render(ApiError::UploadRateLimited).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "UPLOAD_LIMIT_EXCEEDED");
        assert_eq!(ApiError::RateLimited.code(), "RATE_LIMIT_EXCEEDED");
    }

    #[tokio::test]
    async fn test_internal_detail_not_leaked() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "/secret/path");
        let (status, body) = render(ApiError::from(io)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "INTERNAL_SERVER_ERROR");
        assert_eq!(body["error"]["message"], "Internal Server Error");
    }
}
