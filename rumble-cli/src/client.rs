//! Rumble API client
//!
//! Thin wrapper over `reqwest` with a per-request timeout and capped,
//! jittered exponential backoff. Only GET requests are retried; uploads and
//! regenerations are sent once.

use rand::Rng;
use reqwest::{multipart, Response, StatusCode};
use rumble_common::api::{AnalysisRecord, Combo, ErrorBody, RegenerateRequest, SongDetails, UploadAccepted};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_SERVER: &str = "http://localhost:3001";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_RETRIES: u32 = 3;

const USER_AGENT: &str = concat!("rumble-cli/", env!("CARGO_PKG_VERSION"));

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    /// Server answered with an error body
    #[error("{message} ({code}, HTTP {status})")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Error code from the server, if the failure came from one
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Backoff schedule for idempotent requests
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,
    pub base_delay: Duration,
    /// Upper bound (exclusive) of the random jitter added to each delay
    pub max_jitter: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            base_delay: Duration::from_millis(1000),
            max_jitter: Duration::from_millis(1000),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn with_retries(retries: u32) -> Self {
        Self {
            retries,
            ..Self::default()
        }
    }

    /// `min(base * 2^attempt + jitter, max_delay)` for zero-based `attempt`
    pub fn delay_for<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let exponential = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rng.gen_range(0..jitter_ms))
        };
        exponential.saturating_add(jitter).min(self.max_delay)
    }
}

/// Rumble API client
#[derive(Debug, Clone)]
pub struct RumbleClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl RumbleClient {
    pub fn new(server: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: server.trim_end_matches('/').to_string(),
            retry,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// Upload an MP3; the server starts analysis immediately
    pub async fn upload_song(&self, file: &Path) -> Result<UploadAccepted, ClientError> {
        let data = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.mp3".to_string());

        let part = multipart::Part::bytes(data)
            .file_name(file_name)
            .mime_str("audio/mpeg")
            .map_err(|e| ClientError::Parse(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let url = self.url("/songs");
        debug!(url = %url, file = %file.display(), "Uploading song");
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        decode(response).await
    }

    pub async fn get_song(&self, song_id: &str) -> Result<SongDetails, ClientError> {
        self.get_json(&format!("/songs/{}", song_id)).await
    }

    pub async fn get_analysis(&self, song_id: &str) -> Result<AnalysisRecord, ClientError> {
        self.get_json(&format!("/songs/{}/analysis", song_id)).await
    }

    pub async fn get_combos(&self, song_id: &str) -> Result<Vec<Combo>, ClientError> {
        self.get_json(&format!("/songs/{}/combos", song_id)).await
    }

    pub async fn regenerate_combos(
        &self,
        song_id: &str,
        exclude_combo_ids: Vec<String>,
    ) -> Result<Vec<Combo>, ClientError> {
        let url = self.url(&format!("/songs/{}/combos/regenerate", song_id));
        let body = RegenerateRequest { exclude_combo_ids };
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        decode(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.url(path);
        let mut attempt = 0;

        loop {
            let outcome = self.http.get(&url).send().await;
            let retryable = match &outcome {
                Ok(response) => response.status().is_server_error(),
                Err(_) => true,
            };

            if retryable && attempt < self.retry.retries {
                let delay = self.retry.delay_for(attempt, &mut rand::thread_rng());
                match &outcome {
                    Ok(response) => warn!(
                        url = %url,
                        status = response.status().as_u16(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Server error, retrying"
                    ),
                    Err(e) => warn!(
                        url = %url,
                        error = %e,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Request failed, retrying"
                    ),
                }
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let response = outcome.map_err(|e| ClientError::Network(e.to_string()))?;
            return decode(response).await;
        }
    }
}

/// Success bodies decode as `T`; anything else as the API error shape
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    Err(api_error(status, &text))
}

fn api_error(status: StatusCode, text: &str) -> ClientError {
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(body) => ClientError::Api {
            status: status.as_u16(),
            code: body.error.code,
            message: body.error.message,
        },
        Err(_) => ClientError::Api {
            status: status.as_u16(),
            code: "UNKNOWN".to_string(),
            message: if text.is_empty() {
                status.to_string()
            } else {
                text.to_string()
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_delay_grows_exponentially() {
        let policy = RetryPolicy {
            max_jitter: Duration::ZERO,
            ..RetryPolicy::default()
        };
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(policy.delay_for(0, &mut rng), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1, &mut rng), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2, &mut rng), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(3, &mut rng), Duration::from_millis(8000));
    }

    #[test]
    fn test_delay_capped() {
        let policy = RetryPolicy::default();
        let mut rng = StdRng::seed_from_u64(2);

        assert_eq!(policy.delay_for(4, &mut rng), Duration::from_secs(10));
        assert_eq!(policy.delay_for(40, &mut rng), Duration::from_secs(10));
    }

    #[test]
    fn test_jitter_within_bounds() {
        let policy = RetryPolicy::default();
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..100 {
            let delay = policy.delay_for(1, &mut rng);
            assert!(delay >= Duration::from_millis(2000));
            assert!(delay < Duration::from_millis(3000));
        }
    }

    #[test]
    fn test_api_error_decodes_body() {
        let err = api_error(
            StatusCode::NOT_FOUND,
            r#"{"error":{"message":"Song not found","code":"SONG_NOT_FOUND"}}"#,
        );
        assert_eq!(err.code(), Some("SONG_NOT_FOUND"));
        assert_eq!(err.to_string(), "Song not found (SONG_NOT_FOUND, HTTP 404)");
    }

    #[test]
    fn test_api_error_plain_text() {
        let err = api_error(StatusCode::BAD_GATEWAY, "");
        assert_eq!(err.code(), Some("UNKNOWN"));
        match err {
            ClientError::Api { status, message, .. } => {
                assert_eq!(status, 502);
                assert!(message.contains("502"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_base_url_normalised() {
        let client =
            RumbleClient::new("http://localhost:3001/", Duration::from_secs(1), RetryPolicy::default())
                .unwrap();
        assert_eq!(client.url("/songs"), "http://localhost:3001/api/v1/songs");
    }
}
