//! rumble-api library interface
//!
//! Exposes the services, router and application state for the binary and
//! for integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod store;

pub use crate::error::{ApiError, ApiResult};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware, Router,
};
use chrono::{DateTime, Utc};
use rumble_common::{config::RumbleConfig, events::EventBus};
use std::{convert::Infallible, path::PathBuf, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::RateLimiters;
use crate::services::{
    AnalysisLifecycle, AudioAnalyzer, ComboGenerator, PlaceholderAnalyzer, SongRegistry,
};
use crate::store::MemoryStore;

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Event bus capacity
const EVENT_BUS_CAPACITY: usize = 100;

/// Where uploads go and how large they may be
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

impl UploadSettings {
    /// Request body limit for the upload route
    pub fn body_limit(&self) -> usize {
        self.max_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES)
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub songs: SongRegistry,
    pub lifecycle: AnalysisLifecycle,
    pub combos: ComboGenerator,
    /// Analysis lifecycle events
    pub event_bus: EventBus,
    pub uploads: UploadSettings,
    pub rate_limits: RateLimiters,
    pub cors_origin: HeaderValue,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Wire the services together around the given analyzer and combo generator
    pub fn new(
        config: &RumbleConfig,
        analyzer: Arc<dyn AudioAnalyzer>,
        combos: ComboGenerator,
    ) -> rumble_common::Result<Self> {
        config.validate()?;

        let cors_origin = HeaderValue::from_str(&config.cors_origin).map_err(|e| {
            rumble_common::Error::Config(format!("invalid cors_origin {:?}: {}", config.cors_origin, e))
        })?;

        let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
        let songs = SongRegistry::new(MemoryStore::new());
        let lifecycle = AnalysisLifecycle::new(
            songs.clone(),
            MemoryStore::new(),
            combos.clone(),
            analyzer,
            event_bus.clone(),
            config.cleanup_delay(),
        );

        Ok(Self {
            songs,
            lifecycle,
            combos,
            event_bus,
            uploads: UploadSettings {
                dir: config.upload_dir.clone(),
                max_bytes: config.max_upload_bytes,
            },
            rate_limits: RateLimiters::new(&config.rate_limit)?,
            cors_origin,
            startup_time: Utc::now(),
        })
    }

    /// Production wiring: placeholder analyzer and an entropy-seeded generator
    pub fn from_config(config: &RumbleConfig) -> rumble_common::Result<Self> {
        let analyzer = PlaceholderAnalyzer::new(config.tempo_latency(), config.energy_latency());
        Self::new(
            config,
            Arc::new(analyzer),
            ComboGenerator::from_entropy(MemoryStore::new()),
        )
    }
}

/// CORS policy for the web frontend
pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Build application router
///
/// Song routes live under `/api/v1` behind the general rate limit; uploads
/// carry their own stricter limit. `/health` is unthrottled.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let upload = post(api::upload_song)
        .layer::<_, Infallible>(middleware::from_fn_with_state(
            state.clone(),
            api::upload_rate_limit,
        ))
        .layer::<_, Infallible>(DefaultBodyLimit::max(state.uploads.body_limit()));

    let songs = Router::new()
        .route("/songs", upload)
        .route("/songs/:song_id", get(api::get_song))
        .route("/songs/:song_id/analysis", get(api::get_analysis_status))
        .route("/songs/:song_id/combos", get(api::get_combos))
        .route("/songs/:song_id/combos/regenerate", post(api::regenerate_combos))
        .layer(middleware::from_fn_with_state(state.clone(), api::api_rate_limit));

    Router::new()
        .nest("/api/v1", songs)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(state.cors_origin.clone()))
        .with_state(state)
}
