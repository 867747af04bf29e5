//! HTTP API handlers for rumble-api
//!
//! Thin translation between the services and JSON over HTTP. Handlers check
//! preconditions (song exists, analysis completed) and pick status codes;
//! all domain logic lives in [`crate::services`].

pub mod analysis;
pub mod combos;
pub mod health;
pub mod rate_limit;
pub mod songs;

pub use analysis::get_analysis_status;
pub use combos::{get_combos, regenerate_combos};
pub use health::health_routes;
pub use rate_limit::{api_rate_limit, upload_rate_limit, RateLimiters};
pub use songs::{get_song, upload_song};
