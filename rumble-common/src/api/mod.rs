//! Shared API types
//!
//! Request/response bodies exchanged between `rumble-api` and its clients.

pub mod types;

pub use types::{
    AnalysisRecord, AnalysisStatus, Combo, EnergyLevel, EnergySegment, ErrorBody, ErrorDetail,
    Punch, RegenerateRequest, SongDetails, UploadAccepted,
};
