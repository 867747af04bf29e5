//! Domain services
//!
//! - [`SongRegistry`]: uploaded-file metadata
//! - [`AnalysisLifecycle`]: pending → processing → completed/failed driver
//! - [`ComboGenerator`]: punch combos timed to energy segments
//! - [`AudioAnalyzer`]: tempo and energy detection seam

pub mod analysis_lifecycle;
pub mod audio_analyzer;
pub mod combo_generator;
pub mod song_registry;

pub use analysis_lifecycle::{AnalysisHandle, AnalysisLifecycle};
pub use audio_analyzer::{AudioAnalyzer, EnergyEstimate, PlaceholderAnalyzer, TempoEstimate};
pub use combo_generator::{generate_combo, ComboGenerator, MAX_INITIAL_COMBOS};
pub use song_registry::{NewSong, Song, SongRegistry};
