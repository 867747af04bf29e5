//! # Rumble Common Library
//!
//! Shared code for the Rumble API server and terminal client:
//! - Wire types (songs, analysis records, energy segments, combos)
//! - Event types and the in-process event bus
//! - Configuration loading
//! - Time and identifier helpers

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
