//! rumble-cli library interface
//!
//! HTTP client for the Rumble API and terminal rendering of its responses.

pub mod client;
pub mod render;

pub use client::{ClientError, RetryPolicy, RumbleClient};
