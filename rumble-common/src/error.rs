//! Common error types for Rumble

use thiserror::Error;

/// Common result type for Rumble operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the server and client
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid value for a domain type (energy level, punch index)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
