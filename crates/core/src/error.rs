//! Error types for durakv
//!
//! `Error` is the abort path: conditions that stop an operation before or
//! between store calls. Store-reported outcomes (conflict, not found,
//! ambiguous durability, ...) are never errors; they are values of
//! [`OperationOutcome`](crate::OperationOutcome).
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use thiserror::Error;

/// Result type alias for durakv operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the durakv client
#[derive(Debug, Error)]
pub enum Error {
    /// Caller-supplied configuration can never succeed (fatal, never retried)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The operation was cancelled between attempts
    #[error("Operation cancelled after {attempts} attempt(s)")]
    Cancelled {
        /// Attempts made before cancellation was observed
        attempts: u32,
    },

    /// The caller's deadline passed before the next attempt could start
    #[error("Deadline exceeded after {attempts} attempt(s)")]
    DeadlineExceeded {
        /// Attempts made before the deadline was observed
        attempts: u32,
    },

    /// The caller's mutate closure refused to produce a new value
    #[error("Mutation rejected: {0}")]
    Mutation(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration file could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create an `InvalidConfiguration` error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfiguration(msg.into())
    }

    /// Whether the error was raised before any store call could be made
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::InvalidConfiguration(_) | Error::Config(_))
    }

    /// Whether the error came from caller-side interruption
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Error::Cancelled { .. } | Error::DeadlineExceeded { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
