//! Error types for the vitalog_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for vitalog_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No challenge registered under the given id
    #[error("Unknown challenge: {0}")]
    NotFound(String),

    /// Built-in challenges cannot be deleted
    #[error("Challenge '{0}' is built-in and cannot be deleted")]
    ProtectedChallenge(String),

    /// A different challenge is already active
    #[error("Challenge '{0}' is already active; leave it before joining another")]
    ChallengeActive(String),

    /// Challenge validation error
    #[error("Challenge validation error: {0}")]
    ChallengeValidation(String),

    /// State management error
    #[error("State error: {0}")]
    State(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
