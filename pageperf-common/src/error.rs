//! Common error types for pageperf

use thiserror::Error;

/// Common result type for pageperf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the pageperf crates
#[derive(Error, Debug)]
pub enum Error {
    /// A caller-side contract was violated: empty or non-numeric samples,
    /// values that are not alike, or results recorded out of order
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration could not be parsed
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Shorthand for building a [`Error::Precondition`]
    pub fn precondition(msg: impl Into<String>) -> Self {
        Error::Precondition(msg.into())
    }
}
