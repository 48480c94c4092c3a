//! Error types for card model operations.

use thiserror::Error;

/// Result type for card model operations.
pub type CardResult<T> = Result<T, CardError>;

/// Errors that can occur in card model operations.
#[derive(Debug, Error)]
pub enum CardError {
    /// A person record could not be parsed.
    #[error("Invalid person record: {0}")]
    InvalidPerson(String),

    /// Configuration value is out of range or malformed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading a configuration or record file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The QR endpoint URL could not be built.
    #[error("Invalid QR endpoint: {0}")]
    QrEndpoint(#[from] url::ParseError),
}
