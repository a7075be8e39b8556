//! Protocol error types

use thiserror::Error;

/// Errors that can occur while framing or parsing daemon messages
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Request line is not part of the request vocabulary
    #[error("Unknown request: {0}")]
    UnknownRequest(String),

    /// Response line could not be understood
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Endpoint string is not a valid `address:port`
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Frame exceeds the configured maximum length
    #[error("Frame too long: exceeds maximum of {max} bytes")]
    FrameTooLong { max: usize },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
