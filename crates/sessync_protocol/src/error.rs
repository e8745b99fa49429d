//! Error types for protocol decoding.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while decoding remote payloads.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Body is not valid JSON or does not match the expected shape.
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Structurally valid JSON with unexpected content.
    #[error("invalid structure: {0}")]
    InvalidStructure(String),
}

impl ProtocolError {
    /// Creates an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure(message.into())
    }
}
