//! Error types for WEIR
//!
//! Only construction and decoding can fail. Unknown entities or clients
//! are never errors; queries over them resolve to empty results.

use thiserror::Error;

/// Core WEIR errors
#[derive(Error, Debug)]
pub enum WeirError {
    // Filter errors
    #[error("invalid filter field {0:?}: expected \"value\" or \"timestamp\"")]
    InvalidFilterField(String),

    #[error("malformed filter: {0}")]
    MalformedFilter(String),

    // Wire errors
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("unknown request type: {0}")]
    UnknownRequestType(String),

    #[error("unknown request command: {0}")]
    UnknownRequestCommand(String),

    #[error("malformed payload for {command}: {reason}")]
    MalformedPayload { command: String, reason: String },

    // Transport errors
    #[error("transport error: {0}")]
    TransportError(String),
}

/// Result type for WEIR operations
pub type WeirResult<T> = Result<T, WeirError>;
