//! Wire protocol error types.

use thiserror::Error;

/// Result type for wire protocol operations.
pub type WireResult<T> = Result<T, WireError>;

/// Local errors raised while framing, encoding or decoding messages.
///
/// Every variant means the byte stream can no longer be trusted. Rejections
/// sent by the service are not errors at this layer; they arrive as
/// [`ResponsePayload::Error`](crate::ResponsePayload::Error).
#[derive(Debug, Error)]
pub enum WireError {
    /// Body exceeds the maximum frame size.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: u64, max: u64 },

    /// Length prefix smaller than the header itself.
    #[error("invalid frame length: {0} (must be at least 4)")]
    InvalidLength(u32),

    /// Stream ended before the declared frame length was available.
    #[error("incomplete frame: need {needed} bytes, have {available}")]
    IncompleteFrame { needed: usize, available: usize },

    /// Message body is not a valid encoding (unknown tag, bad string, ...).
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Message body ended before all fields of its variant were read.
    #[error("truncated message")]
    TruncatedMessage,

    /// Error code outside the closed set.
    #[error("unknown error code: {0}")]
    UnknownErrorCode(u32),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bincode::Error> for WireError {
    fn from(e: bincode::Error) -> Self {
        match *e {
            bincode::ErrorKind::Io(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                WireError::TruncatedMessage
            }
            other => WireError::MalformedMessage(other.to_string()),
        }
    }
}
