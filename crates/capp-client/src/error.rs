//! Client error types.

use capp_wire::{
    CorrelationError, ErrorCode, RequestKind, ResponsePayload, SequenceNumber, WireError,
};
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur during client operations.
///
/// Variants for which [`ClientError::is_fatal`] returns true mean the
/// connection is no longer usable and must be replaced. The others describe
/// a single failed call on a healthy connection.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Could not establish or configure the connection.
    #[error("connection error: {0}")]
    Connect(#[source] std::io::Error),

    /// Writing the request frame failed.
    #[error("transport write failed: {0}")]
    TransportWriteFailed(#[source] std::io::Error),

    /// Reading the response frame failed.
    #[error("transport read failed: {0}")]
    TransportReadFailed(#[source] std::io::Error),

    /// Framing or message encoding error.
    #[error("wire protocol error: {0}")]
    Wire(#[from] WireError),

    /// Response sequence number does not match the request in flight.
    #[error("response sequence number {received} does not match request {expected}")]
    SequenceMismatch {
        expected: SequenceNumber,
        received: SequenceNumber,
    },

    /// An earlier call failed and left the connection unusable.
    #[error("connection broken by an earlier failure")]
    ConnectionBroken,

    /// Service rejected the request.
    #[error("server error ({code:?}): {message}")]
    Server { code: ErrorCode, message: String },

    /// Operation needs a session but none is established.
    #[error("not connected to server")]
    NotConnected,

    /// Service answered with a success payload of another kind.
    #[error("unexpected response type: expected {expected}, got {actual}")]
    UnexpectedResponse {
        expected: RequestKind,
        actual: RequestKind,
    },
}

impl ClientError {
    /// Creates a server error from an error code and message.
    pub fn server(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Server {
            code,
            message: message.into(),
        }
    }

    /// Maps a response payload that does not answer an `expected` request.
    ///
    /// Only the kind of a success payload is kept. An error payload becomes
    /// [`ClientError::Server`].
    pub(crate) fn unexpected(expected: RequestKind, actual: ResponsePayload) -> Self {
        match actual {
            ResponsePayload::Error(e) => Self::server(e.code, e.message),
            other => Self::UnexpectedResponse {
                expected,
                // Every non-error payload has a kind.
                actual: other.kind().unwrap_or(expected),
            },
        }
    }

    /// Returns true if the connection must be discarded.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ClientError::Connect(_)
                | ClientError::TransportWriteFailed(_)
                | ClientError::TransportReadFailed(_)
                | ClientError::Wire(_)
                | ClientError::SequenceMismatch { .. }
                | ClientError::ConnectionBroken
        )
    }

    /// Returns true if the service asked the caller to retry later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Server { code, .. } if code.is_retryable())
    }
}

impl From<CorrelationError> for ClientError {
    fn from(e: CorrelationError) -> Self {
        match e {
            CorrelationError::SequenceMismatch { expected, received } => {
                ClientError::SequenceMismatch { expected, received }
            }
        }
    }
}
