//! Request and response message types for the wire protocol.
//!
//! Messages are serialized using bincode (big-endian, fixed-width integers)
//! and carried as the body of a [`Frame`].

use std::fmt::Display;

use bincode::Options;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{WireError, WireResult};
use crate::frame::{Frame, MAX_BODY_SIZE};
use crate::types::{ClientId, SequenceNumber, StreamId};

/// Bincode configuration shared by every message body.
fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_big_endian()
        .with_fixint_encoding()
}

fn encode_body<T: Serialize>(value: &T) -> WireResult<Vec<u8>> {
    wire_options()
        .serialize(value)
        .map_err(|e| WireError::Serialization(e.to_string()))
}

fn decode_body<'a, T: Deserialize<'a>>(body: &'a [u8]) -> WireResult<T> {
    wire_options()
        .with_limit(u64::from(MAX_BODY_SIZE))
        .deserialize(body)
        .map_err(WireError::from)
}

// ============================================================================
// Kinds
// ============================================================================

/// The operation a request or response pertains to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Connect,
    Disconnect,
    OpenStream,
    AppendStream,
    FlushStream,
    CloseStream,
    Heartbeat,
    Reconnect,
}

impl RequestKind {
    /// Every kind, in wire tag order.
    pub const ALL: [RequestKind; 8] = [
        RequestKind::Connect,
        RequestKind::Disconnect,
        RequestKind::OpenStream,
        RequestKind::AppendStream,
        RequestKind::FlushStream,
        RequestKind::CloseStream,
        RequestKind::Heartbeat,
        RequestKind::Reconnect,
    ];

    /// Returns the service's short operation code for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Connect => "connect",
            RequestKind::Disconnect => "disconnect",
            RequestKind::OpenStream => "openstrm",
            RequestKind::AppendStream => "appendstrm",
            RequestKind::FlushStream => "flushstrm",
            RequestKind::CloseStream => "closestrm",
            RequestKind::Heartbeat => "heartbeat",
            RequestKind::Reconnect => "reconnect",
        }
    }
}

impl Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Request Types
// ============================================================================

/// A client request to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Sequence number echoed back by the matching response.
    pub sequence_number: SequenceNumber,
    /// The request payload. Its variant determines the request kind.
    pub payload: RequestPayload,
}

impl Request {
    /// Creates a new request.
    pub fn new(sequence_number: SequenceNumber, payload: RequestPayload) -> Self {
        Self {
            sequence_number,
            payload,
        }
    }

    /// Returns the kind of this request.
    pub fn kind(&self) -> RequestKind {
        self.payload.kind()
    }

    /// Encodes the request body.
    pub fn encode(&self) -> WireResult<Vec<u8>> {
        encode_body(self)
    }

    /// Decodes a request body.
    pub fn decode(body: &[u8]) -> WireResult<Self> {
        decode_body(body)
    }

    /// Encodes the request to a frame.
    pub fn to_frame(&self) -> WireResult<Frame> {
        Frame::new(Bytes::from(self.encode()?))
    }

    /// Decodes a request from a frame.
    pub fn from_frame(frame: &Frame) -> WireResult<Self> {
        Self::decode(frame.body())
    }
}

/// Request payload variants, one per [`RequestKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestPayload {
    /// Open a new client session.
    Connect(ConnectRequest),
    /// End a client session.
    Disconnect(DisconnectRequest),
    /// Open a stream backed by a file.
    OpenStream(OpenStreamRequest),
    /// Append bytes to an open stream.
    AppendStream(AppendStreamRequest),
    /// Flush buffered appends of a stream.
    FlushStream(FlushStreamRequest),
    /// Close an open stream.
    CloseStream(CloseStreamRequest),
    /// Keep the session alive and acknowledge responses.
    Heartbeat(HeartbeatRequest),
    /// Resume an existing session on a new connection.
    Reconnect(ReconnectRequest),
}

impl RequestPayload {
    /// Returns the kind this payload belongs to.
    pub fn kind(&self) -> RequestKind {
        match self {
            RequestPayload::Connect(_) => RequestKind::Connect,
            RequestPayload::Disconnect(_) => RequestKind::Disconnect,
            RequestPayload::OpenStream(_) => RequestKind::OpenStream,
            RequestPayload::AppendStream(_) => RequestKind::AppendStream,
            RequestPayload::FlushStream(_) => RequestKind::FlushStream,
            RequestPayload::CloseStream(_) => RequestKind::CloseStream,
            RequestPayload::Heartbeat(_) => RequestKind::Heartbeat,
            RequestPayload::Reconnect(_) => RequestKind::Reconnect,
        }
    }
}

/// Connect request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRequest {}

/// Disconnect request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectRequest {
    pub client_id: ClientId,
}

/// Open stream request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenStreamRequest {
    pub client_id: ClientId,
    /// Path of the file backing the stream, as seen by the service.
    pub filepath: String,
}

/// Append stream request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendStreamRequest {
    pub client_id: ClientId,
    pub stream_id: StreamId,
    /// Bytes to append. May be empty.
    pub data: Vec<u8>,
}

/// Flush stream request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushStreamRequest {
    pub client_id: ClientId,
    pub stream_id: StreamId,
}

/// Close stream request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseStreamRequest {
    pub client_id: ClientId,
    pub stream_id: StreamId,
}

/// Heartbeat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub client_id: ClientId,
    /// Highest sequence number whose response the client has received.
    pub acked_sequence_number: SequenceNumber,
}

/// Reconnect request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectRequest {
    pub client_id: ClientId,
}

// ============================================================================
// Response Types
// ============================================================================

/// Whether a response reports success or a protocol error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    Error,
}

/// A service response to a client request.
///
/// The status is not stored: it follows from whether the payload is the
/// [`ResponsePayload::Error`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Sequence number of the request this responds to.
    pub sequence_number: SequenceNumber,
    /// The response payload.
    pub payload: ResponsePayload,
}

impl Response {
    /// Creates a new response.
    pub fn new(sequence_number: SequenceNumber, payload: ResponsePayload) -> Self {
        Self {
            sequence_number,
            payload,
        }
    }

    /// Creates an error response.
    pub fn error(
        sequence_number: SequenceNumber,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            sequence_number,
            payload: ResponsePayload::Error(ErrorResponse {
                code,
                message: message.into(),
            }),
        }
    }

    /// Returns the response status.
    pub fn status(&self) -> Status {
        match self.payload {
            ResponsePayload::Error(_) => Status::Error,
            _ => Status::Ok,
        }
    }

    /// Returns true if the request succeeded.
    pub fn is_ok(&self) -> bool {
        self.status() == Status::Ok
    }

    /// Returns the kind of a success response, `None` for an error response.
    pub fn kind(&self) -> Option<RequestKind> {
        self.payload.kind()
    }

    /// Encodes the response body.
    pub fn encode(&self) -> WireResult<Vec<u8>> {
        encode_body(self)
    }

    /// Decodes a response body.
    pub fn decode(body: &[u8]) -> WireResult<Self> {
        decode_body(body)
    }

    /// Encodes the response to a frame.
    pub fn to_frame(&self) -> WireResult<Frame> {
        Frame::new(Bytes::from(self.encode()?))
    }

    /// Decodes a response from a frame.
    pub fn from_frame(frame: &Frame) -> WireResult<Self> {
        Self::decode(frame.body())
    }
}

/// Response payload variants: one success shape per kind, plus `Error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponsePayload {
    Connect(ConnectResponse),
    Disconnect(DisconnectResponse),
    OpenStream(OpenStreamResponse),
    AppendStream(AppendStreamResponse),
    FlushStream(FlushStreamResponse),
    CloseStream(CloseStreamResponse),
    Heartbeat(HeartbeatResponse),
    Reconnect(ReconnectResponse),
    /// The service rejected the request.
    Error(ErrorResponse),
}

impl ResponsePayload {
    /// Returns the kind of a success payload, `None` for `Error`.
    pub fn kind(&self) -> Option<RequestKind> {
        match self {
            ResponsePayload::Connect(_) => Some(RequestKind::Connect),
            ResponsePayload::Disconnect(_) => Some(RequestKind::Disconnect),
            ResponsePayload::OpenStream(_) => Some(RequestKind::OpenStream),
            ResponsePayload::AppendStream(_) => Some(RequestKind::AppendStream),
            ResponsePayload::FlushStream(_) => Some(RequestKind::FlushStream),
            ResponsePayload::CloseStream(_) => Some(RequestKind::CloseStream),
            ResponsePayload::Heartbeat(_) => Some(RequestKind::Heartbeat),
            ResponsePayload::Reconnect(_) => Some(RequestKind::Reconnect),
            ResponsePayload::Error(_) => None,
        }
    }
}

/// Connect response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectResponse {
    /// Session identifier assigned by the service.
    pub client_id: ClientId,
}

/// Disconnect response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectResponse {}

/// Open stream response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenStreamResponse {
    /// The opened stream.
    pub stream_id: StreamId,
}

/// Append stream response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendStreamResponse {}

/// Flush stream response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushStreamResponse {}

/// Close stream response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseStreamResponse {}

/// Heartbeat response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatResponse {}

/// Reconnect response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectResponse {}

/// Error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
}

/// Error codes carried by error responses.
///
/// The numeric values are part of the wire format and are encoded
/// explicitly, independent of declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
#[repr(u32)]
pub enum ErrorCode {
    /// Unknown error.
    Unknown = 0,
    /// The request was invalid for the session's current state.
    InvalidRequest = 1,
    /// The request came too early and may be retried later.
    RetryTooSoon = 2,
}

impl ErrorCode {
    /// Returns the wire value of this code.
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Returns true if the rejected request may succeed when sent again.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorCode::RetryTooSoon)
    }
}

impl From<ErrorCode> for u32 {
    fn from(code: ErrorCode) -> Self {
        code.as_u32()
    }
}

impl TryFrom<u32> for ErrorCode {
    type Error = WireError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Unknown),
            1 => Ok(ErrorCode::InvalidRequest),
            2 => Ok(ErrorCode::RetryTooSoon),
            other => Err(WireError::UnknownErrorCode(other)),
        }
    }
}

// ============================================================================
// Free functions
// ============================================================================

/// Encodes a request body.
pub fn encode_request(request: &Request) -> WireResult<Vec<u8>> {
    request.encode()
}

/// Decodes a request body.
pub fn decode_request(body: &[u8]) -> WireResult<Request> {
    Request::decode(body)
}

/// Encodes a response body.
pub fn encode_response(response: &Response) -> WireResult<Vec<u8>> {
    response.encode()
}

/// Decodes a response body.
pub fn decode_response(body: &[u8]) -> WireResult<Response> {
    Response::decode(body)
}

#[cfg(test)]
mod message_tests {
    use super::*;

    fn seq(n: u64) -> SequenceNumber {
        SequenceNumber::new(n)
    }

    #[test]
    fn test_request_roundtrip() {
        let request = Request::new(
            seq(1),
            RequestPayload::OpenStream(OpenStreamRequest {
                client_id: ClientId::new(42),
                filepath: "/tmp/x".to_string(),
            }),
        );

        let frame = request.to_frame().unwrap();
        let decoded = Request::from_frame(&frame).unwrap();

        assert_eq!(decoded, request);
        assert_eq!(decoded.kind(), RequestKind::OpenStream);
    }

    #[test]
    fn test_response_roundtrip() {
        let response = Response::new(
            seq(1),
            ResponsePayload::OpenStream(OpenStreamResponse {
                stream_id: StreamId::new(99),
            }),
        );

        let frame = response.to_frame().unwrap();
        let decoded = Response::from_frame(&frame).unwrap();

        assert_eq!(decoded, response);
        assert_eq!(decoded.status(), Status::Ok);
        assert_eq!(decoded.kind(), Some(RequestKind::OpenStream));
    }

    #[test]
    fn test_error_response() {
        let response = Response::error(seq(1), ErrorCode::InvalidRequest, "stream 123 not open");

        let frame = response.to_frame().unwrap();
        let decoded = Response::from_frame(&frame).unwrap();

        assert_eq!(decoded.status(), Status::Error);
        assert!(!decoded.is_ok());
        assert_eq!(decoded.kind(), None);
        if let ResponsePayload::Error(err) = decoded.payload {
            assert_eq!(err.code, ErrorCode::InvalidRequest);
            assert_eq!(err.message, "stream 123 not open");
        } else {
            panic!("expected error payload");
        }
    }

    #[test]
    fn test_error_response_layout() {
        let body = Response::error(seq(1), ErrorCode::RetryTooSoon, "")
            .encode()
            .unwrap();

        #[rustfmt::skip]
        let expected: [u8; 24] = [
            0, 0, 0, 0, 0, 0, 0, 1, // sequence number
            0, 0, 0, 8,             // Error variant
            0, 0, 0, 2,             // RetryTooSoon
            0, 0, 0, 0, 0, 0, 0, 0, // empty message
        ];
        assert_eq!(body, expected);
    }

    #[test]
    fn test_error_code_wire_values() {
        for (code, value) in [
            (ErrorCode::Unknown, 0u32),
            (ErrorCode::InvalidRequest, 1),
            (ErrorCode::RetryTooSoon, 2),
        ] {
            assert_eq!(code.as_u32(), value);
            assert_eq!(ErrorCode::try_from(value).unwrap(), code);
            assert_eq!(encode_body(&code).unwrap(), value.to_be_bytes());
            assert_eq!(decode_body::<ErrorCode>(&value.to_be_bytes()).unwrap(), code);
        }
        assert!(matches!(
            ErrorCode::try_from(3),
            Err(WireError::UnknownErrorCode(3))
        ));
    }

    #[test]
    fn test_only_retry_too_soon_is_retryable() {
        assert!(ErrorCode::RetryTooSoon.is_retryable());
        assert!(!ErrorCode::InvalidRequest.is_retryable());
        assert!(!ErrorCode::Unknown.is_retryable());
    }

    #[test]
    fn test_kind_codes() {
        let codes: Vec<&str> = RequestKind::ALL.iter().map(RequestKind::as_str).collect();
        assert_eq!(
            codes,
            [
                "connect",
                "disconnect",
                "openstrm",
                "appendstrm",
                "flushstrm",
                "closestrm",
                "heartbeat",
                "reconnect"
            ]
        );
        assert_eq!(RequestKind::AppendStream.to_string(), "appendstrm");
    }
}
