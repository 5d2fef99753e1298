//! # capp-wire: Binary wire protocol for `capp`
//!
//! This crate defines the binary wire protocol spoken between a `capp`
//! client and the stream-append service.
//!
//! ## Frame Format
//!
//! ```text
//! ┌──────────┬──────────────────────────────┐
//! │ Length   │            Body              │
//! │ (4 B)    │        (Length - 4)          │
//! └──────────┴──────────────────────────────┘
//! ```
//!
//! - **Length**: Big-endian `u32`, counts itself plus the body (always >= 4)
//! - **Body**: Bincode-encoded [`Request`] or [`Response`]
//!
//! ## Message Types
//!
//! Every operation ([`RequestKind`]) has exactly one request payload and one
//! success response payload. A rejected request is answered with the
//! [`ResponsePayload::Error`] payload, which carries an [`ErrorCode`] and is
//! returned as data rather than raised as a local error.
//!
//! ## Correlation
//!
//! Each request carries a [`SequenceNumber`] assigned by the caller through a
//! [`SequenceCounter`]. The response echoes it back and [`correlate`] checks
//! that the two match.

mod error;
mod frame;
mod message;
mod sequence;
mod types;

pub use error::{WireError, WireResult};
pub use frame::{
    FRAME_HEADER_SIZE, Frame, FrameDecoder, MAX_BODY_SIZE, encode_frame, read_frame,
    read_frame_with_limit, write_frame,
};
pub use message::{
    AppendStreamRequest, AppendStreamResponse, CloseStreamRequest, CloseStreamResponse,
    ConnectRequest, ConnectResponse, DisconnectRequest, DisconnectResponse, ErrorCode,
    ErrorResponse, FlushStreamRequest, FlushStreamResponse, HeartbeatRequest, HeartbeatResponse,
    OpenStreamRequest, OpenStreamResponse, ReconnectRequest, ReconnectResponse, Request,
    RequestKind, RequestPayload, Response, ResponsePayload, Status, decode_request,
    decode_response, encode_request, encode_response,
};
pub use sequence::{CorrelationError, SequenceCounter, correlate};
pub use types::{ClientId, SequenceNumber, StreamId};
