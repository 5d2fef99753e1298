//! Synchronous call driver.
//!
//! A [`CallDriver`] owns one connection and runs every call as
//! encode → frame → write → read frame → decode → correlate. The protocol
//! allows a single outstanding request, so the driver blocks on the write and
//! then on the read, and never pipelines.

use std::fmt;
use std::io::{self, Read, Write};

use bytes::BytesMut;
use capp_wire::{
    Request, RequestPayload, Response, SequenceCounter, SequenceNumber, WireError, correlate,
    read_frame_with_limit,
};
use tracing::{debug, trace, warn};

use crate::config::DEFAULT_MAX_FRAME_BODY;
use crate::error::{ClientError, ClientResult};

/// Progress of the most recent call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// No call has been made yet.
    Idle,
    /// Building and encoding the request.
    Encoding,
    /// Request frame written to the transport.
    Sent,
    /// Waiting for the response frame.
    AwaitingResponse,
    /// Decoding the response body.
    Decoding,
    /// Response matched to the request.
    Correlated,
    /// Call completed; ready for the next one.
    Done,
    /// A call failed locally. Absorbing: the connection is unusable.
    Errored,
}

/// Drives request/response calls over an exclusively owned transport.
pub struct CallDriver<T> {
    transport: T,
    sequence: SequenceCounter,
    state: CallState,
    last_acked: SequenceNumber,
    max_frame_body: u32,
}

impl<T: Read + Write> CallDriver<T> {
    /// Creates a driver with the default response size limit.
    pub fn new(transport: T) -> Self {
        Self::with_max_frame_body(transport, DEFAULT_MAX_FRAME_BODY)
    }

    /// Creates a driver that rejects response bodies above `max_frame_body`.
    pub fn with_max_frame_body(transport: T, max_frame_body: u32) -> Self {
        Self {
            transport,
            sequence: SequenceCounter::new(),
            state: CallState::Idle,
            last_acked: SequenceNumber::default(),
            max_frame_body,
        }
    }

    /// Sends one request and returns the correlated response.
    ///
    /// A response carrying a protocol error is returned as `Ok`; inspect
    /// [`Response::status`]. Any `Err` leaves the driver in
    /// [`CallState::Errored`] and later calls fail with
    /// [`ClientError::ConnectionBroken`].
    pub fn call(&mut self, payload: RequestPayload) -> ClientResult<Response> {
        if self.state == CallState::Errored {
            return Err(ClientError::ConnectionBroken);
        }

        match self.run(payload) {
            Ok(response) => {
                self.state = CallState::Done;
                Ok(response)
            }
            Err(e) => {
                warn!(error = %e, state = ?self.state, "call failed, connection unusable");
                self.state = CallState::Errored;
                Err(e)
            }
        }
    }

    fn run(&mut self, payload: RequestPayload) -> ClientResult<Response> {
        self.state = CallState::Encoding;
        let request = Request::new(self.sequence.next_sequence_number(), payload);
        let frame = request.to_frame()?;
        let mut write_buf = BytesMut::with_capacity(frame.total_size());
        frame.encode(&mut write_buf);

        self.transport
            .write_all(&write_buf)
            .and_then(|()| self.transport.flush())
            .map_err(ClientError::TransportWriteFailed)?;
        self.state = CallState::Sent;
        debug!(
            seq = %request.sequence_number,
            kind = %request.kind(),
            bytes = write_buf.len(),
            "request sent"
        );

        self.state = CallState::AwaitingResponse;
        let body = read_frame_with_limit(&mut self.transport, self.max_frame_body).map_err(
            |e| match e {
                WireError::Io(io) => ClientError::TransportReadFailed(io),
                // Peer hung up before the whole response arrived.
                WireError::IncompleteFrame { needed, available } => {
                    ClientError::TransportReadFailed(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("connection closed after {available} of {needed} frame bytes"),
                    ))
                }
                other => ClientError::Wire(other),
            },
        )?;
        trace!(bytes = body.len(), "response frame read");

        self.state = CallState::Decoding;
        let response = Response::decode(&body)?;

        correlate(&request, &response)?;
        self.state = CallState::Correlated;
        self.last_acked = response.sequence_number;
        debug!(
            seq = %response.sequence_number,
            status = ?response.status(),
            "response received"
        );

        Ok(response)
    }
}

impl<T> CallDriver<T> {
    /// Returns the state of the most recent call.
    pub fn state(&self) -> CallState {
        self.state
    }

    /// Returns true if an earlier failure made the connection unusable.
    pub fn is_broken(&self) -> bool {
        self.state == CallState::Errored
    }

    /// Sequence number of the last response received, 0 before any.
    pub fn last_acked(&self) -> SequenceNumber {
        self.last_acked
    }

    /// Sequence number the next call will use.
    pub fn next_sequence_number(&self) -> SequenceNumber {
        self.sequence.peek()
    }

    /// Returns a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns a mutable reference to the transport.
    ///
    /// Writing to or reading from it directly desynchronizes frame boundaries.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consumes the driver, returning the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }
}

impl<T> fmt::Debug for CallDriver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallDriver")
            .field("state", &self.state)
            .field("next_sequence_number", &self.sequence.peek())
            .field("last_acked", &self.last_acked)
            .finish_non_exhaustive()
    }
}
