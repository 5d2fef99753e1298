//! Frame encoding and decoding for the wire protocol.
//!
//! A frame is a big-endian `u32` length followed by the message body. The
//! length counts the 4 header bytes too, so it is never smaller than 4.

use std::io::{self, Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{WireError, WireResult};

/// Frame header size in bytes (the length prefix).
pub const FRAME_HEADER_SIZE: usize = 4;

/// Largest body a frame can carry: the length prefix must still fit in a `u32`.
pub const MAX_BODY_SIZE: u32 = u32::MAX - FRAME_HEADER_SIZE as u32;

/// A complete frame holding one encoded message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Body bytes (an encoded request or response).
    body: Bytes,
}

impl Frame {
    /// Creates a frame around a body.
    ///
    /// Fails with [`WireError::PayloadTooLarge`] if the length prefix would
    /// overflow.
    pub fn new(body: Bytes) -> WireResult<Self> {
        check_body_size(body.len(), MAX_BODY_SIZE)?;
        Ok(Self { body })
    }

    /// Returns the body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consumes the frame, returning its body.
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Returns the value written in the length prefix.
    pub fn length(&self) -> u32 {
        // Bounded by `check_body_size` in `new`.
        (self.body.len() + FRAME_HEADER_SIZE) as u32
    }

    /// Encodes the frame to a byte buffer.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(self.total_size());
        buf.put_u32(self.length());
        buf.put_slice(&self.body);
    }

    /// Encodes the frame to a new byte buffer.
    pub fn encode_to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.total_size());
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Returns the total size of the frame in bytes.
    pub fn total_size(&self) -> usize {
        FRAME_HEADER_SIZE + self.body.len()
    }
}

/// Wraps a body into a length-prefixed frame.
pub fn encode_frame(body: &[u8]) -> WireResult<Bytes> {
    let length = check_body_size(body.len(), MAX_BODY_SIZE)? + FRAME_HEADER_SIZE as u32;

    let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + body.len());
    buf.put_u32(length);
    buf.put_slice(body);
    Ok(buf.freeze())
}

/// Frames `body` and writes it to `sink`, flushing afterwards.
pub fn write_frame<W: Write>(sink: &mut W, body: &[u8]) -> WireResult<()> {
    let frame = encode_frame(body)?;
    sink.write_all(&frame)?;
    sink.flush()?;
    Ok(())
}

/// Reads exactly one frame from a blocking byte stream and returns its body.
///
/// Consumes exactly the number of bytes announced by the length prefix, so
/// the next call starts on the following frame boundary.
pub fn read_frame<R: Read>(source: &mut R) -> WireResult<Bytes> {
    read_frame_with_limit(source, MAX_BODY_SIZE)
}

/// Like [`read_frame`], but rejects bodies larger than `max_body` before
/// allocating for them.
pub fn read_frame_with_limit<R: Read>(source: &mut R, max_body: u32) -> WireResult<Bytes> {
    let mut header = [0u8; FRAME_HEADER_SIZE];
    let got = read_full(source, &mut header)?;
    if got < FRAME_HEADER_SIZE {
        return Err(WireError::IncompleteFrame {
            needed: FRAME_HEADER_SIZE,
            available: got,
        });
    }

    let length = u32::from_be_bytes(header);
    let body_len = validate_length(length, max_body)?;

    let mut body = vec![0u8; body_len];
    let got = read_full(source, &mut body)?;
    if got < body_len {
        return Err(WireError::IncompleteFrame {
            needed: length as usize,
            available: FRAME_HEADER_SIZE + got,
        });
    }

    Ok(Bytes::from(body))
}

/// Incremental frame decoder for bytes that arrive in arbitrary chunks.
#[derive(Debug, Clone, Copy)]
pub struct FrameDecoder {
    max_body: u32,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Creates a decoder accepting any body that fits the length prefix.
    pub fn new() -> Self {
        Self {
            max_body: MAX_BODY_SIZE,
        }
    }

    /// Creates a decoder with a custom maximum body size.
    pub fn with_max_body(max_body: u32) -> Self {
        Self {
            max_body: max_body.min(MAX_BODY_SIZE),
        }
    }

    /// Attempts to decode a frame from a byte buffer.
    ///
    /// Returns `Ok(Some(frame))` if a complete frame was decoded.
    /// Returns `Ok(None)` if more bytes are needed.
    /// Returns `Err` if the length prefix is invalid.
    ///
    /// On success, exactly the frame's bytes are removed from the buffer.
    pub fn decode(&self, buf: &mut BytesMut) -> WireResult<Option<Frame>> {
        if buf.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        // Peek at the length without consuming
        let length = {
            let mut peek = &buf[..FRAME_HEADER_SIZE];
            peek.get_u32()
        };
        let body_len = validate_length(length, self.max_body)?;

        if buf.len() < FRAME_HEADER_SIZE + body_len {
            return Ok(None);
        }

        buf.advance(FRAME_HEADER_SIZE);
        let body = buf.split_to(body_len).freeze();

        Ok(Some(Frame { body }))
    }
}

fn check_body_size(len: usize, max: u32) -> WireResult<u32> {
    if len as u64 > u64::from(max) {
        return Err(WireError::PayloadTooLarge {
            size: len as u64,
            max: u64::from(max),
        });
    }
    Ok(len as u32)
}

/// Checks a length prefix and returns the body length it announces.
fn validate_length(length: u32, max_body: u32) -> WireResult<usize> {
    if (length as usize) < FRAME_HEADER_SIZE {
        return Err(WireError::InvalidLength(length));
    }
    let body_len = length - FRAME_HEADER_SIZE as u32;
    if body_len > max_body {
        return Err(WireError::PayloadTooLarge {
            size: u64::from(body_len),
            max: u64::from(max_body),
        });
    }
    Ok(body_len as usize)
}

/// Fills `buf` from `source`, stopping early only at end of stream.
///
/// Returns the number of bytes read.
fn read_full<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
