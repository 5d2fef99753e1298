//! # capp-client: Client for the `capp` stream-append service
//!
//! This crate provides a synchronous client that talks to the service using
//! the binary wire protocol defined in `capp-wire`.
//!
//! Two layers are exposed:
//!
//! - [`CallDriver`]: sends any [`RequestPayload`] and returns the correlated
//!   [`Response`]. Protocol errors are returned as data.
//! - [`Client`]: one method per operation over TCP, mapping protocol errors
//!   to [`ClientError::Server`].
//!
//! ## Usage
//!
//! ```ignore
//! use capp_client::{Client, ClientConfig};
//!
//! let mut client = Client::connect("127.0.0.1:7000", ClientConfig::default())?;
//!
//! let stream_id = client.open_stream("/data/events.log")?;
//! client.append(stream_id, b"event1".to_vec())?;
//! client.heartbeat()?;
//!
//! match client.flush(stream_id) {
//!     Err(e) if e.is_retryable() => { /* back off and try again */ }
//!     other => other?,
//! }
//! ```
//!
//! ## Configuration
//!
//! ```ignore
//! use capp_client::ClientConfig;
//! use std::time::Duration;
//!
//! let config = ClientConfig::default()
//!     .with_read_timeout(Duration::from_secs(60))
//!     .with_max_frame_body(4 * 1024 * 1024);
//! ```

mod client;
mod config;
mod driver;
mod error;

pub use client::Client;
pub use config::{ClientConfig, DEFAULT_MAX_FRAME_BODY};
pub use driver::{CallDriver, CallState};
pub use error::{ClientError, ClientResult};

// Re-export useful types from dependencies
pub use capp_wire::{
    ClientId, ErrorCode, RequestKind, RequestPayload, Response, ResponsePayload, SequenceNumber,
    Status, StreamId,
};
