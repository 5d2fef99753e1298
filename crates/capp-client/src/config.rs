//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default maximum response body accepted from the service (16 MiB).
pub const DEFAULT_MAX_FRAME_BODY: u32 = 16 * 1024 * 1024;

/// Configuration for the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Read timeout. A timed-out read breaks the connection.
    pub read_timeout: Option<Duration>,
    /// Write timeout. A timed-out write breaks the connection.
    pub write_timeout: Option<Duration>,
    /// Largest response body the client will allocate for.
    pub max_frame_body: u32,
    /// Disable Nagle's algorithm on TCP connections.
    pub nodelay: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            read_timeout: Some(Duration::from_secs(30)),
            write_timeout: Some(Duration::from_secs(30)),
            max_frame_body: DEFAULT_MAX_FRAME_BODY,
            nodelay: true,
        }
    }
}

impl ClientConfig {
    /// Sets the read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Disables the read timeout (reads block indefinitely).
    pub fn without_read_timeout(mut self) -> Self {
        self.read_timeout = None;
        self
    }

    /// Sets the write timeout.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    /// Disables the write timeout.
    pub fn without_write_timeout(mut self) -> Self {
        self.write_timeout = None;
        self
    }

    /// Sets the maximum response body size.
    pub fn with_max_frame_body(mut self, size: u32) -> Self {
        self.max_frame_body = size;
        self
    }

    /// Enables or disables `TCP_NODELAY`.
    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }
}
