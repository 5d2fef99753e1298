//! Typed client for the stream-append service.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use capp_wire::{
    AppendStreamRequest, ClientId, CloseStreamRequest, ConnectRequest, DisconnectRequest,
    FlushStreamRequest, HeartbeatRequest, OpenStreamRequest, ReconnectRequest, RequestKind,
    RequestPayload, Response, ResponsePayload, StreamId,
};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::driver::CallDriver;
use crate::error::{ClientError, ClientResult};

/// Client for the stream-append service.
///
/// Wraps a [`CallDriver`] and offers one method per operation. Rejections
/// from the service come back as [`ClientError::Server`], which leaves the
/// connection usable; see [`ClientError::is_fatal`].
///
/// # Example
///
/// ```ignore
/// use capp_client::{Client, ClientConfig};
///
/// let mut client = Client::connect("127.0.0.1:7000", ClientConfig::default())?;
///
/// let stream_id = client.open_stream("/var/log/app.log")?;
/// client.append(stream_id, b"hello\n".to_vec())?;
/// client.flush(stream_id)?;
/// client.close_stream(stream_id)?;
/// client.disconnect()?;
/// ```
pub struct Client<T = TcpStream> {
    driver: CallDriver<T>,
    client_id: Option<ClientId>,
    config: ClientConfig,
}

impl Client<TcpStream> {
    /// Connects to the service and opens a new session.
    pub fn connect(addr: impl ToSocketAddrs, config: ClientConfig) -> ClientResult<Self> {
        let stream = open_tcp(addr, &config)?;
        let mut client = Self::with_transport(stream, config);
        client.handshake()?;
        Ok(client)
    }

    /// Connects to the service and resumes the session `client_id`.
    pub fn resume(
        addr: impl ToSocketAddrs,
        client_id: ClientId,
        config: ClientConfig,
    ) -> ClientResult<Self> {
        let stream = open_tcp(addr, &config)?;
        let mut client = Self::with_transport(stream, config);
        client.client_id = Some(client_id);
        client.reconnect()?;
        Ok(client)
    }
}

fn open_tcp(addr: impl ToSocketAddrs, config: &ClientConfig) -> ClientResult<TcpStream> {
    let stream = TcpStream::connect(addr).map_err(ClientError::Connect)?;
    stream
        .set_read_timeout(config.read_timeout)
        .map_err(ClientError::Connect)?;
    stream
        .set_write_timeout(config.write_timeout)
        .map_err(ClientError::Connect)?;
    stream
        .set_nodelay(config.nodelay)
        .map_err(ClientError::Connect)?;
    debug!(peer = ?stream.peer_addr().ok(), "tcp connection established");
    Ok(stream)
}

impl<T: Read + Write> Client<T> {
    /// Creates a client over an already established transport.
    ///
    /// No session is opened; call [`Client::handshake`] or set one up with
    /// [`Client::reconnect`] after [`Client::set_client_id`].
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        Self {
            driver: CallDriver::with_max_frame_body(transport, config.max_frame_body),
            client_id: None,
            config,
        }
    }

    /// Opens a new session and returns the identifier assigned by the service.
    pub fn handshake(&mut self) -> ClientResult<ClientId> {
        let response = self.call(RequestPayload::Connect(ConnectRequest {}))?;

        match response.payload {
            ResponsePayload::Connect(r) => {
                info!(client_id = %r.client_id, "session established");
                self.client_id = Some(r.client_id);
                Ok(r.client_id)
            }
            ResponsePayload::Error(e) => Err(ClientError::server(e.code, e.message)),
            other => Err(ClientError::unexpected(RequestKind::Connect, other)),
        }
    }

    /// Resumes the current session on this connection.
    pub fn reconnect(&mut self) -> ClientResult<()> {
        let client_id = self.require_client_id()?;
        let response = self.call(RequestPayload::Reconnect(ReconnectRequest { client_id }))?;

        match response.payload {
            ResponsePayload::Reconnect(_) => {
                info!(client_id = %client_id, "session resumed");
                Ok(())
            }
            ResponsePayload::Error(e) => Err(ClientError::server(e.code, e.message)),
            other => Err(ClientError::unexpected(RequestKind::Reconnect, other)),
        }
    }

    /// Ends the session.
    pub fn disconnect(&mut self) -> ClientResult<()> {
        let client_id = self.require_client_id()?;
        let response = self.call(RequestPayload::Disconnect(DisconnectRequest { client_id }))?;

        match response.payload {
            ResponsePayload::Disconnect(_) => {
                info!(client_id = %client_id, "session closed");
                self.client_id = None;
                Ok(())
            }
            ResponsePayload::Error(e) => Err(ClientError::server(e.code, e.message)),
            other => Err(ClientError::unexpected(RequestKind::Disconnect, other)),
        }
    }

    /// Opens a stream backed by `filepath`.
    pub fn open_stream(&mut self, filepath: &str) -> ClientResult<StreamId> {
        let client_id = self.require_client_id()?;
        let response = self.call(RequestPayload::OpenStream(OpenStreamRequest {
            client_id,
            filepath: filepath.to_string(),
        }))?;

        match response.payload {
            ResponsePayload::OpenStream(r) => Ok(r.stream_id),
            ResponsePayload::Error(e) => Err(ClientError::server(e.code, e.message)),
            other => Err(ClientError::unexpected(RequestKind::OpenStream, other)),
        }
    }

    /// Appends `data` to a stream.
    pub fn append(&mut self, stream_id: StreamId, data: impl Into<Vec<u8>>) -> ClientResult<()> {
        let client_id = self.require_client_id()?;
        let response = self.call(RequestPayload::AppendStream(AppendStreamRequest {
            client_id,
            stream_id,
            data: data.into(),
        }))?;

        match response.payload {
            ResponsePayload::AppendStream(_) => Ok(()),
            ResponsePayload::Error(e) => Err(ClientError::server(e.code, e.message)),
            other => Err(ClientError::unexpected(RequestKind::AppendStream, other)),
        }
    }

    /// Flushes buffered appends of a stream.
    pub fn flush(&mut self, stream_id: StreamId) -> ClientResult<()> {
        let client_id = self.require_client_id()?;
        let response = self.call(RequestPayload::FlushStream(FlushStreamRequest {
            client_id,
            stream_id,
        }))?;

        match response.payload {
            ResponsePayload::FlushStream(_) => Ok(()),
            ResponsePayload::Error(e) => Err(ClientError::server(e.code, e.message)),
            other => Err(ClientError::unexpected(RequestKind::FlushStream, other)),
        }
    }

    /// Closes a stream.
    pub fn close_stream(&mut self, stream_id: StreamId) -> ClientResult<()> {
        let client_id = self.require_client_id()?;
        let response = self.call(RequestPayload::CloseStream(CloseStreamRequest {
            client_id,
            stream_id,
        }))?;

        match response.payload {
            ResponsePayload::CloseStream(_) => Ok(()),
            ResponsePayload::Error(e) => Err(ClientError::server(e.code, e.message)),
            other => Err(ClientError::unexpected(RequestKind::CloseStream, other)),
        }
    }

    /// Sends a heartbeat acknowledging the last response received.
    pub fn heartbeat(&mut self) -> ClientResult<()> {
        let client_id = self.require_client_id()?;
        let acked_sequence_number = self.driver.last_acked();
        let response = self.call(RequestPayload::Heartbeat(HeartbeatRequest {
            client_id,
            acked_sequence_number,
        }))?;

        match response.payload {
            ResponsePayload::Heartbeat(_) => Ok(()),
            ResponsePayload::Error(e) => Err(ClientError::server(e.code, e.message)),
            other => Err(ClientError::unexpected(RequestKind::Heartbeat, other)),
        }
    }

    /// Sends a raw request and returns the response, protocol errors included.
    pub fn call(&mut self, payload: RequestPayload) -> ClientResult<Response> {
        self.driver.call(payload)
    }

    fn require_client_id(&self) -> ClientResult<ClientId> {
        self.client_id.ok_or(ClientError::NotConnected)
    }
}

impl<T> Client<T> {
    /// Returns the session identifier, if a session is established.
    pub fn client_id(&self) -> Option<ClientId> {
        self.client_id
    }

    /// Sets the session to resume with [`Client::reconnect`].
    pub fn set_client_id(&mut self, client_id: ClientId) {
        self.client_id = Some(client_id);
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the underlying call driver.
    pub fn driver(&self) -> &CallDriver<T> {
        &self.driver
    }
}

impl<T> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("client_id", &self.client_id)
            .field("driver", &self.driver)
            .finish_non_exhaustive()
    }
}
