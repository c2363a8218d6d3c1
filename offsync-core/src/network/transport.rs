//! Transport Seam
//!
//! Platform-agnostic abstraction over the real-time socket. A [`Connector`]
//! opens sockets; each socket reports its lifecycle through a
//! [`SocketEventSink`] and accepts outbound frames through a
//! [`SocketHandle`]. The connection manager never touches the wire itself.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::error::NetworkError;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, NetworkError>;

/// Close code for an intentional shutdown; never triggers a reconnect.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Close code for a close frame that carried no status.
pub const NO_STATUS_RECEIVED: u16 = 1005;

/// Close code reported when a socket dies without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// No socket.
    Disconnected,
    /// Socket opened, handshake in progress.
    Connecting,
    /// Socket open and ready.
    Connected,
}

/// Configuration for the real-time channel.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server URL.
    pub server_url: String,
    /// Consecutive reconnects before giving up.
    pub max_reconnect_attempts: u32,
    /// Base delay; the n-th reconnect waits `n * reconnect_interval`.
    pub reconnect_interval: Duration,
    /// Keep-alive period while connected.
    pub heartbeat_interval: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            server_url: "ws://localhost:8080".to_string(),
            max_reconnect_attempts: 5,
            reconnect_interval: Duration::from_millis(3_000),
            heartbeat_interval: Duration::from_secs(25),
        }
    }
}

impl ConnectionConfig {
    /// Creates a config for the given server with default timings.
    pub fn new(server_url: impl Into<String>) -> Self {
        ConnectionConfig {
            server_url: server_url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Delay before the given (1-based) reconnect attempt.
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        self.reconnect_interval.saturating_mul(attempt)
    }
}

/// Identifies one socket over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketId(pub u64);

/// Lifecycle event reported by a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// The socket is open.
    Opened,
    /// A text frame arrived.
    Message(String),
    /// Transport-level error; a `Closed` event follows when the socket dies.
    Error(String),
    /// The socket closed with the given code.
    Closed { code: u16 },
}

/// Outbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Close(u16),
}

/// Reporting end for a socket's events.
#[derive(Debug, Clone)]
pub struct SocketEventSink {
    id: SocketId,
    tx: mpsc::UnboundedSender<(SocketId, SocketEvent)>,
}

impl SocketEventSink {
    pub(crate) fn new(id: SocketId, tx: mpsc::UnboundedSender<(SocketId, SocketEvent)>) -> Self {
        SocketEventSink { id, tx }
    }

    pub fn id(&self) -> SocketId {
        self.id
    }

    /// Reports an event. Returns false once the receiving manager is gone.
    pub fn emit(&self, event: SocketEvent) -> bool {
        self.tx.send((self.id, event)).is_ok()
    }
}

/// Sending end of an open socket.
#[derive(Debug, Clone)]
pub struct SocketHandle {
    id: SocketId,
    outbound: mpsc::UnboundedSender<Frame>,
}

impl SocketHandle {
    pub fn new(id: SocketId, outbound: mpsc::UnboundedSender<Frame>) -> Self {
        SocketHandle { id, outbound }
    }

    pub fn id(&self) -> SocketId {
        self.id
    }

    /// Queues a text frame for transmission.
    pub fn send_text(&self, text: String) -> TransportResult<()> {
        self.outbound
            .send(Frame::Text(text))
            .map_err(|_| NetworkError::ConnectionClosed)
    }

    /// Asks the socket to close with the given code.
    pub fn close(&self, code: u16) {
        let _ = self.outbound.send(Frame::Close(code));
    }
}

/// Opens real-time sockets.
///
/// Implementations return immediately; the socket reports `Opened` (or
/// `Error` followed by `Closed`) through the sink once the connection
/// attempt settles. Tests use [`super::MockConnector`].
pub trait Connector: Send {
    fn open(&mut self, url: &str, events: SocketEventSink) -> TransportResult<SocketHandle>;
}
