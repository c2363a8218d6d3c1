// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Real-time Channel
//!
//! Keeps one logical socket to the server alive across transient network
//! loss.
//!
//! # Architecture
//!
//! - **Connector trait**: platform-agnostic way to open a socket
//! - **Payloads**: tagged message kinds with an `Unknown` fallback
//! - **Connection manager**: connect/reconnect/heartbeat state machine that
//!   queues sends it cannot deliver
//! - **Connection handle**: command front for a manager running as a task
//!
//! # Example
//!
//! ```ignore
//! use offsync_core::network::{ConnectionConfig, ConnectionHandle, ConnectionManager, WebSocketConnector};
//!
//! let manager = ConnectionManager::new(
//!     WebSocketConnector::new(),
//!     ConnectionConfig::new("ws://localhost:8080"),
//!     store,
//!     monitor,
//! );
//! let (handle, _task) = ConnectionHandle::spawn(manager);
//! handle.connect().await?;
//! handle.send(MessagePayload::chat("hello")).await;
//! ```

mod connection;
mod error;
mod handle;
mod message;
mod mock;
mod transport;
mod websocket;

pub use connection::{
    ConnectionManager, SendOutcome, CONNECTION_ERROR, CONNECT_FAILED_ERROR,
    OFFLINE_CONNECT_ERROR, QUEUED_NOTICE, RECONNECT_EXHAUSTED_ERROR,
};
pub use error::NetworkError;
pub use handle::{Command, ConnectionHandle};
pub use message::{ChatMessage, MessagePayload};
pub use mock::MockConnector;
pub use transport::{
    ConnectionConfig, ConnectionStatus, Connector, Frame, SocketEvent, SocketEventSink,
    SocketHandle, SocketId, TransportResult, ABNORMAL_CLOSURE, NORMAL_CLOSURE, NO_STATUS_RECEIVED,
};
pub use websocket::WebSocketConnector;
