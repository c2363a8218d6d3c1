// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mock Connector
//!
//! In-memory connector for driving the connection manager in tests. Every
//! `open` records a socket; the test then plays the server side by calling
//! [`MockConnector::open_socket`], [`MockConnector::close`] and friends.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::error::NetworkError;
use super::transport::{
    Connector, Frame, SocketEvent, SocketEventSink, SocketHandle, TransportResult,
};

struct MockSocket {
    url: String,
    sink: SocketEventSink,
    outbound: mpsc::UnboundedReceiver<Frame>,
    sent: Vec<String>,
    closed_with: Option<u16>,
}

impl MockSocket {
    fn drain(&mut self) {
        while let Ok(frame) = self.outbound.try_recv() {
            match frame {
                Frame::Text(text) => self.sent.push(text),
                Frame::Close(code) => self.closed_with = Some(code),
            }
        }
    }
}

#[derive(Default)]
struct MockState {
    sockets: Vec<MockSocket>,
    refuse: bool,
}

/// Mock connector for testing. Cloning shares the recorded sockets.
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    /// Creates a new mock connector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent `open` calls fail synchronously.
    pub fn set_refuse(&self, refuse: bool) {
        self.state.lock().refuse = refuse;
    }

    /// Number of sockets opened so far.
    pub fn socket_count(&self) -> usize {
        self.state.lock().sockets.len()
    }

    /// URL the n-th socket was opened with.
    pub fn url(&self, index: usize) -> Option<String> {
        self.state.lock().sockets.get(index).map(|s| s.url.clone())
    }

    /// Reports the n-th socket as open.
    pub fn open_socket(&self, index: usize) {
        self.emit(index, SocketEvent::Opened);
    }

    /// Reports an inbound text frame on the n-th socket.
    pub fn deliver(&self, index: usize, text: &str) {
        self.emit(index, SocketEvent::Message(text.to_string()));
    }

    /// Reports a transport error on the n-th socket.
    pub fn error(&self, index: usize, message: &str) {
        self.emit(index, SocketEvent::Error(message.to_string()));
    }

    /// Reports the n-th socket as closed with `code`.
    pub fn close(&self, index: usize, code: u16) {
        self.emit(index, SocketEvent::Closed { code });
    }

    /// Text frames sent on the n-th socket so far.
    pub fn sent(&self, index: usize) -> Vec<String> {
        let mut state = self.state.lock();
        match state.sockets.get_mut(index) {
            Some(socket) => {
                socket.drain();
                socket.sent.clone()
            }
            None => Vec::new(),
        }
    }

    /// Close code the client requested on the n-th socket, if any.
    pub fn closed_with(&self, index: usize) -> Option<u16> {
        let mut state = self.state.lock();
        let socket = state.sockets.get_mut(index)?;
        socket.drain();
        socket.closed_with
    }

    fn emit(&self, index: usize, event: SocketEvent) {
        let state = self.state.lock();
        if let Some(socket) = state.sockets.get(index) {
            socket.sink.emit(event);
        }
    }
}

impl Connector for MockConnector {
    fn open(&mut self, url: &str, events: SocketEventSink) -> TransportResult<SocketHandle> {
        let mut state = self.state.lock();
        if state.refuse {
            return Err(NetworkError::ConnectionFailed("refused by mock".into()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SocketHandle::new(events.id(), tx);
        state.sockets.push(MockSocket {
            url: url.to_string(),
            sink: events,
            outbound: rx,
            sent: Vec::new(),
            closed_with: None,
        });
        Ok(handle)
    }
}

/// Hands out sinks that are not wired to any manager.
#[cfg(test)]
pub(crate) fn detached_sink(id: u64) -> SocketEventSink {
    let (tx, _rx) = mpsc::unbounded_channel();
    SocketEventSink::new(super::transport::SocketId(id), tx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_records_socket() {
        let mut connector = MockConnector::new();
        let handle = connector.open("ws://test", detached_sink(1)).unwrap();

        assert_eq!(connector.socket_count(), 1);
        assert_eq!(connector.url(0).as_deref(), Some("ws://test"));
        assert_eq!(handle.id(), super::super::transport::SocketId(1));
    }

    #[test]
    fn test_sent_frames_are_captured() {
        let mut connector = MockConnector::new();
        let handle = connector.open("ws://test", detached_sink(1)).unwrap();

        handle.send_text("one".into()).unwrap();
        handle.close(1000);

        assert_eq!(connector.sent(0), vec!["one".to_string()]);
        assert_eq!(connector.closed_with(0), Some(1000));
    }

    #[test]
    fn test_refuse() {
        let mut connector = MockConnector::new();
        connector.set_refuse(true);

        assert!(connector.open("ws://test", detached_sink(1)).is_err());
        assert_eq!(connector.socket_count(), 0);
    }
}
