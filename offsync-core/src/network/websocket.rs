// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! WebSocket Transport
//!
//! Real connector built on tokio-tungstenite. Each socket runs as one task
//! that owns the stream: it forwards outbound frames and reports inbound
//! frames and the close code. The TLS backend follows the crate's
//! `native-tls` / `rustls` feature.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use super::error::NetworkError;
use super::transport::{
    Connector, Frame, SocketEvent, SocketEventSink, SocketHandle, TransportResult,
    ABNORMAL_CLOSURE, NO_STATUS_RECEIVED,
};

/// WebSocket connector for the real-time channel.
///
/// Supports both ws:// (plaintext) and wss:// (TLS) URLs. Must be used from
/// within a tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    /// Creates a new WebSocket connector.
    pub fn new() -> Self {
        WebSocketConnector
    }
}

impl Connector for WebSocketConnector {
    fn open(&mut self, url: &str, events: SocketEventSink) -> TransportResult<SocketHandle> {
        let parsed = url::Url::parse(url)
            .map_err(|e| NetworkError::ConnectionFailed(format!("invalid URL: {}", e)))?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(NetworkError::ConnectionFailed(
                "invalid URL scheme (expected ws:// or wss://)".into(),
            ));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SocketHandle::new(events.id(), tx);
        tokio::spawn(run_socket(parsed.to_string(), rx, events));
        Ok(handle)
    }
}

async fn run_socket(url: String, mut outbound: mpsc::UnboundedReceiver<Frame>, events: SocketEventSink) {
    let stream = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            tracing::debug!(socket = events.id().0, error = %e, "websocket connect failed");
            events.emit(SocketEvent::Error(e.to_string()));
            events.emit(SocketEvent::Closed {
                code: ABNORMAL_CLOSURE,
            });
            return;
        }
    };

    events.emit(SocketEvent::Opened);
    let (mut sink, mut stream) = stream.split();

    let code = loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(Frame::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        events.emit(SocketEvent::Error(e.to_string()));
                        break ABNORMAL_CLOSURE;
                    }
                }
                Some(Frame::Close(code)) => {
                    let close = CloseFrame {
                        code: CloseCode::from(code),
                        reason: "".into(),
                    };
                    let _ = sink.send(Message::Close(Some(close))).await;
                    break code;
                }
                // Manager dropped the handle.
                None => {
                    let _ = sink.close().await;
                    break ABNORMAL_CLOSURE;
                }
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    events.emit(SocketEvent::Message(text));
                }
                Some(Ok(Message::Close(frame))) => {
                    break received_close_code(frame.as_ref());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    events.emit(SocketEvent::Error(e.to_string()));
                    break ABNORMAL_CLOSURE;
                }
                None => break ABNORMAL_CLOSURE,
            },
        }
    };

    tracing::debug!(socket = events.id().0, code, "websocket closed");
    events.emit(SocketEvent::Closed { code });
}

/// Code carried by a peer's close frame; an empty frame has none.
fn received_close_code(frame: Option<&CloseFrame<'_>>) -> u16 {
    frame
        .map(|f| u16::from(f.code))
        .unwrap_or(NO_STATUS_RECEIVED)
}
