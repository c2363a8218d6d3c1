//! State Mirror
//!
//! Folds [`ClientEvent`]s into the view a presentation layer renders:
//! online flag, connection badge, visible messages and the latest error.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use super::events::{ClientEvent, EventHandler};
use crate::network::{ConnectionStatus, MessagePayload, QUEUED_NOTICE};

/// Last completed drain, as reported by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LastSync {
    pub count: usize,
    pub remaining: usize,
    pub timestamp: u64,
}

/// State consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientState {
    pub is_online: bool,
    pub is_connected: bool,
    pub messages: Vec<MessagePayload>,
    pub error: Option<String>,
    pub last_sync: Option<LastSync>,
}

impl ClientState {
    pub fn new(is_online: bool) -> Self {
        ClientState {
            is_online,
            is_connected: false,
            messages: Vec::new(),
            error: None,
            last_sync: None,
        }
    }

    /// Applies one event.
    pub fn apply(&mut self, event: &ClientEvent) {
        match event {
            ClientEvent::ConnectionStatusChanged { status } => {
                self.is_connected = *status == ConnectionStatus::Connected;
                if self.is_connected {
                    self.error = None;
                }
            }
            ClientEvent::MessageReceived { payload } => self.messages.push(payload.clone()),
            ClientEvent::MessageQueued { .. } => self.error = Some(QUEUED_NOTICE.to_string()),
            ClientEvent::ConnectivityChanged { status, .. } => {
                self.is_online = status.is_online();
                if !self.is_online {
                    self.is_connected = false;
                }
            }
            ClientEvent::MessagesSynced {
                count,
                remaining,
                timestamp,
            } => {
                self.last_sync = Some(LastSync {
                    count: *count,
                    remaining: *remaining,
                    timestamp: *timestamp,
                });
            }
            ClientEvent::Error { message } => self.error = Some(message.clone()),
            ClientEvent::MessageDropped { .. } | ClientEvent::MessageSent { .. } => {}
        }
    }
}

/// Shared, event-driven [`ClientState`].
#[derive(Debug, Clone)]
pub struct StateMirror {
    state: Arc<RwLock<ClientState>>,
}

impl StateMirror {
    pub fn new(is_online: bool) -> Self {
        StateMirror {
            state: Arc::new(RwLock::new(ClientState::new(is_online))),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> ClientState {
        self.state.read().clone()
    }

    pub fn apply(&self, event: &ClientEvent) {
        self.state.write().apply(event);
    }

    /// Sets the platform online flag directly.
    pub fn set_online(&self, online: bool) {
        let mut state = self.state.write();
        state.is_online = online;
        if !online {
            state.is_connected = false;
        }
    }

    /// Dismisses the current error.
    pub fn clear_error(&self) {
        self.state.write().error = None;
    }
}

impl EventHandler for StateMirror {
    fn on_event(&self, event: ClientEvent) {
        self.apply(&event);
    }
}
