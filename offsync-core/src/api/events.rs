//! Event System
//!
//! Callbacks for Offsync events.

use std::sync::Arc;

use crate::connectivity::ConnectivityStatus;
use crate::network::{ConnectionStatus, MessagePayload};

/// Events emitted by the foreground runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Real-time connection status changed.
    ConnectionStatusChanged {
        /// The new status.
        status: ConnectionStatus,
    },

    /// A payload arrived on the real-time channel.
    MessageReceived {
        /// The decoded payload.
        payload: MessagePayload,
    },

    /// An inbound frame could not be parsed and was dropped.
    MessageDropped {
        /// Parse error description.
        reason: String,
    },

    /// A payload was written to the open socket.
    MessageSent {
        /// The payload sent.
        payload: MessagePayload,
    },

    /// A payload was stored for later delivery.
    MessageQueued {
        /// The queue entry's ID.
        pending_id: String,
    },

    /// Host connectivity changed, as confirmed by the worker.
    ConnectivityChanged {
        /// The new status.
        status: ConnectivityStatus,
        /// When the worker recorded it.
        timestamp: u64,
    },

    /// The worker drained the pending queue.
    MessagesSynced {
        /// Messages delivered.
        count: usize,
        /// Messages still queued.
        remaining: usize,
        /// When the drain finished.
        timestamp: u64,
    },

    /// A recoverable error for the user.
    Error {
        /// Human-readable description.
        message: String,
    },
}

/// Event handler trait.
///
/// Implement this trait to receive Offsync events.
pub trait EventHandler: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: ClientEvent);
}

/// Simple callback-based event handler.
///
/// Wraps a closure for easy event handling.
pub struct CallbackHandler<F>
where
    F: Fn(ClientEvent) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackHandler<F>
where
    F: Fn(ClientEvent) + Send + Sync,
{
    /// Creates a new callback handler.
    pub fn new(callback: F) -> Self {
        CallbackHandler { callback }
    }
}

impl<F> EventHandler for CallbackHandler<F>
where
    F: Fn(ClientEvent) + Send + Sync,
{
    fn on_event(&self, event: ClientEvent) {
        (self.callback)(event);
    }
}

/// Event dispatcher for managing multiple handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    /// Creates a new event dispatcher.
    pub fn new() -> Self {
        EventDispatcher {
            handlers: Vec::new(),
        }
    }

    /// Adds an event handler.
    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Dispatches an event to all handlers.
    pub fn dispatch(&self, event: ClientEvent) {
        for handler in &self.handlers {
            handler.on_event(event.clone());
        }
    }
}
