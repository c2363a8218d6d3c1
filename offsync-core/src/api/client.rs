// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Foreground Client
//!
//! Glue for one foreground context: drives a [`ConnectionManager`] through
//! its handle, talks to the worker over a messenger port, and keeps a
//! [`StateMirror`] the presentation layer can render.
//!
//! # Example
//!
//! ```ignore
//! let manager = ConnectionManager::new(WebSocketConnector, config, store, monitor);
//! let client = Client::builder(manager, worker.attach())
//!     .background_sync(Arc::new(worker.clone()))
//!     .start();
//! client.connect().await?;
//! client.send("hello").await;
//! println!("{:?}", client.state());
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::events::{ClientEvent, EventDispatcher, EventHandler};
use super::state::{ClientState, StateMirror};
use crate::connectivity::{ConnectivityMonitor, ConnectivityStatus};
use crate::messenger::{ClientId, ClientMessage, ClientPort, ClientSender, WorkerMessage};
use crate::network::{
    ConnectionHandle, ConnectionManager, ConnectionStatus, Connector, MessagePayload,
    SendOutcome, TransportResult,
};
use crate::sync::{BackgroundSync, SYNC_TAG};

/// Builder for a [`Client`].
pub struct ClientBuilder<C: Connector> {
    manager: ConnectionManager<C>,
    port: ClientPort,
    handlers: Vec<Arc<dyn EventHandler>>,
    background_sync: Option<Arc<dyn BackgroundSync>>,
}

impl<C: Connector + 'static> ClientBuilder<C> {
    /// Adds a handler for every client event, local or from the worker.
    pub fn handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Sets where background syncs are registered.
    pub fn background_sync(mut self, sync: Arc<dyn BackgroundSync>) -> Self {
        self.background_sync = Some(sync);
        self
    }

    /// Spawns the connection manager and the worker-message forwarder.
    pub fn start(self) -> Client {
        let ClientBuilder {
            mut manager,
            port,
            handlers,
            background_sync,
        } = self;

        let monitor = manager.monitor().clone();
        let mirror = StateMirror::new(monitor.is_online());

        let mut worker_events = EventDispatcher::new();
        worker_events.add_handler(Arc::new(mirror.clone()));
        manager.add_handler(Arc::new(mirror.clone()));
        for handler in handlers {
            worker_events.add_handler(handler.clone());
            manager.add_handler(handler);
        }
        if let Some(sync) = &background_sync {
            manager.set_background_sync(sync.clone());
        }

        let (connection, connection_task) = ConnectionHandle::spawn(manager);
        let id = port.id();
        let sender = port.sender();
        let forwarder = tokio::spawn(forward_worker_messages(port, worker_events));

        tracing::debug!(client = id.0, "client started");
        Client {
            id,
            connection,
            sender,
            mirror,
            monitor,
            background_sync,
            connection_task,
            forwarder,
        }
    }
}

/// A running foreground.
pub struct Client {
    id: ClientId,
    connection: ConnectionHandle,
    sender: ClientSender,
    mirror: StateMirror,
    monitor: ConnectivityMonitor,
    background_sync: Option<Arc<dyn BackgroundSync>>,
    connection_task: JoinHandle<()>,
    forwarder: JoinHandle<()>,
}

impl Client {
    pub fn builder<C: Connector + 'static>(
        manager: ConnectionManager<C>,
        port: ClientPort,
    ) -> ClientBuilder<C> {
        ClientBuilder {
            manager,
            port,
            handlers: Vec::new(),
            background_sync: None,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Snapshot of the presentation state.
    pub fn state(&self) -> ClientState {
        self.mirror.snapshot()
    }

    pub fn mirror(&self) -> &StateMirror {
        &self.mirror
    }

    pub fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }

    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    pub async fn connect(&self) -> TransportResult<()> {
        self.connection.connect().await
    }

    pub fn disconnect(&self) -> TransportResult<()> {
        self.connection.disconnect()
    }

    /// Sends a chat message with the given content.
    pub async fn send(&self, content: &str) -> SendOutcome {
        self.send_payload(MessagePayload::chat(content)).await
    }

    /// Sends an arbitrary payload, queueing it while disconnected.
    pub async fn send_payload(&self, payload: MessagePayload) -> SendOutcome {
        self.connection.send(payload).await
    }

    /// Reports a host connectivity transition.
    ///
    /// The connection manager reacts through the shared monitor. The
    /// worker is told so it can broadcast the change and, when online,
    /// flush queued messages. Returns false if the status did not change.
    pub fn set_connectivity(&self, status: ConnectivityStatus) -> bool {
        if !self.monitor.set(status) {
            return false;
        }
        self.mirror.set_online(status.is_online());

        if !self.sender.post(ClientMessage::ConnectivityChange { status }) {
            tracing::warn!(client = self.id.0, "worker gone, connectivity not reported");
        }

        if status.is_online() {
            if let Some(sync) = &self.background_sync {
                if !sync.register(SYNC_TAG) {
                    tracing::warn!("background sync registration refused");
                }
            }
        }
        true
    }

    /// Dismisses the current error.
    pub fn clear_error(&self) {
        self.mirror.clear_error();
    }

    /// Closes the connection and stops forwarding worker messages.
    pub async fn shutdown(self) {
        let _ = self.connection.shutdown();
        self.forwarder.abort();
        let _ = self.connection_task.await;
        tracing::debug!(client = self.id.0, "client stopped");
    }
}

async fn forward_worker_messages(mut port: ClientPort, events: EventDispatcher) {
    while let Some(message) = port.recv().await {
        events.dispatch(worker_event(message));
    }
}

fn worker_event(message: WorkerMessage) -> ClientEvent {
    match message {
        WorkerMessage::ConnectivityUpdate { status, timestamp } => {
            ClientEvent::ConnectivityChanged { status, timestamp }
        }
        WorkerMessage::MessagesSynced {
            count,
            remaining,
            timestamp,
        } => ClientEvent::MessagesSynced {
            count,
            remaining,
            timestamp,
        },
    }
}
