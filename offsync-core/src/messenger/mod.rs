// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Cross-Context Messenger
//!
//! Fire-and-forget typed notifications between the worker context and any
//! number of attached foreground clients. Foregrounds post
//! [`ClientMessage`]s to the worker; the worker broadcasts
//! [`WorkerMessage`]s to every port still attached.

mod message;

pub use message::{ClientMessage, WorkerMessage};

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Identifies an attached foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub u64);

struct Port {
    id: ClientId,
    tx: mpsc::UnboundedSender<WorkerMessage>,
    controlled: Arc<AtomicBool>,
}

/// Worker-side registry of attached foregrounds.
pub struct Messenger {
    ports: Mutex<Vec<Port>>,
    inbound: mpsc::UnboundedSender<(ClientId, ClientMessage)>,
    next_id: AtomicU64,
}

impl Messenger {
    /// Creates a messenger and the receiver for messages posted by clients.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(ClientId, ClientMessage)>) {
        let (inbound, rx) = mpsc::unbounded_channel();
        let messenger = Messenger {
            ports: Mutex::new(Vec::new()),
            inbound,
            next_id: AtomicU64::new(1),
        };
        (messenger, rx)
    }

    /// Attaches a new foreground.
    pub fn attach(&self) -> ClientPort {
        let id = ClientId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        let controlled = Arc::new(AtomicBool::new(false));
        self.ports.lock().push(Port {
            id,
            tx,
            controlled: controlled.clone(),
        });
        tracing::debug!(client = id.0, "client attached");

        ClientPort {
            id,
            to_worker: self.inbound.clone(),
            from_worker: rx,
            controlled,
        }
    }

    /// Delivers a message to every attached client. Ports whose client has
    /// gone away are dropped. Returns how many clients received it.
    pub fn post_all(&self, message: &WorkerMessage) -> usize {
        let mut ports = self.ports.lock();
        ports.retain(|port| port.tx.send(message.clone()).is_ok());
        ports.len()
    }

    /// Takes control of every attached client. Returns how many there are.
    pub fn claim(&self) -> usize {
        let mut ports = self.ports.lock();
        ports.retain(|port| !port.tx.is_closed());
        for port in ports.iter() {
            port.controlled.store(true, Ordering::Release);
        }
        ports.len()
    }

    /// Number of clients still attached.
    pub fn client_count(&self) -> usize {
        let mut ports = self.ports.lock();
        ports.retain(|port| !port.tx.is_closed());
        ports.len()
    }
}

/// Foreground end of the messenger.
#[derive(Debug)]
pub struct ClientPort {
    id: ClientId,
    to_worker: mpsc::UnboundedSender<(ClientId, ClientMessage)>,
    from_worker: mpsc::UnboundedReceiver<WorkerMessage>,
    controlled: Arc<AtomicBool>,
}

impl ClientPort {
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// True once the worker has claimed this client.
    pub fn is_controlled(&self) -> bool {
        self.controlled.load(Ordering::Acquire)
    }

    /// Posts a message to the worker. Returns false if the worker is gone.
    pub fn post(&self, message: ClientMessage) -> bool {
        self.to_worker.send((self.id, message)).is_ok()
    }

    /// Waits for the next message from the worker.
    pub async fn recv(&mut self) -> Option<WorkerMessage> {
        self.from_worker.recv().await
    }

    /// Returns a message from the worker if one is waiting.
    pub fn try_recv(&mut self) -> Option<WorkerMessage> {
        self.from_worker.try_recv().ok()
    }

    /// Splits off a cloneable sender for posting to the worker.
    pub fn sender(&self) -> ClientSender {
        ClientSender {
            id: self.id,
            to_worker: self.to_worker.clone(),
        }
    }
}

/// Cloneable posting half of a [`ClientPort`].
#[derive(Debug, Clone)]
pub struct ClientSender {
    id: ClientId,
    to_worker: mpsc::UnboundedSender<(ClientId, ClientMessage)>,
}

impl ClientSender {
    pub fn post(&self, message: ClientMessage) -> bool {
        self.to_worker.send((self.id, message)).is_ok()
    }
}
