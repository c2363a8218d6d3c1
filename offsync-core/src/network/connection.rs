// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Connection Manager
//!
//! Owns the single real-time socket and drives the
//! Disconnected → Connecting → Connected state machine with linear-backoff
//! reconnects and a keep-alive heartbeat. Messages that cannot be sent live
//! go to the queue store instead of being buffered in memory.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior, Sleep};

use super::error::NetworkError;
use super::message::MessagePayload;
use super::transport::{
    ConnectionConfig, ConnectionStatus, Connector, SocketEvent, SocketEventSink, SocketHandle,
    SocketId, TransportResult, NORMAL_CLOSURE,
};
use crate::api::{ClientEvent, EventDispatcher, EventHandler};
use crate::connectivity::{ConnectivityMonitor, ConnectivityStatus};
use crate::storage::QueueStore;
use crate::sync::{BackgroundSync, SYNC_TAG};

/// Shown when `connect` is called while the host is offline.
pub const OFFLINE_CONNECT_ERROR: &str = "Failed to connect to the server. You are offline.";

/// Shown when the connector cannot even start a socket.
pub const CONNECT_FAILED_ERROR: &str = "Failed to connect to the server.";

/// Shown on a transport error event.
pub const CONNECTION_ERROR: &str = "Connection error. Please try again.";

/// Shown once automatic reconnects are exhausted.
pub const RECONNECT_EXHAUSTED_ERROR: &str =
    "Unable to reach the server. Will retry when the connection changes.";

/// Shown when a send was diverted to the queue.
pub const QUEUED_NOTICE: &str = "Message saved for later delivery";

/// Result of [`ConnectionManager::send_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Written to the open socket.
    Sent,
    /// Stored in the queue for later delivery.
    Queued { pending_id: String },
    /// Neither sent nor stored.
    Failed,
}

/// Keep-alive task. Aborted when dropped.
struct Heartbeat {
    task: JoinHandle<()>,
}

impl Heartbeat {
    fn start(socket: &SocketHandle, period: Duration) -> Self {
        let socket = socket.clone();
        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let ping = match MessagePayload::ping().to_json() {
                    Ok(ping) => ping,
                    Err(_) => continue,
                };
                if socket.send_text(ping).is_err() {
                    break;
                }
                tracing::trace!(socket = socket.id().0, "heartbeat sent");
            }
        });
        Heartbeat { task }
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A scheduled reconnect. Dropping it cancels the reconnect.
struct ReconnectTimer {
    attempt: u32,
    deadline: Instant,
    sleep: Pin<Box<Sleep>>,
}

impl ReconnectTimer {
    fn new(attempt: u32, delay: Duration) -> Self {
        let deadline = Instant::now() + delay;
        ReconnectTimer {
            attempt,
            deadline,
            sleep: Box::pin(time::sleep_until(deadline)),
        }
    }
}

/// State owned by the manager.
struct ConnectionState {
    socket: Option<SocketHandle>,
    status: ConnectionStatus,
    reconnect_attempts: u32,
    heartbeat: Option<Heartbeat>,
    reconnect: Option<ReconnectTimer>,
}

impl ConnectionState {
    fn new() -> Self {
        ConnectionState {
            socket: None,
            status: ConnectionStatus::Disconnected,
            reconnect_attempts: 0,
            heartbeat: None,
            reconnect: None,
        }
    }
}

/// Input processed by the manager loop.
pub(super) enum Input {
    Socket(SocketId, SocketEvent),
    ReconnectDue,
}

/// Connection manager for the real-time channel.
///
/// Constructed explicitly and driven either directly (call
/// [`ConnectionManager::process_next`] to handle socket events and timers)
/// or through a [`super::ConnectionHandle`] after spawning
/// [`ConnectionManager::run`]. Must live inside a tokio runtime.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use offsync_core::network::{ConnectionConfig, ConnectionManager, WebSocketConnector};
///
/// let mut manager = ConnectionManager::new(
///     WebSocketConnector::new(),
///     ConnectionConfig::new("ws://localhost:8080"),
///     store,
///     monitor,
/// );
/// manager.connect()?;
/// manager.process_next().await;
/// ```
pub struct ConnectionManager<C: Connector> {
    connector: C,
    config: ConnectionConfig,
    state: ConnectionState,
    store: Arc<QueueStore>,
    monitor: ConnectivityMonitor,
    events: EventDispatcher,
    background_sync: Option<Arc<dyn BackgroundSync>>,
    status_tx: watch::Sender<ConnectionStatus>,
    inputs_tx: mpsc::UnboundedSender<(SocketId, SocketEvent)>,
    inputs_rx: mpsc::UnboundedReceiver<(SocketId, SocketEvent)>,
    next_socket: u64,
}

impl<C: Connector> ConnectionManager<C> {
    /// Creates a new, disconnected connection manager.
    pub fn new(
        connector: C,
        config: ConnectionConfig,
        store: Arc<QueueStore>,
        monitor: ConnectivityMonitor,
    ) -> Self {
        let (inputs_tx, inputs_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(ConnectionStatus::Disconnected);
        ConnectionManager {
            connector,
            config,
            state: ConnectionState::new(),
            store,
            monitor,
            events: EventDispatcher::new(),
            background_sync: None,
            status_tx,
            inputs_tx,
            inputs_rx,
            next_socket: 0,
        }
    }

    /// Adds a handler for status, message and error events.
    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.events.add_handler(handler);
    }

    /// Sets where `sync-messages` registrations go after a message is queued.
    pub fn set_background_sync(&mut self, sync: Arc<dyn BackgroundSync>) {
        self.background_sync = Some(sync);
    }

    // === Accessors ===

    pub fn status(&self) -> ConnectionStatus {
        self.state.status
    }

    pub fn is_connected(&self) -> bool {
        self.state.status == ConnectionStatus::Connected
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.state.reconnect_attempts
    }

    /// True while a keep-alive task is running.
    pub fn has_heartbeat(&self) -> bool {
        self.state.heartbeat.is_some()
    }

    /// Attempt number and deadline of the scheduled reconnect, if any.
    pub fn scheduled_reconnect(&self) -> Option<(u32, Instant)> {
        self.state
            .reconnect
            .as_ref()
            .map(|timer| (timer.attempt, timer.deadline))
    }

    /// Subscribes to status transitions.
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    // === Operations ===

    /// Opens the socket.
    ///
    /// No-op while connecting or connected. Fails without opening a socket
    /// when the host is offline.
    pub fn connect(&mut self) -> TransportResult<()> {
        if matches!(
            self.state.status,
            ConnectionStatus::Connecting | ConnectionStatus::Connected
        ) {
            tracing::debug!(status = ?self.state.status, "already connected or connecting");
            return Ok(());
        }

        if !self.monitor.is_online() {
            tracing::info!("cannot connect: host is offline");
            self.report_error(OFFLINE_CONNECT_ERROR);
            return Err(NetworkError::Offline);
        }

        self.state.reconnect = None;
        self.next_socket += 1;
        let id = SocketId(self.next_socket);
        let sink = SocketEventSink::new(id, self.inputs_tx.clone());

        match self.connector.open(&self.config.server_url, sink) {
            Ok(socket) => {
                tracing::debug!(socket = id.0, url = %self.config.server_url, "socket opening");
                self.state.socket = Some(socket);
                self.set_status(ConnectionStatus::Connecting);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to open socket");
                self.report_error(CONNECT_FAILED_ERROR);
                Err(e)
            }
        }
    }

    /// Closes the socket and cancels all timers. Idempotent.
    pub fn disconnect(&mut self) {
        self.state.reconnect = None;
        self.state.heartbeat = None;
        if let Some(socket) = self.state.socket.take() {
            tracing::debug!(socket = socket.id().0, "closing socket");
            socket.close(NORMAL_CLOSURE);
        }
        self.set_status(ConnectionStatus::Disconnected);
    }

    /// Sends a payload, or queues it durably when not connected.
    pub fn send_message(&mut self, payload: MessagePayload) -> SendOutcome {
        if self.is_connected() {
            match self.transmit(&payload) {
                Ok(()) => {
                    self.events.dispatch(ClientEvent::MessageSent { payload });
                    return SendOutcome::Sent;
                }
                Err(e) => tracing::warn!(error = %e, "live send failed, queueing"),
            }
        }

        match self.store.try_enqueue(payload) {
            Ok(message) => {
                let pending_id = message.pending_id;
                self.events.dispatch(ClientEvent::MessageQueued {
                    pending_id: pending_id.clone(),
                });
                self.register_sync();
                SendOutcome::Queued { pending_id }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to queue message");
                SendOutcome::Failed
            }
        }
    }

    /// Sends a payload on the live socket only. Used for redelivery.
    pub fn deliver(&mut self, payload: &MessagePayload) -> TransportResult<()> {
        if !self.is_connected() {
            return Err(NetworkError::NotConnected);
        }
        self.transmit(payload)
    }

    /// Reacts to a host connectivity transition.
    ///
    /// Going offline closes the socket. Coming back online clears the
    /// reconnect budget and connects again.
    pub fn handle_connectivity(&mut self, status: ConnectivityStatus) {
        match status {
            ConnectivityStatus::Offline => self.disconnect(),
            ConnectivityStatus::Online => {
                self.state.reconnect_attempts = 0;
                let _ = self.connect();
            }
        }
    }

    /// Waits for the next socket event or reconnect timer and handles it.
    pub async fn process_next(&mut self) {
        let input = self.next_input().await;
        self.handle_input(input);
    }

    /// Handles every socket event that is already queued, without waiting.
    /// Returns how many were handled.
    pub fn process_ready(&mut self) -> usize {
        let mut handled = 0;
        while let Ok((id, event)) = self.inputs_rx.try_recv() {
            self.handle_input(Input::Socket(id, event));
            handled += 1;
        }
        handled
    }

    pub(crate) fn monitor(&self) -> &ConnectivityMonitor {
        &self.monitor
    }

    pub(super) async fn next_input(&mut self) -> Input {
        let reconnect = &mut self.state.reconnect;
        let inputs = &mut self.inputs_rx;
        tokio::select! {
            Some((id, event)) = inputs.recv() => Input::Socket(id, event),
            _ = async {
                match reconnect.as_mut() {
                    Some(timer) => timer.sleep.as_mut().await,
                    None => std::future::pending::<()>().await,
                }
            } => Input::ReconnectDue,
        }
    }

    pub(super) fn handle_input(&mut self, input: Input) {
        match input {
            Input::ReconnectDue => {
                let attempt = self.state.reconnect.take().map(|t| t.attempt);
                tracing::info!(
                    attempt,
                    max = self.config.max_reconnect_attempts,
                    "attempting to reconnect"
                );
                let _ = self.connect();
            }
            Input::Socket(id, event) => {
                if self.state.socket.as_ref().map(|s| s.id()) != Some(id) {
                    tracing::trace!(socket = id.0, ?event, "ignoring event from stale socket");
                    return;
                }
                self.handle_socket_event(event);
            }
        }
    }

    fn handle_socket_event(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::Opened => self.on_open(),
            SocketEvent::Message(text) => self.on_message(&text),
            SocketEvent::Error(error) => {
                tracing::warn!(%error, "socket error");
                self.report_error(CONNECTION_ERROR);
            }
            SocketEvent::Closed { code } => self.on_close(code),
        }
    }

    fn on_open(&mut self) {
        tracing::info!(url = %self.config.server_url, "connected");
        self.state.reconnect_attempts = 0;
        self.state.heartbeat = None;
        if let Some(socket) = &self.state.socket {
            self.state.heartbeat = Some(Heartbeat::start(socket, self.config.heartbeat_interval));
        }
        self.set_status(ConnectionStatus::Connected);

        if self.store.pending_count() > 0 {
            self.register_sync();
        }
    }

    fn on_message(&mut self, text: &str) {
        match MessagePayload::parse(text) {
            Ok(payload) => {
                tracing::debug!(kind = ?payload.kind(), "message received");
                self.events.dispatch(ClientEvent::MessageReceived { payload });
            }
            Err(e) => {
                tracing::warn!(error = %e, "dropping unparseable message");
                self.events.dispatch(ClientEvent::MessageDropped {
                    reason: e.to_string(),
                });
            }
        }
    }

    fn on_close(&mut self, code: u16) {
        tracing::info!(code, "disconnected");
        self.state.heartbeat = None;
        self.state.socket = None;
        self.set_status(ConnectionStatus::Disconnected);

        if code == NORMAL_CLOSURE || !self.monitor.is_online() {
            return;
        }

        if self.state.reconnect_attempts < self.config.max_reconnect_attempts {
            self.state.reconnect_attempts += 1;
            let attempt = self.state.reconnect_attempts;
            let delay = self.config.reconnect_delay(attempt);
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "reconnect scheduled");
            self.state.reconnect = Some(ReconnectTimer::new(attempt, delay));
        } else {
            tracing::warn!(
                attempts = self.state.reconnect_attempts,
                "reconnect attempts exhausted"
            );
            self.report_error(RECONNECT_EXHAUSTED_ERROR);
        }
    }

    fn transmit(&self, payload: &MessagePayload) -> TransportResult<()> {
        let socket = self.state.socket.as_ref().ok_or(NetworkError::NotConnected)?;
        socket.send_text(payload.to_json()?)
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if self.state.status == status {
            return;
        }
        self.state.status = status;
        self.status_tx.send_replace(status);
        self.events
            .dispatch(ClientEvent::ConnectionStatusChanged { status });
    }

    fn report_error(&self, message: &str) {
        self.events.dispatch(ClientEvent::Error {
            message: message.to_string(),
        });
    }

    fn register_sync(&self) {
        if let Some(sync) = &self.background_sync {
            if !sync.register(SYNC_TAG) {
                tracing::warn!("background sync registration failed");
            }
        }
    }
}
