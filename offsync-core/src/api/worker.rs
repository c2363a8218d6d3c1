// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Worker
//!
//! The background context. Owns the network mediator and the sync
//! coordinator, answers fetches, runs registered background syncs once the
//! host is online, and keeps every attached foreground informed.
//!
//! # Example
//!
//! ```ignore
//! let worker = Worker::new(mediator, SyncCoordinator::new(store, redeliver), monitor);
//! let (handle, _task) = worker.spawn();
//! handle.install().await?;
//! let port = handle.attach();
//! let response = handle.fetch(Request::navigate(url)).await?;
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::error::{OffsyncError, OffsyncResult};
use crate::connectivity::{ConnectivityMonitor, ConnectivityStatus};
use crate::mediator::{Fetcher, NetworkMediator, Request, Response};
use crate::messenger::{ClientId, ClientMessage, ClientPort, Messenger, WorkerMessage};
use crate::sync::{BackgroundSync, Redeliver, SyncCoordinator, SyncReport};

/// Installation state of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerLifecycle {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; the worker serves requests but precache is incomplete.
    Redundant,
}

/// Command accepted by a running worker.
#[derive(Debug)]
enum WorkerCommand {
    Install(oneshot::Sender<OffsyncResult<()>>),
    Activate(oneshot::Sender<OffsyncResult<Vec<String>>>),
    Fetch(Request, oneshot::Sender<Response>),
    Post(ClientMessage),
    RegisterSync(String),
    SyncNow(oneshot::Sender<Option<SyncReport>>),
    Shutdown,
}

/// Background worker.
pub struct Worker<F: Fetcher, R: Redeliver> {
    mediator: NetworkMediator<F>,
    coordinator: SyncCoordinator<R>,
    messenger: Arc<Messenger>,
    inbound: mpsc::UnboundedReceiver<(ClientId, ClientMessage)>,
    monitor: ConnectivityMonitor,
    lifecycle: watch::Sender<WorkerLifecycle>,
    deferred: BTreeSet<String>,
    /// Latest status reported during this run. The record persisted by an
    /// earlier run only seeds the mediator.
    reported: Option<ConnectivityStatus>,
}

impl<F, R> Worker<F, R>
where
    F: Fetcher + 'static,
    R: Redeliver + 'static,
{
    pub fn new(
        mediator: NetworkMediator<F>,
        coordinator: SyncCoordinator<R>,
        monitor: ConnectivityMonitor,
    ) -> Self {
        let (messenger, inbound) = Messenger::new();
        let (lifecycle, _) = watch::channel(WorkerLifecycle::Parsed);
        Worker {
            mediator,
            coordinator,
            messenger: Arc::new(messenger),
            inbound,
            monitor,
            lifecycle,
            deferred: BTreeSet::new(),
            reported: None,
        }
    }

    pub fn mediator(&self) -> &NetworkMediator<F> {
        &self.mediator
    }

    pub fn lifecycle(&self) -> WorkerLifecycle {
        *self.lifecycle.borrow()
    }

    /// Tags waiting for the host to come online.
    pub fn deferred_syncs(&self) -> Vec<String> {
        self.deferred.iter().cloned().collect()
    }

    /// Spawns the worker's event loop and returns a handle to it.
    pub fn spawn(self) -> (WorkerHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = WorkerHandle {
            commands: tx,
            messenger: self.messenger.clone(),
            lifecycle: self.lifecycle.subscribe(),
        };
        let task = tokio::spawn(self.run(rx));
        (handle, task)
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<WorkerCommand>) {
        let mut connectivity = self.monitor.subscribe();
        let _ = connectivity.borrow_and_update();

        loop {
            let step = tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => Step::Command(command),
                    None => Step::Stop,
                },
                Some((client, message)) = self.inbound.recv() => Step::Message(client, message),
                Ok(()) = connectivity.changed() => {
                    Step::Connectivity(*connectivity.borrow_and_update())
                }
            };

            match step {
                Step::Command(WorkerCommand::Shutdown) | Step::Stop => break,
                Step::Command(command) => self.apply(command).await,
                Step::Message(client, message) => {
                    tracing::debug!(client = client.0, ?message, "client message");
                    self.on_client_message(message).await;
                }
                Step::Connectivity(status) => self.on_connectivity(status).await,
            }
        }

        tracing::debug!("worker stopped");
    }

    async fn apply(&mut self, command: WorkerCommand) {
        match command {
            WorkerCommand::Install(reply) => {
                let _ = reply.send(self.install().await);
            }
            WorkerCommand::Activate(reply) => {
                let _ = reply.send(self.activate());
            }
            WorkerCommand::Fetch(request, reply) => {
                let _ = reply.send(self.mediator.handle_fetch(&request).await);
            }
            WorkerCommand::Post(message) => self.on_client_message(message).await,
            WorkerCommand::RegisterSync(tag) => self.register_sync(tag).await,
            WorkerCommand::SyncNow(reply) => {
                let _ = reply.send(self.sync_now().await);
            }
            WorkerCommand::Shutdown => {}
        }
    }

    // === Lifecycle ===

    /// Precaches the shell, then activates without waiting for old
    /// clients to detach.
    pub async fn install(&mut self) -> OffsyncResult<()> {
        self.set_lifecycle(WorkerLifecycle::Installing);
        if let Err(e) = self.mediator.install().await {
            tracing::error!(error = %e, "install failed");
            self.set_lifecycle(WorkerLifecycle::Redundant);
            return Err(e.into());
        }
        self.set_lifecycle(WorkerLifecycle::Installed);

        // skip waiting
        self.activate()?;
        Ok(())
    }

    /// Purges stale caches and claims every attached client. Returns the
    /// deleted cache names.
    pub fn activate(&mut self) -> OffsyncResult<Vec<String>> {
        self.set_lifecycle(WorkerLifecycle::Activating);
        let deleted = self.mediator.activate()?;
        let claimed = self.messenger.claim();
        self.set_lifecycle(WorkerLifecycle::Activated);
        tracing::info!(purged = deleted.len(), claimed, "worker activated");
        Ok(deleted)
    }

    fn set_lifecycle(&self, state: WorkerLifecycle) {
        self.lifecycle.send_replace(state);
        tracing::debug!(?state, "worker lifecycle");
    }

    // === Connectivity ===

    async fn on_client_message(&mut self, message: ClientMessage) {
        match message {
            ClientMessage::ConnectivityChange { status } => self.on_connectivity(status).await,
        }
    }

    /// Records a connectivity report and broadcasts it. A report matching
    /// the last known status is not broadcast again.
    async fn on_connectivity(&mut self, status: ConnectivityStatus) {
        if self.reported == Some(status) {
            return;
        }
        self.reported = Some(status);
        if !self.mediator.record_connectivity(status) {
            tracing::warn!(%status, "connectivity not persisted");
        }

        let update = WorkerMessage::ConnectivityUpdate {
            status,
            timestamp: crate::now_millis(),
        };
        let reached = self.messenger.post_all(&update);
        tracing::debug!(%status, clients = reached, "connectivity broadcast");

        if status.is_online() {
            self.run_deferred().await;
        }
    }

    fn is_online(&self) -> bool {
        match self.reported {
            Some(status) => status.is_online(),
            None => self.monitor.is_online(),
        }
    }

    // === Background Sync ===

    async fn register_sync(&mut self, tag: String) {
        if !self.is_online() {
            tracing::debug!(%tag, "offline, deferring sync");
            self.deferred.insert(tag);
            return;
        }
        self.run_sync(&tag).await;
    }

    async fn run_deferred(&mut self) {
        let tags = std::mem::take(&mut self.deferred);
        for tag in tags {
            self.run_sync(&tag).await;
        }
    }

    async fn run_sync(&self, tag: &str) {
        if let Some(report) = self.coordinator.handle_sync(tag).await {
            self.messenger.post_all(&report.into());
        }
    }

    /// Drains the queue immediately, whatever the connectivity.
    pub async fn sync_now(&self) -> Option<SyncReport> {
        let report = self.coordinator.sync_pending_messages().await?;
        self.messenger.post_all(&report.into());
        Some(report)
    }
}

enum Step {
    Command(WorkerCommand),
    Message(ClientId, ClientMessage),
    Connectivity(ConnectivityStatus),
    Stop,
}

/// Handle to a spawned [`Worker`].
#[derive(Clone)]
pub struct WorkerHandle {
    commands: mpsc::UnboundedSender<WorkerCommand>,
    messenger: Arc<Messenger>,
    lifecycle: watch::Receiver<WorkerLifecycle>,
}

impl WorkerHandle {
    /// Current lifecycle state.
    pub fn lifecycle(&self) -> WorkerLifecycle {
        *self.lifecycle.borrow()
    }

    pub fn subscribe_lifecycle(&self) -> watch::Receiver<WorkerLifecycle> {
        self.lifecycle.clone()
    }

    /// Precaches and activates.
    pub async fn install(&self) -> OffsyncResult<()> {
        let (tx, rx) = oneshot::channel();
        self.command(WorkerCommand::Install(tx))?;
        rx.await.map_err(|_| OffsyncError::WorkerStopped)?
    }

    /// Purges stale caches and claims clients.
    pub async fn activate(&self) -> OffsyncResult<Vec<String>> {
        let (tx, rx) = oneshot::channel();
        self.command(WorkerCommand::Activate(tx))?;
        rx.await.map_err(|_| OffsyncError::WorkerStopped)?
    }

    /// Routes a request through the mediator.
    pub async fn fetch(&self, request: Request) -> OffsyncResult<Response> {
        let (tx, rx) = oneshot::channel();
        self.command(WorkerCommand::Fetch(request, tx))?;
        rx.await.map_err(|_| OffsyncError::WorkerStopped)
    }

    /// Posts a message as if from an attached client.
    pub fn post_message(&self, message: ClientMessage) -> OffsyncResult<()> {
        self.command(WorkerCommand::Post(message))
    }

    /// Registers a background sync tag.
    pub fn register_sync(&self, tag: &str) -> OffsyncResult<()> {
        self.command(WorkerCommand::RegisterSync(tag.to_string()))
    }

    /// Drains the queue now and returns the report, if anything was queued.
    pub async fn sync_now(&self) -> OffsyncResult<Option<SyncReport>> {
        let (tx, rx) = oneshot::channel();
        self.command(WorkerCommand::SyncNow(tx))?;
        rx.await.map_err(|_| OffsyncError::WorkerStopped)
    }

    /// Attaches a new foreground.
    pub fn attach(&self) -> ClientPort {
        self.messenger.attach()
    }

    /// Number of foregrounds still attached.
    pub fn client_count(&self) -> usize {
        self.messenger.client_count()
    }

    pub fn shutdown(&self) -> OffsyncResult<()> {
        self.command(WorkerCommand::Shutdown)
    }

    fn command(&self, command: WorkerCommand) -> OffsyncResult<()> {
        self.commands
            .send(command)
            .map_err(|_| OffsyncError::WorkerStopped)
    }
}

impl BackgroundSync for WorkerHandle {
    fn register(&self, tag: &str) -> bool {
        self.register_sync(tag).is_ok()
    }
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}
