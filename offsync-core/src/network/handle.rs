//! Connection Handle
//!
//! Cloneable front for a [`ConnectionManager`] running as its own task. The
//! task is the only owner of the socket and timers; callers talk to it
//! through commands.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::connection::{ConnectionManager, Input, SendOutcome};
use super::error::NetworkError;
use super::message::MessagePayload;
use super::transport::{ConnectionStatus, Connector, TransportResult};
use crate::connectivity::ConnectivityStatus;
use crate::storage::PendingMessage;
use crate::sync::Redeliver;

/// Command accepted by a running manager.
#[derive(Debug)]
pub enum Command {
    Connect(oneshot::Sender<TransportResult<()>>),
    Disconnect,
    Send(MessagePayload, oneshot::Sender<SendOutcome>),
    Deliver(MessagePayload, oneshot::Sender<TransportResult<()>>),
    Connectivity(ConnectivityStatus),
    Shutdown,
}

/// Handle to a spawned connection manager.
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ConnectionStatus>,
}

impl ConnectionHandle {
    /// Spawns the manager's event loop and returns a handle to it.
    pub fn spawn<C>(manager: ConnectionManager<C>) -> (Self, JoinHandle<()>)
    where
        C: Connector + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let status = manager.subscribe_status();
        let task = tokio::spawn(manager.run(rx));
        (
            ConnectionHandle {
                commands: tx,
                status,
            },
            task,
        )
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    /// Subscribes to status transitions.
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    pub async fn connect(&self) -> TransportResult<()> {
        let (tx, rx) = oneshot::channel();
        self.command(Command::Connect(tx))?;
        rx.await.map_err(|_| NetworkError::ManagerStopped)?
    }

    pub fn disconnect(&self) -> TransportResult<()> {
        self.command(Command::Disconnect)
    }

    /// Sends a payload, queueing it when the socket is not open.
    pub async fn send(&self, payload: MessagePayload) -> SendOutcome {
        let (tx, rx) = oneshot::channel();
        if self.command(Command::Send(payload, tx)).is_err() {
            return SendOutcome::Failed;
        }
        rx.await.unwrap_or(SendOutcome::Failed)
    }

    /// Sends a payload on the live socket only.
    pub async fn deliver(&self, payload: MessagePayload) -> TransportResult<()> {
        let (tx, rx) = oneshot::channel();
        self.command(Command::Deliver(payload, tx))?;
        rx.await.map_err(|_| NetworkError::ManagerStopped)?
    }

    /// Reports a host connectivity transition.
    pub fn connectivity(&self, status: ConnectivityStatus) -> TransportResult<()> {
        self.command(Command::Connectivity(status))
    }

    /// Closes the socket and stops the manager task.
    pub fn shutdown(&self) -> TransportResult<()> {
        self.command(Command::Shutdown)
    }

    fn command(&self, command: Command) -> TransportResult<()> {
        self.commands
            .send(command)
            .map_err(|_| NetworkError::ManagerStopped)
    }
}

#[async_trait]
impl Redeliver for ConnectionHandle {
    async fn redeliver(&self, message: &PendingMessage) -> Result<(), NetworkError> {
        self.deliver(message.payload.clone()).await
    }
}

enum Step {
    Command(Command),
    Connectivity,
    Input(Input),
    Stop,
}

impl<C: Connector> ConnectionManager<C> {
    /// Runs the manager until shut down or every handle is dropped.
    ///
    /// Host connectivity transitions observed on the manager's monitor are
    /// applied as they happen.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut connectivity = self.monitor().subscribe();
        let _ = connectivity.borrow_and_update();

        loop {
            let step = tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => Step::Command(command),
                    None => Step::Stop,
                },
                Ok(()) = connectivity.changed() => Step::Connectivity,
                input = self.next_input() => Step::Input(input),
            };

            match step {
                Step::Command(Command::Shutdown) | Step::Stop => break,
                Step::Command(command) => self.apply(command),
                Step::Connectivity => {
                    let status = *connectivity.borrow_and_update();
                    self.handle_connectivity(status);
                }
                Step::Input(input) => self.handle_input(input),
            }
        }

        self.disconnect();
        tracing::debug!("connection manager stopped");
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Connect(reply) => {
                let _ = reply.send(self.connect());
            }
            Command::Disconnect => self.disconnect(),
            Command::Send(payload, reply) => {
                let _ = reply.send(self.send_message(payload));
            }
            Command::Deliver(payload, reply) => {
                let _ = reply.send(self.deliver(&payload));
            }
            // Applied when the monitor's watch fires.
            Command::Connectivity(status) => {
                self.monitor().set(status);
            }
            Command::Shutdown => {}
        }
    }
}
