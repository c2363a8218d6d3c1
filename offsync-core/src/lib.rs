//! Offsync Core Library
//!
//! Offline-first runtime for real-time clients: a self-healing socket
//! connection, a cache-first request mediator, and a durable queue that
//! redelivers writes once connectivity returns.

pub mod api;
pub mod connectivity;
pub mod mediator;
pub mod messenger;
pub mod network;
pub mod storage;
pub mod sync;

pub use api::{
    Client, ClientEvent, ClientState, OffsyncConfig, OffsyncError, OffsyncResult, Worker,
    WorkerHandle,
};
pub use connectivity::{ConnectivityMonitor, ConnectivityStatus};
pub use mediator::{CacheStorage, HttpFetcher, MediatorConfig, NetworkMediator, Request, Response};
pub use messenger::{ClientMessage, Messenger, WorkerMessage};
pub use network::{
    ConnectionConfig, ConnectionHandle, ConnectionManager, ConnectionStatus, MessagePayload,
    MockConnector, NetworkError, SendOutcome, WebSocketConnector,
};
pub use storage::{PendingMessage, QueueStore, StorageError};
pub use sync::{FetchRedelivery, Redeliver, SyncCoordinator, SyncReport, SYNC_TAG};

/// Milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time before UNIX epoch")
        .as_millis() as u64
}
