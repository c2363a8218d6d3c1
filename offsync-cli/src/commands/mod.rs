//! CLI Commands

pub mod chat;
pub mod fetch;
pub mod install;
pub mod queue;

use std::sync::Arc;

use anyhow::Result;
use offsync_core::connectivity::{ConnectivityMonitor, ConnectivityStatus};
use offsync_core::mediator::{CacheStorage, HttpFetcher, NetworkMediator};
use offsync_core::storage::QueueStore;

use crate::config::CliConfig;

/// Connectivity as last recorded by a previous session, online if never
/// recorded.
pub fn initial_monitor(store: &QueueStore) -> ConnectivityMonitor {
    let status = store
        .last_connectivity()
        .map(|record| record.status)
        .unwrap_or(ConnectivityStatus::Online);
    ConnectivityMonitor::new(status)
}

/// Builds a mediator over HTTP with the on-disk response caches.
pub fn open_mediator(
    config: &CliConfig,
    store: Arc<QueueStore>,
    monitor: ConnectivityMonitor,
) -> Result<NetworkMediator<HttpFetcher>> {
    let caches = CacheStorage::new(&config.offsync.cache_dir())?;
    let fetcher = HttpFetcher::new(&config.offsync.mediator)?;
    Ok(NetworkMediator::new(
        config.offsync.mediator.clone(),
        caches,
        fetcher,
        store,
        monitor,
    ))
}
