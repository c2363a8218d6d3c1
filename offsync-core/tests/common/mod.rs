// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Common Test Utilities
//!
//! Shared fixtures for the integration tests: stores, managers wired to a
//! mock connector, and mediators wired to a mock fetcher.

#![allow(dead_code)]

pub mod strategies;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use offsync_core::connectivity::{ConnectivityMonitor, ConnectivityStatus};
use offsync_core::mediator::{CacheStorage, MediatorConfig, MockFetcher, NetworkMediator};
use offsync_core::network::{
    ConnectionConfig, ConnectionManager, MessagePayload, MockConnector, NetworkError,
};
use offsync_core::storage::{PendingMessage, QueueStore};
use offsync_core::sync::Redeliver;

pub const ORIGIN: &str = "http://localhost:3000";
pub const SERVER: &str = "ws://localhost:8080";

pub fn memory_store() -> Arc<QueueStore> {
    Arc::new(QueueStore::in_memory().unwrap())
}

pub fn monitor(online: bool) -> ConnectivityMonitor {
    ConnectivityMonitor::new(if online {
        ConnectivityStatus::Online
    } else {
        ConnectivityStatus::Offline
    })
}

/// Manager on a mock connector with the default timings.
pub fn manager(
    store: Arc<QueueStore>,
    monitor: ConnectivityMonitor,
) -> (ConnectionManager<MockConnector>, MockConnector) {
    let connector = MockConnector::new();
    let manager = ConnectionManager::new(
        connector.clone(),
        ConnectionConfig::new(SERVER),
        store,
        monitor,
    );
    (manager, connector)
}

/// Mediator caching under `temp`, with every precache asset routed.
pub fn mediator(
    temp: &TempDir,
    config: MediatorConfig,
    store: Arc<QueueStore>,
    monitor: ConnectivityMonitor,
) -> (NetworkMediator<MockFetcher>, MockFetcher) {
    let fetcher = MockFetcher::new();
    route_shell(&fetcher, &config);
    let mediator = NetworkMediator::new(
        config,
        CacheStorage::new(&temp.path().join("caches")).unwrap(),
        fetcher.clone(),
        store,
        monitor,
    );
    (mediator, fetcher)
}

pub fn route_shell(fetcher: &MockFetcher, config: &MediatorConfig) {
    for path in &config.precache {
        let url = config.resolve(path).unwrap();
        fetcher.route_ok(url.as_str(), &format!("<html>{}</html>", path));
    }
}

pub fn chat(content: &str) -> MessagePayload {
    MessagePayload::chat(content)
}

/// Redelivery that fails for chosen message contents and records the rest.
#[derive(Clone, Default)]
pub struct ScriptedRedeliver {
    failing: Arc<Mutex<Vec<String>>>,
    delivered: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRedeliver {
    pub fn failing(contents: &[&str]) -> Self {
        let redeliver = ScriptedRedeliver::default();
        redeliver
            .failing
            .lock()
            .extend(contents.iter().map(|c| c.to_string()));
        redeliver
    }

    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().clone()
    }

    pub fn heal(&self) {
        self.failing.lock().clear();
    }
}

#[async_trait]
impl Redeliver for ScriptedRedeliver {
    async fn redeliver(&self, message: &PendingMessage) -> Result<(), NetworkError> {
        let text = message.payload.display_text().unwrap_or_default().to_string();
        if self.failing.lock().contains(&text) {
            return Err(NetworkError::SendFailed(format!("refused {}", text)));
        }
        self.delivered.lock().push(text);
        Ok(())
    }
}
