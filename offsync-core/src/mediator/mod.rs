// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network Mediator
//!
//! Answers every outbound request cache-first, falls back to the network,
//! and synthesizes typed responses when the network is unreachable. Failed
//! writes to the real-time endpoint are queued instead of lost.
//!
//! # Example
//!
//! ```ignore
//! use offsync_core::mediator::{CacheStorage, HttpFetcher, MediatorConfig, NetworkMediator, Request};
//!
//! let config = MediatorConfig::default();
//! let mediator = NetworkMediator::new(
//!     config.clone(),
//!     CacheStorage::new(&data_dir.join("caches"))?,
//!     HttpFetcher::new(&config)?,
//!     store,
//!     monitor,
//! );
//! mediator.install().await?;
//! mediator.activate()?;
//! let response = mediator.handle_fetch(&Request::navigate(config.resolve("/")?)).await;
//! ```

mod cache;
mod config;
mod error;
mod fetcher;
mod mock;
mod offline;
mod request;

pub use cache::{Cache, CacheStorage};
pub use config::{MediatorConfig, DEFAULT_CACHE_NAME};
pub use error::{CacheError, FetchError, MediatorError};
pub use fetcher::{Fetcher, HttpFetcher};
pub use mock::MockFetcher;
pub use offline::{
    network_error, offline_json, queued_ack, NETWORK_ERROR_TEXT, OFFLINE_JSON_ERROR,
    QUEUED_MESSAGE,
};
pub use request::{Request, Response, ResponseType};

pub use reqwest::header;
pub use reqwest::{Method, StatusCode};

use std::sync::Arc;

use parking_lot::Mutex;

use crate::connectivity::{ConnectivityMonitor, ConnectivityStatus};
use crate::network::MessagePayload;
use crate::storage::QueueStore;

/// Cache-first request mediator.
pub struct NetworkMediator<F: Fetcher> {
    config: MediatorConfig,
    caches: CacheStorage,
    fetcher: F,
    store: Arc<QueueStore>,
    monitor: ConnectivityMonitor,
    last_known: Mutex<Option<ConnectivityStatus>>,
}

impl<F: Fetcher> NetworkMediator<F> {
    /// Creates a mediator. The last recorded connectivity is read from the
    /// store once, here.
    pub fn new(
        config: MediatorConfig,
        caches: CacheStorage,
        fetcher: F,
        store: Arc<QueueStore>,
        monitor: ConnectivityMonitor,
    ) -> Self {
        let last_known = store.last_connectivity().map(|record| record.status);
        tracing::debug!(?last_known, "mediator starting");
        NetworkMediator {
            config,
            caches,
            fetcher,
            store,
            monitor,
            last_known: Mutex::new(last_known),
        }
    }

    pub fn config(&self) -> &MediatorConfig {
        &self.config
    }

    pub fn caches(&self) -> &CacheStorage {
        &self.caches
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn store(&self) -> &Arc<QueueStore> {
        &self.store
    }

    /// Last connectivity reported by a foreground, if any.
    pub fn last_known_connectivity(&self) -> Option<ConnectivityStatus> {
        *self.last_known.lock()
    }

    /// Records a connectivity report from a foreground, in memory and in
    /// the store. Returns whether the store write succeeded.
    pub fn record_connectivity(&self, status: ConnectivityStatus) -> bool {
        *self.last_known.lock() = Some(status);
        self.store.save_connectivity(status)
    }

    // === Lifecycle ===

    /// Stores every precache asset in the active cache.
    ///
    /// Any failed asset aborts the install and leaves the cache untouched.
    pub async fn install(&self) -> Result<(), MediatorError> {
        let requests = self
            .config
            .precache
            .iter()
            .map(|path| self.config.resolve(path).map(Request::get))
            .collect::<Result<Vec<_>, _>>()?;

        let cache = self.caches.open(&self.config.cache_name)?;
        cache.add_all(&self.fetcher, &requests).await?;

        tracing::info!(
            cache = %self.config.cache_name,
            assets = requests.len(),
            "precache complete"
        );
        Ok(())
    }

    /// Deletes every cache except the active one. Returns the deleted names.
    pub fn activate(&self) -> Result<Vec<String>, MediatorError> {
        let mut deleted = Vec::new();
        for name in self.caches.keys()? {
            if name != self.config.cache_name {
                tracing::info!(cache = %name, "clearing old cache");
                self.caches.delete(&name)?;
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    // === Request Handling ===

    /// Answers a request. Never fails: network trouble becomes a
    /// synthesized response.
    pub async fn handle_fetch(&self, request: &Request) -> Response {
        let cache = match self.caches.open(&self.config.cache_name) {
            Ok(cache) => Some(cache),
            Err(e) => {
                tracing::warn!(error = %e, "active cache unavailable");
                None
            }
        };

        if let Some(hit) = cache.as_ref().and_then(|c| c.match_request(request)) {
            tracing::trace!(url = %request.url, "cache hit");
            return hit;
        }

        if request.accepts_html() && self.known_offline() {
            tracing::debug!(url = %request.url, "offline navigation, skipping network");
            return self.offline_page(cache.as_ref());
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    if let Some(cache) = &cache {
                        if let Err(e) = cache.put(request, &response) {
                            tracing::warn!(url = %request.url, error = %e, "failed to cache response");
                        }
                    }
                }
                response
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "fetch failed, answering offline");
                self.offline_response(request, cache.as_ref())
            }
        }
    }

    /// True when the platform reports offline and no foreground has said
    /// otherwise.
    fn known_offline(&self) -> bool {
        !self.monitor.is_online() && self.last_known_connectivity() != Some(ConnectivityStatus::Online)
    }

    fn offline_response(&self, request: &Request, cache: Option<&Cache>) -> Response {
        if request.accepts_html() {
            return self.offline_page(cache);
        }

        if self.config.is_api(&request.url) {
            return offline_json(crate::now_millis());
        }

        if request.is_write() && self.config.is_realtime(&request.url) {
            match self.queue_write(request) {
                Ok(pending_id) => return queued_ack(&pending_id, crate::now_millis()),
                Err(e) => tracing::error!(error = %e, "failed to queue offline write"),
            }
        }

        network_error()
    }

    fn offline_page(&self, cache: Option<&Cache>) -> Response {
        let page = self
            .config
            .resolve(&self.config.offline_page)
            .ok()
            .map(Request::get);

        match (cache, page) {
            (Some(cache), Some(page)) => cache.match_request(&page).unwrap_or_else(|| {
                tracing::warn!("offline page missing from cache");
                network_error()
            }),
            _ => network_error(),
        }
    }

    fn queue_write(&self, request: &Request) -> Result<String, crate::api::OffsyncError> {
        let payload: MessagePayload = serde_json::from_slice(&request.body)?;
        let message = self.store.try_enqueue(payload)?;
        tracing::info!(pending_id = %message.pending_id, "offline write queued");
        Ok(message.pending_id)
    }
}
