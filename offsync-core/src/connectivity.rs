// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Platform connectivity signal.
//!
//! A single online/offline flag shared by the foreground client and the
//! background worker. Whatever observes the host network (an OS hook, a
//! polling loop, a test) calls [`ConnectivityMonitor::set`]; everything else
//! reads or subscribes.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Host network reachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityStatus {
    Online,
    Offline,
}

impl ConnectivityStatus {
    pub fn is_online(self) -> bool {
        self == ConnectivityStatus::Online
    }
}

impl fmt::Display for ConnectivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectivityStatus::Online => f.write_str("online"),
            ConnectivityStatus::Offline => f.write_str("offline"),
        }
    }
}

/// Shared, observable connectivity flag.
#[derive(Clone, Debug)]
pub struct ConnectivityMonitor {
    tx: Arc<watch::Sender<ConnectivityStatus>>,
}

impl ConnectivityMonitor {
    /// Creates a monitor with the given initial status.
    pub fn new(initial: ConnectivityStatus) -> Self {
        let (tx, _rx) = watch::channel(initial);
        ConnectivityMonitor { tx: Arc::new(tx) }
    }

    /// Current status.
    pub fn status(&self) -> ConnectivityStatus {
        *self.tx.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.status().is_online()
    }

    /// Updates the status. Returns true if it changed.
    pub fn set(&self, status: ConnectivityStatus) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            tracing::info!(%status, "host connectivity changed");
        }
        changed
    }

    /// Subscribes to transitions.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityStatus> {
        self.tx.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        ConnectivityMonitor::new(ConnectivityStatus::Online)
    }
}
