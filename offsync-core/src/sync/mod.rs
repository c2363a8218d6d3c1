// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync Module
//!
//! Drains the pending-message queue once connectivity returns. The
//! transport used to redeliver queued messages is pluggable through
//! [`Redeliver`]; the deferred-work trigger is [`BackgroundSync`].

mod coordinator;
mod redelivery;

pub use coordinator::{SyncCoordinator, SyncReport};
pub use redelivery::FetchRedelivery;

use std::sync::Arc;

use async_trait::async_trait;

use crate::network::NetworkError;
use crate::storage::PendingMessage;

/// Background-sync tag that drains the pending-message queue.
pub const SYNC_TAG: &str = "sync-messages";

/// Sends one queued message to the server.
#[async_trait]
pub trait Redeliver: Send + Sync {
    async fn redeliver(&self, message: &PendingMessage) -> Result<(), NetworkError>;
}

#[async_trait]
impl<T: Redeliver + ?Sized> Redeliver for Arc<T> {
    async fn redeliver(&self, message: &PendingMessage) -> Result<(), NetworkError> {
        (**self).redeliver(message).await
    }
}

/// Deferred-work registration.
///
/// A registered tag is run by whoever implements this once the host is
/// online, possibly long after the registering context has gone away.
pub trait BackgroundSync: Send + Sync {
    /// Registers `tag`. Returns false if the registration was refused.
    fn register(&self, tag: &str) -> bool;
}
