//! Sync Coordinator
//!
//! Redelivers queued messages in insertion order and writes back only the
//! ones that failed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{Redeliver, SYNC_TAG};
use crate::storage::QueueStore;

/// Result of one drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Messages delivered and removed from the queue.
    pub synced: usize,
    /// Messages left in the queue after the write-back.
    pub remaining: usize,
    /// When the drain finished (milliseconds since the Unix epoch).
    pub timestamp: u64,
}

/// Drains the pending-message queue through a [`Redeliver`] transport.
pub struct SyncCoordinator<R: Redeliver> {
    store: Arc<QueueStore>,
    redeliver: R,
}

impl<R: Redeliver> SyncCoordinator<R> {
    pub fn new(store: Arc<QueueStore>, redeliver: R) -> Self {
        SyncCoordinator { store, redeliver }
    }

    pub fn redeliver(&self) -> &R {
        &self.redeliver
    }

    /// Runs the drain for a background-sync tag. Other tags are ignored.
    pub async fn handle_sync(&self, tag: &str) -> Option<SyncReport> {
        if tag != SYNC_TAG {
            tracing::debug!(tag, "ignoring unknown sync tag");
            return None;
        }
        self.sync_pending_messages().await
    }

    /// Redelivers every queued message.
    ///
    /// Returns `None` when the queue was empty or the write-back failed;
    /// otherwise the counts to report to foregrounds.
    pub async fn sync_pending_messages(&self) -> Option<SyncReport> {
        let pending = self.store.pending_messages();
        if pending.is_empty() {
            return None;
        }
        tracing::info!(count = pending.len(), "syncing pending messages");

        let mut delivered = Vec::with_capacity(pending.len());
        for message in &pending {
            match self.redeliver.redeliver(message).await {
                Ok(()) => delivered.push(message.pending_id.clone()),
                Err(e) => {
                    tracing::warn!(pending_id = %message.pending_id, error = %e, "redelivery failed");
                }
            }
        }

        // Messages queued while the drain ran are preserved by the write-back.
        let remaining = match self.store.try_remove_pending(&delivered) {
            Ok(remaining) => remaining,
            Err(e) => {
                tracing::error!(error = %e, "failed to write back pending messages");
                return None;
            }
        };

        let report = SyncReport {
            synced: delivered.len(),
            remaining,
            timestamp: crate::now_millis(),
        };
        tracing::info!(synced = report.synced, remaining, "sync complete");
        Some(report)
    }
}
