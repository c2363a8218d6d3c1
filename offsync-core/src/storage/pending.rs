// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Pending message queue operations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{QueueStore, StorageError};
use crate::network::MessagePayload;

/// Slot holding the ordered sequence of pending messages.
pub const PENDING_MESSAGES_KEY: &str = "pendingMessages";

/// A user message that could not be delivered live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMessage {
    /// Unique, time-ordered identifier assigned at enqueue time.
    pub pending_id: String,
    /// When the message was queued (milliseconds since the Unix epoch).
    pub saved_at: u64,
    /// The payload as the user submitted it.
    pub payload: MessagePayload,
}

impl PendingMessage {
    /// Stamps a payload with a fresh pending ID and the current time.
    pub fn new(payload: MessagePayload) -> Self {
        PendingMessage {
            pending_id: Uuid::now_v7().to_string(),
            saved_at: crate::now_millis(),
            payload,
        }
    }
}

impl QueueStore {
    // === Pending Message Operations ===

    /// Appends a payload to the pending sequence.
    pub fn try_enqueue(&self, payload: MessagePayload) -> Result<PendingMessage, StorageError> {
        let message = PendingMessage::new(payload);
        let queued = message.clone();

        let len = self.update::<Vec<PendingMessage>, _, _>(PENDING_MESSAGES_KEY, move |pending| {
            pending.push(queued);
            pending.len()
        })?;

        tracing::debug!(pending_id = %message.pending_id, queued = len, "message queued");
        Ok(message)
    }

    /// Appends a payload to the pending sequence.
    ///
    /// Returns the stored entry, or `None` (logged) if it could not be persisted.
    pub fn enqueue(&self, payload: MessagePayload) -> Option<PendingMessage> {
        match self.try_enqueue(payload) {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::error!(error = %e, "failed to queue pending message");
                None
            }
        }
    }

    /// Returns the pending sequence in insertion order (empty when unreadable).
    pub fn pending_messages(&self) -> Vec<PendingMessage> {
        self.get(PENDING_MESSAGES_KEY).unwrap_or_default()
    }

    /// Number of queued messages.
    pub fn pending_count(&self) -> usize {
        self.pending_messages().len()
    }

    /// Removes delivered entries from the pending sequence.
    ///
    /// The current sequence is re-read under the write lock, so entries
    /// enqueued while a drain was in progress survive. Returns the number of
    /// entries left.
    pub fn try_remove_pending(&self, delivered: &[String]) -> Result<usize, StorageError> {
        self.update::<Vec<PendingMessage>, _, _>(PENDING_MESSAGES_KEY, |pending| {
            pending.retain(|m| !delivered.contains(&m.pending_id));
            pending.len()
        })
    }

    /// Best-effort variant of [`QueueStore::try_remove_pending`].
    pub fn remove_pending(&self, delivered: &[String]) -> Option<usize> {
        match self.try_remove_pending(delivered) {
            Ok(remaining) => Some(remaining),
            Err(e) => {
                tracing::error!(error = %e, "failed to write back pending messages");
                None
            }
        }
    }
}
