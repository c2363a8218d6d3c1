//! Last known connectivity record.

use super::QueueStore;
use crate::connectivity::ConnectivityStatus;

/// Slot holding the last connectivity status reported by a foreground.
pub const CONNECTION_STATUS_KEY: &str = "connectionStatus";

/// Last known connectivity status and when it was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityRecord {
    pub status: ConnectivityStatus,
    /// Write time (milliseconds since the Unix epoch).
    pub timestamp: u64,
}

impl QueueStore {
    /// Records a connectivity transition.
    pub fn save_connectivity(&self, status: ConnectivityStatus) -> bool {
        self.put(CONNECTION_STATUS_KEY, &status)
    }

    /// Returns the last recorded connectivity, if any.
    pub fn last_connectivity(&self) -> Option<ConnectivityRecord> {
        let record = match self.try_record(CONNECTION_STATUS_KEY) {
            Ok(record) => record?,
            Err(e) => {
                tracing::error!(error = %e, "failed to read connectivity record");
                return None;
            }
        };

        match serde_json::from_value(record.value) {
            Ok(status) => Some(ConnectivityRecord {
                status,
                timestamp: record.timestamp,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed connectivity record");
                None
            }
        }
    }
}
