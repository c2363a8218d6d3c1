//! Messenger wire types.

use serde::{Deserialize, Serialize};

use crate::connectivity::ConnectivityStatus;
use crate::sync::SyncReport;

/// Foreground → worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    ConnectivityChange { status: ConnectivityStatus },
}

/// Worker → every foreground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    ConnectivityUpdate {
        status: ConnectivityStatus,
        timestamp: u64,
    },
    MessagesSynced {
        count: usize,
        remaining: usize,
        timestamp: u64,
    },
}

impl From<SyncReport> for WorkerMessage {
    fn from(report: SyncReport) -> Self {
        WorkerMessage::MessagesSynced {
            count: report.synced,
            remaining: report.remaining,
            timestamp: report.timestamp,
        }
    }
}
