//! Network error types.

use thiserror::Error;

/// Errors raised by the real-time channel and redelivery paths.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("host is offline")]
    Offline,

    #[error("not connected")]
    NotConnected,

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("maximum reconnect attempts exceeded")]
    MaxRetriesExceeded,

    /// The remote end answered but refused the message.
    #[error("delivery rejected: {0}")]
    Rejected(String),

    #[error("connection manager stopped")]
    ManagerStopped,
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        NetworkError::InvalidMessage(err.to_string())
    }
}
