// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! API Error Types
//!
//! Unified error type for the Offsync API layer.

use thiserror::Error;

use crate::mediator::{CacheError, FetchError, MediatorError};
use crate::network::NetworkError;
use crate::storage::StorageError;

/// Unified error type for Offsync operations.
#[derive(Error, Debug)]
pub enum OffsyncError {
    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Network operation failed.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Install or activate failed.
    #[error("mediator error: {0}")]
    Mediator(#[from] MediatorError),

    /// Response cache failed.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// HTTP request failed.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The worker task has stopped.
    #[error("worker stopped")]
    WorkerStopped,
}

/// Result type for Offsync operations.
pub type OffsyncResult<T> = Result<T, OffsyncError>;
