//! Mediator error types.

use std::io;

use thiserror::Error;

/// Errors from the response cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored body is not valid base64
    #[error("corrupt cache entry: {0}")]
    Corrupt(#[from] base64::DecodeError),

    /// Cache names become directory names
    #[error("invalid cache name: {0:?}")]
    InvalidName(String),
}

/// Errors from issuing a network request.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network/request error
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The host has no connectivity
    #[error("host is offline")]
    Offline,

    /// The request could not be built
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Errors from the install/activate lifecycle.
#[derive(Debug, Error)]
pub enum MediatorError {
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// A precached asset answered with a non-OK status.
    #[error("precache of {url} failed with status {status}")]
    Precache { url: String, status: u16 },

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
