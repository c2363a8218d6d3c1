//! Configuration
//!
//! Combined configuration for the foreground client and the worker.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use super::error::{OffsyncError, OffsyncResult};
use crate::mediator::MediatorConfig;
use crate::network::ConnectionConfig;

/// Configuration for an Offsync runtime.
#[derive(Debug, Clone)]
pub struct OffsyncConfig {
    /// Directory holding the queue database and response caches.
    pub data_dir: PathBuf,
    /// Real-time channel settings.
    pub connection: ConnectionConfig,
    /// Worker request-handling settings.
    pub mediator: MediatorConfig,
}

impl Default for OffsyncConfig {
    fn default() -> Self {
        OffsyncConfig {
            data_dir: PathBuf::from("./offsync-data"),
            connection: ConnectionConfig::default(),
            mediator: MediatorConfig::default(),
        }
    }
}

impl OffsyncConfig {
    /// Creates a config rooted at the given data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        OffsyncConfig {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Reads `OFFSYNC_*` environment variables over the defaults.
    pub fn from_env() -> OffsyncResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> OffsyncResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = OffsyncConfig::default();

        if let Some(dir) = lookup("OFFSYNC_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(server) = lookup("OFFSYNC_SERVER_URL") {
            config.connection.server_url = server.clone();
            config.mediator.realtime_endpoint = server;
        }
        if let Some(attempts) = parse(&lookup, "OFFSYNC_MAX_RECONNECT_ATTEMPTS") {
            config.connection.max_reconnect_attempts = attempts;
        }
        if let Some(ms) = parse(&lookup, "OFFSYNC_RECONNECT_INTERVAL_MS") {
            config.connection.reconnect_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = parse(&lookup, "OFFSYNC_HEARTBEAT_SECS") {
            config.connection.heartbeat_interval = Duration::from_secs(secs);
        }

        if let Some(origin) = lookup("OFFSYNC_ORIGIN") {
            config.mediator.origin = parse_url("OFFSYNC_ORIGIN", &origin)?;
        }
        if let Some(name) = lookup("OFFSYNC_CACHE_NAME") {
            config.mediator.cache_name = name;
        }
        if let Some(outbox) = lookup("OFFSYNC_OUTBOX_URL") {
            config.mediator.outbox_url = Some(parse_url("OFFSYNC_OUTBOX_URL", &outbox)?);
        }
        if let Some(secs) = parse(&lookup, "OFFSYNC_FETCH_TIMEOUT_SECS") {
            config.mediator.fetch_timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Path of the queue database.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("queue.db")
    }

    /// Root of the response caches.
    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("caches")
    }
}

fn parse<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}

fn parse_url(key: &str, raw: &str) -> OffsyncResult<Url> {
    Url::parse(raw).map_err(|e| OffsyncError::Configuration(format!("{}: {}", key, e)))
}
