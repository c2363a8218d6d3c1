//! CLI Configuration

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use offsync_core::storage::QueueStore;
use offsync_core::OffsyncConfig;
use url::Url;

/// Outbox path used when `OFFSYNC_OUTBOX_URL` is unset.
const DEFAULT_OUTBOX_PATH: &str = "/api/outbox";

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Runtime configuration, environment applied.
    pub offsync: OffsyncConfig,
}

impl CliConfig {
    /// Loads the configuration from the process environment, then applies
    /// command-line overrides.
    pub fn load(data_dir: Option<PathBuf>, server: Option<String>) -> Result<Self> {
        Self::load_with(|key| env::var(key).ok(), data_dir, server)
    }

    /// Same as [`CliConfig::load`] with an explicit variable lookup.
    pub fn load_with<F>(lookup: F, data_dir: Option<PathBuf>, server: Option<String>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let explicit_dir = lookup("OFFSYNC_DATA_DIR").is_some();
        let mut offsync = OffsyncConfig::from_lookup(lookup)?;

        if let Some(dir) = data_dir {
            offsync.data_dir = dir;
        } else if !explicit_dir {
            offsync.data_dir = default_data_dir();
        }

        if let Some(server) = server {
            offsync.connection.server_url = server.clone();
            offsync.mediator.realtime_endpoint = server;
        }

        Ok(CliConfig { offsync })
    }

    /// Real-time server URL.
    pub fn server_url(&self) -> &str {
        &self.offsync.connection.server_url
    }

    /// HTTP endpoint that accepts redelivered messages.
    pub fn outbox_url(&self) -> Result<Url> {
        match &self.offsync.mediator.outbox_url {
            Some(url) => Ok(url.clone()),
            None => self
                .offsync
                .mediator
                .resolve(DEFAULT_OUTBOX_PATH)
                .context("origin cannot hold an outbox path"),
        }
    }

    /// Resolves a user-supplied target: absolute URLs as given, anything
    /// else relative to the configured origin.
    pub fn resolve_target(&self, target: &str) -> Result<Url> {
        match Url::parse(target) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .offsync
                .mediator
                .resolve(target)
                .with_context(|| format!("invalid path: {}", target)),
            Err(e) => Err(e).with_context(|| format!("invalid URL: {}", target)),
        }
    }

    /// Opens the queue database, creating the data directory if needed.
    pub fn open_store(&self) -> Result<Arc<QueueStore>> {
        fs::create_dir_all(&self.offsync.data_dir)
            .with_context(|| format!("cannot create {:?}", self.offsync.data_dir))?;
        let store = QueueStore::open(self.offsync.store_path())?;
        Ok(Arc::new(store))
    }
}

/// Platform data directory, e.g. `~/.local/share/offsync`.
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("offsync")
}
