//! Queue Commands
//!
//! Inspect and drain the pending-message queue.

use anyhow::Result;
use offsync_core::mediator::{CacheStorage, HttpFetcher};
use offsync_core::network::MessagePayload;
use offsync_core::sync::{FetchRedelivery, SyncCoordinator};

use crate::config::CliConfig;
use crate::display;

/// Lists queued messages, oldest first.
pub fn list(config: &CliConfig) -> Result<()> {
    let store = config.open_store()?;
    let pending = store.pending_messages();

    if pending.is_empty() {
        display::info("No pending messages");
        return Ok(());
    }
    println!("{} pending message(s):", pending.len());
    for (i, message) in pending.iter().enumerate() {
        display::display_pending(message, i);
    }
    Ok(())
}

/// Queues a chat message without trying the network.
pub fn add(config: &CliConfig, content: &str) -> Result<()> {
    let store = config.open_store()?;
    let message = store.try_enqueue(MessagePayload::chat(content))?;
    display::success(&format!("Queued {}", message.pending_id));
    Ok(())
}

/// Drains the queue to the HTTP outbox.
pub async fn sync(config: &CliConfig) -> Result<()> {
    let store = config.open_store()?;
    let outbox = config.outbox_url()?;
    let fetcher = HttpFetcher::new(&config.offsync.mediator)?;
    let coordinator = SyncCoordinator::new(store, FetchRedelivery::new(fetcher, outbox.clone()));

    println!("Delivering to {}...", outbox);
    match coordinator.sync_pending_messages().await {
        Some(report) => display::display_sync_report(&report),
        None => display::info("Nothing to sync"),
    }
    Ok(())
}

/// Shows recorded connectivity, queue depth and cache generations.
pub fn status(config: &CliConfig) -> Result<()> {
    let store = config.open_store()?;

    println!("Data dir:   {:?}", config.offsync.data_dir);
    println!("Server:     {}", config.server_url());
    match store.last_connectivity() {
        Some(record) => println!("Last seen:  {:?} at {}", record.status, record.timestamp),
        None => println!("Last seen:  (never recorded)"),
    }
    println!("Pending:    {}", store.pending_count());

    let caches = CacheStorage::new(&config.offsync.cache_dir())?;
    let names = caches.keys()?;
    if names.is_empty() {
        println!("Caches:     (none, run 'offsync install')");
    } else {
        println!("Caches:     {}", names.join(", "));
    }
    Ok(())
}
