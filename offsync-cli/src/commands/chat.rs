//! Chat Command
//!
//! Interactive session: a worker and a foreground client sharing the
//! on-disk queue. Lines typed on stdin are sent, or queued while offline.

use std::sync::Arc;

use anyhow::Result;
use offsync_core::api::{CallbackHandler, Client, ClientEvent, Worker};
use offsync_core::connectivity::ConnectivityStatus;
use offsync_core::mediator::HttpFetcher;
use offsync_core::network::{ConnectionManager, SendOutcome, WebSocketConnector};
use offsync_core::sync::{FetchRedelivery, SyncCoordinator};
use tokio::io::{self, AsyncBufReadExt, BufReader};

use super::{initial_monitor, open_mediator};
use crate::config::CliConfig;
use crate::display;

/// Session commands typed as `/name`.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Offline,
    Online,
    Status,
    Sync,
    Quit,
    Unknown(&'a str),
    Say(&'a str),
}

fn parse_input(line: &str) -> Option<Input<'_>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let input = match line {
        "/offline" => Input::Offline,
        "/online" => Input::Online,
        "/status" => Input::Status,
        "/sync" => Input::Sync,
        "/quit" | "/exit" => Input::Quit,
        other if other.starts_with('/') => Input::Unknown(other),
        text => Input::Say(text),
    };
    Some(input)
}

/// Runs the interactive session until `/quit` or end of input.
pub async fn run(config: &CliConfig) -> Result<()> {
    let store = config.open_store()?;
    let monitor = initial_monitor(&store);
    let mediator = open_mediator(config, store.clone(), monitor.clone())?;

    let redelivery = FetchRedelivery::new(
        HttpFetcher::new(&config.offsync.mediator)?,
        config.outbox_url()?,
    );
    let coordinator = SyncCoordinator::new(store.clone(), redelivery);
    let (worker, worker_task) = Worker::new(mediator, coordinator, monitor.clone()).spawn();

    // The shell may be unreachable; the session still works from the queue.
    if let Err(e) = worker.install().await {
        display::warning(&format!("Install failed, continuing without cache: {}", e));
    }

    let manager = ConnectionManager::new(
        WebSocketConnector::new(),
        config.offsync.connection.clone(),
        store.clone(),
        monitor,
    );
    let client = Client::builder(manager, worker.attach())
        .handler(Arc::new(CallbackHandler::new(|event: ClientEvent| {
            display::display_event(&event)
        })))
        .background_sync(Arc::new(worker.clone()))
        .start();

    println!("Connecting to {}...", config.server_url());
    if let Err(e) = client.connect().await {
        display::warning(&format!("Not connected: {}", e));
    }
    display::info("Type a message, or /online /offline /status /sync /quit");

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(input) = parse_input(&line) else {
            continue;
        };
        match input {
            Input::Offline => {
                client.set_connectivity(ConnectivityStatus::Offline);
            }
            Input::Online => {
                client.set_connectivity(ConnectivityStatus::Online);
            }
            Input::Status => {
                let state = client.state();
                println!(
                    "online: {}  connected: {}  pending: {}",
                    state.is_online,
                    state.is_connected,
                    store.pending_count()
                );
                if let Some(error) = state.error {
                    display::warning(&error);
                }
            }
            Input::Sync => match worker.sync_now().await? {
                Some(report) => display::display_sync_report(&report),
                None => display::info("Nothing to sync"),
            },
            Input::Quit => break,
            Input::Unknown(command) => {
                display::warning(&format!("Unknown command: {}", command));
            }
            Input::Say(text) => {
                if let SendOutcome::Failed = client.send(text).await {
                    display::error("Message could not be sent or queued");
                }
            }
        }
    }

    client.shutdown().await;
    worker.shutdown()?;
    worker_task.await?;
    Ok(())
}
