//! Offsync CLI
//!
//! Command-line client for the Offsync runtime: precache the application
//! shell, fetch through the cache-first mediator, inspect and drain the
//! pending queue, or chat interactively with offline queueing.

mod commands;
mod config;
mod display;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "offsync")]
#[command(version, about = "Offline-first real-time messaging client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory (default: platform data dir + /offsync)
    #[arg(long, global = true, env = "OFFSYNC_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Real-time server URL
    #[arg(long, global = true, env = "OFFSYNC_SERVER_URL")]
    server: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Precache the application shell and activate the cache
    Install,

    /// Fetch a URL or origin-relative path through the cache-first mediator
    Fetch {
        /// URL, or path relative to the origin
        target: String,

        /// Treat the request as a page navigation
        #[arg(long)]
        navigate: bool,

        /// Send as a POST with this body
        #[arg(long)]
        body: Option<String>,
    },

    /// Inspect and drain the pending-message queue
    #[command(subcommand)]
    Queue(QueueCommands),

    /// Show connectivity, queue depth and caches
    Status,

    /// Interactive session with offline queueing
    Chat,
}

#[derive(Subcommand)]
enum QueueCommands {
    /// List pending messages
    List,

    /// Queue a message for later delivery
    Add {
        /// Message text
        content: String,
    },

    /// Deliver pending messages to the HTTP outbox
    Sync,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("offsync=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load(cli.data_dir, cli.server)?;
    tracing::debug!(data_dir = ?config.offsync.data_dir, "configuration loaded");

    match cli.command {
        Commands::Install => commands::install::run(&config).await?,
        Commands::Fetch {
            target,
            navigate,
            body,
        } => commands::fetch::run(&config, &target, navigate, body).await?,
        Commands::Queue(cmd) => match cmd {
            QueueCommands::List => commands::queue::list(&config)?,
            QueueCommands::Add { content } => commands::queue::add(&config, &content)?,
            QueueCommands::Sync => commands::queue::sync(&config).await?,
        },
        Commands::Status => commands::queue::status(&config)?,
        Commands::Chat => commands::chat::run(&config).await?,
    }

    Ok(())
}
