//! Install Command
//!
//! Precaches the application shell and drops older cache generations.

use anyhow::Result;

use super::{initial_monitor, open_mediator};
use crate::config::CliConfig;
use crate::display;

/// Runs install then activate.
pub async fn run(config: &CliConfig) -> Result<()> {
    let store = config.open_store()?;
    let monitor = initial_monitor(&store);
    let mediator = open_mediator(config, store, monitor)?;
    let settings = mediator.config();

    println!(
        "Precaching {} asset(s) from {}...",
        settings.precache.len(),
        settings.origin
    );
    mediator.install().await?;
    let removed = mediator.activate()?;

    display::success(&format!("Cache '{}' is active", settings.cache_name));
    for name in removed {
        display::info(&format!("Removed old cache '{}'", name));
    }
    Ok(())
}
