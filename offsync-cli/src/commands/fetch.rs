//! Fetch Command
//!
//! Sends one request through the mediator.

use anyhow::Result;
use offsync_core::mediator::Request;

use super::{initial_monitor, open_mediator};
use crate::config::CliConfig;
use crate::display;

/// Fetches `target` cache-first and prints the response.
///
/// With `navigate` the request is treated as a page load and falls back to
/// the offline page. A `body` turns it into a POST.
pub async fn run(
    config: &CliConfig,
    target: &str,
    navigate: bool,
    body: Option<String>,
) -> Result<()> {
    let url = config.resolve_target(target)?;
    let store = config.open_store()?;
    let monitor = initial_monitor(&store);
    let mediator = open_mediator(config, store, monitor)?;

    let request = match (body, navigate) {
        (Some(body), _) => Request::post(url, body),
        (None, true) => Request::navigate(url),
        (None, false) => Request::get(url),
    };
    let response = mediator.handle_fetch(&request).await;

    display::display_response(&response);
    Ok(())
}
