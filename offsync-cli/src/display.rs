//! Display Helpers
//!
//! Terminal output formatting and styling.

use console::{style, Style};
use offsync_core::api::ClientEvent;
use offsync_core::mediator::Response;
use offsync_core::network::MessagePayload;
use offsync_core::storage::PendingMessage;
use offsync_core::sync::SyncReport;

/// Prints a success message.
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Prints an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Prints a warning message.
pub fn warning(msg: &str) {
    println!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Prints an info message.
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// One-line rendering of a payload.
fn payload_text(payload: &MessagePayload) -> String {
    match payload.display_text() {
        Some(text) => text.to_string(),
        None => format!("<{}>", payload.kind().unwrap_or("unknown")),
    }
}

/// Displays a queue entry in a compact format.
pub fn display_pending(message: &PendingMessage, index: usize) {
    let dim = Style::new().dim();
    println!(
        "  {}. {} {}",
        index + 1,
        payload_text(&message.payload),
        dim.apply_to(format!("({} @ {})", message.pending_id, message.saved_at))
    );
}

/// Displays the outcome of a queue drain.
pub fn display_sync_report(report: &SyncReport) {
    if report.remaining == 0 {
        success(&format!("Delivered {} queued message(s)", report.synced));
    } else {
        warning(&format!(
            "Delivered {}, {} still queued",
            report.synced, report.remaining
        ));
    }
}

/// Displays a mediated response: status line, then body.
pub fn display_response(response: &Response) {
    let status = response.status;
    let line = format!("{}", status);
    if status.is_success() {
        println!("{}", style(line).green());
    } else {
        println!("{}", style(line).yellow());
    }
    if let Some(content_type) = response.content_type() {
        println!("{}", style(content_type).dim());
    }
    println!();
    println!("{}", response.text_body());
}

/// Prints a runtime event during an interactive session.
pub fn display_event(event: &ClientEvent) {
    match event {
        ClientEvent::ConnectionStatusChanged { status } => {
            info(&format!("connection: {:?}", status));
        }
        ClientEvent::MessageReceived { payload } => {
            println!("{} {}", style("<").cyan().bold(), payload_text(payload));
        }
        ClientEvent::MessageDropped { reason } => {
            tracing::debug!(%reason, "dropped inbound frame");
        }
        ClientEvent::MessageSent { payload } => {
            println!("{} {}", style(">").dim(), payload_text(payload));
        }
        ClientEvent::MessageQueued { pending_id } => {
            warning(&format!("queued for later delivery ({})", pending_id));
        }
        ClientEvent::ConnectivityChanged { status, .. } => {
            info(&format!("host is {:?}", status));
        }
        ClientEvent::MessagesSynced {
            count, remaining, ..
        } => {
            info(&format!("synced {} message(s), {} remaining", count, remaining));
        }
        ClientEvent::Error { message } => error(message),
    }
}
