//! Responses synthesized when the network cannot be reached.

use reqwest::StatusCode;
use serde_json::json;

use super::request::Response;

/// Error text of the JSON offline response.
pub const OFFLINE_JSON_ERROR: &str = "You are offline";

/// Confirmation text of the queued-write acknowledgement.
pub const QUEUED_MESSAGE: &str = "Message saved for delivery when online";

/// Body of the generic failure.
pub const NETWORK_ERROR_TEXT: &str = "Network error: You are currently offline";

/// `{error, offline: true, timestamp}` for API and status requests.
pub fn offline_json(timestamp: u64) -> Response {
    Response::json(
        StatusCode::OK,
        &json!({
            "error": OFFLINE_JSON_ERROR,
            "offline": true,
            "timestamp": timestamp,
        }),
    )
}

/// 202 acknowledgement for a write that was queued.
pub fn queued_ack(pending_id: &str, timestamp: u64) -> Response {
    Response::json(
        StatusCode::ACCEPTED,
        &json!({
            "status": "queued",
            "message": QUEUED_MESSAGE,
            "pendingId": pending_id,
            "timestamp": timestamp,
        }),
    )
}

/// 503 plain-text failure for everything else.
pub fn network_error() -> Response {
    Response::text(StatusCode::SERVICE_UNAVAILABLE, NETWORK_ERROR_TEXT)
}
