//! Transport layer types for MCP stdio communication.
//!
//! MCP over stdio frames each JSON-RPC message as one line of JSON. The
//! client's background reader classifies every frame with
//! [`classify_message`] before dispatching it.

use serde::Serialize;

/// Classification of an incoming JSON-RPC message.
#[derive(Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// A response to a request we sent (has `id`, no `method`).
    Response { id: u64 },
    /// A request from the server (has `id` + `method`), e.g. `ping`.
    IncomingRequest { id: u64, method: String },
    /// A notification (has `method`, no `id`), e.g. `notifications/message`.
    Notification,
    /// Anything else, including responses with non-numeric ids.
    Unknown,
}

/// Classify a JSON-RPC message by inspecting `id` and `method` fields.
pub fn classify_message(json: &serde_json::Value) -> MessageKind {
    let id = json.get("id").and_then(|v| v.as_u64());
    let method = json.get("method").and_then(|v| v.as_str());

    match (id, method) {
        (Some(id), Some(method)) => MessageKind::IncomingRequest {
            id,
            method: method.to_string(),
        },
        (Some(id), None) => MessageKind::Response { id },
        (None, Some(_)) => MessageKind::Notification,
        (None, None) => MessageKind::Unknown,
    }
}

/// Serialize a message as one newline-terminated frame.
pub fn encode_frame<T: Serialize>(message: &T) -> serde_json::Result<String> {
    let mut frame = serde_json::to_string(message)?;
    frame.push('\n');
    Ok(frame)
}
