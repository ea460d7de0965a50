//! JSON-RPC protocol types for MCP communication.
//!
//! - **Requests**: client → server (`initialize`, `tools/list`, `tools/call`)
//! - **Responses**: server → client (result or error)
//! - **Notifications**: either direction, no id (`notifications/initialized`)
//! - **Incoming requests**: server → client (`ping`)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// Protocol revision sent in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Global request ID counter for JSON-RPC requests.
static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    REQUEST_ID.fetch_add(1, Ordering::SeqCst)
}

/// JSON-RPC request
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Creates a new JSON-RPC request with an auto-generated ID.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: next_id(),
            method: method.into(),
            params,
        }
    }
}

/// Outgoing notification (no id, no response).
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params: None,
        }
    }
}

/// JSON-RPC response
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
}

/// JSON-RPC error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Response we send to a server-initiated request.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponseOut {
    pub jsonrpc: &'static str,
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl JsonRpcResponseOut {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn method_not_found(id: u64, method: &str) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code: -32601,
                message: format!("Method not found: {}", method),
                data: None,
            }),
        }
    }
}

/// `initialize` request parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: &'static str,
    pub capabilities: Value,
    pub client_info: Implementation,
}

impl Default for InitializeParams {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            capabilities: serde_json::json!({}),
            client_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

/// Name and version of a client or server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// `initialize` result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    #[serde(default)]
    pub protocol_version: String,
    #[serde(default)]
    pub server_info: Option<Implementation>,
}

/// One tool advertised by `tools/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// `tools/list` result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResult {
    #[serde(default)]
    pub tools: Vec<ToolInfo>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// `tools/call` request parameters
#[derive(Debug, Clone, Serialize)]
pub struct CallToolParams {
    pub name: String,
    pub arguments: Value,
}

/// One content block of a tool result.
///
/// Only `text` blocks carry data the platform handlers read; other block
/// types (images, resources) are kept by type name only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
        }
    }
}

/// `tools/call` result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    #[serde(default)]
    pub is_error: bool,
}

impl CallToolResult {
    /// Text blocks in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
    }

    /// All text blocks joined by newlines.
    pub fn joined_text(&self) -> String {
        self.texts().collect::<Vec<_>>().join("\n")
    }

    /// The data the server returned as JSON.
    ///
    /// Structured content wins. Otherwise a single text block is parsed as
    /// JSON (falling back to a JSON string), and several text blocks become
    /// an array with one element per block.
    pub fn json(&self) -> Option<Value> {
        if let Some(structured) = &self.structured_content {
            return Some(structured.clone());
        }
        let texts: Vec<&str> = self.texts().collect();
        match texts.as_slice() {
            [] => None,
            [single] => Some(parse_or_string(single)),
            many => Some(Value::Array(many.iter().map(|t| parse_or_string(t)).collect())),
        }
    }
}

fn parse_or_string(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization_skips_missing_params() {
        let request = JsonRpcRequest::new("tools/list", None);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["method"], "tools/list");
        assert!(value.get("params").is_none());
    }

    #[test]
    fn test_initialize_params_shape() {
        let value = serde_json::to_value(InitializeParams::default()).unwrap();
        assert_eq!(value["protocolVersion"], PROTOCOL_VERSION);
        assert!(value["clientInfo"]["name"].is_string());
    }

    #[test]
    fn test_call_tool_result_prefers_structured_content() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "ignored"}],
            "structuredContent": {"items": [1, 2]},
        }))
        .unwrap();
        assert_eq!(result.json(), Some(json!({"items": [1, 2]})));
    }

    #[test]
    fn test_call_tool_result_parses_text_blocks() {
        let single = CallToolResult {
            content: vec![ContentBlock::text(r#"{"total_count": 3}"#)],
            ..Default::default()
        };
        assert_eq!(single.json(), Some(json!({"total_count": 3})));

        let many = CallToolResult {
            content: vec![
                ContentBlock::text(r#"{"title": "a"}"#),
                ContentBlock::text("plain"),
            ],
            ..Default::default()
        };
        assert_eq!(many.json(), Some(json!([{"title": "a"}, "plain"])));

        assert_eq!(CallToolResult::default().json(), None);
    }

    #[test]
    fn test_method_not_found_response() {
        let out = JsonRpcResponseOut::method_not_found(7, "sampling/createMessage");
        let value = serde_json::to_value(&out).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["error"]["code"], -32601);
        assert!(value.get("result").is_none());
    }
}
