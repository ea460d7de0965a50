//! Error types for the MCP client

use thiserror::Error;

/// Result type alias for MCP operations
pub type Result<T> = std::result::Result<T, McpError>;

/// Errors that can occur when talking to an MCP server
#[derive(Error, Debug)]
pub enum McpError {
    #[error("I/O error talking to MCP server: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("JSON-RPC error (code {code}): {message}")]
    RpcError { code: i64, message: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Tool '{tool}' reported an error: {message}")]
    ToolError { tool: String, message: String },

    #[error("Server exited or closed its output")]
    TransportClosed,

    #[error("Request cancelled: connection closing")]
    Cancelled,
}
