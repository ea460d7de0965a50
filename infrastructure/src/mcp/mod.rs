//! Model Context Protocol client over stdio.
//!
//! Every research platform is an MCP server started as a child process.
//! [`client::McpClient`] speaks newline-delimited JSON-RPC 2.0 with it;
//! [`adapter::McpPlatformAdapter`] turns that into the application's
//! `PlatformAdapter` / `PlatformConnection` ports.

pub mod adapter;
pub mod client;
pub mod error;
pub mod protocol;
pub mod transport;
