//! Infrastructure layer for trend-scout
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: MCP platform connections, the JSON keyword
//! store, LLM clients, report sinks, the JSONL event log and
//! configuration file loading.

pub mod config;
pub mod llm;
pub mod logging;
pub mod mcp;
pub mod platforms;
pub mod reports;
pub mod store;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigSource, ConfigValidationError, FileConfig, LlmSelection, process_env,
};
pub use llm::{LlmKeywordExtractor, LlmRecommender, LlmSettings, build_client};
pub use logging::JsonlEventLogger;
pub use mcp::adapter::McpPlatformAdapter;
pub use platforms::BUILTIN_PLATFORMS;
pub use reports::build_sinks;
pub use store::JsonKeywordStore;
