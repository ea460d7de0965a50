//! Logging infrastructure: structured research event logging.
//!
//! Provides [`JsonlEventLogger`], a JSONL file writer that implements
//! the [`EventLogger`](scout_application::EventLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlEventLogger;
