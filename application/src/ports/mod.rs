//! Ports (interfaces) for the application layer
//!
//! Traits implemented by the infrastructure layer (adapters, stores, LLM
//! services, sinks) and by the presentation layer (progress).

pub mod event_logger;
pub mod extraction;
pub mod keyword_store;
pub mod platform_adapter;
pub mod progress;
pub mod report_sink;
