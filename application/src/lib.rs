//! Application layer for trend-scout
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::CycleParams;
pub use ports::{
    event_logger::{EventLogger, NoEventLogger, ResearchEvent},
    extraction::{ExtractionError, KeywordExtractor, Recommender},
    keyword_store::{KeywordStore, StoreError},
    platform_adapter::{AdapterError, PlatformAdapter, PlatformConnection},
    progress::{CyclePhase, CycleProgressNotifier, NoProgress},
    report_sink::{ReportSink, SinkAck, SinkError},
};
pub use use_cases::connection_manager::{ConnectionManager, StartResults, StopError};
pub use use_cases::fan_out::FanOutEngine;
pub use use_cases::keyword_lifecycle::{
    CycleUpdate, KeywordLifecycleUpdater, LifecycleChanges, LifecycleError, LifecyclePolicy,
    Selection,
};
pub use use_cases::report_assembler::{ReportAssembler, SinkReport};
pub use use_cases::run_cycle::{CycleError, CycleReport, RunCycleInput, RunResearchCycleUseCase};
