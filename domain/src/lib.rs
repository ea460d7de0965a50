//! Domain layer for trend-scout
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Keyword lifecycle
//!
//! The [`KeywordCatalog`] holds every keyword ever seen. Keywords move
//! `Discovered -> Active -> Used -> Archived`; a cycle promotes a batch to
//! `Active`, researches it, marks it `Used` and inserts what it discovered.
//!
//! ## Research cycle
//!
//! A cycle researches every active keyword on every connected platform.
//! Each (keyword, platform) pair is a [`ResearchTask`] with exactly one
//! [`TaskOutcome`]; the outcomes are aggregated into a [`ContentBundle`] and
//! a [`FailureSummary`] and end up in a [`ResearchCycleResult`].

pub mod core;
pub mod keyword;
pub mod platform;
pub mod prompt;
pub mod research;
pub mod util;

// Re-export commonly used types
pub use core::error::DomainError;
pub use keyword::{
    KeywordCatalog, KeywordId, KeywordRecord, KeywordSource, KeywordState, canonical_key,
};
pub use platform::{ConnectionState, PlatformSpec};
pub use prompt::{ResearchPromptTemplate, parse_bullet_list, parse_keyword_list};
pub use research::{
    ContentBundle, CycleHistoryEntry, CycleId, CycleStatus, CycleSummary, FailureDetail,
    FailureSummary, OutcomeStatus, PlatformName, ResearchCycleResult, ResearchItem,
    ResearchPayload, ResearchTask, ResultAggregator, TaskId, TaskOutcome, score_candidates,
};
