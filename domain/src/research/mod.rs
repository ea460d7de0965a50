//! Research cycle model: tasks, outcomes, aggregation and scoring.

pub mod aggregation;
pub mod entities;
pub mod scoring;
pub mod value_objects;

pub use aggregation::{ContentBundle, FailureDetail, FailureSummary, ResultAggregator};
pub use entities::{
    CycleHistoryEntry, CycleStatus, CycleSummary, ResearchCycleResult, ResearchTask, TaskOutcome,
};
pub use scoring::score_candidates;
pub use value_objects::{
    CycleId, OutcomeStatus, PlatformName, ResearchItem, ResearchPayload, TaskId,
};
