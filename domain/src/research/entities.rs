//! Research entities: tasks, their outcomes and the per-cycle result.

use super::aggregation::FailureSummary;
use super::value_objects::{CycleId, OutcomeStatus, PlatformName, ResearchPayload, TaskId};
use crate::keyword::entities::KeywordRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

/// One (keyword, platform) unit of work.
///
/// Built at dispatch time and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ResearchTask {
    id: TaskId,
    keyword: String,
    platform: PlatformName,
    deadline: Instant,
    attempt: u32,
}

impl ResearchTask {
    pub fn new(
        id: TaskId,
        keyword: impl Into<String>,
        platform: PlatformName,
        deadline: Instant,
    ) -> Self {
        Self {
            id,
            keyword: keyword.into(),
            platform,
            deadline,
            attempt: 1,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn platform(&self) -> &PlatformName {
        &self.platform
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

/// Result of exactly one [`ResearchTask`].
///
/// A payload is present if and only if the status is
/// [`OutcomeStatus::Success`]; an error detail is present otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    task_id: TaskId,
    keyword: String,
    platform: PlatformName,
    status: OutcomeStatus,
    payload: Option<ResearchPayload>,
    error: Option<String>,
    elapsed_ms: u64,
}

impl TaskOutcome {
    pub fn success(
        task_id: TaskId,
        keyword: impl Into<String>,
        platform: PlatformName,
        payload: ResearchPayload,
        elapsed: Duration,
    ) -> Self {
        Self {
            task_id,
            keyword: keyword.into(),
            platform,
            status: OutcomeStatus::Success,
            payload: Some(payload),
            error: None,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    /// Build a failed outcome. A `Success` status is downgraded to
    /// `ProtocolError` since there is no payload to carry.
    pub fn failure(
        task_id: TaskId,
        keyword: impl Into<String>,
        platform: PlatformName,
        status: OutcomeStatus,
        error: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        let status = if status.is_success() {
            OutcomeStatus::ProtocolError
        } else {
            status
        };
        Self {
            task_id,
            keyword: keyword.into(),
            platform,
            status,
            payload: None,
            error: Some(error.into()),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn platform(&self) -> &PlatformName {
        &self.platform
    }

    pub fn status(&self) -> OutcomeStatus {
        self.status
    }

    pub fn payload(&self) -> Option<&ResearchPayload> {
        self.payload.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Number of normalized items carried, zero for failures.
    pub fn item_count(&self) -> usize {
        self.payload.as_ref().map(|p| p.items.len()).unwrap_or(0)
    }
}

/// Headline numbers of a cycle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CycleSummary {
    pub total_tasks: usize,
    pub successful_tasks: usize,
    pub failed_tasks: usize,
    /// Items returned per platform.
    pub platform_breakdown: BTreeMap<PlatformName, usize>,
    pub total_items: usize,
    pub new_keywords_count: usize,
    /// Keywords with at least one failed task.
    pub runs_with_errors: usize,
}

impl CycleSummary {
    pub fn from_outcomes(outcomes: &[TaskOutcome], new_keywords_count: usize) -> Self {
        let mut summary = CycleSummary {
            total_tasks: outcomes.len(),
            new_keywords_count,
            ..Default::default()
        };
        let mut keywords_with_errors = BTreeSet::new();

        for outcome in outcomes {
            if outcome.is_success() {
                summary.successful_tasks += 1;
                let items = outcome.item_count();
                *summary
                    .platform_breakdown
                    .entry(outcome.platform().clone())
                    .or_insert(0) += items;
                summary.total_items += items;
            } else {
                summary.failed_tasks += 1;
                keywords_with_errors.insert(outcome.keyword().to_lowercase());
            }
        }
        summary.runs_with_errors = keywords_with_errors.len();
        summary
    }
}

/// Overall status recorded in the cycle history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    /// Every task succeeded.
    Completed,
    /// Some tasks failed or some platforms were excluded.
    Partial,
    /// No task succeeded.
    Failed,
}

impl CycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleStatus::Completed => "completed",
            CycleStatus::Partial => "partial",
            CycleStatus::Failed => "failed",
        }
    }
}

/// Everything a research cycle produced, handed to the report sinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchCycleResult {
    pub cycle_id: CycleId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Keywords researched this cycle.
    pub keywords: Vec<String>,
    /// Platforms that were connected for the fan-out.
    pub platforms: Vec<PlatformName>,
    /// Platforms left out, with the reason.
    pub excluded_platforms: BTreeMap<PlatformName, String>,
    /// One outcome per task, ordered by task id.
    pub outcomes: Vec<TaskOutcome>,
    pub discovered: Vec<KeywordRecord>,
    pub recommendations: Vec<String>,
    pub failures: FailureSummary,
    pub summary: CycleSummary,
    /// Non-fatal problems (extraction, persistence).
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ResearchCycleResult {
    pub fn status(&self) -> CycleStatus {
        if self.summary.total_tasks > 0 && self.summary.successful_tasks == 0 {
            CycleStatus::Failed
        } else if self.summary.failed_tasks > 0 || !self.excluded_platforms.is_empty() {
            CycleStatus::Partial
        } else {
            CycleStatus::Completed
        }
    }

    /// Outcomes that succeeded, in task order.
    pub fn successes(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn history_entry(&self) -> CycleHistoryEntry {
        CycleHistoryEntry {
            cycle_id: self.cycle_id.clone(),
            finished_at: self.finished_at,
            keywords: self.keywords.clone(),
            status: self.status(),
            new_keywords: self.discovered.len(),
            total_items: self.summary.total_items,
        }
    }
}

/// One line of the durable cycle history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleHistoryEntry {
    pub cycle_id: CycleId,
    pub finished_at: DateTime<Utc>,
    pub keywords: Vec<String>,
    pub status: CycleStatus,
    pub new_keywords: usize,
    #[serde(default)]
    pub total_items: usize,
}
