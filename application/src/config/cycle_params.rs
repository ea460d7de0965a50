//! Cycle parameters: research cycle control.
//!
//! [`CycleParams`] groups the static parameters that control one
//! [`RunResearchCycleUseCase`](crate::use_cases::run_cycle::RunResearchCycleUseCase)
//! execution: concurrency, timeouts, retry policy and keyword lifecycle
//! limits.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Research cycle control parameters.
///
/// | Group | Fields |
/// |-------|--------|
/// | Connect | `connect_attempts`, `connect_retry_delay`, `close_timeout` |
/// | Fan-out | `max_in_flight`, `task_timeout`, `cycle_deadline`, `cancel_grace` |
/// | Keywords | `batch_size`, `staleness`, `max_new_keywords`, `seed_keywords` |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleParams {
    /// Handshake attempts per platform (first try plus retries).
    pub connect_attempts: u32,
    /// Pause between handshake attempts.
    pub connect_retry_delay: Duration,
    /// Bound on closing one connection.
    pub close_timeout: Duration,
    /// Maximum research tasks running at once.
    pub max_in_flight: usize,
    /// Deadline of a single (keyword, platform) task.
    pub task_timeout: Duration,
    /// Deadline of the whole fan-out, if any.
    pub cycle_deadline: Option<Duration>,
    /// Time tasks get to settle after cancellation before being aborted.
    pub cancel_grace: Duration,
    /// Keywords promoted into each cycle.
    pub batch_size: usize,
    /// Age after which unused keywords are archived.
    pub staleness: Duration,
    /// Cap on keywords discovered per cycle.
    pub max_new_keywords: usize,
    /// Inserted as `Discovered` when the catalog is empty.
    pub seed_keywords: Vec<String>,
}

impl Default for CycleParams {
    fn default() -> Self {
        Self {
            connect_attempts: 2,
            connect_retry_delay: Duration::from_secs(2),
            close_timeout: Duration::from_secs(10),
            max_in_flight: 8,
            task_timeout: Duration::from_secs(60),
            cycle_deadline: Some(Duration::from_secs(15 * 60)),
            cancel_grace: Duration::from_secs(5),
            batch_size: 5,
            staleness: Duration::from_secs(30 * 24 * 60 * 60),
            max_new_keywords: 10,
            seed_keywords: Vec::new(),
        }
    }
}

impl CycleParams {
    // ==================== Builder Methods ====================

    pub fn with_connect_attempts(mut self, attempts: u32) -> Self {
        self.connect_attempts = attempts.max(1);
        self
    }

    pub fn with_connect_retry_delay(mut self, delay: Duration) -> Self {
        self.connect_retry_delay = delay;
        self
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max.max(1);
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn with_cycle_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.cycle_deadline = deadline;
        self
    }

    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace = grace;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_staleness_days(mut self, days: u64) -> Self {
        self.staleness = Duration::from_secs(days * 24 * 60 * 60);
        self
    }

    pub fn with_max_new_keywords(mut self, max: usize) -> Self {
        self.max_new_keywords = max;
        self
    }

    pub fn with_seed_keywords(mut self, seeds: Vec<String>) -> Self {
        self.seed_keywords = seeds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = CycleParams::default();
        assert_eq!(params.connect_attempts, 2);
        assert_eq!(params.connect_retry_delay, Duration::from_secs(2));
        assert_eq!(params.batch_size, 5);
        assert_eq!(params.max_new_keywords, 10);
        assert_eq!(params.staleness, Duration::from_secs(30 * 86_400));
    }

    #[test]
    fn test_builders_clamp_to_one() {
        let params = CycleParams::default()
            .with_connect_attempts(0)
            .with_max_in_flight(0)
            .with_staleness_days(7);
        assert_eq!(params.connect_attempts, 1);
        assert_eq!(params.max_in_flight, 1);
        assert_eq!(params.staleness, Duration::from_secs(7 * 86_400));
    }
}
