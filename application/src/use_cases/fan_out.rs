//! Task Fan-Out Engine
//!
//! Runs the full keyword × platform cross-product. Every pair becomes an
//! independent tokio task with its own deadline; at most `max_in_flight`
//! run at once. The engine returns only after every task has exactly one
//! [`TaskOutcome`].
//!
//! # Cancellation
//!
//! The caller's token and the optional cycle deadline cancel every task
//! still pending, which then resolves as [`OutcomeStatus::Timeout`]. Tasks
//! that have not settled after the grace period are aborted and
//! force-resolved the same way.

use crate::config::CycleParams;
use crate::ports::event_logger::{EventLogger, NoEventLogger, ResearchEvent};
use crate::ports::platform_adapter::PlatformConnection;
use crate::ports::progress::{CycleProgressNotifier, CyclePhase};
use scout_domain::{OutcomeStatus, PlatformName, ResearchTask, TaskId, TaskOutcome};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct FanOutEngine {
    max_in_flight: usize,
    task_timeout: Duration,
    cycle_deadline: Option<Duration>,
    cancel_grace: Duration,
    logger: Arc<dyn EventLogger>,
}

impl FanOutEngine {
    pub fn new(max_in_flight: usize, task_timeout: Duration) -> Self {
        Self {
            max_in_flight: max_in_flight.max(1),
            task_timeout,
            cycle_deadline: None,
            cancel_grace: Duration::from_secs(5),
            logger: Arc::new(NoEventLogger),
        }
    }

    pub fn from_params(params: &CycleParams) -> Self {
        Self::new(params.max_in_flight, params.task_timeout)
            .with_cycle_deadline(params.cycle_deadline)
            .with_cancel_grace(params.cancel_grace)
    }

    pub fn with_cycle_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.cycle_deadline = deadline;
        self
    }

    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace = grace;
        self
    }

    pub fn with_event_logger(mut self, logger: Arc<dyn EventLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Research every keyword on every connection.
    ///
    /// Outcomes are returned ordered by task id (keyword-major). The result
    /// length is always `keywords.len() * connections.len()`.
    pub async fn run(
        &self,
        keywords: &[String],
        connections: &BTreeMap<PlatformName, Arc<dyn PlatformConnection>>,
        cancel: &CancellationToken,
        progress: &dyn CycleProgressNotifier,
    ) -> Vec<TaskOutcome> {
        let started = Instant::now();
        let cycle_token = cancel.child_token();
        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut pending: HashMap<TaskId, (String, PlatformName)> = HashMap::new();
        let mut join_set = JoinSet::new();

        let mut next_id = 0u64;
        for keyword in keywords {
            for (platform, connection) in connections {
                next_id += 1;
                let id = TaskId::new(next_id);
                pending.insert(id, (keyword.clone(), platform.clone()));

                let unit = TaskUnit {
                    id,
                    keyword: keyword.clone(),
                    platform: platform.clone(),
                    connection: Arc::clone(connection),
                    semaphore: Arc::clone(&semaphore),
                    timeout: self.task_timeout,
                    cancel: cycle_token.child_token(),
                };
                join_set.spawn(unit.run());
            }
        }

        let total = pending.len();
        info!(
            "Dispatching {} research task(s): {} keyword(s) x {} platform(s), {} in flight",
            total,
            keywords.len(),
            connections.len(),
            self.max_in_flight
        );
        progress.on_phase_start(CyclePhase::Research, total);

        let deadline_sleep = async {
            match self.cycle_deadline {
                Some(deadline) => tokio::time::sleep(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline_sleep);
        let mut deadline_fired = false;
        let mut grace_until: Option<tokio::time::Instant> = None;

        let mut outcomes = Vec::with_capacity(total);
        while !join_set.is_empty() {
            let joined = match grace_until {
                None => tokio::select! {
                    joined = join_set.join_next() => joined,
                    _ = cycle_token.cancelled() => {
                        grace_until = Some(tokio::time::Instant::now() + self.cancel_grace);
                        continue;
                    }
                    _ = &mut deadline_sleep, if !deadline_fired => {
                        warn!("Cycle deadline reached, cancelling outstanding tasks");
                        deadline_fired = true;
                        cycle_token.cancel();
                        continue;
                    }
                },
                Some(until) => match tokio::time::timeout_at(until, join_set.join_next()).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        warn!(
                            "{} task(s) ignored cancellation for {:?}, aborting",
                            join_set.len(),
                            self.cancel_grace
                        );
                        join_set.abort_all();
                        break;
                    }
                },
            };

            match joined {
                Some(Ok(outcome)) => {
                    pending.remove(&outcome.task_id());
                    self.record(&outcome, progress);
                    outcomes.push(outcome);
                }
                Some(Err(e)) => warn!("Research task terminated abnormally: {}", e),
                None => break,
            }
        }

        // Force-resolve anything that never reported back.
        let cancelled = cycle_token.is_cancelled();
        let mut leftovers: Vec<_> = pending.into_iter().collect();
        leftovers.sort_by_key(|(id, _)| *id);
        for (id, (keyword, platform)) in leftovers {
            let outcome = if cancelled {
                TaskOutcome::failure(
                    id,
                    keyword,
                    platform,
                    OutcomeStatus::Timeout,
                    "cycle cancelled before the task settled",
                    started.elapsed(),
                )
            } else {
                TaskOutcome::failure(
                    id,
                    keyword,
                    platform,
                    OutcomeStatus::ProtocolError,
                    "task terminated abnormally",
                    started.elapsed(),
                )
            };
            self.record(&outcome, progress);
            outcomes.push(outcome);
        }

        outcomes.sort_by_key(|o| o.task_id());
        progress.on_phase_complete(CyclePhase::Research);
        info!(
            "Research fan-out finished: {} outcome(s), {} succeeded, in {:?}",
            outcomes.len(),
            outcomes.iter().filter(|o| o.is_success()).count(),
            started.elapsed()
        );
        outcomes
    }

    fn record(&self, outcome: &TaskOutcome, progress: &dyn CycleProgressNotifier) {
        progress.on_task_complete(outcome.keyword(), outcome.platform(), outcome.status());
        self.logger.log(ResearchEvent::new(
            "task_outcome",
            serde_json::json!({
                "task_id": outcome.task_id().value(),
                "keyword": outcome.keyword(),
                "platform": outcome.platform().as_str(),
                "status": outcome.status().as_str(),
                "items": outcome.item_count(),
                "error": outcome.error(),
                "elapsed_ms": outcome.elapsed().as_millis() as u64,
            }),
        ));
    }
}

/// Everything one spawned task needs.
struct TaskUnit {
    id: TaskId,
    keyword: String,
    platform: PlatformName,
    connection: Arc<dyn PlatformConnection>,
    semaphore: Arc<Semaphore>,
    timeout: Duration,
    cancel: CancellationToken,
}

impl TaskUnit {
    async fn run(self) -> TaskOutcome {
        let queued = Instant::now();
        let permit = tokio::select! {
            permit = Arc::clone(&self.semaphore).acquire_owned() => permit,
            _ = self.cancel.cancelled() => {
                return self.fail(OutcomeStatus::Timeout, "cancelled before dispatch", queued);
            }
        };
        let Ok(_permit) = permit else {
            return self.fail(
                OutcomeStatus::PlatformUnavailable,
                "task queue closed",
                queued,
            );
        };

        let dispatched = Instant::now();
        let task = ResearchTask::new(
            self.id,
            self.keyword.clone(),
            self.platform.clone(),
            dispatched + self.timeout,
        );
        debug!("{} dispatched: '{}' on {}", task.id(), task.keyword(), task.platform());

        let search = self.connection.search(task.keyword(), task.deadline());
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                self.fail(OutcomeStatus::Timeout, "cycle deadline reached", dispatched)
            }
            result = tokio::time::timeout(self.timeout, search) => match result {
                Ok(Ok(payload)) => TaskOutcome::success(
                    task.id(),
                    task.keyword(),
                    task.platform().clone(),
                    payload,
                    dispatched.elapsed(),
                ),
                Ok(Err(error)) => self.fail(error.outcome_status(), error.to_string(), dispatched),
                Err(_) => self.fail(
                    OutcomeStatus::Timeout,
                    format!("exceeded task deadline of {:?}", self.timeout),
                    dispatched,
                ),
            },
        }
    }

    fn fail(&self, status: OutcomeStatus, error: impl Into<String>, since: Instant) -> TaskOutcome {
        TaskOutcome::failure(
            self.id,
            self.keyword.clone(),
            self.platform.clone(),
            status,
            error,
            since.elapsed(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::platform_adapter::AdapterError;
    use crate::ports::progress::NoProgress;
    use crate::testing::{MockConnection, RecordingProgress, SearchBehavior, platform};
    use std::collections::HashSet;

    fn connections(
        list: Vec<MockConnection>,
    ) -> (
        BTreeMap<PlatformName, Arc<dyn PlatformConnection>>,
        Vec<Arc<MockConnection>>,
    ) {
        let mocks: Vec<Arc<MockConnection>> = list.into_iter().map(Arc::new).collect();
        let map = mocks
            .iter()
            .map(|m| (m.platform().clone(), m.clone() as Arc<dyn PlatformConnection>))
            .collect();
        (map, mocks)
    }

    fn keywords(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_full_cross_product_without_duplicates() {
        let (conns, mocks) = connections(vec![
            MockConnection::new("github", SearchBehavior::Items(2)),
            MockConnection::new("arxiv", SearchBehavior::Items(1)),
            MockConnection::new("youtube", SearchBehavior::Items(3)),
        ]);
        let kws = keywords(&["rust", "wasm", "zig", "gleam"]);
        let progress = RecordingProgress::default();

        let outcomes = FanOutEngine::new(2, Duration::from_secs(5))
            .run(&kws, &conns, &CancellationToken::new(), &progress)
            .await;

        assert_eq!(outcomes.len(), 12);
        let pairs: HashSet<_> = outcomes
            .iter()
            .map(|o| (o.keyword().to_string(), o.platform().clone()))
            .collect();
        assert_eq!(pairs.len(), 12);
        let ids: HashSet<_> = outcomes.iter().map(|o| o.task_id()).collect();
        assert_eq!(ids.len(), 12);
        assert!(outcomes.iter().all(|o| o.is_success()));
        assert!(mocks.iter().all(|m| m.calls.lock().unwrap().len() == 4));
        assert_eq!(progress.completed.lock().unwrap().len(), 12);
        assert_eq!(
            progress.phases.lock().unwrap()[0],
            (CyclePhase::Research, 12)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_task_times_out_without_affecting_siblings() {
        let (conns, _mocks) = connections(vec![
            MockConnection::new("github", SearchBehavior::Items(1))
                .with_keyword("slow", SearchBehavior::Sleep(Duration::from_secs(30))),
            MockConnection::new("arxiv", SearchBehavior::Items(1)),
        ]);
        let kws = keywords(&["slow", "fast"]);

        let outcomes = FanOutEngine::new(4, Duration::from_secs(1))
            .run(&kws, &conns, &CancellationToken::new(), &NoProgress)
            .await;

        assert_eq!(outcomes.len(), 4);
        let timed_out: Vec<_> = outcomes
            .iter()
            .filter(|o| o.status() == OutcomeStatus::Timeout)
            .map(|o| (o.keyword(), o.platform().as_str()))
            .collect();
        assert_eq!(timed_out, vec![("slow", "github")]);
        assert_eq!(outcomes.iter().filter(|o| o.is_success()).count(), 3);
    }

    #[tokio::test]
    async fn test_protocol_errors_and_closed_connections() {
        let (conns, _mocks) = connections(vec![
            MockConnection::new(
                "web",
                SearchBehavior::Fail(AdapterError::Protocol("bad json".into())),
            ),
            MockConnection::new("hackernews", SearchBehavior::Fail(AdapterError::Closed)),
        ]);

        let outcomes = FanOutEngine::new(4, Duration::from_secs(5))
            .run(&keywords(&["rust"]), &conns, &CancellationToken::new(), &NoProgress)
            .await;

        let by_platform: BTreeMap<_, _> = outcomes
            .iter()
            .map(|o| (o.platform().as_str().to_string(), o.status()))
            .collect();
        assert_eq!(by_platform["web"], OutcomeStatus::ProtocolError);
        assert_eq!(by_platform["hackernews"], OutcomeStatus::PlatformUnavailable);
        assert!(outcomes.iter().all(|o| o.payload().is_none()));
        assert!(outcomes[0].error().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_deadline_resolves_hung_tasks_as_timeout() {
        let (conns, _mocks) = connections(vec![
            MockConnection::new("github", SearchBehavior::Hang),
            MockConnection::new("arxiv", SearchBehavior::Items(1)),
        ]);
        let kws = keywords(&["rust", "wasm", "zig"]);

        let started = tokio::time::Instant::now();
        let outcomes = FanOutEngine::new(1, Duration::from_secs(3600))
            .with_cycle_deadline(Some(Duration::from_secs(10)))
            .with_cancel_grace(Duration::from_secs(1))
            .run(&kws, &conns, &CancellationToken::new(), &NoProgress)
            .await;

        assert!(started.elapsed() <= Duration::from_secs(11));
        assert_eq!(outcomes.len(), 6);
        for outcome in &outcomes {
            if outcome.platform() == &platform("github") {
                assert_eq!(outcome.status(), OutcomeStatus::Timeout);
            }
        }
    }

    #[tokio::test]
    async fn test_external_cancellation() {
        let (conns, _mocks) = connections(vec![MockConnection::new(
            "github",
            SearchBehavior::Hang,
        )]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcomes = FanOutEngine::new(2, Duration::from_secs(3600))
            .run(&keywords(&["rust", "wasm"]), &conns, &cancel, &NoProgress)
            .await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.status() == OutcomeStatus::Timeout));
    }

    #[tokio::test]
    async fn test_no_connections_yields_no_outcomes() {
        let outcomes = FanOutEngine::new(2, Duration::from_secs(1))
            .run(
                &keywords(&["rust"]),
                &BTreeMap::new(),
                &CancellationToken::new(),
                &NoProgress,
            )
            .await;
        assert!(outcomes.is_empty());
    }
}
