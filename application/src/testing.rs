//! Hand-written port doubles shared by the use case tests.

use crate::ports::extraction::{ExtractionError, KeywordExtractor, Recommender};
use crate::ports::keyword_store::{KeywordStore, StoreError};
use crate::ports::platform_adapter::{AdapterError, PlatformAdapter, PlatformConnection};
use crate::ports::progress::{CycleProgressNotifier, CyclePhase};
use crate::ports::report_sink::{ReportSink, SinkAck, SinkError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scout_domain::{
    ContentBundle, CycleHistoryEntry, CycleId, KeywordCatalog, KeywordRecord, OutcomeStatus,
    PlatformName, PlatformSpec, ResearchCycleResult, ResearchItem, ResearchPayload, TaskOutcome,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub fn platform(name: &str) -> PlatformName {
    PlatformName::parse(name).unwrap()
}

pub fn spec(name: &str) -> PlatformSpec {
    PlatformSpec::new(platform(name), "mock-server").with_init_timeout(Duration::from_secs(5))
}

// ==================== Platforms ====================

#[derive(Clone)]
pub enum SearchBehavior {
    Items(usize),
    Fail(AdapterError),
    Sleep(Duration),
    Hang,
}

pub struct MockConnection {
    platform: PlatformName,
    default: SearchBehavior,
    per_keyword: HashMap<String, SearchBehavior>,
    close_error: Option<AdapterError>,
    pub calls: Mutex<Vec<String>>,
    pub closed: AtomicBool,
}

impl MockConnection {
    pub fn new(name: &str, default: SearchBehavior) -> Self {
        Self {
            platform: platform(name),
            default,
            per_keyword: HashMap::new(),
            close_error: None,
            calls: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn with_keyword(mut self, keyword: &str, behavior: SearchBehavior) -> Self {
        self.per_keyword.insert(keyword.to_string(), behavior);
        self
    }

    pub fn with_close_error(mut self, error: AdapterError) -> Self {
        self.close_error = Some(error);
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn payload_for(keyword: &str, count: usize) -> ResearchPayload {
    let items = (0..count)
        .map(|i| {
            ResearchItem::new(format!("{} result {}", keyword, i))
                .with_description(format!("notes about {}", keyword))
        })
        .collect();
    ResearchPayload::new(items)
}

#[async_trait]
impl PlatformConnection for MockConnection {
    fn platform(&self) -> &PlatformName {
        &self.platform
    }

    async fn search(
        &self,
        keyword: &str,
        _deadline: Instant,
    ) -> Result<ResearchPayload, AdapterError> {
        self.calls.lock().unwrap().push(keyword.to_string());
        let behavior = self
            .per_keyword
            .get(keyword)
            .unwrap_or(&self.default)
            .clone();
        match behavior {
            SearchBehavior::Items(count) => Ok(payload_for(keyword, count)),
            SearchBehavior::Fail(error) => Err(error),
            SearchBehavior::Sleep(duration) => {
                tokio::time::sleep(duration).await;
                Ok(payload_for(keyword, 1))
            }
            SearchBehavior::Hang => std::future::pending().await,
        }
    }

    async fn close(&self) -> Result<(), AdapterError> {
        self.closed.store(true, Ordering::SeqCst);
        match &self.close_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

pub enum ConnectBehavior {
    Ok,
    Fail(AdapterError),
    Hang,
}

pub struct MockAdapter {
    platform: PlatformName,
    pub connection: Arc<MockConnection>,
    script: Mutex<VecDeque<ConnectBehavior>>,
    pub attempts: AtomicUsize,
}

impl MockAdapter {
    pub fn new(connection: MockConnection) -> Self {
        Self {
            platform: connection.platform.clone(),
            connection: Arc::new(connection),
            script: Mutex::new(VecDeque::new()),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn ready(name: &str, items: usize) -> Self {
        Self::new(MockConnection::new(name, SearchBehavior::Items(items)))
    }

    /// Queue connect results; once exhausted every attempt succeeds.
    pub fn with_connects(self, behaviors: Vec<ConnectBehavior>) -> Self {
        *self.script.lock().unwrap() = behaviors.into();
        self
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlatformAdapter for MockAdapter {
    fn platform(&self) -> &PlatformName {
        &self.platform
    }

    async fn connect(
        &self,
        _spec: &PlatformSpec,
    ) -> Result<Arc<dyn PlatformConnection>, AdapterError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next.unwrap_or(ConnectBehavior::Ok) {
            ConnectBehavior::Ok => Ok(self.connection.clone() as Arc<dyn PlatformConnection>),
            ConnectBehavior::Fail(error) => Err(error),
            ConnectBehavior::Hang => std::future::pending().await,
        }
    }
}

// ==================== Store ====================

#[derive(Default)]
pub struct MockStore {
    pub records: Mutex<Vec<KeywordRecord>>,
    pub history: Mutex<Vec<CycleHistoryEntry>>,
    pub fail_load: bool,
    pub fail_writes: bool,
    pub upserts: AtomicUsize,
}

impl MockStore {
    pub fn with_records(records: Vec<KeywordRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> Vec<KeywordRecord> {
        self.records.lock().unwrap().clone()
    }

    fn write_guard(&self) -> Result<(), StoreError> {
        if self.fail_writes {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeywordStore for MockStore {
    async fn load_all(&self) -> Result<Vec<KeywordRecord>, StoreError> {
        if self.fail_load {
            return Err(StoreError::Corrupt("unreadable".to_string()));
        }
        Ok(self.snapshot())
    }

    async fn upsert_batch(&self, records: &[KeywordRecord]) -> Result<(), StoreError> {
        self.write_guard()?;
        self.upserts.fetch_add(1, Ordering::SeqCst);
        let mut stored = self.records.lock().unwrap();
        for record in records {
            match stored.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => stored.push(record.clone()),
            }
        }
        Ok(())
    }

    async fn mark_used_batch(
        &self,
        keywords: &[String],
        cycle: &CycleId,
        at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        self.write_guard()?;
        let mut stored = self.records.lock().unwrap();
        let mut catalog = KeywordCatalog::from_records(stored.clone())?;
        let changed = catalog.mark_used(keywords, cycle, at).len();
        *stored = catalog.into_records();
        Ok(changed)
    }

    async fn record_cycle(&self, entry: &CycleHistoryEntry) -> Result<(), StoreError> {
        self.write_guard()?;
        self.history.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn history(&self, limit: usize) -> Result<Vec<CycleHistoryEntry>, StoreError> {
        let history = self.history.lock().unwrap();
        let skip = history.len().saturating_sub(limit);
        Ok(history[skip..].to_vec())
    }
}

// ==================== Extraction ====================

pub struct MockExtractor {
    pub result: Result<Vec<String>, ExtractionError>,
    pub calls: AtomicUsize,
}

impl MockExtractor {
    pub fn returning(candidates: &[&str]) -> Self {
        Self {
            result: Ok(candidates.iter().map(|s| s.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: Err(ExtractionError::Llm("model offline".to_string())),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl KeywordExtractor for MockExtractor {
    async fn extract(
        &self,
        _bundle: &ContentBundle,
        _known: &[String],
    ) -> Result<Vec<String>, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

pub struct MockRecommender;

#[async_trait]
impl Recommender for MockRecommender {
    async fn recommend(
        &self,
        outcomes: &[TaskOutcome],
        _history: &[KeywordRecord],
        discovered: &[KeywordRecord],
    ) -> Result<Vec<String>, ExtractionError> {
        Ok(vec![format!(
            "{} outcomes, {} new keywords",
            outcomes.len(),
            discovered.len()
        )])
    }
}

// ==================== Sinks and progress ====================

pub struct MockSink {
    name: String,
    fail: bool,
    pub published: Mutex<Vec<ResearchCycleResult>>,
}

impl MockSink {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fail: false,
            published: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            fail: true,
            ..Self::new(name)
        }
    }
}

#[async_trait]
impl ReportSink for MockSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&self, result: &ResearchCycleResult) -> Result<SinkAck, SinkError> {
        if self.fail {
            return Err(SinkError::Http {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        self.published.lock().unwrap().push(result.clone());
        Ok(SinkAck::at(format!("{}://{}", self.name, result.cycle_id)))
    }
}

#[derive(Default)]
pub struct RecordingProgress {
    pub phases: Mutex<Vec<(CyclePhase, usize)>>,
    pub completed: Mutex<Vec<(String, PlatformName, OutcomeStatus)>>,
}

impl CycleProgressNotifier for RecordingProgress {
    fn on_phase_start(&self, phase: CyclePhase, total: usize) {
        self.phases.lock().unwrap().push((phase, total));
    }

    fn on_task_complete(&self, keyword: &str, platform: &PlatformName, status: OutcomeStatus) {
        self.completed
            .lock()
            .unwrap()
            .push((keyword.to_string(), platform.clone(), status));
    }

    fn on_phase_complete(&self, _phase: CyclePhase) {}
}
