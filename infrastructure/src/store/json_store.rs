//! JSON file keyword store.
//!
//! Layout of the store directory:
//!
//! - `keywords.json`: every [`KeywordRecord`] as a JSON array
//! - `history.json`: [`CycleHistoryEntry`] array, oldest first
//!
//! Writes go to a `.tmp` sibling which is then renamed over the target, so
//! a crash never leaves a half-written file behind. All operations are
//! serialized through one async mutex.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scout_application::ports::keyword_store::{KeywordStore, StoreError};
use scout_domain::{CycleHistoryEntry, CycleId, KeywordCatalog, KeywordRecord};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// History entries kept on disk; older ones are dropped.
pub const MAX_HISTORY: usize = 500;

const KEYWORDS_FILE: &str = "keywords.json";
const HISTORY_FILE: &str = "history.json";

pub struct JsonKeywordStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonKeywordStore {
    /// Store rooted at `dir`. Nothing is touched until the first operation.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn keywords_path(&self) -> PathBuf {
        self.dir.join(KEYWORDS_FILE)
    }

    fn history_path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }

    async fn read_records(&self) -> Result<Vec<KeywordRecord>, StoreError> {
        read_array(&self.keywords_path()).await
    }

    async fn write_records(&self, records: &[KeywordRecord]) -> Result<(), StoreError> {
        write_atomic(&self.keywords_path(), records).await
    }
}

/// A missing file reads as an empty array.
async fn read_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(&bytes)
        .map_err(|e| StoreError::Corrupt(format!("{}: {}", path.display(), e)))
}

async fn write_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| StoreError::Corrupt(format!("serialize {}: {}", path.display(), e)))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    debug!("Wrote {}", path.display());
    Ok(())
}

#[async_trait]
impl KeywordStore for JsonKeywordStore {
    async fn load_all(&self) -> Result<Vec<KeywordRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        self.read_records().await
    }

    async fn upsert_batch(&self, records: &[KeywordRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        let _guard = self.lock.lock().await;
        let mut stored = self.read_records().await?;
        for record in records {
            match stored.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => stored.push(record.clone()),
            }
        }
        // Reject batches that would break text uniqueness.
        let catalog = KeywordCatalog::from_records(stored)?;
        self.write_records(catalog.records()).await
    }

    async fn mark_used_batch(
        &self,
        keywords: &[String],
        cycle: &CycleId,
        at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().await;
        let mut catalog = KeywordCatalog::from_records(self.read_records().await?)?;
        let changed = catalog.mark_used(keywords, cycle, at).len();
        if changed > 0 {
            self.write_records(catalog.records()).await?;
        }
        Ok(changed)
    }

    async fn record_cycle(&self, entry: &CycleHistoryEntry) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let path = self.history_path();
        let mut history: Vec<CycleHistoryEntry> = read_array(&path).await?;
        history.push(entry.clone());
        let skip = history.len().saturating_sub(MAX_HISTORY);
        write_atomic(&path, &history[skip..]).await
    }

    async fn history(&self, limit: usize) -> Result<Vec<CycleHistoryEntry>, StoreError> {
        let _guard = self.lock.lock().await;
        let history: Vec<CycleHistoryEntry> = read_array(&self.history_path()).await?;
        let skip = history.len().saturating_sub(limit);
        Ok(history[skip..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_domain::{CycleStatus, KeywordId, KeywordSource, KeywordState};

    fn record(id: u64, text: &str) -> KeywordRecord {
        KeywordRecord::new(KeywordId::new(id), text, KeywordSource::Seed, Utc::now())
    }

    fn entry(cycle: &str) -> CycleHistoryEntry {
        CycleHistoryEntry {
            cycle_id: CycleId::new(cycle),
            finished_at: Utc::now(),
            keywords: vec!["rust".into()],
            status: CycleStatus::Completed,
            new_keywords: 2,
            total_items: 10,
        }
    }

    #[tokio::test]
    async fn test_empty_store_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonKeywordStore::new(dir.path().join("keywords"));
        assert!(store.load_all().await.unwrap().is_empty());
        assert!(store.history(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_inserts_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonKeywordStore::new(dir.path());

        store
            .upsert_batch(&[record(1, "rust"), record(2, "wasm")])
            .await
            .unwrap();
        let mut updated = record(2, "wasm");
        updated.state = KeywordState::Active;
        store.upsert_batch(&[updated]).await.unwrap();

        let records = store.load_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].state, KeywordState::Active);
        assert!(!dir.path().join("keywords.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_upsert_rejects_duplicate_text() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonKeywordStore::new(dir.path());
        store.upsert_batch(&[record(1, "Rust")]).await.unwrap();

        let result = store.upsert_batch(&[record(2, "rust")]).await;
        assert!(matches!(result, Err(StoreError::Invalid(_))));
        assert_eq!(store.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mark_used_is_idempotent_per_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonKeywordStore::new(dir.path());
        store
            .upsert_batch(&[record(1, "rust"), record(2, "wasm")])
            .await
            .unwrap();
        let cycle = CycleId::new("c1");
        let keywords = vec!["rust".to_string(), "unknown".to_string()];

        assert_eq!(store.mark_used_batch(&keywords, &cycle, Utc::now()).await.unwrap(), 1);
        assert_eq!(store.mark_used_batch(&keywords, &cycle, Utc::now()).await.unwrap(), 0);

        let records = store.load_all().await.unwrap();
        assert_eq!(records[0].state, KeywordState::Used);
        assert_eq!(records[0].times_used, 1);
        assert_eq!(records[1].state, KeywordState::Discovered);
    }

    #[tokio::test]
    async fn test_history_is_appended_and_limited() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonKeywordStore::new(dir.path());
        for cycle in ["a", "b", "c"] {
            store.record_cycle(&entry(cycle)).await.unwrap();
        }

        let last_two = store.history(2).await.unwrap();
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].cycle_id, CycleId::new("b"));
        assert_eq!(last_two[1].cycle_id, CycleId::new("c"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("keywords.json"), "{not json").unwrap();
        let store = JsonKeywordStore::new(dir.path());
        assert!(matches!(store.load_all().await, Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        JsonKeywordStore::new(dir.path())
            .upsert_batch(&[record(7, "vector search")])
            .await
            .unwrap();
        let records = JsonKeywordStore::new(dir.path()).load_all().await.unwrap();
        assert_eq!(records[0].id, KeywordId::new(7));
        assert_eq!(records[0].text, "vector search");
    }
}
