//! Keyword store port
//!
//! Durable storage of the keyword catalog and the cycle history. Only the
//! keyword lifecycle updater holds a store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scout_domain::{CycleHistoryEntry, CycleId, DomainError, KeywordRecord};
use thiserror::Error;

/// Errors from keyword store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store data is corrupt: {0}")]
    Corrupt(String),

    #[error("Invalid catalog: {0}")]
    Invalid(#[from] DomainError),
}

#[async_trait]
pub trait KeywordStore: Send + Sync {
    /// Load every record. A failure here is fatal for a cycle.
    async fn load_all(&self) -> Result<Vec<KeywordRecord>, StoreError>;

    /// Insert or replace records by id.
    async fn upsert_batch(&self, records: &[KeywordRecord]) -> Result<(), StoreError>;

    /// Mark keywords used by `cycle` at `at`; re-marking within the same
    /// cycle is a no-op. Returns the number of records changed.
    async fn mark_used_batch(
        &self,
        keywords: &[String],
        cycle: &CycleId,
        at: DateTime<Utc>,
    ) -> Result<usize, StoreError>;

    /// Append one entry to the cycle history.
    async fn record_cycle(&self, entry: &CycleHistoryEntry) -> Result<(), StoreError>;

    /// Most recent history entries, newest last.
    async fn history(&self, limit: usize) -> Result<Vec<CycleHistoryEntry>, StoreError>;
}
