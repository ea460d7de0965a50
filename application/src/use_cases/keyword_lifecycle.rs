//! Keyword Lifecycle Updater
//!
//! The only component that writes to the [`KeywordStore`]. Transitions are
//! applied to the in-memory [`KeywordCatalog`] first (pure, synchronous) and
//! persisted in a separate step, so a failed write never loses the
//! in-memory view of the cycle.

use crate::config::CycleParams;
use crate::ports::event_logger::{EventLogger, NoEventLogger, ResearchEvent};
use crate::ports::keyword_store::{KeywordStore, StoreError};
use chrono::{DateTime, Utc};
use scout_domain::{
    CycleHistoryEntry, CycleId, DomainError, KeywordCatalog, KeywordRecord, KeywordSource,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from manual keyword operations
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Limits applied by the updater.
#[derive(Debug, Clone)]
pub struct LifecyclePolicy {
    pub batch_size: usize,
    pub staleness: chrono::Duration,
    pub max_new_per_cycle: usize,
    pub seed_keywords: Vec<String>,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self::from_params(&CycleParams::default())
    }
}

impl LifecyclePolicy {
    pub fn from_params(params: &CycleParams) -> Self {
        Self {
            batch_size: params.batch_size,
            staleness: chrono::Duration::from_std(params.staleness)
                .unwrap_or_else(|_| chrono::Duration::days(30)),
            max_new_per_cycle: params.max_new_keywords,
            seed_keywords: params.seed_keywords.clone(),
        }
    }
}

/// Keywords selected for a cycle.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Seed keywords inserted because the catalog was empty.
    pub seeded: Vec<KeywordRecord>,
    /// Keywords promoted to `Active`, in research order.
    pub promoted: Vec<KeywordRecord>,
}

impl Selection {
    pub fn keywords(&self) -> Vec<String> {
        self.promoted.iter().map(|r| r.text.clone()).collect()
    }
}

/// What a finished cycle feeds back into the catalog.
#[derive(Debug, Clone)]
pub struct CycleUpdate<'a> {
    pub cycle_id: &'a CycleId,
    pub cycle_time: DateTime<Utc>,
    /// Keywords that had at least one task, whatever the outcome.
    pub used_keywords: &'a [String],
    /// Scored extraction candidates, best first.
    pub candidates: &'a [(String, u8)],
}

/// Records changed by [`KeywordLifecycleUpdater::apply_cycle`].
#[derive(Debug, Clone, Default)]
pub struct LifecycleChanges {
    pub marked_used: Vec<KeywordRecord>,
    pub discovered: Vec<KeywordRecord>,
    pub archived: Vec<KeywordRecord>,
}

impl LifecycleChanges {
    pub fn is_empty(&self) -> bool {
        self.marked_used.is_empty() && self.discovered.is_empty() && self.archived.is_empty()
    }
}

pub struct KeywordLifecycleUpdater {
    store: Arc<dyn KeywordStore>,
    policy: LifecyclePolicy,
    logger: Arc<dyn EventLogger>,
}

impl KeywordLifecycleUpdater {
    pub fn new(store: Arc<dyn KeywordStore>, policy: LifecyclePolicy) -> Self {
        Self {
            store,
            policy,
            logger: Arc::new(NoEventLogger),
        }
    }

    pub fn with_event_logger(mut self, logger: Arc<dyn EventLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn policy(&self) -> &LifecyclePolicy {
        &self.policy
    }

    /// Load the catalog from the store.
    pub async fn load_catalog(&self) -> Result<KeywordCatalog, StoreError> {
        let records = self.store.load_all().await?;
        debug!("Loaded {} keyword record(s)", records.len());
        Ok(KeywordCatalog::from_records(records)?)
    }

    /// Seed an empty catalog and promote the next batch to `Active`.
    pub fn select_for_cycle(&self, catalog: &mut KeywordCatalog, now: DateTime<Utc>) -> Selection {
        let mut selection = Selection::default();

        if catalog.is_empty() {
            for seed in &self.policy.seed_keywords {
                if let Ok(Some(record)) = catalog.insert(seed, KeywordSource::Seed, now) {
                    selection.seeded.push(record);
                }
            }
            if !selection.seeded.is_empty() {
                info!("Seeded empty catalog with {} keyword(s)", selection.seeded.len());
            }
        }

        selection.promoted = catalog.promote(self.policy.batch_size);
        selection
    }

    /// Persist the records touched by [`Self::select_for_cycle`].
    pub async fn persist_selection(&self, selection: &Selection) -> Result<(), StoreError> {
        let mut records = selection.seeded.clone();
        records.retain(|seed| !selection.promoted.iter().any(|p| p.id == seed.id));
        records.extend(selection.promoted.iter().cloned());
        if records.is_empty() {
            return Ok(());
        }
        self.store.upsert_batch(&records).await
    }

    /// Apply a finished cycle to the catalog: mark used, insert
    /// discoveries, archive stale keywords.
    ///
    /// Applying the same update twice changes nothing the second time.
    pub fn apply_cycle(&self, catalog: &mut KeywordCatalog, update: &CycleUpdate<'_>) -> LifecycleChanges {
        let marked_used = catalog.mark_used(update.used_keywords, update.cycle_id, update.cycle_time);
        let discovered = catalog.discover(
            update.candidates,
            update.cycle_id,
            update.cycle_time,
            self.policy.max_new_per_cycle,
        );
        let archived = catalog.archive_stale(self.policy.staleness, update.cycle_time);

        for record in &discovered {
            self.logger.log(ResearchEvent::new(
                "keyword_discovered",
                serde_json::json!({
                    "cycle_id": update.cycle_id.as_str(),
                    "keyword": record.text,
                    "score": record.score,
                }),
            ));
        }

        info!(
            "Keyword lifecycle: {} used, {} discovered, {} archived",
            marked_used.len(),
            discovered.len(),
            archived.len()
        );

        LifecycleChanges {
            marked_used,
            discovered,
            archived,
        }
    }

    /// Persist a cycle's changes: usage through `mark_used_batch`, new and
    /// archived records through `upsert_batch`.
    pub async fn persist_cycle(
        &self,
        update: &CycleUpdate<'_>,
        changes: &LifecycleChanges,
    ) -> Result<(), StoreError> {
        self.store
            .mark_used_batch(update.used_keywords, update.cycle_id, update.cycle_time)
            .await?;

        let mut records = changes.discovered.clone();
        records.extend(changes.archived.iter().cloned());
        if !records.is_empty() {
            self.store.upsert_batch(&records).await?;
        }
        Ok(())
    }

    pub async fn record_cycle(&self, entry: &CycleHistoryEntry) -> Result<(), StoreError> {
        self.store.record_cycle(entry).await
    }

    pub async fn history(&self, limit: usize) -> Result<Vec<CycleHistoryEntry>, StoreError> {
        self.store.history(limit).await
    }

    // ==================== Manual operations ====================

    /// All records, sorted by state then text.
    pub async fn list(&self) -> Result<Vec<KeywordRecord>, StoreError> {
        let mut records = self.store.load_all().await?;
        records.sort_by(|a, b| {
            a.state
                .cmp(&b.state)
                .then_with(|| a.text.to_lowercase().cmp(&b.text.to_lowercase()))
        });
        Ok(records)
    }

    /// Add keywords by hand. Texts already present are skipped.
    pub async fn add_manual(
        &self,
        texts: &[String],
        now: DateTime<Utc>,
    ) -> Result<Vec<KeywordRecord>, LifecycleError> {
        let mut catalog = self.load_catalog().await?;
        let mut added = Vec::new();
        for text in texts {
            if let Some(record) = catalog.insert(text, KeywordSource::Manual, now)? {
                added.push(record);
            }
        }
        if !added.is_empty() {
            self.store.upsert_batch(&added).await?;
        }
        Ok(added)
    }

    /// Move an archived keyword back to `Discovered`.
    pub async fn reactivate(
        &self,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<KeywordRecord, LifecycleError> {
        let mut catalog = self.load_catalog().await?;
        let record = catalog.reactivate(text, now)?;
        self.store.upsert_batch(std::slice::from_ref(&record)).await?;
        info!("Reactivated keyword '{}'", record.text);
        Ok(record)
    }
}
