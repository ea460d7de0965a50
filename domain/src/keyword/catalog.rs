//! In-memory keyword catalog and its lifecycle transitions.
//!
//! The catalog enforces case-insensitive uniqueness and applies every state
//! transition of [`KeywordState`]. Each mutating method returns the records
//! it changed so callers can persist exactly those.

use super::entities::{KeywordId, KeywordRecord, KeywordSource, KeywordState};
use super::text::{canonical_key, clean_candidate, normalize_display};
use crate::core::error::DomainError;
use crate::research::value_objects::CycleId;
use chrono::{DateTime, Duration, Utc};
use std::cmp::Reverse;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct KeywordCatalog {
    records: Vec<KeywordRecord>,
    index: HashMap<String, usize>,
    next_id: u64,
}

impl KeywordCatalog {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Build a catalog from persisted records, rejecting duplicates.
    pub fn from_records(records: Vec<KeywordRecord>) -> Result<Self, DomainError> {
        let mut catalog = Self::new();
        for record in records {
            let key = canonical_key(&record.text);
            if catalog.index.contains_key(&key) {
                return Err(DomainError::DuplicateKeyword(record.text));
            }
            catalog.next_id = catalog.next_id.max(record.id.value() + 1);
            catalog.index.insert(key, catalog.records.len());
            catalog.records.push(record);
        }
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[KeywordRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<KeywordRecord> {
        self.records
    }

    pub fn get(&self, text: &str) -> Option<&KeywordRecord> {
        self.index
            .get(&canonical_key(text))
            .map(|&idx| &self.records[idx])
    }

    pub fn contains(&self, text: &str) -> bool {
        self.index.contains_key(&canonical_key(text))
    }

    pub fn in_state(&self, state: KeywordState) -> impl Iterator<Item = &KeywordRecord> {
        self.records.iter().filter(move |r| r.state == state)
    }

    /// Insert a new `Discovered` keyword.
    ///
    /// Returns `Ok(None)` when the text is already present (in any state).
    pub fn insert(
        &mut self,
        text: &str,
        source: KeywordSource,
        now: DateTime<Utc>,
    ) -> Result<Option<KeywordRecord>, DomainError> {
        let display = normalize_display(text)?;
        let key = canonical_key(&display);
        if self.index.contains_key(&key) {
            return Ok(None);
        }
        let record = KeywordRecord::new(KeywordId::new(self.next_id), display, source, now);
        self.next_id += 1;
        self.index.insert(key, self.records.len());
        self.records.push(record.clone());
        Ok(Some(record))
    }

    /// Insert scored extraction candidates found by `cycle`.
    ///
    /// Invalid and already-known candidates are skipped; at most `limit`
    /// records carry `cycle` as their origin, counting ones created by an
    /// earlier pass. Re-applying the same candidates is a no-op.
    pub fn discover(
        &mut self,
        candidates: &[(String, u8)],
        cycle: &CycleId,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Vec<KeywordRecord> {
        let already = self
            .records
            .iter()
            .filter(|r| r.discovered_from.as_ref() == Some(cycle))
            .count();
        let mut created = Vec::new();
        for (text, score) in candidates {
            if already + created.len() >= limit {
                break;
            }
            let Some(cleaned) = clean_candidate(text) else {
                continue;
            };
            if let Ok(Some(record)) = self.insert(&cleaned, KeywordSource::Discovered, now) {
                let idx = self.index[&canonical_key(&record.text)];
                let stored = &mut self.records[idx];
                stored.score = Some((*score).min(100));
                stored.discovered_from = Some(cycle.clone());
                created.push(stored.clone());
            }
        }
        created
    }

    /// Select up to `batch_size` keywords for the next cycle and mark them
    /// `Active`.
    ///
    /// Keywords already `Active` come first, then by score (highest first),
    /// then least recently used (never used first), then text.
    pub fn promote(&mut self, batch_size: usize) -> Vec<KeywordRecord> {
        let mut candidates: Vec<usize> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.state.is_selectable())
            .map(|(idx, _)| idx)
            .collect();

        candidates.sort_by_key(|&idx| {
            let r = &self.records[idx];
            (
                r.state != KeywordState::Active,
                Reverse(r.score.unwrap_or(0)),
                r.last_used_at.is_some(),
                r.last_used_at,
                canonical_key(&r.text),
            )
        });

        candidates
            .into_iter()
            .take(batch_size)
            .map(|idx| {
                self.records[idx].state = KeywordState::Active;
                self.records[idx].clone()
            })
            .collect()
    }

    /// Mark the given keywords as used by `cycle`.
    ///
    /// A keyword already marked by the same cycle is left untouched, so
    /// applying a cycle twice does not double-count usage. Unknown texts are
    /// ignored.
    pub fn mark_used(
        &mut self,
        texts: &[String],
        cycle: &CycleId,
        at: DateTime<Utc>,
    ) -> Vec<KeywordRecord> {
        let mut changed = Vec::new();
        for text in texts {
            let Some(&idx) = self.index.get(&canonical_key(text)) else {
                continue;
            };
            let record = &mut self.records[idx];
            if record.last_cycle.as_ref() == Some(cycle) {
                continue;
            }
            record.state = KeywordState::Used;
            record.last_used_at = Some(at);
            record.times_used += 1;
            record.last_cycle = Some(cycle.clone());
            changed.push(record.clone());
        }
        changed
    }

    /// Archive `Used` and `Discovered` keywords not touched within
    /// `threshold` of `now`.
    pub fn archive_stale(&mut self, threshold: Duration, now: DateTime<Utc>) -> Vec<KeywordRecord> {
        let cutoff = now - threshold;
        let mut archived = Vec::new();
        for record in &mut self.records {
            let eligible = matches!(record.state, KeywordState::Used | KeywordState::Discovered);
            if eligible && record.last_touched() < cutoff {
                record.state = KeywordState::Archived;
                archived.push(record.clone());
            }
        }
        archived
    }

    /// Manually move an `Archived` keyword back to `Discovered`.
    ///
    /// The discovery time is reset so the keyword is not archived again by
    /// the next staleness pass.
    pub fn reactivate(
        &mut self,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<KeywordRecord, DomainError> {
        let idx = *self
            .index
            .get(&canonical_key(text))
            .ok_or_else(|| DomainError::UnknownKeyword(text.to_string()))?;
        let record = &mut self.records[idx];
        if record.state != KeywordState::Archived {
            return Err(DomainError::InvalidTransition {
                keyword: record.text.clone(),
                from: record.state.to_string(),
                to: KeywordState::Discovered.to_string(),
            });
        }
        record.state = KeywordState::Discovered;
        record.discovered_at = now;
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
    }

    fn catalog_with(texts: &[&str]) -> KeywordCatalog {
        let mut catalog = KeywordCatalog::new();
        for text in texts {
            catalog.insert(text, KeywordSource::Seed, at(1)).unwrap();
        }
        catalog
    }

    #[test]
    fn test_insert_is_case_insensitive_unique() {
        let mut catalog = KeywordCatalog::new();
        assert!(catalog.insert("LLM Agents", KeywordSource::Seed, at(1)).unwrap().is_some());
        assert!(catalog.insert("llm  agents", KeywordSource::Manual, at(2)).unwrap().is_none());
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("LLM AGENTS").unwrap().text, "LLM Agents");
    }

    #[test]
    fn test_from_records_rejects_duplicates() {
        let a = KeywordRecord::new(KeywordId::new(1), "Rust", KeywordSource::Seed, at(1));
        let b = KeywordRecord::new(KeywordId::new(2), "rust", KeywordSource::Seed, at(1));
        assert_eq!(
            KeywordCatalog::from_records(vec![a, b]).unwrap_err(),
            DomainError::DuplicateKeyword("rust".to_string())
        );
    }

    #[test]
    fn test_from_records_continues_id_sequence() {
        let a = KeywordRecord::new(KeywordId::new(7), "rust", KeywordSource::Seed, at(1));
        let mut catalog = KeywordCatalog::from_records(vec![a]).unwrap();
        let created = catalog.insert("go", KeywordSource::Manual, at(2)).unwrap().unwrap();
        assert_eq!(created.id, KeywordId::new(8));
    }

    #[test]
    fn test_promote_orders_by_score_then_recency() {
        let mut catalog = catalog_with(&["low", "high", "used-recently", "never-used"]);
        catalog.records[0].score = Some(10);
        catalog.records[1].score = Some(90);
        catalog.records[2].score = Some(50);
        catalog.records[2].state = KeywordState::Used;
        catalog.records[2].last_used_at = Some(at(5));
        catalog.records[3].score = Some(50);

        let promoted: Vec<_> = catalog.promote(3).into_iter().map(|r| r.text).collect();
        assert_eq!(promoted, vec!["high", "never-used", "used-recently"]);
        assert_eq!(catalog.get("low").unwrap().state, KeywordState::Discovered);
        assert_eq!(catalog.in_state(KeywordState::Active).count(), 3);
    }

    #[test]
    fn test_promote_reselects_active_and_skips_archived() {
        let mut catalog = catalog_with(&["left-active", "archived", "fresh"]);
        catalog.records[0].state = KeywordState::Active;
        catalog.records[1].state = KeywordState::Archived;
        catalog.records[1].score = Some(100);
        catalog.records[2].score = Some(80);

        let promoted: Vec<_> = catalog.promote(5).into_iter().map(|r| r.text).collect();
        assert_eq!(promoted, vec!["left-active", "fresh"]);
    }

    #[test]
    fn test_mark_used_is_idempotent_per_cycle() {
        let mut catalog = catalog_with(&["rust"]);
        catalog.promote(1);
        let cycle = CycleId::new("c1");
        let texts = vec!["RUST".to_string(), "unknown".to_string()];

        assert_eq!(catalog.mark_used(&texts, &cycle, at(3)).len(), 1);
        assert!(catalog.mark_used(&texts, &cycle, at(4)).is_empty());

        let record = catalog.get("rust").unwrap();
        assert_eq!(record.state, KeywordState::Used);
        assert_eq!(record.times_used, 1);
        assert_eq!(record.last_used_at, Some(at(3)));

        catalog.mark_used(&texts, &CycleId::new("c2"), at(5));
        assert_eq!(catalog.get("rust").unwrap().times_used, 2);
    }

    #[test]
    fn test_discover_dedups_and_limits() {
        let mut catalog = catalog_with(&["rust"]);
        let cycle = CycleId::new("c1");
        let candidates = vec![
            ("Rust".to_string(), 90),
            ("wasm".to_string(), 70),
            ("x".to_string(), 60),
            ("zig".to_string(), 50),
            ("gleam".to_string(), 40),
        ];

        let created = catalog.discover(&candidates, &cycle, at(2), 2);
        let texts: Vec<_> = created.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["wasm", "zig"]);
        assert_eq!(created[0].score, Some(70));
        assert_eq!(created[0].discovered_from, Some(cycle.clone()));

        assert!(catalog.discover(&candidates[..2], &cycle, at(2), 10).is_empty());
    }

    #[test]
    fn test_discover_twice_keeps_cycle_cap() {
        let mut catalog = KeywordCatalog::new();
        let cycle = CycleId::new("c1");
        let candidates: Vec<(String, u8)> = (0..12)
            .map(|i| (format!("topic {}", i), 50))
            .collect();

        assert_eq!(catalog.discover(&candidates, &cycle, at(1), 10).len(), 10);
        assert_eq!(catalog.records().len(), 10);

        assert!(catalog.discover(&candidates, &cycle, at(1), 10).is_empty());
        assert_eq!(catalog.records().len(), 10);
        assert!(catalog.get("topic 10").is_none());

        let next = CycleId::new("c2");
        assert_eq!(catalog.discover(&candidates, &next, at(2), 10).len(), 2);
    }

    #[test]
    fn test_archive_stale_skips_active() {
        let mut catalog = catalog_with(&["old-used", "old-discovered", "active", "recent"]);
        catalog.records[0].state = KeywordState::Used;
        catalog.records[0].last_used_at = Some(at(2));
        catalog.records[2].state = KeywordState::Active;
        catalog.records[3].discovered_at = at(20);

        let archived = catalog.archive_stale(Duration::days(10), at(25));
        let texts: Vec<_> = archived.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["old-used", "old-discovered"]);
        assert_eq!(catalog.get("active").unwrap().state, KeywordState::Active);
        assert_eq!(catalog.get("recent").unwrap().state, KeywordState::Discovered);

        assert!(catalog.archive_stale(Duration::days(10), at(25)).is_empty());
    }

    #[test]
    fn test_reactivate_only_from_archived() {
        let mut catalog = catalog_with(&["rust", "go"]);
        catalog.records[0].state = KeywordState::Archived;

        let record = catalog.reactivate("Rust", at(9)).unwrap();
        assert_eq!(record.state, KeywordState::Discovered);
        assert_eq!(record.discovered_at, at(9));

        assert!(matches!(
            catalog.reactivate("go", at(9)),
            Err(DomainError::InvalidTransition { .. })
        ));
        assert!(catalog.reactivate("nope", at(9)).unwrap_err().is_unknown_keyword());
    }
}
