//! Keyword records and their lifecycle states.
//!
//! # State Transitions
//!
//! ```text
//! Discovered ──> Active ──> Used ──> Archived
//!                  ^  │       │         │
//!                  └──┘       │         │ (manual reactivation)
//!                  ^          │         v
//!                  └──────────┘     Discovered
//! ```
//!
//! `Active -> Active` is re-selection of a keyword left active by an
//! interrupted cycle; `Used -> Active` is re-promotion of a keyword that has
//! not gone stale.

use crate::research::value_objects::CycleId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable numeric identifier of a keyword record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeywordId(u64);

impl KeywordId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for KeywordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "kw-{}", self.0)
    }
}

/// Lifecycle state of a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordState {
    /// Known but not yet scheduled for research.
    Discovered,
    /// Selected for the current (or an interrupted) cycle.
    Active,
    /// Researched at least once.
    Used,
    /// Stale; only manual reactivation brings it back.
    Archived,
}

impl KeywordState {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeywordState::Discovered => "discovered",
            KeywordState::Active => "active",
            KeywordState::Used => "used",
            KeywordState::Archived => "archived",
        }
    }

    /// Whether promotion into a cycle may pick a keyword in this state.
    pub fn is_selectable(&self) -> bool {
        !matches!(self, KeywordState::Archived)
    }
}

impl std::fmt::Display for KeywordState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for KeywordState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "discovered" => Ok(KeywordState::Discovered),
            "active" => Ok(KeywordState::Active),
            "used" => Ok(KeywordState::Used),
            "archived" => Ok(KeywordState::Archived),
            other => Err(format!("unknown keyword state: {}", other)),
        }
    }
}

/// Where a keyword came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordSource {
    /// Configured seed list, inserted when the catalog is empty.
    Seed,
    /// Extracted from research content.
    Discovered,
    /// Added by hand through the CLI.
    Manual,
}

impl KeywordSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeywordSource::Seed => "seed",
            KeywordSource::Discovered => "discovered",
            KeywordSource::Manual => "manual",
        }
    }
}

/// A single entry of the keyword catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRecord {
    pub id: KeywordId,
    /// Display text. Uniqueness is enforced on its canonical key.
    pub text: String,
    pub state: KeywordState,
    pub source: KeywordSource,
    pub discovered_at: DateTime<Utc>,
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
    /// Relevance score in `0..=100`.
    #[serde(default)]
    pub score: Option<u8>,
    #[serde(default)]
    pub times_used: u32,
    /// Cycle that found this keyword, if any.
    #[serde(default)]
    pub discovered_from: Option<CycleId>,
    /// Last cycle that marked the keyword used.
    #[serde(default)]
    pub last_cycle: Option<CycleId>,
}

impl KeywordRecord {
    pub fn new(
        id: KeywordId,
        text: impl Into<String>,
        source: KeywordSource,
        discovered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            state: KeywordState::Discovered,
            source,
            discovered_at,
            last_used_at: None,
            score: None,
            times_used: 0,
            discovered_from: None,
            last_cycle: None,
        }
    }

    pub fn with_score(mut self, score: u8) -> Self {
        self.score = Some(score.min(100));
        self
    }

    pub fn with_discovered_from(mut self, cycle: CycleId) -> Self {
        self.discovered_from = Some(cycle);
        self
    }

    /// Reference time for staleness: last use, or discovery if never used.
    pub fn last_touched(&self) -> DateTime<Utc> {
        self.last_used_at.unwrap_or(self.discovered_at)
    }
}
