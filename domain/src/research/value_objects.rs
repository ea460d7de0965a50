//! Research value objects - identifiers and normalized results.
//!
//! # Identifiers
//! - [`CycleId`] - One research cycle, derived from its start time
//! - [`TaskId`] - One (keyword, platform) task within a cycle
//! - [`PlatformName`] - Unique key of a platform connection
//!
//! # Results
//! - [`ResearchItem`] - A single normalized hit (repository, video, paper...)
//! - [`ResearchPayload`] - Everything one platform returned for one keyword
//! - [`OutcomeStatus`] - How a task ended

use crate::core::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of one research cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CycleId(String);

impl CycleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive a sortable id from the cycle start time.
    pub fn from_time(started_at: DateTime<Utc>) -> Self {
        Self(started_at.format("%Y%m%dT%H%M%S%3fZ").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CycleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequential identifier of a research task within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(u64);

impl TaskId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Unique name of a platform (e.g. `github`, `arxiv`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformName(String);

impl PlatformName {
    /// Platform names are lowercase identifiers: `[a-z0-9_-]+`.
    pub fn parse(name: &str) -> Result<Self, DomainError> {
        let name = name.trim().to_lowercase();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if valid {
            Ok(Self(name))
        } else {
            Err(DomainError::InvalidPlatform(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlatformName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal status of a research task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    /// Task deadline or the cycle deadline elapsed.
    Timeout,
    /// The platform answered with an error or an unusable payload.
    ProtocolError,
    /// The connection was gone when the task ran.
    PlatformUnavailable,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::Timeout => "timeout",
            OutcomeStatus::ProtocolError => "protocol_error",
            OutcomeStatus::PlatformUnavailable => "platform_unavailable",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeStatus::Success)
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single normalized search hit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResearchItem {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Tags, topics or categories reported by the platform.
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    /// Platform-specific fields (stars, views, trend score...).
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ResearchItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_topics(mut self, topics: Vec<String>) -> Self {
        self.topics = topics;
        self
    }

    pub fn with_published_at(mut self, published_at: impl Into<String>) -> Self {
        self.published_at = Some(published_at.into());
        self
    }

    pub fn with_extra(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// Title, description and topics joined for text mining.
    pub fn text(&self) -> String {
        let mut text = self.title.clone();
        if !self.description.is_empty() {
            text.push(' ');
            text.push_str(&self.description);
        }
        for topic in &self.topics {
            text.push(' ');
            text.push_str(topic);
        }
        text
    }
}

/// Everything one platform returned for one keyword.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResearchPayload {
    pub items: Vec<ResearchItem>,
    /// Aggregate figures computed by the platform handler.
    #[serde(default)]
    pub metrics: BTreeMap<String, serde_json::Value>,
}

impl ResearchPayload {
    pub fn new(items: Vec<ResearchItem>) -> Self {
        Self {
            items,
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metrics.insert(key.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
