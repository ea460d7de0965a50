//! Result aggregation.
//!
//! Partitions the outcomes of a fan-out into the content that feeds keyword
//! extraction ([`ContentBundle`]) and a failure breakdown
//! ([`FailureSummary`]) for the report.

use super::entities::TaskOutcome;
use super::value_objects::{OutcomeStatus, PlatformName, ResearchPayload};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Successful payloads grouped by keyword.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBundle {
    entries: BTreeMap<String, Vec<(PlatformName, ResearchPayload)>>,
}

impl ContentBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, keyword: &str, platform: PlatformName, payload: ResearchPayload) {
        self.entries
            .entry(keyword.to_string())
            .or_default()
            .push((platform, payload));
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn get(&self, keyword: &str) -> Option<&[(PlatformName, ResearchPayload)]> {
        self.entries.get(keyword).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[(PlatformName, ResearchPayload)])> {
        self.entries
            .iter()
            .map(|(keyword, payloads)| (keyword.as_str(), payloads.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total items across every keyword and platform.
    pub fn item_count(&self) -> usize {
        self.entries
            .values()
            .flat_map(|payloads| payloads.iter())
            .map(|(_, payload)| payload.items.len())
            .sum()
    }

    /// Concatenated item text, used for candidate scoring.
    pub fn corpus(&self) -> String {
        let mut corpus = String::new();
        for (_, payload) in self.entries.values().flatten() {
            for item in &payload.items {
                corpus.push_str(&item.text());
                corpus.push('\n');
            }
        }
        corpus
    }
}

/// A single failed task, kept for the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub keyword: String,
    pub platform: PlatformName,
    pub status: OutcomeStatus,
    pub error: String,
}

/// Failures by platform and by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailureSummary {
    pub by_platform: BTreeMap<PlatformName, BTreeMap<OutcomeStatus, usize>>,
    pub details: Vec<FailureDetail>,
    /// Keywords for which every task failed.
    pub keywords_without_content: Vec<String>,
}

impl FailureSummary {
    pub fn total(&self) -> usize {
        self.details.len()
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    /// Count of failures of a given kind across all platforms.
    pub fn count_status(&self, status: OutcomeStatus) -> usize {
        self.by_platform
            .values()
            .filter_map(|counts| counts.get(&status))
            .sum()
    }
}

/// Stateless aggregation of fan-out outcomes.
pub struct ResultAggregator;

impl ResultAggregator {
    pub fn aggregate(outcomes: &[TaskOutcome]) -> (ContentBundle, FailureSummary) {
        let mut bundle = ContentBundle::new();
        let mut failures = FailureSummary::default();
        let mut attempted = BTreeSet::new();

        for outcome in outcomes {
            attempted.insert(outcome.keyword().to_string());
            match outcome.payload() {
                Some(payload) => {
                    bundle.insert(outcome.keyword(), outcome.platform().clone(), payload.clone())
                }
                None => {
                    *failures
                        .by_platform
                        .entry(outcome.platform().clone())
                        .or_default()
                        .entry(outcome.status())
                        .or_insert(0) += 1;
                    failures.details.push(FailureDetail {
                        keyword: outcome.keyword().to_string(),
                        platform: outcome.platform().clone(),
                        status: outcome.status(),
                        error: outcome.error().unwrap_or_default().to_string(),
                    });
                }
            }
        }

        failures.keywords_without_content = attempted
            .into_iter()
            .filter(|keyword| bundle.get(keyword).is_none())
            .collect();

        (bundle, failures)
    }
}
