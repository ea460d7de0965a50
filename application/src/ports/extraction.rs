//! Keyword extraction and recommendation ports

use async_trait::async_trait;
use scout_domain::{ContentBundle, KeywordRecord, TaskOutcome};
use thiserror::Error;

/// Errors from the extraction and recommendation services
#[derive(Error, Debug, Clone)]
pub enum ExtractionError {
    #[error("Language model request failed: {0}")]
    Llm(String),

    #[error("Could not parse model response: {0}")]
    Parse(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Turns a cycle's content into new keyword candidates.
#[async_trait]
pub trait KeywordExtractor: Send + Sync {
    /// Candidate texts, best first. `known` lists keywords already in the
    /// catalog so the service can avoid repeating them.
    async fn extract(
        &self,
        bundle: &ContentBundle,
        known: &[String],
    ) -> Result<Vec<String>, ExtractionError>;
}

/// Produces human-readable recommendations for the report.
#[async_trait]
pub trait Recommender: Send + Sync {
    async fn recommend(
        &self,
        outcomes: &[TaskOutcome],
        history: &[KeywordRecord],
        discovered: &[KeywordRecord],
    ) -> Result<Vec<String>, ExtractionError>;
}
