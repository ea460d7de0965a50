//! Report sink port

use async_trait::async_trait;
use scout_domain::ResearchCycleResult;
use thiserror::Error;

/// Errors from report sinks
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
}

/// Confirmation that a sink accepted a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkAck {
    /// Where the report ended up (file path, page URL, row id).
    pub location: Option<String>,
}

impl SinkAck {
    pub fn at(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
        }
    }

    pub fn accepted() -> Self {
        Self { location: None }
    }
}

/// External destination for cycle results.
#[async_trait]
pub trait ReportSink: Send + Sync {
    fn name(&self) -> &str;

    async fn publish(&self, result: &ResearchCycleResult) -> Result<SinkAck, SinkError>;
}
