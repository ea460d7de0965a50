//! CSV outcome table sink.
//!
//! One row per task: keyword, platform, status, item count, elapsed time,
//! error and the first item's title and URL.

use super::report_path;
use async_trait::async_trait;
use scout_application::ports::report_sink::{ReportSink, SinkAck, SinkError};
use scout_domain::{ResearchCycleResult, TaskOutcome};
use std::path::{Path, PathBuf};

const HEADER: [&str; 8] = [
    "keyword",
    "platform",
    "status",
    "items",
    "elapsed_ms",
    "error",
    "top_title",
    "top_url",
];

/// Writes `outcomes_<date>_<cycle>.csv` into the report directory.
pub struct CsvFileSink {
    dir: PathBuf,
}

impl CsvFileSink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

/// Quote a field when it holds a separator, quote or line break.
fn field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn row(outcome: &TaskOutcome) -> String {
    let top = outcome.payload().and_then(|p| p.items.first());
    let cells = [
        outcome.keyword().to_string(),
        outcome.platform().to_string(),
        outcome.status().to_string(),
        outcome.item_count().to_string(),
        outcome.elapsed().as_millis().to_string(),
        outcome.error().unwrap_or_default().to_string(),
        top.map(|i| i.title.clone()).unwrap_or_default(),
        top.and_then(|i| i.url.clone()).unwrap_or_default(),
    ];
    cells.iter().map(|c| field(c)).collect::<Vec<_>>().join(",")
}

pub fn render(result: &ResearchCycleResult) -> String {
    let mut out = HEADER.join(",");
    out.push('\n');
    for outcome in &result.outcomes {
        out.push_str(&row(outcome));
        out.push('\n');
    }
    out
}

#[async_trait]
impl ReportSink for CsvFileSink {
    fn name(&self) -> &str {
        "csv"
    }

    async fn publish(&self, result: &ResearchCycleResult) -> Result<SinkAck, SinkError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = report_path(&self.dir, "outcomes", result, "csv");
        tokio::fs::write(&path, render(result)).await?;
        Ok(SinkAck::at(path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::tests::sample_result;

    #[test]
    fn test_field_quoting() {
        assert_eq!(field("plain"), "plain");
        assert_eq!(field("a,b"), "\"a,b\"");
        assert_eq!(field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_render_rows() {
        let csv = render(&sample_result());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER.join(","));
        assert_eq!(
            lines[1],
            "vector search,github,success,1,850,,qdrant/qdrant,https://github.com/qdrant/qdrant"
        );
        assert_eq!(lines[2], "vector search,arxiv,timeout,0,60000,deadline elapsed,,");
    }

    #[tokio::test]
    async fn test_publish_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let ack = CsvFileSink::new(dir.path()).publish(&sample_result()).await.unwrap();
        let path = PathBuf::from(ack.location.unwrap());
        assert!(path.to_string_lossy().ends_with(".csv"));
        assert!(std::fs::read_to_string(path).unwrap().starts_with("keyword,"));
    }
}
