//! JSON report file sink.

use super::{report_document, report_path};
use async_trait::async_trait;
use scout_application::ports::report_sink::{ReportSink, SinkAck, SinkError};
use scout_domain::ResearchCycleResult;
use std::path::{Path, PathBuf};

/// Writes `trends_<date>_<cycle>.json` into the report directory.
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ReportSink for JsonFileSink {
    fn name(&self) -> &str {
        "json"
    }

    async fn publish(&self, result: &ResearchCycleResult) -> Result<SinkAck, SinkError> {
        let json = serde_json::to_vec_pretty(&report_document(result))
            .map_err(|e| SinkError::Serialization(e.to_string()))?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = report_path(&self.dir, "trends", result, "json");
        tokio::fs::write(&path, json).await?;
        Ok(SinkAck::at(path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::tests::sample_result;

    #[tokio::test]
    async fn test_writes_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("reports"));
        let result = sample_result();

        let ack = sink.publish(&result).await.unwrap();

        let path = PathBuf::from(ack.location.unwrap());
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            format!("trends_2026-03-01_{}.json", result.cycle_id)
        );
        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written["recommendations"][0], "Benchmark HNSW parameters");
    }

    #[tokio::test]
    async fn test_unwritable_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let sink = JsonFileSink::new(blocker.join("reports"));
        assert!(matches!(
            sink.publish(&sample_result()).await,
            Err(SinkError::Io(_))
        ));
    }
}
