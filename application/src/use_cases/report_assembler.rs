//! Report Assembler
//!
//! Hands a finished [`ResearchCycleResult`] to every configured sink
//! concurrently. Sink failures are logged and returned; they never affect
//! other sinks or keyword state.

use crate::ports::event_logger::{EventLogger, NoEventLogger, ResearchEvent};
use crate::ports::report_sink::{ReportSink, SinkAck, SinkError};
use scout_domain::ResearchCycleResult;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of publishing to one sink.
#[derive(Debug)]
pub struct SinkReport {
    pub sink: String,
    pub result: Result<SinkAck, SinkError>,
}

impl SinkReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct ReportAssembler {
    sinks: Vec<Arc<dyn ReportSink>>,
    logger: Arc<dyn EventLogger>,
}

impl ReportAssembler {
    pub fn new(sinks: Vec<Arc<dyn ReportSink>>) -> Self {
        Self {
            sinks,
            logger: Arc::new(NoEventLogger),
        }
    }

    pub fn with_event_logger(mut self, logger: Arc<dyn EventLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Publish to every sink; one report per sink, in configuration order.
    pub async fn publish(&self, result: &ResearchCycleResult) -> Vec<SinkReport> {
        let publishes = self.sinks.iter().map(|sink| async move {
            SinkReport {
                sink: sink.name().to_string(),
                result: sink.publish(result).await,
            }
        });
        let reports = futures::future::join_all(publishes).await;

        for report in &reports {
            match &report.result {
                Ok(ack) => {
                    info!(
                        "Report published to {}{}",
                        report.sink,
                        ack.location
                            .as_deref()
                            .map(|l| format!(" ({})", l))
                            .unwrap_or_default()
                    );
                    self.logger.log(ResearchEvent::new(
                        "sink_published",
                        serde_json::json!({
                            "cycle_id": result.cycle_id.as_str(),
                            "sink": report.sink,
                            "location": ack.location,
                        }),
                    ));
                }
                Err(e) => {
                    warn!("Report sink {} failed: {}", report.sink, e);
                    self.logger.log(ResearchEvent::new(
                        "sink_failed",
                        serde_json::json!({
                            "cycle_id": result.cycle_id.as_str(),
                            "sink": report.sink,
                            "error": e.to_string(),
                        }),
                    ));
                }
            }
        }

        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSink;
    use chrono::Utc;
    use scout_domain::{CycleId, CycleSummary, FailureSummary};
    use std::collections::BTreeMap;

    fn empty_result() -> ResearchCycleResult {
        let now = Utc::now();
        ResearchCycleResult {
            cycle_id: CycleId::from_time(now),
            started_at: now,
            finished_at: now,
            keywords: vec!["rust".into()],
            platforms: vec![],
            excluded_platforms: BTreeMap::new(),
            outcomes: vec![],
            discovered: vec![],
            recommendations: vec![],
            failures: FailureSummary::default(),
            summary: CycleSummary::default(),
            warnings: vec![],
        }
    }

    #[tokio::test]
    async fn test_failing_sink_is_isolated() {
        let good = Arc::new(MockSink::new("json"));
        let bad = Arc::new(MockSink::failing("notion"));
        let assembler = ReportAssembler::new(vec![bad.clone(), good.clone()]);

        let reports = assembler.publish(&empty_result()).await;

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].sink, "notion");
        assert!(!reports[0].is_ok());
        assert!(reports[1].is_ok());
        assert_eq!(good.published.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_sinks() {
        let assembler = ReportAssembler::new(vec![]);
        assert!(assembler.publish(&empty_result()).await.is_empty());
        assert!(assembler.sink_names().is_empty());
    }
}
