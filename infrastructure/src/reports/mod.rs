//! Report sinks.
//!
//! Implementations of the [`ReportSink`] port: a JSON report file, a CSV
//! outcome table, a Notion page and a Supabase table row. [`build_sinks`]
//! assembles the enabled ones from configuration.

pub mod csv_file;
pub mod json_file;
pub mod notion;
pub mod supabase;

pub use csv_file::CsvFileSink;
pub use json_file::JsonFileSink;
pub use notion::NotionSink;
pub use supabase::SupabaseSink;

use crate::config::{FileReportsConfig, expand_env};
use scout_application::ports::report_sink::{ReportSink, SinkError};
use scout_domain::ResearchCycleResult;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Report document shared by the JSON file and Supabase sinks.
pub fn report_document(result: &ResearchCycleResult) -> Value {
    let new_keywords: Vec<&str> = result.discovered.iter().map(|r| r.text.as_str()).collect();
    json!({
        "date": result.started_at.format("%Y-%m-%d").to_string(),
        "cycle_id": result.cycle_id,
        "status": result.status(),
        "started_at": result.started_at,
        "finished_at": result.finished_at,
        "keywords": result.keywords,
        "platforms": result.platforms,
        "excluded_platforms": result.excluded_platforms,
        "summary": result.summary,
        "new_keywords": new_keywords,
        "discovered": result.discovered,
        "recommendations": result.recommendations,
        "failures": result.failures,
        "warnings": result.warnings,
        "detailed_results": result.outcomes,
    })
}

/// `<prefix>_<date>_<cycle>.<ext>` inside `dir`.
fn report_path(dir: &Path, prefix: &str, result: &ResearchCycleResult, ext: &str) -> PathBuf {
    dir.join(format!(
        "{}_{}_{}.{}",
        prefix,
        result.started_at.format("%Y-%m-%d"),
        result.cycle_id,
        ext
    ))
}

/// Error body of a failed HTTP response.
async fn http_error(response: reqwest::Response) -> SinkError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    SinkError::Http { status, body }
}

/// Sinks enabled by the configuration. Remote sinks whose credentials do
/// not resolve are skipped.
pub fn build_sinks(
    config: &FileReportsConfig,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Vec<Arc<dyn ReportSink>> {
    let mut sinks: Vec<Arc<dyn ReportSink>> = Vec::new();
    if config.json {
        sinks.push(Arc::new(JsonFileSink::new(&config.dir)));
    }
    if config.csv {
        sinks.push(Arc::new(CsvFileSink::new(&config.dir)));
    }

    let notion_key = expand_env(&config.notion.api_key, lookup);
    let notion_parent = expand_env(&config.notion.parent_page_id, lookup);
    if !notion_key.is_empty() && !notion_parent.is_empty() {
        match NotionSink::new(notion_key, notion_parent) {
            Ok(sink) => sinks.push(Arc::new(sink)),
            Err(e) => warn!("Notion sink disabled: {}", e),
        }
    } else {
        debug!("Notion sink not configured");
    }

    let supabase_url = expand_env(&config.supabase.url, lookup);
    let supabase_key = expand_env(&config.supabase.key, lookup);
    if !supabase_url.is_empty() && !supabase_key.is_empty() {
        match SupabaseSink::new(supabase_url, supabase_key, config.supabase.table.clone()) {
            Ok(sink) => sinks.push(Arc::new(sink)),
            Err(e) => warn!("Supabase sink disabled: {}", e),
        }
    } else {
        debug!("Supabase sink not configured");
    }
    sinks
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use scout_domain::{
        CycleId, CycleSummary, KeywordId, KeywordRecord, KeywordSource,
        OutcomeStatus, PlatformName, ResultAggregator, ResearchItem, ResearchPayload, TaskId,
        TaskOutcome,
    };
    use std::collections::BTreeMap;
    use std::time::Duration;

    pub(crate) fn sample_result() -> ResearchCycleResult {
        let started_at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let github = PlatformName::parse("github").unwrap();
        let arxiv = PlatformName::parse("arxiv").unwrap();
        let outcomes = vec![
            TaskOutcome::success(
                TaskId::new(1),
                "vector search",
                github.clone(),
                ResearchPayload::new(vec![
                    ResearchItem::new("qdrant/qdrant")
                        .with_url("https://github.com/qdrant/qdrant")
                        .with_description("Vector database, \"fast\""),
                ]),
                Duration::from_millis(850),
            ),
            TaskOutcome::failure(
                TaskId::new(2),
                "vector search",
                arxiv.clone(),
                OutcomeStatus::Timeout,
                "deadline elapsed",
                Duration::from_secs(60),
            ),
        ];
        let (_, failures) = ResultAggregator::aggregate(&outcomes);
        let discovered = vec![KeywordRecord::new(
            KeywordId::new(9),
            "hnsw",
            KeywordSource::Discovered,
            started_at,
        )];
        ResearchCycleResult {
            cycle_id: CycleId::from_time(started_at),
            started_at,
            finished_at: started_at + chrono::Duration::minutes(3),
            keywords: vec!["vector search".into()],
            platforms: vec![github, arxiv],
            excluded_platforms: BTreeMap::new(),
            summary: CycleSummary::from_outcomes(&outcomes, discovered.len()),
            outcomes,
            discovered,
            recommendations: vec!["Benchmark HNSW parameters".into()],
            failures,
            warnings: vec![],
        }
    }

    #[test]
    fn test_report_document_fields() {
        let doc = report_document(&sample_result());
        assert_eq!(doc["date"], "2026-03-01");
        assert_eq!(doc["status"], "partial");
        assert_eq!(doc["new_keywords"], json!(["hnsw"]));
        assert_eq!(doc["summary"]["total_items"], 1);
        assert_eq!(doc["detailed_results"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_build_sinks_from_config() {
        let config = FileReportsConfig {
            csv: true,
            ..Default::default()
        };
        let env = |key: &str| match key {
            "SUPABASE_URL" => Some("https://x.supabase.co".to_string()),
            "SUPABASE_KEY" => Some("anon".to_string()),
            _ => None,
        };
        let sinks = build_sinks(&config, &env);
        let names: Vec<&str> = sinks.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["json", "csv", "supabase"]);
    }
}
