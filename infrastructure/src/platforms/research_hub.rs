//! Academic paper search through the research hub server.

use super::{HandlerError, PlatformHandler, records, result_json, str_field, string_list, u64_field};
use crate::mcp::protocol::CallToolResult;
use chrono::{DateTime, Datelike, Utc};
use scout_domain::{ResearchItem, ResearchPayload};
use serde_json::{Value, json};

/// Papers from this many years back (or newer) count as recent.
const RECENT_YEARS: i32 = 2;

pub struct ResearchHubHandler;

impl PlatformHandler for ResearchHubHandler {
    fn default_tool(&self) -> &'static str {
        "search_papers"
    }

    fn arguments(&self, keyword: &str) -> Value {
        json!({ "query": keyword, "limit": 10 })
    }

    fn normalize_at(
        &self,
        _keyword: &str,
        result: &CallToolResult,
        now: DateTime<Utc>,
    ) -> Result<ResearchPayload, HandlerError> {
        let data = result_json(result)?;
        let papers = records(&data, &["papers", "results"])?;
        let cutoff = now.year() - RECENT_YEARS;

        let mut items = Vec::new();
        let mut recent = 0;
        for paper in papers.iter().filter(|p| p.is_object()) {
            let title = str_field(paper, &["title"]).unwrap_or_else(|| "N/A".to_string());
            let year = u64_field(paper, &["year"]).and_then(|y| i32::try_from(y).ok());
            if year.is_some_and(|y| y >= cutoff) {
                recent += 1;
            }

            let mut item = ResearchItem::new(title)
                .with_description(str_field(paper, &["summary", "abstract"]).unwrap_or_default())
                .with_extra("authors", string_list(paper.get("authors")).join(", "))
                .with_extra(
                    "source",
                    str_field(paper, &["source"]).unwrap_or_else(|| "unknown".to_string()),
                );
            if let Some(year) = year {
                item = item.with_extra("year", year);
            }
            if let Some(url) = str_field(paper, &["url", "doi"]) {
                item = item.with_url(url);
            }
            items.push(item);
        }

        let count = items.len();
        Ok(ResearchPayload::new(items)
            .with_metric("paper_count", count)
            .with_metric("recent_papers_count", recent))
    }
}
