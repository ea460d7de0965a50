//! arXiv paper search.

use super::{
    HandlerError, PlatformHandler, days_since, records, result_json, str_field, string_list,
};
use crate::mcp::protocol::CallToolResult;
use chrono::{DateTime, Utc};
use scout_domain::{ResearchItem, ResearchPayload};
use serde_json::{Value, json};

/// Papers at most this many days old count as recent.
pub const RECENT_DAYS: i64 = 90;

pub struct ArxivHandler;

impl PlatformHandler for ArxivHandler {
    fn default_tool(&self) -> &'static str {
        "search_arxiv"
    }

    fn arguments(&self, keyword: &str) -> Value {
        json!({
            "query": keyword,
            "max_results": 10,
            "sort_by": "relevance",
        })
    }

    fn normalize_at(
        &self,
        _keyword: &str,
        result: &CallToolResult,
        now: DateTime<Utc>,
    ) -> Result<ResearchPayload, HandlerError> {
        let data = result_json(result)?;
        let papers = records(&data, &["results", "papers", "entries"])?;

        let mut items = Vec::new();
        let mut recent = 0;
        for paper in papers {
            let Some(title) = str_field(paper, &["title"]) else {
                continue;
            };
            let published = str_field(paper, &["published", "published_date"]);
            let days_old = published.as_deref().and_then(|p| days_since(p, now));
            let is_recent = days_old.is_some_and(|d| d <= RECENT_DAYS);
            if is_recent {
                recent += 1;
            }

            let mut item = ResearchItem::new(title)
                .with_description(str_field(paper, &["summary", "abstract"]).unwrap_or_default())
                .with_topics(string_list(paper.get("categories")))
                .with_extra("authors", string_list(paper.get("authors")))
                .with_extra("is_recent", is_recent);
            if let Some(days_old) = days_old {
                item = item.with_extra("days_old", days_old);
            }
            if let Some(published) = published {
                item = item.with_published_at(published);
            }
            if let Some(url) = str_field(paper, &["url", "pdf_url", "id"]) {
                item = item.with_url(url);
            }
            items.push(item);
        }

        let count = items.len();
        Ok(ResearchPayload::new(items)
            .with_metric("paper_count", count)
            .with_metric("recent_paper_count", recent))
    }
}
