//! Handler for platforms declared only in configuration.
//!
//! Calls the configured tool (default `search`) with `{"query": keyword}`
//! and reads any list of records carrying a title or name.

use super::{HandlerError, PlatformHandler, records, result_json, str_field};
use crate::mcp::protocol::CallToolResult;
use chrono::{DateTime, Utc};
use scout_domain::{ResearchItem, ResearchPayload};
use serde_json::{Value, json};

pub struct GenericHandler;

impl PlatformHandler for GenericHandler {
    fn default_tool(&self) -> &'static str {
        "search"
    }

    fn arguments(&self, keyword: &str) -> Value {
        json!({ "query": keyword })
    }

    fn normalize_at(
        &self,
        _keyword: &str,
        result: &CallToolResult,
        _now: DateTime<Utc>,
    ) -> Result<ResearchPayload, HandlerError> {
        let data = result_json(result)?;
        let items = records(&data, &["results", "items", "papers", "data"])?
            .iter()
            .filter_map(|record| {
                let title = str_field(record, &["title", "name"])?;
                let mut item = ResearchItem::new(title).with_description(
                    str_field(record, &["description", "summary", "abstract", "snippet"])
                        .unwrap_or_default(),
                );
                if let Some(url) = str_field(record, &["url", "link", "html_url"]) {
                    item = item.with_url(url);
                }
                Some(item)
            })
            .collect::<Vec<_>>();
        let count = items.len();
        Ok(ResearchPayload::new(items).with_metric("result_count", count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::tests::text_result;

    #[test]
    fn test_normalize_any_record_list() {
        let result = text_result(json!({
            "papers": [
                {"title": "Sparse attention", "abstract": "We study...", "link": "https://x/1"},
                {"name": "kv-cache"},
                {"id": 3}
            ]
        }));
        let payload = GenericHandler.normalize("attention", &result).unwrap();
        assert_eq!(payload.items.len(), 2);
        assert_eq!(payload.items[0].description, "We study...");
        assert_eq!(payload.items[1].title, "kv-cache");
        assert_eq!(payload.metrics["result_count"], json!(2));
    }

    #[test]
    fn test_plain_text_is_rejected() {
        let result = text_result(json!("no results"));
        assert!(matches!(
            GenericHandler.normalize("x", &result),
            Err(HandlerError::UnexpectedShape(_))
        ));
    }
}
