//! Web search through a metasearch MCP server.

use super::{HandlerError, PlatformHandler, records, result_json, str_field};
use crate::mcp::protocol::CallToolResult;
use chrono::{DateTime, Utc};
use scout_domain::{ResearchItem, ResearchPayload};
use serde_json::{Value, json};
use std::collections::BTreeSet;

/// Sites the query is narrowed to.
const SITES: [&str; 3] = ["github.com", "arxiv.org", "huggingface.co"];

pub struct WebHandler;

/// Host part of a URL, without a leading `www.`.
pub fn source_domain(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

impl PlatformHandler for WebHandler {
    fn default_tool(&self) -> &'static str {
        "one_search"
    }

    fn arguments(&self, keyword: &str) -> Value {
        let sites = SITES
            .iter()
            .map(|s| format!("site:{}", s))
            .collect::<Vec<_>>()
            .join(" OR ");
        json!({
            "query": format!("{} {}", keyword, sites),
            "max_results": 10,
        })
    }

    fn normalize_at(
        &self,
        _keyword: &str,
        result: &CallToolResult,
        _now: DateTime<Utc>,
    ) -> Result<ResearchPayload, HandlerError> {
        let data = result_json(result)?;
        let hits = records(&data, &["results", "items"])?;

        let mut items = Vec::new();
        let mut domains = BTreeSet::new();
        for hit in hits {
            let Some(title) = str_field(hit, &["title"]) else {
                continue;
            };
            let mut item = ResearchItem::new(title).with_description(
                str_field(hit, &["snippet", "description", "content"]).unwrap_or_default(),
            );
            if let Some(url) = str_field(hit, &["url", "link"]) {
                if let Some(domain) = source_domain(&url) {
                    domains.insert(domain.clone());
                    item = item.with_extra("source", domain);
                }
                item = item.with_url(url);
            }
            items.push(item);
        }

        let count = items.len();
        Ok(ResearchPayload::new(items)
            .with_metric("search_count", count)
            .with_metric("source_domains", domains.into_iter().collect::<Vec<_>>()))
    }
}
