//! Notion page sink.
//!
//! Creates one child page per cycle under a configured parent page. The
//! page carries the summary, recommendations, new keywords and the top
//! results of each platform as toggle blocks.

use super::http_error;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use scout_application::ports::report_sink::{ReportSink, SinkAck, SinkError};
use scout_domain::util::truncate_str;
use scout_domain::{ContentBundle, ResearchCycleResult, ResultAggregator};
use serde_json::{Value, json};
use std::time::Duration;

const API_URL: &str = "https://api.notion.com/v1/pages";
const NOTION_VERSION: &str = "2022-06-28";
/// Notion rejects rich text longer than this.
const MAX_TEXT: usize = 2000;
/// Children accepted in a single page creation request.
const MAX_BLOCKS: usize = 100;
const TOP_RESULTS: usize = 3;

pub struct NotionSink {
    http: reqwest::Client,
    parent_page_id: String,
}

impl NotionSink {
    pub fn new(api_key: String, parent_page_id: String) -> Result<Self, SinkError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| SinkError::Request(e.to_string()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert("notion-version", HeaderValue::from_static(NOTION_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SinkError::Request(e.to_string()))?;
        Ok(Self {
            http,
            parent_page_id,
        })
    }
}

fn rich_text(content: &str) -> Value {
    json!([{ "type": "text", "text": { "content": truncate_str(content, MAX_TEXT) } }])
}

fn block(kind: &str, content: &str) -> Value {
    json!({ "object": "block", "type": kind, kind: { "rich_text": rich_text(content) } })
}

fn toggle(title: &str, children: Vec<Value>) -> Value {
    json!({
        "object": "block",
        "type": "toggle",
        "toggle": { "rich_text": rich_text(title), "children": children },
    })
}

/// Page body blocks, capped at [`MAX_BLOCKS`].
pub fn page_blocks(result: &ResearchCycleResult, bundle: &ContentBundle) -> Vec<Value> {
    let summary = &result.summary;
    let mut blocks = vec![
        block("heading_2", "Summary"),
        block(
            "paragraph",
            &format!(
                "{} of {} tasks succeeded, {} items collected, {} new keywords. Keywords: {}.",
                summary.successful_tasks,
                summary.total_tasks,
                summary.total_items,
                summary.new_keywords_count,
                result.keywords.join(", ")
            ),
        ),
    ];

    if !result.recommendations.is_empty() {
        blocks.push(block("heading_2", "Recommendations"));
        blocks.extend(
            result
                .recommendations
                .iter()
                .map(|r| block("bulleted_list_item", r)),
        );
    }

    if !result.discovered.is_empty() {
        blocks.push(block("heading_2", "New keywords"));
        blocks.extend(
            result
                .discovered
                .iter()
                .map(|r| block("bulleted_list_item", &r.text)),
        );
    }

    if !bundle.is_empty() {
        blocks.push(block("heading_2", "Top results"));
        for (keyword, platforms) in bundle.iter() {
            for (platform, payload) in platforms {
                let items: Vec<Value> = payload
                    .items
                    .iter()
                    .take(TOP_RESULTS)
                    .map(|item| {
                        let line = match &item.url {
                            Some(url) => format!("{} ({})", item.title, url),
                            None => item.title.clone(),
                        };
                        block("bulleted_list_item", &line)
                    })
                    .collect();
                if !items.is_empty() {
                    blocks.push(toggle(&format!("{} / {}", platform, keyword), items));
                }
            }
        }
    }

    blocks.truncate(MAX_BLOCKS);
    blocks
}

#[async_trait]
impl ReportSink for NotionSink {
    fn name(&self) -> &str {
        "notion"
    }

    async fn publish(&self, result: &ResearchCycleResult) -> Result<SinkAck, SinkError> {
        let (bundle, _) = ResultAggregator::aggregate(&result.outcomes);
        let title = format!("Trend report {}", result.started_at.format("%Y-%m-%d"));
        let body = json!({
            "parent": { "page_id": self.parent_page_id },
            "properties": { "title": { "title": rich_text(&title) } },
            "children": page_blocks(result, &bundle),
        });

        let response = self
            .http
            .post(API_URL)
            .json(&body)
            .send()
            .await
            .map_err(|e| SinkError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }
        let page: Value = response
            .json()
            .await
            .map_err(|e| SinkError::Serialization(e.to_string()))?;
        Ok(match page.get("url").and_then(Value::as_str) {
            Some(url) => SinkAck::at(url),
            None => SinkAck::accepted(),
        })
    }
}
