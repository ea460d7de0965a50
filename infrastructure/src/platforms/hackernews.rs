//! Hacker News front-page stories, filtered locally by keyword.
//!
//! The Hacker News server has no search tool; `getStories` returns the
//! current top stories and the keyword is matched against their titles.

use super::{HandlerError, PlatformHandler, records, result_json, str_field, u64_field};
use crate::mcp::protocol::CallToolResult;
use chrono::{DateTime, Utc};
use scout_domain::{ResearchItem, ResearchPayload};
use serde_json::{Value, json};
use std::collections::HashSet;

pub struct HackerNewsHandler;

fn words(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '-' && c != '+' && c != '#')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a story title matches a keyword: one shared word for
/// single-word keywords, two for longer ones.
pub fn title_matches(keyword: &str, title: &str) -> bool {
    let keyword_words = words(keyword);
    if keyword_words.is_empty() {
        return false;
    }
    let threshold = if keyword_words.len() > 1 { 2 } else { 1 };
    let title_words = words(title);
    keyword_words.intersection(&title_words).count() >= threshold
}

impl PlatformHandler for HackerNewsHandler {
    fn default_tool(&self) -> &'static str {
        "getStories"
    }

    fn arguments(&self, _keyword: &str) -> Value {
        json!({})
    }

    fn normalize_at(
        &self,
        keyword: &str,
        result: &CallToolResult,
        _now: DateTime<Utc>,
    ) -> Result<ResearchPayload, HandlerError> {
        let data = result_json(result)?;
        let stories = records(&data, &["stories", "hits"])?;

        let mut items = Vec::new();
        for story in stories {
            let Some(title) = str_field(story, &["title"]) else {
                continue;
            };
            if !title_matches(keyword, &title) {
                continue;
            }
            let score = u64_field(story, &["score", "points"]).unwrap_or(0);
            let comments = u64_field(story, &["descendants", "num_comments"]).unwrap_or(0);

            let mut item = ResearchItem::new(title)
                .with_extra("score", score)
                .with_extra("comments", comments);
            if let Some(url) = str_field(story, &["url"]) {
                item = item.with_url(url);
            }
            if let Some(author) = str_field(story, &["by", "author"]) {
                item = item.with_extra("author", author);
            }
            if let Some(id) = u64_field(story, &["id", "objectID"]) {
                item = item.with_extra("story_id", id);
            }
            if let Some(time) = story.get("time").and_then(Value::as_i64)
                && let Some(at) = DateTime::<Utc>::from_timestamp(time, 0)
            {
                item = item.with_published_at(at.to_rfc3339());
            }
            items.push(item);
        }

        let post_count = items.len();
        let total_score: u64 = items
            .iter()
            .filter_map(|i| i.extra.get("score").and_then(Value::as_u64))
            .sum();
        let avg_score = if post_count == 0 {
            0
        } else {
            (total_score as f64 / post_count as f64).round() as u64
        };

        Ok(ResearchPayload::new(items)
            .with_metric("post_count", post_count)
            .with_metric("avg_score", avg_score)
            .with_metric("stories_scanned", stories.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::ContentBlock;

    #[test]
    fn test_title_matching_threshold() {
        assert!(title_matches("rust", "Why Rust is eating the world"));
        assert!(!title_matches("rust", "Trust issues"));
        assert!(title_matches("vector database", "A vector database in 500 lines"));
        assert!(!title_matches("vector database", "Vector graphics for the web"));
        assert!(!title_matches("  ", "anything"));
    }

    #[test]
    fn test_stories_as_separate_text_blocks() {
        let result = CallToolResult {
            content: vec![
                ContentBlock::text(
                    json!({"id": 1, "title": "Show HN: Rust GPU kernels", "score": 120, "descendants": 40, "by": "alice", "time": 1767225600})
                        .to_string(),
                ),
                ContentBlock::text(
                    json!({"id": 2, "title": "Rust 2.0 announced", "score": 80, "url": "https://blog.rust-lang.org"})
                        .to_string(),
                ),
                ContentBlock::text(json!({"id": 3, "title": "Gardening tips", "score": 5}).to_string()),
            ],
            ..Default::default()
        };

        let payload = HackerNewsHandler.normalize("rust", &result).unwrap();

        assert_eq!(payload.items.len(), 2);
        assert_eq!(payload.items[0].extra["author"], json!("alice"));
        assert_eq!(
            payload.items[0].published_at.as_deref(),
            Some("2026-01-01T00:00:00+00:00")
        );
        assert_eq!(payload.metrics["avg_score"], json!(100));
        assert_eq!(payload.metrics["stories_scanned"], json!(3));
    }
}
