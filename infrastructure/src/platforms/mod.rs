//! Platform handlers.
//!
//! A handler knows which tool a platform's MCP server exposes for search,
//! how to phrase the arguments for a keyword, and how to turn the tool
//! result into a [`ResearchPayload`]. Handlers do no I/O.

pub mod arxiv;
pub mod generic;
pub mod github;
pub mod hackernews;
pub mod research_hub;
pub mod web;
pub mod youtube;

use crate::mcp::protocol::CallToolResult;
use chrono::{DateTime, NaiveDate, Utc};
use scout_domain::ResearchPayload;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Platforms with a built-in handler.
pub const BUILTIN_PLATFORMS: [&str; 6] = [
    "github",
    "youtube",
    "web",
    "arxiv",
    "hackernews",
    "research_hub",
];

/// Errors turning a tool result into a payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("tool returned no content")]
    EmptyResult,

    #[error("unexpected result shape: {0}")]
    UnexpectedShape(String),
}

/// Search behavior of one platform.
pub trait PlatformHandler: Send + Sync {
    /// Tool called when the platform config does not name one.
    fn default_tool(&self) -> &'static str;

    /// Tool arguments for a keyword.
    fn arguments(&self, keyword: &str) -> Value;

    /// Normalize a tool result, judging ages against `now`.
    fn normalize_at(
        &self,
        keyword: &str,
        result: &CallToolResult,
        now: DateTime<Utc>,
    ) -> Result<ResearchPayload, HandlerError>;

    fn normalize(
        &self,
        keyword: &str,
        result: &CallToolResult,
    ) -> Result<ResearchPayload, HandlerError> {
        self.normalize_at(keyword, result, Utc::now())
    }
}

/// Built-in handler for a platform name.
pub fn handler_for(platform: &str) -> Option<Arc<dyn PlatformHandler>> {
    let handler: Arc<dyn PlatformHandler> = match platform {
        "github" => Arc::new(github::GitHubHandler),
        "youtube" => Arc::new(youtube::YouTubeHandler),
        "web" => Arc::new(web::WebHandler),
        "arxiv" => Arc::new(arxiv::ArxivHandler),
        "hackernews" => Arc::new(hackernews::HackerNewsHandler),
        "research_hub" => Arc::new(research_hub::ResearchHubHandler),
        _ => return None,
    };
    Some(handler)
}

/// Built-in handler, or [`generic::GenericHandler`] for platforms declared
/// only in configuration.
pub fn handler_or_generic(platform: &str) -> Arc<dyn PlatformHandler> {
    handler_for(platform).unwrap_or_else(|| Arc::new(generic::GenericHandler))
}

// ==================== JSON helpers ====================

/// The tool result as JSON, or [`HandlerError::EmptyResult`].
fn result_json(result: &CallToolResult) -> Result<Value, HandlerError> {
    result.json().ok_or(HandlerError::EmptyResult)
}

/// The record list of a result: the value itself when it is an array,
/// otherwise the first of `keys` holding an array.
fn records<'a>(value: &'a Value, keys: &[&str]) -> Result<&'a [Value], HandlerError> {
    if let Some(array) = value.as_array() {
        return Ok(array.as_slice());
    }
    if let Some(object) = value.as_object() {
        for key in keys {
            if let Some(array) = object.get(*key).and_then(Value::as_array) {
                return Ok(array.as_slice());
            }
        }
        return Ok(&[]);
    }
    Err(HandlerError::UnexpectedShape(match value {
        Value::String(text) => format!("plain text: {}", scout_domain::util::excerpt(text, 80)),
        other => format!("{} instead of a list", type_name(other)),
    }))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// First non-empty string among `keys`.
fn str_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// First integer among `keys`.
fn u64_field(value: &Value, keys: &[&str]) -> Option<u64> {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(Value::as_u64))
}

/// A list of strings, or of objects carrying a `name`.
fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .or_else(|| str_field(item, &["name", "login"]))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Whole days between an RFC 3339 / ISO date and `now`.
fn days_since(date: &str, now: DateTime<Utc>) -> Option<i64> {
    let date = date.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
        return Some((now - parsed.with_timezone(&Utc)).num_days());
    }
    let day = date.get(..10)?;
    let parsed = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?;
    Some((now.date_naive() - parsed).num_days())
}

/// Round to two decimals.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::ContentBlock;
    use chrono::TimeZone;
    use serde_json::json;

    pub(crate) fn text_result(value: Value) -> CallToolResult {
        CallToolResult {
            content: vec![ContentBlock::text(value.to_string())],
            ..Default::default()
        }
    }

    #[test]
    fn test_handler_for_builtins() {
        for name in BUILTIN_PLATFORMS {
            let handler = handler_for(name).unwrap();
            assert!(!handler.default_tool().is_empty());
        }
        assert!(handler_for("myspace").is_none());
        assert_eq!(handler_or_generic("myspace").default_tool(), "search");
        assert_eq!(handler_or_generic("web").default_tool(), "one_search");
    }

    #[test]
    fn test_records_accepts_array_or_keyed_object() {
        let array = json!([1, 2]);
        assert_eq!(records(&array, &["items"]).unwrap().len(), 2);
        let keyed = json!({"repositories": [1]});
        assert_eq!(records(&keyed, &["items", "repositories"]).unwrap().len(), 1);
        let none = json!({"total_count": 0});
        assert!(records(&none, &["items"]).unwrap().is_empty());
        assert!(matches!(
            records(&json!("rate limited"), &["items"]),
            Err(HandlerError::UnexpectedShape(_))
        ));
    }

    #[test]
    fn test_days_since_formats() {
        let now = Utc.with_ymd_and_hms(2026, 3, 11, 12, 0, 0).unwrap();
        assert_eq!(days_since("2026-03-01T12:00:00Z", now), Some(10));
        assert_eq!(days_since("2026-03-01", now), Some(10));
        assert_eq!(days_since("yesterday", now), None);
    }

    #[test]
    fn test_empty_result() {
        assert_eq!(
            result_json(&CallToolResult::default()),
            Err(HandlerError::EmptyResult)
        );
    }

    #[test]
    fn test_string_list_mixed() {
        let value = json!(["a", {"name": "b"}, 3]);
        assert_eq!(string_list(Some(&value)), vec!["a", "b"]);
    }
}
