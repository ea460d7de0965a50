//! YouTube video search.

use super::{HandlerError, PlatformHandler, records, result_json, str_field};
use crate::mcp::protocol::CallToolResult;
use chrono::{DateTime, Utc};
use scout_domain::{ResearchItem, ResearchPayload};
use serde_json::{Value, json};

pub struct YouTubeHandler;

const TUTORIAL: &[&str] = &[
    "tutorial", "explained", "introduction", "beginner", "guide", "how to", "解説", "説明",
    "入門", "基礎", "学習", "チュートリアル",
];
const DEMO: &[&str] = &["demo", "showcase", "walkthrough", "デモ", "実演", "サンプル"];
const CONFERENCE: &[&str] = &[
    "conference", "keynote", "talk", "seminar", "カンファレンス", "セミナー", "講演", "発表",
];
const NEWS: &[&str] = &[
    "news", "release", "update", "announc", "ニュース", "最新", "アップデート", "リリース",
];

/// Rough kind of video from its title and description.
pub fn classify_content(text: &str) -> &'static str {
    let text = text.to_lowercase();
    let matches = |words: &[&str]| words.iter().any(|w| text.contains(w));
    if matches(TUTORIAL) {
        "tutorial"
    } else if matches(DEMO) {
        "demo"
    } else if matches(CONFERENCE) {
        "conference"
    } else if matches(NEWS) {
        "news"
    } else {
        "other"
    }
}

/// `ja` when the text contains kana or CJK ideographs, `en` otherwise.
pub fn detect_language(text: &str) -> &'static str {
    let cjk = text.chars().any(|c| {
        matches!(c,
            '\u{3040}'..='\u{30ff}' | '\u{3400}'..='\u{4dbf}' | '\u{4e00}'..='\u{9fff}')
    });
    if cjk { "ja" } else { "en" }
}

impl PlatformHandler for YouTubeHandler {
    fn default_tool(&self) -> &'static str {
        "searchVideos"
    }

    fn arguments(&self, keyword: &str) -> Value {
        json!({
            "query": keyword,
            "order": "relevance",
            "type": "video",
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
        let videos = records(&data, &["videos", "items"])?;

        let mut items = Vec::new();
        for video in videos {
            let video_id = match video.get("id") {
                Some(Value::String(id)) => Some(id.clone()),
                Some(id) => str_field(id, &["videoId"]),
                None => None,
            };
            let Some(video_id) = video_id.filter(|id| !id.is_empty()) else {
                continue;
            };
            let snippet = video.get("snippet").unwrap_or(video);
            let title = str_field(snippet, &["title"]).unwrap_or_default();
            let description = str_field(snippet, &["description"]).unwrap_or_default();
            let text = format!("{} {}", title, description);

            let mut item = ResearchItem::new(title)
                .with_description(description)
                .with_url(format!("https://www.youtube.com/watch?v={}", video_id))
                .with_extra("video_id", video_id)
                .with_extra("content_type", classify_content(&text))
                .with_extra("language", detect_language(&text));
            if let Some(published) = str_field(snippet, &["publishedAt", "published_at"]) {
                item = item.with_published_at(published);
            }
            if let Some(channel) = str_field(snippet, &["channelTitle", "channel"]) {
                item = item.with_extra("channel", channel);
            }
            items.push(item);
        }

        let total = items.len();
        Ok(ResearchPayload::new(items).with_metric("total_videos", total))
    }
}
