//! GitHub repository search with trend metrics.

use super::{
    HandlerError, PlatformHandler, days_since, records, result_json, round2, str_field,
    string_list, u64_field,
};
use crate::mcp::protocol::CallToolResult;
use chrono::{DateTime, Utc};
use scout_domain::{ResearchItem, ResearchPayload};
use serde_json::{Value, json};
use std::collections::HashMap;

/// Repositories below this many stars are filtered by the query itself.
const MIN_STARS: u32 = 50;

pub struct GitHubHandler;

/// Growth figures for one repository.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendMetrics {
    pub star_rate: f64,
    pub days_old: i64,
    pub is_trending: bool,
    pub trend_score: f64,
}

impl TrendMetrics {
    /// Stars per day since creation; trending means at least 100 stars,
    /// under a year old and more than half a star a day.
    ///
    /// The score (0-100) adds a growth component (up to 50), a recency
    /// bonus (up to 30) and a popularity bonus (up to 20).
    pub fn compute(stars: u64, days_old: Option<i64>) -> Self {
        let Some(days_old) = days_old.filter(|d| *d > 0) else {
            return Self {
                star_rate: 0.0,
                days_old: 0,
                is_trending: false,
                trend_score: 0.0,
            };
        };
        let stars_f = stars as f64;
        let star_rate = stars_f / days_old as f64;
        let is_trending = stars >= 100 && days_old <= 365 && star_rate > 0.5;

        let growth = (star_rate * 10.0).min(50.0);
        let recency = ((365 - days_old) as f64 / 365.0 * 30.0).max(0.0);
        let popularity = (stars_f / 200.0).min(20.0);
        let trend_score = round2((growth + recency + popularity).min(100.0));

        Self {
            star_rate: round2(star_rate),
            days_old,
            is_trending,
            trend_score,
        }
    }
}

impl PlatformHandler for GitHubHandler {
    fn default_tool(&self) -> &'static str {
        "search_repositories"
    }

    fn arguments(&self, keyword: &str) -> Value {
        json!({
            "query": format!("{} stars:>{}", keyword, MIN_STARS),
            "sort": "stars",
            "order": "desc",
            "per_page": 10,
        })
    }

    fn normalize_at(
        &self,
        _keyword: &str,
        result: &CallToolResult,
        now: DateTime<Utc>,
    ) -> Result<ResearchPayload, HandlerError> {
        let data = result_json(result)?;
        let repos = records(&data, &["items", "repositories"])?;

        let mut items = Vec::new();
        let mut total_stars = 0;
        let mut trending = 0;
        let mut languages: HashMap<String, usize> = HashMap::new();

        for repo in repos.iter().filter(|r| r.is_object()) {
            let Some(name) = str_field(repo, &["full_name", "name"]) else {
                continue;
            };
            let stars = u64_field(repo, &["stargazers_count", "stars"]).unwrap_or(0);
            let created_at = str_field(repo, &["created_at"]);
            let trend = TrendMetrics::compute(
                stars,
                created_at.as_deref().and_then(|d| days_since(d, now)),
            );
            let language = str_field(repo, &["language"]);

            total_stars += stars;
            if trend.is_trending {
                trending += 1;
            }
            if let Some(language) = &language {
                *languages.entry(language.clone()).or_default() += 1;
            }

            let mut item = ResearchItem::new(name)
                .with_description(str_field(repo, &["description"]).unwrap_or_default())
                .with_topics(string_list(repo.get("topics")))
                .with_extra("stars", stars)
                .with_extra("star_rate", trend.star_rate)
                .with_extra("days_old", trend.days_old)
                .with_extra("is_trending", trend.is_trending)
                .with_extra("trend_score", trend.trend_score);
            if let Some(url) = str_field(repo, &["html_url", "url"]) {
                item = item.with_url(url);
            }
            if let Some(created_at) = created_at {
                item = item.with_published_at(created_at);
            }
            if let Some(owner) = repo.get("owner").and_then(|o| str_field(o, &["login"])) {
                item = item.with_extra("owner", owner);
            }
            if let Some(language) = language {
                item = item.with_extra("language", language);
            }
            items.push(item);
        }

        let mut top_languages: Vec<(String, usize)> = languages.into_iter().collect();
        top_languages.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_languages.truncate(3);
        let top_languages: serde_json::Map<String, Value> = top_languages
            .into_iter()
            .map(|(lang, count)| (lang, json!(count)))
            .collect();

        let repo_count = items.len();
        Ok(ResearchPayload::new(items)
            .with_metric("repo_count", repo_count)
            .with_metric("total_stars", total_stars)
            .with_metric("trending_repos_count", trending)
            .with_metric("top_languages", Value::Object(top_languages)))
    }
}
