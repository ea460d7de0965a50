//! Recommendations for the cycle report.

use super::CompletionClient;
use async_trait::async_trait;
use scout_application::ports::extraction::{ExtractionError, Recommender};
use scout_domain::{
    CycleSummary, KeywordRecord, ResearchPromptTemplate, TaskOutcome, parse_bullet_list,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;

/// Recommendations kept from a model answer.
pub const MAX_RECOMMENDATIONS: usize = 5;
/// Top findings quoted in the prompt.
const MAX_HIGHLIGHTS: usize = 5;
/// Keywords researched at least this often are suggested for retirement.
const OVERUSED_AFTER: u32 = 5;

/// Asks the configured model for next steps; falls back to rules based on
/// which platforms produced data.
pub struct LlmRecommender {
    client: Option<Arc<dyn CompletionClient>>,
}

impl LlmRecommender {
    pub fn new(client: Option<Arc<dyn CompletionClient>>) -> Self {
        Self { client }
    }

    async fn ask(
        &self,
        client: &dyn CompletionClient,
        outcomes: &[TaskOutcome],
        discovered: &[KeywordRecord],
    ) -> Result<Vec<String>, ExtractionError> {
        let summary = CycleSummary::from_outcomes(outcomes, discovered.len());
        let statistics = serde_json::to_string_pretty(&summary)
            .map_err(|e| ExtractionError::Parse(e.to_string()))?;
        let new_keywords: Vec<String> = discovered.iter().map(|r| r.text.clone()).collect();
        let prompt = ResearchPromptTemplate::recommendation_prompt(
            &statistics,
            &new_keywords,
            &highlights(outcomes),
        );

        let response = client
            .complete(ResearchPromptTemplate::recommendation_system(), &prompt)
            .await
            .map_err(|e| ExtractionError::Llm(e.to_string()))?;
        let recommendations = parse_bullet_list(&response, MAX_RECOMMENDATIONS);
        if recommendations.is_empty() {
            return Err(ExtractionError::Parse("empty recommendation list".to_string()));
        }
        Ok(recommendations)
    }
}

/// First item of each successful outcome, as "platform: title (keyword)".
fn highlights(outcomes: &[TaskOutcome]) -> Vec<String> {
    outcomes
        .iter()
        .filter_map(|outcome| {
            let item = outcome.payload()?.items.first()?;
            Some(format!(
                "From {}: '{}' for '{}'",
                outcome.platform(),
                item.title,
                outcome.keyword()
            ))
        })
        .take(MAX_HIGHLIGHTS)
        .collect()
}

/// Rule-based recommendations.
pub fn heuristic_recommendations(
    outcomes: &[TaskOutcome],
    history: &[KeywordRecord],
    discovered: &[KeywordRecord],
) -> Vec<String> {
    let with_data: BTreeSet<&str> = outcomes
        .iter()
        .filter(|o| o.item_count() > 0)
        .map(|o| o.platform().as_str())
        .collect();

    let mut recs = Vec::new();
    for platform in &with_data {
        let rec = match *platform {
            "github" => "Prioritize repositories with a high star rate and recent activity.",
            "arxiv" => "Read the recent arXiv abstracts (last 90 days) for new research directions.",
            "web" => "Scan the web results for emerging terms and new vendors.",
            "youtube" => "Watch the top tutorial and conference talks to gauge adoption.",
            "hackernews" => "Follow the Hacker News threads with the most comments for practitioner feedback.",
            "research_hub" => "Download the recent research hub papers for a deeper read.",
            _ => continue,
        };
        recs.push(rec.to_string());
    }
    if recs.is_empty() {
        recs.push("Broaden the sources or keywords to get more signal.".to_string());
    }

    if !discovered.is_empty() {
        let names: Vec<&str> = discovered.iter().take(5).map(|r| r.text.as_str()).collect();
        recs.push(format!(
            "Explore the newly discovered keywords in depth: {}.",
            names.join(", ")
        ));
    }

    if let Some(overused) = history
        .iter()
        .filter(|r| r.times_used >= OVERUSED_AFTER)
        .max_by_key(|r| r.times_used)
    {
        recs.push(format!(
            "Consider retiring '{}': researched {} times.",
            overused.text, overused.times_used
        ));
    }
    recs
}

#[async_trait]
impl Recommender for LlmRecommender {
    async fn recommend(
        &self,
        outcomes: &[TaskOutcome],
        history: &[KeywordRecord],
        discovered: &[KeywordRecord],
    ) -> Result<Vec<String>, ExtractionError> {
        let has_input = outcomes.iter().any(|o| o.is_success()) || !discovered.is_empty();
        if let Some(client) = &self.client
            && has_input
        {
            match self.ask(client.as_ref(), outcomes, discovered).await {
                Ok(recommendations) => return Ok(recommendations),
                Err(e) => warn!(
                    "Recommendations via {} failed, using rules: {}",
                    client.describe(),
                    e
                ),
            }
        }
        Ok(heuristic_recommendations(outcomes, history, discovered))
    }
}
