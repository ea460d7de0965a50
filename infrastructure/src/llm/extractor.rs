//! LLM keyword extraction with a heuristic fallback.

use super::CompletionClient;
use super::heuristic::HeuristicKeywordExtractor;
use async_trait::async_trait;
use scout_application::ports::extraction::{ExtractionError, KeywordExtractor};
use scout_domain::util::truncate_str;
use scout_domain::{ContentBundle, ResearchPromptTemplate, canonical_key, parse_keyword_list};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Items per (keyword, platform) sent to the model.
pub const ITEMS_PER_OUTCOME: usize = 3;
/// Description bytes kept per item.
pub const DESCRIPTION_BYTES: usize = 200;

/// One line of the compact content summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub platform: String,
    pub keyword: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
}

/// First [`ITEMS_PER_OUTCOME`] items of every successful outcome.
pub fn content_summary(bundle: &ContentBundle) -> Vec<SummaryEntry> {
    let mut summary = Vec::new();
    for (keyword, payloads) in bundle.iter() {
        for (platform, payload) in payloads {
            for item in payload.items.iter().take(ITEMS_PER_OUTCOME) {
                summary.push(SummaryEntry {
                    platform: platform.to_string(),
                    keyword: keyword.to_string(),
                    title: item.title.clone(),
                    description: truncate_str(&item.description, DESCRIPTION_BYTES).to_string(),
                    topics: item.topics.clone(),
                });
            }
        }
    }
    summary
}

/// Asks the configured model for new keywords; uses the heuristic
/// extractor when there is no model, the request fails or the answer
/// holds no usable keyword.
pub struct LlmKeywordExtractor {
    client: Option<Arc<dyn CompletionClient>>,
    fallback: HeuristicKeywordExtractor,
    max_keywords: usize,
}

impl LlmKeywordExtractor {
    pub fn new(client: Option<Arc<dyn CompletionClient>>, max_keywords: usize) -> Self {
        Self {
            client,
            fallback: HeuristicKeywordExtractor::new(max_keywords),
            max_keywords,
        }
    }

    async fn ask(
        &self,
        client: &dyn CompletionClient,
        summary: &[SummaryEntry],
        known: &[String],
    ) -> Result<Vec<String>, ExtractionError> {
        let summary_json = serde_json::to_string_pretty(summary)
            .map_err(|e| ExtractionError::Parse(e.to_string()))?;
        let prompt =
            ResearchPromptTemplate::extraction_prompt(&summary_json, known, self.max_keywords);
        let response = client
            .complete(ResearchPromptTemplate::extraction_system(), &prompt)
            .await
            .map_err(|e| ExtractionError::Llm(e.to_string()))?;
        debug!("Extraction response: {}", response);

        let known: HashSet<String> = known.iter().map(|k| canonical_key(k)).collect();
        let keywords: Vec<String> = parse_keyword_list(&response, self.max_keywords)
            .into_iter()
            .filter(|k| !known.contains(&canonical_key(k)))
            .collect();
        if keywords.is_empty() {
            return Err(ExtractionError::Parse(
                "no new keywords in model response".to_string(),
            ));
        }
        Ok(keywords)
    }
}

#[async_trait]
impl KeywordExtractor for LlmKeywordExtractor {
    async fn extract(
        &self,
        bundle: &ContentBundle,
        known: &[String],
    ) -> Result<Vec<String>, ExtractionError> {
        let summary = content_summary(bundle);
        if summary.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(client) = &self.client {
            match self.ask(client.as_ref(), &summary, known).await {
                Ok(keywords) => {
                    info!(
                        "{} extracted {} keywords",
                        client.describe(),
                        keywords.len()
                    );
                    return Ok(keywords);
                }
                Err(e) => warn!("Keyword extraction via {} failed, using heuristics: {}", client.describe(), e),
            }
        }

        let corpus = super::heuristic::summary_corpus(&summary);
        Ok(self.fallback.candidates(&corpus, known))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use scout_domain::{PlatformName, ResearchItem, ResearchPayload};
    use std::sync::Mutex;

    struct ScriptedClient {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(reply: Result<&str, &str>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string).map_err(str::to_string),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        fn describe(&self) -> String {
            "scripted/test".to_string()
        }

        async fn complete(&self, _system: &str, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .map_err(|body| LlmError::Api {
                    provider: "scripted",
                    status: 500,
                    body,
                })
        }
    }

    fn bundle() -> ContentBundle {
        let mut bundle = ContentBundle::new();
        let items = (0..5)
            .map(|i| {
                ResearchItem::new(format!("Graph neural networks part {}", i))
                    .with_description("x".repeat(500))
            })
            .collect();
        bundle.insert(
            "gnn",
            PlatformName::parse("arxiv").unwrap(),
            ResearchPayload::new(items),
        );
        bundle
    }

    #[test]
    fn test_content_summary_is_compact() {
        let summary = content_summary(&bundle());
        assert_eq!(summary.len(), ITEMS_PER_OUTCOME);
        assert_eq!(summary[0].platform, "arxiv");
        assert_eq!(summary[0].keyword, "gnn");
        assert_eq!(summary[0].description.len(), DESCRIPTION_BYTES);
    }

    #[tokio::test]
    async fn test_llm_keywords_filtered_against_known() {
        let client = ScriptedClient::new(Ok(r#"["GNN", "graph transformers", "message passing"]"#));
        let extractor = LlmKeywordExtractor::new(Some(client.clone() as Arc<dyn CompletionClient>), 10);

        let keywords = extractor
            .extract(&bundle(), &["gnn".to_string()])
            .await
            .unwrap();

        assert_eq!(keywords, vec!["graph transformers", "message passing"]);
        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[0].contains("Graph neural networks part 0"));
        assert!(!prompts[0].contains("part 3"));
    }

    #[tokio::test]
    async fn test_llm_failure_falls_back_to_heuristics() {
        let client = ScriptedClient::new(Err("overloaded"));
        let extractor = LlmKeywordExtractor::new(Some(client as Arc<dyn CompletionClient>), 5);
        let keywords = extractor.extract(&bundle(), &[]).await.unwrap();
        assert!(keywords.contains(&"graph neural networks".to_string()));
    }

    #[tokio::test]
    async fn test_unusable_answer_falls_back() {
        let client = ScriptedClient::new(Ok("[]"));
        let extractor = LlmKeywordExtractor::new(Some(client as Arc<dyn CompletionClient>), 5);
        assert!(!extractor.extract(&bundle(), &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_bundle_skips_model() {
        let client = ScriptedClient::new(Ok(r#"["never"]"#));
        let extractor = LlmKeywordExtractor::new(Some(client.clone() as Arc<dyn CompletionClient>), 5);
        assert!(extractor.extract(&ContentBundle::new(), &[]).await.unwrap().is_empty());
        assert!(client.prompts.lock().unwrap().is_empty());
    }
}
