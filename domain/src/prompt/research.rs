//! Prompt templates for the research cycle's LLM steps

/// Templates for keyword extraction and recommendations
pub struct ResearchPromptTemplate;

impl ResearchPromptTemplate {
    /// System prompt for keyword extraction
    pub fn extraction_system() -> &'static str {
        r#"You are a technology trend analyst.
You read summaries of search results from code hosting, video, paper and news platforms
and identify emerging topics worth researching next.
Answer with a JSON array of strings and nothing else."#
    }

    /// User prompt for keyword extraction
    pub fn extraction_prompt(summary: &str, known: &[String], max_keywords: usize) -> String {
        let mut prompt = format!(
            r#"Below is a summary of this research cycle's results as JSON.

{}

Extract between 5 and {} new trending keywords suggested by these results.
Prefer concrete technologies, libraries, techniques and product names.
Each keyword must be 1-4 words."#,
            summary, max_keywords
        );

        if !known.is_empty() {
            prompt.push_str("\n\nDo not repeat these keywords that were already researched:\n");
            for keyword in known {
                prompt.push_str(&format!("- {}\n", keyword));
            }
        }

        prompt.push_str("\nRespond only with a JSON array, e.g. [\"keyword one\", \"keyword two\"].");
        prompt
    }

    /// System prompt for recommendations
    pub fn recommendation_system() -> &'static str {
        r#"You are a research lead summarizing a trend-scouting run for engineers.
Be concrete and brief."#
    }

    /// User prompt for recommendations
    pub fn recommendation_prompt(
        statistics: &str,
        new_keywords: &[String],
        highlights: &[String],
    ) -> String {
        let mut prompt = format!(
            r#"Statistics of this research cycle (JSON):
{}
"#,
            statistics
        );

        if !new_keywords.is_empty() {
            prompt.push_str(&format!(
                "\nNewly discovered keywords: {}\n",
                new_keywords.join(", ")
            ));
        }

        if !highlights.is_empty() {
            prompt.push_str("\nNotable findings:\n");
            for highlight in highlights {
                prompt.push_str(&format!("- {}\n", highlight));
            }
        }

        prompt.push_str(
            r#"
Give 3 to 5 actionable recommendations for what to research or try next.
Format each as a single bullet line starting with "- "."#,
        );
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_prompt_lists_known_keywords() {
        let prompt =
            ResearchPromptTemplate::extraction_prompt("{}", &["rust".into(), "wasm".into()], 10);
        assert!(prompt.contains("between 5 and 10"));
        assert!(prompt.contains("- rust\n- wasm"));
        assert!(prompt.contains("JSON array"));
    }

    #[test]
    fn test_extraction_prompt_without_known() {
        let prompt = ResearchPromptTemplate::extraction_prompt("{}", &[], 8);
        assert!(!prompt.contains("already researched"));
    }

    #[test]
    fn test_recommendation_prompt_sections() {
        let prompt = ResearchPromptTemplate::recommendation_prompt(
            r#"{"total_items": 12}"#,
            &["edge ai".into()],
            &["tokio trending on github".into()],
        );
        assert!(prompt.contains("\"total_items\": 12"));
        assert!(prompt.contains("Newly discovered keywords: edge ai"));
        assert!(prompt.contains("- tokio trending on github"));
    }
}
