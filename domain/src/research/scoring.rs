//! Relevance scoring for newly extracted keyword candidates.

/// Score each candidate `0..=100` by how often it occurs in `corpus`,
/// log-scaled against the most frequent candidate.
///
/// Matching is case-insensitive substring counting. When no candidate
/// occurs at all every score is zero. The result is sorted best first;
/// ties keep the extractor's order.
pub fn score_candidates(candidates: &[String], corpus: &str) -> Vec<(String, u8)> {
    let corpus = corpus.to_lowercase();
    let hits: Vec<usize> = candidates
        .iter()
        .map(|candidate| {
            let needle = candidate.to_lowercase();
            if needle.is_empty() {
                0
            } else {
                corpus.matches(needle.as_str()).count()
            }
        })
        .collect();

    let max_hits = hits.iter().copied().max().unwrap_or(0);
    let denominator = (max_hits as f64).ln_1p();

    let mut scored: Vec<(String, u8)> = candidates
        .iter()
        .zip(hits)
        .map(|(candidate, count)| {
            let score = if denominator > 0.0 {
                ((count as f64).ln_1p() / denominator * 100.0).round()
            } else {
                0.0
            };
            (candidate.clone(), score.clamp(0.0, 100.0) as u8)
        })
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_frequent_scores_100() {
        let candidates = vec!["agents".to_string(), "rag".to_string(), "zig".to_string()];
        let corpus = "Agents agents AGENTS and rag";
        let scores = score_candidates(&candidates, corpus);
        assert_eq!(scores[0], ("agents".to_string(), 100));
        // ln(2) / ln(4) = 0.5
        assert_eq!(scores[1], ("rag".to_string(), 50));
        assert_eq!(scores[2], ("zig".to_string(), 0));
    }

    #[test]
    fn test_sorted_best_first_with_stable_ties() {
        let candidates = vec![
            "zig".to_string(),
            "gleam".to_string(),
            "rag".to_string(),
            "agents".to_string(),
        ];
        let corpus = "agents agents agents rag";
        let names: Vec<String> = score_candidates(&candidates, corpus)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["agents", "rag", "zig", "gleam"]);
    }

    #[test]
    fn test_no_hits_scores_zero() {
        let scores = score_candidates(&["nothing".to_string()], "unrelated text");
        assert_eq!(scores, vec![("nothing".to_string(), 0)]);
    }

    #[test]
    fn test_empty_candidates() {
        assert!(score_candidates(&[], "text").is_empty());
    }
}
