//! Frequency-based keyword extraction used without a language model.
//!
//! Phrases (two and three words) that repeat across the corpus rank first,
//! then frequent single tokens not already part of a phrase. Stop words,
//! numbers and keywords already in the catalog are skipped.

use super::extractor::{SummaryEntry, content_summary};
use async_trait::async_trait;
use regex::Regex;
use scout_application::ports::extraction::{ExtractionError, KeywordExtractor};
use scout_domain::{ContentBundle, canonical_key};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9][a-z0-9+#_.\-]{2,}").expect("valid regex"));
static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z0-9]+").expect("valid regex"));

const STOP_WORDS: &[&str] = &[
    "a", "an", "as", "at", "by", "in", "is", "it", "of", "on", "or", "to", "https", "http", "www", "com", "org", "the", "and", "for", "are", "but", "not", "you", "all",
    "can", "her", "was", "one", "our", "out", "has", "his", "how", "its", "new", "now", "see",
    "two", "who", "use", "using", "from", "with", "that", "this", "what", "when", "your", "have",
    "about", "into", "like", "will", "there", "their", "been", "make", "only", "some", "more",
    "over", "also", "than", "which", "were", "after", "before", "because", "could", "should",
    "would", "these", "those", "they", "them", "then", "just", "very", "most", "such", "other",
    "here", "where", "while", "each", "based", "via", "between", "through", "paper", "video",
];

fn is_stop(word: &str) -> bool {
    STOP_WORDS.contains(&word) || word.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Counts with first-seen order for stable ranking.
#[derive(Default)]
struct Tally {
    counts: HashMap<String, (usize, usize)>,
    next: usize,
}

impl Tally {
    fn add(&mut self, term: String) {
        let next = self.next;
        let entry = self.counts.entry(term).or_insert((0, next));
        if entry.0 == 0 {
            self.next += 1;
        }
        entry.0 += 1;
    }

    fn ranked(self, min_count: usize) -> Vec<String> {
        let mut terms: Vec<(String, usize, usize)> = self
            .counts
            .into_iter()
            .filter(|(_, (count, _))| *count >= min_count)
            .map(|(term, (count, order))| (term, count, order))
            .collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        terms.into_iter().map(|(term, _, _)| term).collect()
    }
}

/// Keyword candidates from word and phrase frequencies.
#[derive(Debug, Clone)]
pub struct HeuristicKeywordExtractor {
    max_keywords: usize,
}

impl HeuristicKeywordExtractor {
    pub fn new(max_keywords: usize) -> Self {
        Self { max_keywords }
    }

    /// Candidates from `corpus`, skipping anything in `known`.
    pub fn candidates(&self, corpus: &str, known: &[String]) -> Vec<String> {
        let text = corpus.to_lowercase();
        let known: HashSet<String> = known.iter().map(|k| canonical_key(k)).collect();

        let mut singles = Tally::default();
        for token in TOKEN.find_iter(&text) {
            let token = token.as_str().trim_end_matches(['.', '-', '_']);
            if token.len() >= 3 && !is_stop(token) {
                singles.add(token.to_string());
            }
        }

        let mut bigrams = Tally::default();
        let mut trigrams = Tally::default();
        for line in text.lines() {
            let words: Vec<&str> = WORD.find_iter(line).map(|m| m.as_str()).collect();
            for window in words.windows(2) {
                if window.iter().all(|w| !is_stop(w)) {
                    bigrams.add(window.join(" "));
                }
            }
            for window in words.windows(3) {
                if !is_stop(window[0]) && !is_stop(window[2]) {
                    trigrams.add(window.join(" "));
                }
            }
        }

        let mut out: Vec<String> = Vec::new();
        let mut phrase_words = HashSet::new();
        for phrase in trigrams.ranked(2).into_iter().chain(bigrams.ranked(2)) {
            if out.len() >= self.max_keywords {
                return out;
            }
            if known.contains(&phrase) || out.contains(&phrase) {
                continue;
            }
            phrase_words.extend(phrase.split(' ').map(str::to_string));
            out.push(phrase);
        }
        for single in singles.ranked(1) {
            if out.len() >= self.max_keywords {
                break;
            }
            // Already covered by a phrase.
            if known.contains(&single) || phrase_words.contains(&single) || out.contains(&single) {
                continue;
            }
            out.push(single);
        }
        out
    }

    /// Candidates from a bundle's content summary.
    pub fn from_bundle(&self, bundle: &ContentBundle, known: &[String]) -> Vec<String> {
        self.candidates(&summary_corpus(&content_summary(bundle)), known)
    }
}

/// Titles, descriptions and topics of a summary, one per line.
pub fn summary_corpus(summary: &[SummaryEntry]) -> String {
    let mut parts = Vec::new();
    for entry in summary {
        parts.push(entry.title.as_str());
        parts.push(entry.description.as_str());
        parts.extend(entry.topics.iter().map(String::as_str));
    }
    parts.retain(|p| !p.is_empty());
    parts.join("\n")
}

#[async_trait]
impl KeywordExtractor for HeuristicKeywordExtractor {
    async fn extract(
        &self,
        bundle: &ContentBundle,
        known: &[String],
    ) -> Result<Vec<String>, ExtractionError> {
        Ok(self.from_bundle(bundle, known))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_phrases_rank_first() {
        let corpus = "Mixture of experts routing for small models\n\
                      Sparse mixture of experts at scale\n\
                      Mixture of experts inference kernels\n\
                      Speculative decoding kernels";
        let candidates = HeuristicKeywordExtractor::new(5).candidates(corpus, &[]);
        assert_eq!(candidates[0], "mixture of experts");
        assert!(candidates.contains(&"kernels".to_string()));
        assert!(candidates.len() <= 5);
    }

    #[test]
    fn test_known_and_stop_words_skipped() {
        let corpus = "rust async runtime\nrust async runtime with tokio\nthe 2026 release";
        let known = vec!["Rust Async Runtime".to_string(), "tokio".to_string()];
        let candidates = HeuristicKeywordExtractor::new(20).candidates(corpus, &known);
        assert!(!candidates.contains(&"rust async runtime".to_string()));
        assert!(!candidates.contains(&"tokio".to_string()));
        assert!(!candidates.contains(&"the".to_string()));
        assert!(!candidates.contains(&"2026".to_string()));
        assert!(candidates.contains(&"rust async".to_string()));
    }

    #[test]
    fn test_empty_corpus() {
        assert!(HeuristicKeywordExtractor::new(10).candidates("", &[]).is_empty());
    }
}
