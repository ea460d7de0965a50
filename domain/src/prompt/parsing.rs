//! LLM response parsing for keyword extraction and recommendations.
//!
//! These functions extract structured lists from free-form LLM output.
//! They are pure domain logic: no I/O, just text pattern matching.
//!
//! | Function | Use Case | Accepted formats |
//! |----------|----------|------------------|
//! | [`parse_keyword_list`] | Keyword extraction | JSON array, comma/line separated |
//! | [`parse_bullet_list`] | Recommendations | `-`, `*`, `•` or numbered lines |

use crate::keyword::text::{canonical_key, clean_candidate};
use std::collections::HashSet;

/// Parse keyword candidates from an extraction response.
///
/// The first bracketed span is tried as a JSON array of strings. When there
/// is none, or it does not parse, the text is split on commas and newlines.
/// Results are cleaned, de-duplicated case-insensitively and capped at
/// `max`.
///
/// ```
/// use scout_domain::prompt::parsing::parse_keyword_list;
///
/// let parsed = parse_keyword_list(r#"Sure: ["MCP servers", "vector db"]"#, 10);
/// assert_eq!(parsed, vec!["MCP servers", "vector db"]);
/// ```
pub fn parse_keyword_list(response: &str, max: usize) -> Vec<String> {
    let raw: Vec<String> = first_json_array(response).unwrap_or_else(|| {
        response
            .split([',', '\n'])
            .map(|s| s.to_string())
            .collect()
    });

    let mut seen = HashSet::new();
    raw.iter()
        .filter_map(|s| clean_candidate(s))
        .filter(|s| seen.insert(canonical_key(s)))
        .take(max)
        .collect()
}

fn first_json_array(response: &str) -> Option<Vec<String>> {
    let start = response.find('[')?;
    let end = start + response[start..].find(']')?;
    serde_json::from_str::<Vec<String>>(&response[start..=end]).ok()
}

/// Parse a bulleted (or numbered) list, one recommendation per line.
///
/// When no line carries a list marker, every non-empty line is taken.
pub fn parse_bullet_list(response: &str, max: usize) -> Vec<String> {
    let lines: Vec<&str> = response
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let bullets: Vec<String> = lines
        .iter()
        .filter_map(|line| strip_bullet(line))
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    let items = if bullets.is_empty() {
        lines.into_iter().map(str::to_string).collect()
    } else {
        bullets
    };
    items.into_iter().take(max).collect()
}

fn strip_bullet(line: &str) -> Option<&str> {
    if let Some(rest) = line.strip_prefix(['-', '*', '•']) {
        return Some(rest.trim());
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0
        && let Some(rest) = line[digits..].strip_prefix(['.', ')'])
    {
        return Some(rest.trim());
    }
    None
}
