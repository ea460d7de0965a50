//! Keyword text normalization.
//!
//! Two forms exist for every keyword: the display text stored in the record
//! (trimmed, inner whitespace collapsed) and the canonical key used for
//! case-insensitive uniqueness (display text lowercased).

use crate::core::error::DomainError;

/// Maximum byte length accepted for a keyword.
pub const MAX_KEYWORD_BYTES: usize = 100;

/// Trim and collapse inner whitespace, validating length.
pub fn normalize_display(text: &str) -> Result<String, DomainError> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(DomainError::EmptyKeyword);
    }
    if collapsed.len() > MAX_KEYWORD_BYTES {
        return Err(DomainError::KeywordTooLong(collapsed, MAX_KEYWORD_BYTES));
    }
    Ok(collapsed)
}

/// Case-insensitive identity of a keyword.
pub fn canonical_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Clean an extraction candidate: strip list markers, surrounding quotes
/// and punctuation, then normalize. Candidates shorter than three
/// characters are rejected.
pub fn clean_candidate(raw: &str) -> Option<String> {
    let stripped = strip_list_marker(raw).trim_matches(|c: char| {
        c.is_whitespace() || matches!(
            c,
            '"' | '\'' | '`' | ',' | ';' | ':' | '.' | '!' | '?' | '[' | ']'
        )
    });
    let display = normalize_display(stripped).ok()?;
    if display.chars().count() < 3 {
        return None;
    }
    Some(display)
}

fn strip_list_marker(s: &str) -> &str {
    let s = s.trim_start();
    if let Some(rest) = s.strip_prefix(['-', '*', '•']) {
        return rest;
    }
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0
        && let Some(rest) = s[digits..].strip_prefix(['.', ')'])
    {
        return rest;
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(
            normalize_display("  rust   async\truntime ").unwrap(),
            "rust async runtime"
        );
    }

    #[test]
    fn test_normalize_rejects_empty_and_long() {
        assert_eq!(normalize_display("   "), Err(DomainError::EmptyKeyword));
        let long = "a".repeat(MAX_KEYWORD_BYTES + 1);
        assert!(matches!(
            normalize_display(&long),
            Err(DomainError::KeywordTooLong(_, _))
        ));
    }

    #[test]
    fn test_canonical_key_is_case_insensitive() {
        assert_eq!(canonical_key("LLM  Agents"), canonical_key("llm agents"));
    }

    #[test]
    fn test_clean_candidate() {
        assert_eq!(clean_candidate("\"vector db\","), Some("vector db".to_string()));
        assert_eq!(clean_candidate("- RAG pipelines"), Some("RAG pipelines".to_string()));
        assert_eq!(clean_candidate("3. mcp servers"), Some("mcp servers".to_string()));
        assert_eq!(clean_candidate("3d printing"), Some("3d printing".to_string()));
        assert_eq!(clean_candidate("ai"), None);
        assert_eq!(clean_candidate("  "), None);
    }
}
