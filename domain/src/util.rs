//! Shared text helpers.

/// Cut `s` to at most `max_bytes`, backing off to the previous UTF-8
/// character boundary.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Like [`truncate_str`] but marks the cut with `...` and collapses
/// whitespace first. Used for one-line console and report excerpts.
pub fn excerpt(s: &str, max_bytes: usize) -> String {
    let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.len() <= max_bytes {
        return flat;
    }
    let cut = truncate_str(&flat, max_bytes.saturating_sub(3));
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_input_unchanged() {
        assert_eq!(truncate_str("tokio", 10), "tokio");
        assert_eq!(truncate_str("", 3), "");
    }

    #[test]
    fn truncate_backs_off_inside_multibyte() {
        // each kana is 3 bytes
        assert_eq!(truncate_str("トレンド", 4), "ト");
        assert_eq!(truncate_str("トレンド", 6), "トレ");
    }

    #[test]
    fn excerpt_flattens_and_marks_cut() {
        assert_eq!(excerpt("a  quick\nbrown fox", 100), "a quick brown fox");
        assert_eq!(excerpt("a quick brown fox", 10), "a quick...");
    }
}
