//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Keyword text is empty after normalization")]
    EmptyKeyword,

    #[error("Keyword '{0}' is longer than {1} bytes")]
    KeywordTooLong(String, usize),

    #[error("Duplicate keyword in catalog: {0}")]
    DuplicateKeyword(String),

    #[error("Unknown keyword: {0}")]
    UnknownKeyword(String),

    #[error("Invalid keyword transition for '{keyword}': {from} -> {to}")]
    InvalidTransition {
        keyword: String,
        from: String,
        to: String,
    },

    #[error("Invalid platform name: {0}")]
    InvalidPlatform(String),
}

impl DomainError {
    /// Whether the error was caused by input that referenced a keyword the
    /// catalog does not know about.
    pub fn is_unknown_keyword(&self) -> bool {
        matches!(self, DomainError::UnknownKeyword(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_error_display() {
        let error = DomainError::InvalidTransition {
            keyword: "rust".to_string(),
            from: "archived".to_string(),
            to: "active".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid keyword transition for 'rust': archived -> active"
        );
    }

    #[test]
    fn test_is_unknown_keyword() {
        assert!(DomainError::UnknownKeyword("x".into()).is_unknown_keyword());
        assert!(!DomainError::EmptyKeyword.is_unknown_keyword());
    }
}
