//! Keyword catalog: records, lifecycle state machine and text normalization.

pub mod catalog;
pub mod entities;
pub mod text;

pub use catalog::KeywordCatalog;
pub use entities::{KeywordId, KeywordRecord, KeywordSource, KeywordState};
pub use text::{canonical_key, clean_candidate, normalize_display};
