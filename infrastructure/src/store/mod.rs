//! Keyword store backed by JSON files.
//!
//! Provides [`JsonKeywordStore`], which implements the
//! [`KeywordStore`](scout_application::KeywordStore) port.

mod json_store;

pub use json_store::JsonKeywordStore;
