//! Cycle and keyword configuration from TOML (`[cycle]` and `[keywords]`)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw cycle configuration.
///
/// Durations are whole seconds. `deadline_secs = 0` disables the cycle
/// deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCycleConfig {
    pub connect_attempts: u32,
    pub connect_retry_delay_secs: u64,
    pub close_timeout_secs: u64,
    pub max_in_flight: usize,
    pub task_timeout_secs: u64,
    pub deadline_secs: u64,
    pub cancel_grace_secs: u64,
}

impl Default for FileCycleConfig {
    fn default() -> Self {
        Self {
            connect_attempts: 2,
            connect_retry_delay_secs: 2,
            close_timeout_secs: 10,
            max_in_flight: 8,
            task_timeout_secs: 60,
            deadline_secs: 15 * 60,
            cancel_grace_secs: 5,
        }
    }
}

/// Raw keyword configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileKeywordsConfig {
    /// Keywords promoted into each cycle.
    pub batch_size: usize,
    /// Unused keywords older than this are archived.
    pub staleness_days: u64,
    pub max_new_keywords: usize,
    /// Inserted when the catalog is empty.
    pub seeds: Vec<String>,
    /// Directory holding `keywords.json` and `history.json`.
    pub store_dir: PathBuf,
}

impl Default for FileKeywordsConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            staleness_days: 30,
            max_new_keywords: 10,
            seeds: vec![
                "AI agents".to_string(),
                "model context protocol".to_string(),
                "retrieval augmented generation".to_string(),
            ],
            store_dir: PathBuf::from("keywords"),
        }
    }
}
