//! Report and logging configuration from TOML (`[reports]`, `[logging]`)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw report sink configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReportsConfig {
    pub dir: PathBuf,
    /// Write `trends_<date>_<cycle>.json`.
    pub json: bool,
    /// Write `outcomes_<date>_<cycle>.csv`.
    pub csv: bool,
    pub notion: FileNotionConfig,
    pub supabase: FileSupabaseConfig,
}

impl Default for FileReportsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("reports"),
            json: true,
            csv: false,
            notion: FileNotionConfig::default(),
            supabase: FileSupabaseConfig::default(),
        }
    }
}

/// Notion page sink. Enabled when both fields resolve to a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileNotionConfig {
    pub api_key: String,
    pub parent_page_id: String,
}

impl Default for FileNotionConfig {
    fn default() -> Self {
        Self {
            api_key: "${NOTION_API_KEY}".to_string(),
            parent_page_id: "${NOTION_PARENT_PAGE_ID}".to_string(),
        }
    }
}

/// Supabase table sink. Enabled when `url` and `key` resolve to a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSupabaseConfig {
    pub url: String,
    pub key: String,
    pub table: String,
}

impl Default for FileSupabaseConfig {
    fn default() -> Self {
        Self {
            url: "${SUPABASE_URL}".to_string(),
            key: "${SUPABASE_KEY}".to_string(),
            table: "ai_trend_reports".to_string(),
        }
    }
}

/// Raw logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory of the rolling diagnostic log; `None` logs to stderr only.
    pub dir: Option<PathBuf>,
    /// JSONL research event log.
    pub event_log: Option<PathBuf>,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            dir: Some(PathBuf::from("logs")),
            event_log: Some(PathBuf::from("logs/events.jsonl")),
        }
    }
}
