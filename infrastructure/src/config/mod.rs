//! Configuration file loading for trend-scout
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `SCOUT_*` environment variables (`SCOUT_CYCLE__MAX_IN_FLIGHT=4`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./scout.toml` or `./.scout.toml`
//! 4. Global: `$XDG_CONFIG_HOME/trend-scout/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, DEFAULT_INIT_TIMEOUT_SECS, FileConfig, FileCycleConfig,
    FileKeywordsConfig, FileLlmConfig, FileLoggingConfig, FileNotionConfig, FilePlatformConfig,
    FileReportsConfig, FileSupabaseConfig, LlmSelection, builtin_platform, expand_env,
    process_env,
};
pub use loader::{ConfigLoader, ConfigSource};
