//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Resolution into application types ([`CycleParams`], [`PlatformSpec`],
//! [`LlmSettings`](crate::llm::LlmSettings)) happens here as well, with
//! `${VAR}` references expanded from the process environment.

mod cycle;
mod llm;
mod platforms;
mod reports;

pub use cycle::{FileCycleConfig, FileKeywordsConfig};
pub use llm::{FileLlmConfig, LlmSelection};
pub use platforms::{DEFAULT_INIT_TIMEOUT_SECS, FilePlatformConfig, builtin_platform, expand_env};
pub use reports::{
    FileLoggingConfig, FileNotionConfig, FileReportsConfig, FileSupabaseConfig,
};

use crate::platforms::BUILTIN_PLATFORMS;
use scout_application::CycleParams;
use scout_domain::PlatformSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("{0} cannot be 0")]
    Zero(&'static str),

    #[error("platform '{0}' has no command")]
    EmptyCommand(String),

    #[error("invalid platform name '{name}': {reason}")]
    InvalidPlatformName { name: String, reason: String },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub cycle: FileCycleConfig,
    pub keywords: FileKeywordsConfig,
    /// Overrides and additions keyed by platform name.
    pub platforms: BTreeMap<String, FilePlatformConfig>,
    pub llm: FileLlmConfig,
    pub reports: FileReportsConfig,
    pub logging: FileLoggingConfig,
}

/// Environment lookup used when resolving `${VAR}` references.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

impl FileConfig {
    /// Validate the configuration, returning every detected problem.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();
        let zero_checks = [
            ("cycle.connect_attempts", self.cycle.connect_attempts == 0),
            ("cycle.close_timeout_secs", self.cycle.close_timeout_secs == 0),
            ("cycle.max_in_flight", self.cycle.max_in_flight == 0),
            ("cycle.task_timeout_secs", self.cycle.task_timeout_secs == 0),
            ("keywords.batch_size", self.keywords.batch_size == 0),
            ("llm.timeout_secs", self.llm.timeout_secs == 0),
        ];
        for (field, is_zero) in zero_checks {
            if is_zero {
                issues.push(ConfigValidationError::Zero(field));
            }
        }

        for (name, platform) in &self.platforms {
            if platform.init_timeout_secs == Some(0) {
                issues.push(ConfigValidationError::Zero("platforms.*.init_timeout_secs"));
            }
            let has_command = match &platform.command {
                Some(command) => !command.trim().is_empty(),
                None => builtin_platform(name).is_some(),
            };
            if !has_command {
                issues.push(ConfigValidationError::EmptyCommand(name.clone()));
            }
        }
        issues
    }

    /// Cycle parameters for the research use case.
    pub fn to_cycle_params(&self) -> CycleParams {
        let cycle = &self.cycle;
        let deadline = (cycle.deadline_secs > 0).then(|| Duration::from_secs(cycle.deadline_secs));
        CycleParams::default()
            .with_connect_attempts(cycle.connect_attempts)
            .with_connect_retry_delay(Duration::from_secs(cycle.connect_retry_delay_secs))
            .with_close_timeout(Duration::from_secs(cycle.close_timeout_secs))
            .with_max_in_flight(cycle.max_in_flight)
            .with_task_timeout(Duration::from_secs(cycle.task_timeout_secs))
            .with_cycle_deadline(deadline)
            .with_cancel_grace(Duration::from_secs(cycle.cancel_grace_secs))
            .with_batch_size(self.keywords.batch_size)
            .with_staleness_days(self.keywords.staleness_days)
            .with_max_new_keywords(self.keywords.max_new_keywords)
            .with_seed_keywords(self.keywords.seeds.clone())
    }

    /// Every platform, built-in ones first, resolved against `lookup`.
    /// Disabled platforms are included with their reason.
    pub fn platform_specs(
        &self,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Vec<PlatformSpec>, ConfigValidationError> {
        let extra = self
            .platforms
            .keys()
            .filter(|name| !BUILTIN_PLATFORMS.contains(&name.as_str()))
            .map(String::as_str);
        let names: Vec<&str> = BUILTIN_PLATFORMS.iter().copied().chain(extra).collect();

        names
            .into_iter()
            .map(|name| {
                let base = builtin_platform(name).unwrap_or_default();
                let merged = match self.platforms.get(name) {
                    Some(user) => user.overlay(&base),
                    None => base,
                };
                merged.resolve(name, lookup)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[cycle]
max_in_flight = 4
task_timeout_secs = 30
deadline_secs = 0

[keywords]
batch_size = 6
seeds = ["wasm components"]
store_dir = "/var/lib/scout"

[platforms.github]
init_timeout_secs = 30

[platforms.papers]
command = "uvx"
args = ["paper-search-mcp"]
tool = "search"

[llm]
provider = "anthropic"
model = "claude-sonnet-4-5"

[reports]
csv = true

[reports.supabase]
table = "scout_reports"

[logging]
event_log = "/tmp/events.jsonl"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.cycle.max_in_flight, 4);
        assert_eq!(config.cycle.connect_attempts, 2);
        assert_eq!(config.keywords.seeds, vec!["wasm components"]);
        assert_eq!(config.platforms["papers"].tool.as_deref(), Some("search"));
        assert_eq!(config.llm.provider.as_deref(), Some("anthropic"));
        assert!(config.reports.csv);
        assert!(config.reports.json);
        assert_eq!(config.reports.supabase.table, "scout_reports");
        assert_eq!(config.reports.supabase.url, "${SUPABASE_URL}");
        assert!(config.validate().is_empty());

        let params = config.to_cycle_params();
        assert_eq!(params.max_in_flight, 4);
        assert_eq!(params.task_timeout, Duration::from_secs(30));
        assert!(params.cycle_deadline.is_none());
        assert_eq!(params.batch_size, 6);
    }

    #[test]
    fn test_default_config() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
        let params = config.to_cycle_params();
        assert_eq!(params.connect_attempts, 2);
        assert_eq!(params.cycle_deadline, Some(Duration::from_secs(900)));
        assert_eq!(params.staleness, Duration::from_secs(30 * 24 * 60 * 60));
    }

    #[test]
    fn test_validate_rejects_zero_values_and_empty_commands() {
        let toml_str = r#"
[cycle]
max_in_flight = 0
task_timeout_secs = 0

[keywords]
batch_size = 0

[platforms.papers]
args = ["x"]

[platforms.blank]
command = "  "
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.validate();
        assert!(issues.contains(&ConfigValidationError::Zero("cycle.max_in_flight")));
        assert!(issues.contains(&ConfigValidationError::Zero("cycle.task_timeout_secs")));
        assert!(issues.contains(&ConfigValidationError::Zero("keywords.batch_size")));
        assert!(issues.contains(&ConfigValidationError::EmptyCommand("papers".into())));
        assert!(issues.contains(&ConfigValidationError::EmptyCommand("blank".into())));
        assert_eq!(issues.len(), 5);
    }

    #[test]
    fn test_platform_specs_order_and_gating() {
        let toml_str = r#"
[platforms.papers]
command = "uvx"
args = ["paper-search-mcp"]

[platforms.hackernews]
enabled = false
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let specs = config.platform_specs(&no_env).unwrap();

        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["github", "youtube", "web", "arxiv", "hackernews", "research_hub", "papers"]
        );
        let by_name = |n: &str| specs.iter().find(|s| s.name.as_str() == n).unwrap();
        assert!(!by_name("github").enabled);
        assert!(!by_name("hackernews").enabled);
        assert!(by_name("web").enabled);
        assert!(by_name("papers").enabled);
        assert_eq!(by_name("papers").args, vec!["paper-search-mcp"]);
    }
}
