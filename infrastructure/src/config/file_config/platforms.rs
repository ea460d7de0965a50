//! Platform server configuration from TOML (`[platforms.<name>]`)
//!
//! Every built-in platform has defaults; a `[platforms.<name>]` table only
//! needs the fields it changes. Unknown names must give a `command`.
//!
//! ```toml
//! [platforms.github]
//! init_timeout_secs = 30
//!
//! [platforms.youtube]
//! enabled = false
//!
//! [platforms.papers]
//! command = "uvx"
//! args = ["paper-search-mcp"]
//! tool = "search"
//! env = { API_KEY = "${PAPERS_API_KEY}" }
//! required_env = ["PAPERS_API_KEY"]
//! ```

use super::ConfigValidationError;
use regex::{Captures, Regex};
use scout_domain::{PlatformName, PlatformSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::Duration;

/// Handshake bound when neither the platform nor `MCP_INIT_TIMEOUT` sets one.
pub const DEFAULT_INIT_TIMEOUT_SECS: u64 = 15;

static ENV_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("valid regex")
});

/// Raw configuration of one platform server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePlatformConfig {
    pub command: Option<String>,
    pub args: Option<Vec<String>>,
    /// Merged over the built-in environment, key by key.
    pub env: BTreeMap<String, String>,
    pub tool: Option<String>,
    pub init_timeout_secs: Option<u64>,
    pub enabled: Option<bool>,
    /// Variables that must be set for the platform to be enabled.
    pub required_env: Option<Vec<String>>,
    /// Disable the platform when `command` cannot be found.
    pub require_executable: Option<bool>,
}

impl FilePlatformConfig {
    fn command(command: &str, args: &[&str]) -> Self {
        Self {
            command: Some(command.to_string()),
            args: Some(args.iter().map(|a| a.to_string()).collect()),
            ..Default::default()
        }
    }

    fn env(mut self, vars: &[(&str, &str)]) -> Self {
        for (key, value) in vars {
            self.env.insert(key.to_string(), value.to_string());
        }
        self
    }

    fn required(mut self, vars: &[&str]) -> Self {
        self.required_env = Some(vars.iter().map(|v| v.to_string()).collect());
        self
    }

    fn init_timeout(mut self, secs: u64) -> Self {
        self.init_timeout_secs = Some(secs);
        self
    }

    /// Fields set here win over `base`; env maps merge.
    pub fn overlay(&self, base: &FilePlatformConfig) -> FilePlatformConfig {
        let mut env = base.env.clone();
        env.extend(self.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        FilePlatformConfig {
            command: self.command.clone().or_else(|| base.command.clone()),
            args: self.args.clone().or_else(|| base.args.clone()),
            env,
            tool: self.tool.clone().or_else(|| base.tool.clone()),
            init_timeout_secs: self.init_timeout_secs.or(base.init_timeout_secs),
            enabled: self.enabled.or(base.enabled),
            required_env: self
                .required_env
                .clone()
                .or_else(|| base.required_env.clone()),
            require_executable: self.require_executable.or(base.require_executable),
        }
    }

    /// Resolve into a [`PlatformSpec`], expanding `${VAR}` references
    /// through `lookup`.
    pub fn resolve(
        &self,
        name: &str,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<PlatformSpec, ConfigValidationError> {
        let platform = PlatformName::parse(name).map_err(|e| {
            ConfigValidationError::InvalidPlatformName {
                name: name.to_string(),
                reason: e.to_string(),
            }
        })?;

        let command = self
            .command
            .as_deref()
            .map(|c| expand_env(c, lookup))
            .unwrap_or_default();
        if command.trim().is_empty() {
            return Err(ConfigValidationError::EmptyCommand(name.to_string()));
        }

        let args = self
            .args
            .iter()
            .flatten()
            .map(|a| expand_env(a, lookup))
            .collect();

        let init_timeout = self
            .init_timeout_secs
            .or_else(|| lookup("MCP_INIT_TIMEOUT").and_then(|v| v.trim().parse().ok()))
            .unwrap_or(DEFAULT_INIT_TIMEOUT_SECS);

        let mut spec = PlatformSpec::new(platform, command.trim())
            .with_args(args)
            .with_init_timeout(Duration::from_secs(init_timeout));
        for (key, value) in &self.env {
            let value = expand_env(value, lookup);
            if !value.is_empty() {
                spec = spec.with_env(key.clone(), value);
            }
        }
        if let Some(tool) = &self.tool {
            spec = spec.with_tool(tool.clone());
        }

        if self.enabled == Some(false) {
            return Ok(spec.disabled("disabled in configuration"));
        }
        let missing: Vec<&str> = self
            .required_env
            .iter()
            .flatten()
            .map(String::as_str)
            .filter(|var| lookup(var).is_none_or(|v| v.trim().is_empty()))
            .collect();
        if !missing.is_empty() {
            return Ok(spec.disabled(format!("{} not set", missing.join(", "))));
        }
        if self.require_executable == Some(true) && which::which(&spec.command).is_err() {
            let reason = format!("{} not found", spec.command);
            return Ok(spec.disabled(reason));
        }
        Ok(spec)
    }
}

/// Replace `${VAR}` and `${VAR:-default}` with values from `lookup`.
/// Unset variables without a default expand to the empty string.
pub fn expand_env(value: &str, lookup: &dyn Fn(&str) -> Option<String>) -> String {
    ENV_REF
        .replace_all(value, |caps: &Captures| {
            lookup(&caps[1])
                .filter(|v| !v.is_empty())
                .or_else(|| caps.get(2).map(|d| d.as_str().to_string()))
                .unwrap_or_default()
        })
        .into_owned()
}

const QUIET_NODE: [(&str, &str); 3] = [("DOTENVX_SILENT", "1"), ("FORCE_COLOR", "0"), ("NO_COLOR", "1")];

/// Built-in defaults for a known platform.
pub fn builtin_platform(name: &str) -> Option<FilePlatformConfig> {
    let config = match name {
        "github" => FilePlatformConfig::command("npx", &["-y", "@modelcontextprotocol/server-github"])
            .env(&[("GITHUB_PERSONAL_ACCESS_TOKEN", "${GITHUB_PERSONAL_ACCESS_TOKEN}")])
            .required(&["GITHUB_PERSONAL_ACCESS_TOKEN"]),
        "youtube" => FilePlatformConfig::command("npx", &["-y", "youtube-data-mcp-server"])
            .env(&[
                ("YOUTUBE_API_KEY", "${YOUTUBE_API_KEY}"),
                ("YOUTUBE_TRANSCRIPT_LANG", "${YOUTUBE_TRANSCRIPT_LANG:-en}"),
            ])
            .required(&["YOUTUBE_API_KEY"]),
        "web" => FilePlatformConfig::command("one-search-mcp", &[])
            .env(&QUIET_NODE)
            .init_timeout(45),
        "arxiv" => FilePlatformConfig::command("npx", &["-y", "@langgpt/arxiv-mcp-server@latest"])
            .env(&[
                ("SILICONFLOW_API_KEY", "${SILICONFLOW_API_KEY}"),
                ("WORK_DIR", "${ARXIV_WORK_DIR:-./reports}"),
            ])
            .env(&QUIET_NODE)
            .required(&["SILICONFLOW_API_KEY"])
            .init_timeout(60),
        "hackernews" => {
            FilePlatformConfig::command("npx", &["-y", "@microagents/server-hackernews"])
        }
        "research_hub" => FilePlatformConfig {
            require_executable: Some(true),
            ..FilePlatformConfig::command(
                "${RESEARCH_HUB_EXECUTABLE:-rust-research-mcp}",
                &[
                    "--download-dir",
                    "${RESEARCH_PAPERS_DIR:-research-papers}",
                    "--log-level",
                    "info",
                ],
            )
        }
        .env(&[("RUST_LOG", "info")])
        .env(&QUIET_NODE),
        _ => return None,
    };
    Some(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_expand_env() {
        let lookup = env_of(&[("TOKEN", "abc"), ("EMPTY", "")]);
        assert_eq!(expand_env("${TOKEN}", &lookup), "abc");
        assert_eq!(expand_env("Bearer ${TOKEN}!", &lookup), "Bearer abc!");
        assert_eq!(expand_env("${MISSING}", &lookup), "");
        assert_eq!(expand_env("${MISSING:-dir}", &lookup), "dir");
        assert_eq!(expand_env("${EMPTY:-fallback}", &lookup), "fallback");
        assert_eq!(expand_env("$TOKEN", &lookup), "$TOKEN");
    }

    #[test]
    fn test_required_env_disables_platform() {
        let github = builtin_platform("github").unwrap();

        let spec = github.resolve("github", &env_of(&[])).unwrap();
        assert!(!spec.enabled);
        assert_eq!(
            spec.disabled_reason.as_deref(),
            Some("GITHUB_PERSONAL_ACCESS_TOKEN not set")
        );
        assert!(spec.env.is_empty());

        let spec = github
            .resolve("github", &env_of(&[("GITHUB_PERSONAL_ACCESS_TOKEN", "ghp")]))
            .unwrap();
        assert!(spec.enabled);
        assert_eq!(spec.env["GITHUB_PERSONAL_ACCESS_TOKEN"], "ghp");
    }

    #[test]
    fn test_init_timeout_precedence() {
        let lookup = env_of(&[("MCP_INIT_TIMEOUT", "20")]);
        let web = builtin_platform("web").unwrap().resolve("web", &lookup).unwrap();
        assert_eq!(web.init_timeout, Duration::from_secs(45));
        let hn = builtin_platform("hackernews")
            .unwrap()
            .resolve("hackernews", &lookup)
            .unwrap();
        assert_eq!(hn.init_timeout, Duration::from_secs(20));
        let hn = builtin_platform("hackernews")
            .unwrap()
            .resolve("hackernews", &env_of(&[]))
            .unwrap();
        assert_eq!(hn.init_timeout, Duration::from_secs(DEFAULT_INIT_TIMEOUT_SECS));
    }

    #[test]
    fn test_overlay_keeps_builtin_fields() {
        let user = FilePlatformConfig {
            init_timeout_secs: Some(30),
            env: BTreeMap::from([("LOG_LEVEL".to_string(), "debug".to_string())]),
            ..Default::default()
        };
        let merged = user.overlay(&builtin_platform("web").unwrap());
        assert_eq!(merged.command.as_deref(), Some("one-search-mcp"));
        assert_eq!(merged.init_timeout_secs, Some(30));
        assert_eq!(merged.env["NO_COLOR"], "1");
        assert_eq!(merged.env["LOG_LEVEL"], "debug");
    }

    #[test]
    fn test_research_hub_args_and_missing_binary() {
        let lookup = env_of(&[
            ("RESEARCH_HUB_EXECUTABLE", "/nonexistent/rust-research-mcp"),
            ("RESEARCH_PAPERS_DIR", "/tmp/papers"),
        ]);
        let spec = builtin_platform("research_hub")
            .unwrap()
            .resolve("research_hub", &lookup)
            .unwrap();
        assert_eq!(spec.command, "/nonexistent/rust-research-mcp");
        assert_eq!(spec.args[1], "/tmp/papers");
        assert!(!spec.enabled);
        assert!(spec.disabled_reason.unwrap().contains("not found"));
    }

    #[test]
    fn test_unknown_platform_needs_command() {
        let config = FilePlatformConfig::default();
        assert!(matches!(
            config.resolve("papers", &env_of(&[])),
            Err(ConfigValidationError::EmptyCommand(_))
        ));
        assert!(builtin_platform("papers").is_none());
    }

    #[test]
    fn test_explicitly_disabled() {
        let config = FilePlatformConfig {
            enabled: Some(false),
            ..Default::default()
        }
        .overlay(&builtin_platform("hackernews").unwrap());
        let spec = config.resolve("hackernews", &env_of(&[])).unwrap();
        assert!(!spec.enabled);
        assert_eq!(spec.disabled_reason.as_deref(), Some("disabled in configuration"));
    }
}
