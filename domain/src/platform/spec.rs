//! Resolved platform specification.

use crate::research::value_objects::PlatformName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// How to reach one platform's tool server.
///
/// Built from configuration once environment references are resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSpec {
    pub name: PlatformName,
    /// Executable of the tool server (e.g. `npx`, `uvx`).
    pub command: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    /// Overrides the tool the platform handler calls by default.
    pub tool: Option<String>,
    pub init_timeout: Duration,
    pub enabled: bool,
    /// Why the platform is disabled (missing credentials, config flag).
    pub disabled_reason: Option<String>,
}

impl PlatformSpec {
    pub fn new(name: PlatformName, command: impl Into<String>) -> Self {
        Self {
            name,
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            tool: None,
            init_timeout: Duration::from_secs(15),
            enabled: true,
            disabled_reason: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    pub fn with_init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = timeout;
        self
    }

    pub fn disabled(mut self, reason: impl Into<String>) -> Self {
        self.enabled = false;
        self.disabled_reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let spec = PlatformSpec::new(PlatformName::parse("github").unwrap(), "npx")
            .with_args(vec!["-y".into(), "@modelcontextprotocol/server-github".into()])
            .with_env("GITHUB_TOKEN", "t")
            .with_init_timeout(Duration::from_secs(45));
        assert!(spec.enabled);
        assert_eq!(spec.args.len(), 2);
        assert_eq!(spec.env["GITHUB_TOKEN"], "t");
        assert_eq!(spec.init_timeout, Duration::from_secs(45));

        let disabled = spec.disabled("GITHUB_TOKEN not set");
        assert!(!disabled.enabled);
        assert_eq!(disabled.disabled_reason.as_deref(), Some("GITHUB_TOKEN not set"));
    }
}
