//! Language model configuration from TOML (`[llm]` section)
//!
//! The provider is chosen once here. Unset fields fall back to the
//! `AI_PROVIDER`, `AI_MODEL_<PROVIDER>` and provider key variables.

use super::platforms::expand_env;
use crate::llm::{LlmSettings, ProviderKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw LLM configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLlmConfig {
    /// "openai", "groq", "ollama", "anthropic", "gemini" or "none".
    pub provider: Option<String>,
    pub model: Option<String>,
    /// Direct API key (prefer `api_key_env`).
    pub api_key: Option<String>,
    /// Variable holding the API key; defaults per provider.
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for FileLlmConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model: None,
            api_key: None,
            api_key_env: None,
            base_url: None,
            max_tokens: 1024,
            temperature: 0.3,
            timeout_secs: 60,
        }
    }
}

/// Outcome of provider selection.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmSelection {
    Enabled(LlmSettings),
    /// No model is used; the reason is shown to the user.
    Disabled(String),
}

impl FileLlmConfig {
    pub fn resolve(&self, lookup: &dyn Fn(&str) -> Option<String>) -> LlmSelection {
        let name = self
            .provider
            .clone()
            .or_else(|| lookup("AI_PROVIDER"))
            .unwrap_or_else(|| "openai".to_string());
        let kind = match name.parse::<ProviderKind>() {
            Ok(kind) => kind,
            Err(e) => return LlmSelection::Disabled(e),
        };
        if kind == ProviderKind::None {
            return LlmSelection::Disabled("llm provider set to none".to_string());
        }

        let api_key = match kind.default_key_env() {
            None => None,
            Some(default_env) => {
                let env = self.api_key_env.as_deref().unwrap_or(default_env);
                let key = self
                    .api_key
                    .as_deref()
                    .map(|k| expand_env(k, lookup))
                    .filter(|k| !k.is_empty())
                    .or_else(|| lookup(env).filter(|k| !k.trim().is_empty()));
                match key {
                    Some(key) => Some(key),
                    None => return LlmSelection::Disabled(format!("{} not set", env)),
                }
            }
        };

        let model_env = format!("AI_MODEL_{}", kind.as_str().to_uppercase());
        let model = self
            .model
            .clone()
            .or_else(|| lookup(&model_env))
            .unwrap_or_else(|| kind.default_model().to_string());
        let base_url = self
            .base_url
            .clone()
            .unwrap_or_else(|| kind.default_base_url().to_string());

        LlmSelection::Enabled(LlmSettings {
            provider: kind,
            model,
            api_key,
            base_url,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}
