//! Language model clients and the LLM-backed research services.
//!
//! A single [`CompletionClient`] is chosen at configuration time from
//! [`LlmSettings`]: an OpenAI-compatible chat completions client (OpenAI,
//! Groq, Ollama), the Anthropic messages client or the Gemini
//! `generateContent` client. The extractor and
//! recommender fall back to local heuristics when no client is configured
//! or a request fails.

pub mod anthropic;
pub mod extractor;
pub mod gemini;
pub mod heuristic;
pub mod openai;
pub mod recommender;

pub use anthropic::AnthropicClient;
pub use extractor::LlmKeywordExtractor;
pub use gemini::GeminiClient;
pub use heuristic::HeuristicKeywordExtractor;
pub use openai::OpenAiCompatibleClient;
pub use recommender::LlmRecommender;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors from language model requests
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0} returned no text")]
    EmptyResponse(&'static str),

    #[error("invalid API key header: {0}")]
    InvalidHeader(String),
}

/// Supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Groq,
    Ollama,
    Anthropic,
    Gemini,
    None,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Groq => "groq",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
            ProviderKind::None => "none",
        }
    }

    /// Variable holding the API key; `None` for keyless providers.
    pub fn default_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Groq => Some("GROQ_API_KEY"),
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::Gemini => Some("GOOGLE_API_KEY"),
            ProviderKind::Ollama | ProviderKind::None => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o",
            ProviderKind::Groq => "llama-3.1-8b-instant",
            ProviderKind::Ollama => "llama3",
            ProviderKind::Anthropic => "claude-3-5-sonnet-latest",
            ProviderKind::Gemini => "gemini-1.5-flash",
            ProviderKind::None => "",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Groq => "https://api.groq.com/openai/v1",
            ProviderKind::Ollama => "http://localhost:11434/v1",
            ProviderKind::Anthropic => "https://api.anthropic.com/v1",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderKind::None => "",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "groq" => Ok(ProviderKind::Groq),
            "ollama" => Ok(ProviderKind::Ollama),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "none" | "off" | "" => Ok(ProviderKind::None),
            other => Err(format!("unsupported llm provider: {}", other)),
        }
    }
}

/// Resolved provider settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub provider: ProviderKind,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

/// One-shot text completion.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// "provider/model", for logs and reports.
    fn describe(&self) -> String;

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}

/// Build the client for the configured provider. `None` for
/// [`ProviderKind::None`].
pub fn build_client(settings: &LlmSettings) -> Result<Option<Arc<dyn CompletionClient>>, LlmError> {
    let client: Arc<dyn CompletionClient> = match settings.provider {
        ProviderKind::None => return Ok(None),
        ProviderKind::Anthropic => Arc::new(AnthropicClient::new(settings.clone())?),
        ProviderKind::Gemini => Arc::new(GeminiClient::new(settings.clone())?),
        ProviderKind::OpenAi | ProviderKind::Groq | ProviderKind::Ollama => {
            Arc::new(OpenAiCompatibleClient::new(settings.clone())?)
        }
    };
    Ok(Some(client))
}
