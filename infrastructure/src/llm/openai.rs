//! OpenAI-compatible chat completions client (OpenAI, Groq, Ollama).

use super::{CompletionClient, LlmError, LlmSettings};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
    }
}

pub struct OpenAiCompatibleClient {
    settings: LlmSettings,
    http: reqwest::Client,
}

impl OpenAiCompatibleClient {
    pub fn new(settings: LlmSettings) -> Result<Self, LlmError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &settings.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| LlmError::InvalidHeader(e.to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { settings, http })
    }

    fn request<'a>(&'a self, system: &'a str, prompt: &'a str) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if !system.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });
        ChatRequest {
            model: &self.settings.model,
            messages,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatibleClient {
    fn describe(&self) -> String {
        format!("{}/{}", self.settings.provider, self.settings.model)
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        );
        debug!(model = %self.settings.model, "Chat completion request");

        let response = self
            .http
            .post(&url)
            .json(&self.request(system, prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                provider: self.settings.provider.as_str(),
                status,
                body,
            });
        }

        let body: ChatResponse = response.json().await?;
        body.into_text()
            .ok_or(LlmError::EmptyResponse(self.settings.provider.as_str()))
    }
}
