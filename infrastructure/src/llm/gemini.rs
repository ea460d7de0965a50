//! Google Gemini `generateContent` client.

use super::{CompletionClient, LlmError, LlmSettings};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Text parts of the first candidate.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let joined = content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");
        (!joined.trim().is_empty()).then_some(joined)
    }
}

pub struct GeminiClient {
    settings: LlmSettings,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(settings: LlmSettings) -> Result<Self, LlmError> {
        let mut headers = HeaderMap::new();
        let key = settings.api_key.as_deref().unwrap_or_default();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(key).map_err(|e| LlmError::InvalidHeader(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { settings, http })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }

    fn request<'a>(&self, system: &'a str, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            system_instruction: (!system.is_empty()).then_some(Content {
                role: None,
                parts: [Part { text: system }],
            }),
            contents: [Content {
                role: Some("user"),
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.settings.max_tokens,
                temperature: self.settings.temperature,
            },
        }
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    fn describe(&self) -> String {
        format!("gemini/{}", self.settings.model)
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        debug!(model = %self.settings.model, "Gemini generateContent request");

        let response = self
            .http
            .post(self.endpoint())
            .json(&self.request(system, prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                provider: "gemini",
                status,
                body,
            });
        }

        let body: GenerateResponse = response.json().await?;
        body.into_text().ok_or(LlmError::EmptyResponse("gemini"))
    }
}
