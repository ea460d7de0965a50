//! Anthropic messages API client.

use super::{CompletionClient, LlmError, LlmSettings};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    system: &'a str,
    messages: [UserMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    fn into_text(self) -> Option<String> {
        let text: Vec<String> = self
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect();
        let joined = text.join("\n");
        (!joined.trim().is_empty()).then_some(joined)
    }
}

pub struct AnthropicClient {
    settings: LlmSettings,
    http: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(settings: LlmSettings) -> Result<Self, LlmError> {
        let mut headers = HeaderMap::new();
        let key = settings.api_key.as_deref().unwrap_or_default();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(key).map_err(|e| LlmError::InvalidHeader(e.to_string()))?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { settings, http })
    }

    fn request<'a>(&'a self, system: &'a str, prompt: &'a str) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.settings.model,
            system,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        }
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    fn describe(&self) -> String {
        format!("anthropic/{}", self.settings.model)
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/messages", self.settings.base_url.trim_end_matches('/'));
        debug!(model = %self.settings.model, "Anthropic messages request");

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
                provider: "anthropic",
                status,
                body,
            });
        }

        let body: MessagesResponse = response.json().await?;
        body.into_text().ok_or(LlmError::EmptyResponse("anthropic"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ProviderKind;
    use serde_json::json;
    use std::time::Duration;

    fn client() -> AnthropicClient {
        AnthropicClient::new(LlmSettings {
            provider: ProviderKind::Anthropic,
            model: "claude-3-5-sonnet-latest".into(),
            api_key: Some("sk-ant".into()),
            base_url: ProviderKind::Anthropic.default_base_url().into(),
            max_tokens: 512,
            temperature: 0.3,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_request_body_carries_system_separately() {
        let client = client();
        let body = serde_json::to_value(client.request("analyst", "extract")).unwrap();
        assert_eq!(body["system"], "analyst");
        assert_eq!(body["messages"], json!([{"role": "user", "content": "extract"}]));

        let body = serde_json::to_value(client.request("", "extract")).unwrap();
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_response_text_blocks() {
        let response: MessagesResponse = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "- one"},
                {"type": "tool_use", "id": "t", "name": "x", "input": {}},
                {"type": "text", "text": "- two"}
            ]
        }))
        .unwrap();
        assert_eq!(response.into_text().as_deref(), Some("- one\n- two"));
    }
}
