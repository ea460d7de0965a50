//! Supabase table sink (PostgREST insert).

use super::{http_error, report_document};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use scout_application::ports::report_sink::{ReportSink, SinkAck, SinkError};
use scout_domain::ResearchCycleResult;
use serde_json::{Value, json};
use std::time::Duration;

pub struct SupabaseSink {
    http: reqwest::Client,
    endpoint: String,
}

impl SupabaseSink {
    pub fn new(url: String, key: String, table: String) -> Result<Self, SinkError> {
        let invalid = |e: reqwest::header::InvalidHeaderValue| SinkError::Request(e.to_string());
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(&key).map_err(invalid)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", key)).map_err(invalid)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("prefer", HeaderValue::from_static("return=representation"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SinkError::Request(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: format!("{}/rest/v1/{}", url.trim_end_matches('/'), table),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Row inserted per cycle.
pub fn table_row(result: &ResearchCycleResult) -> Value {
    let doc = report_document(result);
    json!({
        "date": doc["date"],
        "cycle_id": doc["cycle_id"],
        "summary": doc["summary"],
        "detailed_results": doc["detailed_results"],
        "new_keywords": doc["new_keywords"],
        "recommendations": doc["recommendations"],
    })
}

/// Id of the first returned row, if any.
fn row_id(rows: &Value) -> Option<String> {
    let id = rows.as_array()?.first()?.get("id")?;
    Some(match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

#[async_trait]
impl ReportSink for SupabaseSink {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn publish(&self, result: &ResearchCycleResult) -> Result<SinkAck, SinkError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&table_row(result))
            .send()
            .await
            .map_err(|e| SinkError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }
        let rows: Value = response.json().await.unwrap_or(Value::Null);
        Ok(match row_id(&rows) {
            Some(id) => SinkAck::at(id),
            None => SinkAck::accepted(),
        })
    }
}
