use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Empty completion content")]
    EmptyContent,

    #[error("Service call failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// The text-generation capability every pipeline stage depends on.
/// Production uses [`GroqService`]; tests substitute deterministic doubles.
#[async_trait]
pub trait TextCompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ServiceError>;
}

/// OpenAI-compatible chat-completions client with bounded retries,
/// linear backoff, and a hard per-request timeout.
#[derive(Clone)]
pub struct GroqService {
    client: Client,
    api_key: String,
    base_url: String,
    max_attempts: u32,
    backoff_step: Duration,
    request_timeout: Duration,
}

impl GroqService {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            api_key: config.groq_api_key.clone(),
            base_url: config.groq_base_url.clone(),
            max_attempts: config.max_attempts.max(1),
            backoff_step: Duration::from_millis(config.backoff_step_ms),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    async fn chat_once(&self, request: &CompletionRequest) -> Result<String, ServiceError> {
        let body = serde_json::json!({
            "model": request.model,
            "messages": [
                {"role": "system", "content": "You are an interview question generator."},
                {"role": "user", "content": request.prompt}
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(self.request_timeout)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let message = res.text().await.unwrap_or_default();
            return Err(ServiceError::Api { status, message });
        }

        let body: JsonValue = res.json().await?;
        let content = extract_content(&body);
        if content.trim().is_empty() {
            return Err(ServiceError::EmptyContent);
        }

        // Diagnostics only; the raw text never influences control flow here.
        debug!(chars = content.len(), "completion content received");
        Ok(content)
    }
}

#[async_trait]
impl TextCompletionClient for GroqService {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ServiceError> {
        let mut last: Option<ServiceError> = None;

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.backoff_step * (attempt - 1)).await;
            }
            match self.chat_once(&request).await {
                Ok(content) => return Ok(content),
                Err(e) => {
                    warn!(attempt, error = %e, "completion request failed");
                    last = Some(e);
                }
            }
        }

        Err(ServiceError::Exhausted {
            attempts: self.max_attempts,
            last: last
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempts made".to_string()),
        })
    }
}

/// Pull the generated text out of either supported response shape; fall back
/// to the serialized body when neither is present.
fn extract_content(body: &JsonValue) -> String {
    if let Some(text) = body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
    {
        return text.to_string();
    }
    if let Some(text) = body
        .get("output")
        .and_then(|o| o.get(0))
        .and_then(|o| o.get("content"))
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("text"))
        .and_then(|t| t.as_str())
    {
        return text.to_string();
    }
    body.to_string()
}

/// Locate the first top-level JSON array in free-form model output.
pub fn extract_json_array(raw: &str) -> crate::error::Result<Vec<JsonValue>> {
    let start = raw
        .find('[')
        .ok_or_else(|| crate::error::Error::Parse("no JSON array found in model output".into()))?;
    let end = raw
        .rfind(']')
        .filter(|end| *end > start)
        .ok_or_else(|| crate::error::Error::Parse("no JSON array found in model output".into()))?;

    let parsed: JsonValue = serde_json::from_str(&raw[start..=end])
        .map_err(|e| crate::error::Error::Parse(format!("invalid JSON array: {}", e)))?;
    match parsed {
        JsonValue::Array(items) => Ok(items),
        _ => Err(crate::error::Error::Parse(
            "parsed JSON is not a list".into(),
        )),
    }
}

/// Locate the first top-level JSON object in free-form model output.
pub fn extract_json_object(raw: &str) -> crate::error::Result<JsonValue> {
    let start = raw
        .find('{')
        .ok_or_else(|| crate::error::Error::Parse("no JSON object found in model output".into()))?;
    let end = raw
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| crate::error::Error::Parse("no JSON object found in model output".into()))?;

    let parsed: JsonValue = serde_json::from_str(&raw[start..=end])
        .map_err(|e| crate::error::Error::Parse(format!("invalid JSON object: {}", e)))?;
    if parsed.is_object() {
        Ok(parsed)
    } else {
        Err(crate::error::Error::Parse(
            "parsed JSON is not an object".into(),
        ))
    }
}
