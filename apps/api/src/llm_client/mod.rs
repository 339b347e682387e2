/// LLM Client: the single point of entry for all completion calls in the analyzer.
///
/// ARCHITECTURAL RULE: No other module may talk to the completion endpoint directly.
/// All LLM interactions MUST go through this module.
///
/// The endpoint is an LLMStudio-style deployment configured through `LLM_BASE_URL`
/// and `LLM_COMPLETION_PATH`; response shapes vary between servers, so text is
/// pulled out of whichever field carries it.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::LlmEndpointConfig;

pub mod prompts;

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Unable to parse completion text from LLM response")]
    EmptyContent,
}

/// Anything that can turn a prompt into completion text.
/// `LlmClient` is the production implementation; tests substitute canned responders.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    stream: bool,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// The LLM client used by the analyzer.
/// Wraps the completion endpoint with retry logic and structured output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    completion_path: String,
    api_key: Option<String>,
    model: Option<String>,
}

impl LlmClient {
    pub fn new(config: &LlmEndpointConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            completion_path: normalize_path(&config.completion_path),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Sends a single-message chat completion and returns the extracted text, trimmed.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(&self, prompt: &str) -> Result<String, LlmError> {
        let request_body = CompletionRequest {
            model: self.model.as_deref(),
            stream: false,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        let url = format!("{}{}", self.base_url, self.completion_path);

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            info!("LLM POST {url}");

            let mut request = self.client.post(&url).json(&request_body);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let payload: Value = response.json().await?;
            let text = extract_text(&payload).ok_or(LlmError::EmptyContent)?;

            debug!("LLM call succeeded: {} chars", text.len());

            return Ok(text.trim().to_string());
        }

        // A final 429 is reported as rate limiting; other failures keep their cause.
        Err(match last_error {
            Some(LlmError::Api { status: 429, .. }) | None => LlmError::RateLimited {
                retries: MAX_RETRIES,
            },
            Some(other) => other,
        })
    }
}

#[async_trait]
impl CompletionClient for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.call(prompt).await
    }
}

/// Decodes model output as JSON after stripping any markdown fences around it.
pub fn parse_json_text<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    serde_json::from_str(strip_json_fences(text)).map_err(LlmError::Parse)
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Pulls completion text out of the response shapes LLM servers commonly return:
/// bare strings, `result`/`completion`/`text` keys, OpenAI-style `choices`,
/// `data` envelopes, a top-level `message`, or a list of any of these.
fn extract_text(payload: &Value) -> Option<String> {
    match payload {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => {
            for key in ["result", "completion", "text"] {
                if let Some(Value::String(s)) = map.get(key) {
                    return Some(s.clone());
                }
            }

            if let Some(Value::Array(choices)) = map.get("choices") {
                if let Some(text) = choices
                    .iter()
                    .filter_map(extract_from_choice)
                    .find(|t| !t.is_empty())
                {
                    return Some(text);
                }
            }

            if let Some(Value::Array(entries)) = map.get("data") {
                if let Some(text) = entries
                    .iter()
                    .filter_map(extract_text)
                    .find(|t| !t.is_empty())
                {
                    return Some(text);
                }
            }

            match map.get("message") {
                Some(message @ Value::Object(_)) => extract_message_content(message),
                _ => None,
            }
        }
        Value::Array(items) => {
            let joined: String = items
                .iter()
                .filter_map(extract_text)
                .filter(|t| !t.is_empty())
                .collect();
            (!joined.is_empty()).then_some(joined)
        }
        _ => None,
    }
}

fn extract_from_choice(choice: &Value) -> Option<String> {
    let choice = choice.as_object()?;
    if let Some(Value::String(text)) = choice.get("text") {
        return Some(text.clone());
    }
    if let Some(message @ Value::Object(_)) = choice.get("message") {
        return extract_message_content(message);
    }
    if let Some(delta @ Value::Object(_)) = choice.get("delta") {
        return extract_message_content(delta);
    }
    None
}

fn extract_message_content(message: &Value) -> Option<String> {
    match message.get("content")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => {
            let joined: String = parts
                .iter()
                .filter_map(|part| match part {
                    Value::String(s) => Some(s.as_str()),
                    Value::Object(obj) => obj.get("text").and_then(Value::as_str),
                    _ => None,
                })
                .collect();
            (!joined.is_empty()).then_some(joined)
        }
        _ => None,
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
