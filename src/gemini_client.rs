use async_trait::async_trait;
use eyre::{Result, eyre};
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::config::{GeminiConfig, GenerationConfig};

/// Anything that can turn a conversation into the next model reply.
///
/// `messages` are `(role, text)` pairs in conversation order, where role is
/// `"user"` or `"model"`.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate_content(&self, messages: &[(&str, &str)]) -> Result<String>;
}

pub struct GeminiClient {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, api_key: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.api_base, self.config.model, api_key
        )
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate_content(&self, messages: &[(&str, &str)]) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| eyre!("GEMINI_API_KEY environment variable not set"))?;

        let request_body = build_request_body(messages, &self.config.generation);

        debug!(
            model = %self.config.model,
            turns = messages.len(),
            "Sending request to Gemini API: {}",
            serde_json::to_string_pretty(&request_body)?
        );

        let response = self
            .client
            .post(self.endpoint(api_key))
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            error!("API request failed with status {}: {}", status, error_text);
            return Err(eyre!("API request failed ({}): {}", status, error_text));
        }

        let response_json: Value = response.json().await?;

        debug!("Received response from Gemini API: {}", serde_json::to_string_pretty(&response_json)?);

        extract_text(&response_json)
    }
}

/// Build a `generateContent` request body from `(role, text)` pairs.
pub fn build_request_body(messages: &[(&str, &str)], generation: &GenerationConfig) -> Value {
    let contents = messages
        .iter()
        .map(|(role, text)| {
            json!({
                "role": role,
                "parts": [
                    {
                        "text": text
                    }
                ]
            })
        })
        .collect::<Vec<_>>();

    json!({
        "contents": contents,
        "generationConfig": {
            "temperature": generation.temperature,
            "topP": generation.top_p,
            "topK": generation.top_k,
            "maxOutputTokens": generation.max_output_tokens,
            "responseMimeType": generation.response_mime_type
        }
    })
}

/// Concatenate the text parts of the first candidate.
pub fn extract_text(response_json: &Value) -> Result<String> {
    if let Some(reason) = response_json
        .get("promptFeedback")
        .and_then(|feedback| feedback.get("blockReason"))
        .and_then(Value::as_str)
    {
        return Err(eyre!("Prompt was blocked by the API: {}", reason));
    }

    let first_candidate = response_json
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .ok_or_else(|| eyre!("API response contained no candidates"))?;

    let parts = first_candidate
        .get("content")
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array);

    let text = parts
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default();

    if text.is_empty() {
        let finish_reason = first_candidate
            .get("finishReason")
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN");
        return Err(eyre!("API returned no text (finish reason: {})", finish_reason));
    }

    Ok(text)
}
