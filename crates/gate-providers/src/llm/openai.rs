// gate-providers/src/llm/openai.rs
// ============================================================================
// Module: OpenAI Provider
// Description: `LlmProvider` over an OpenAI-compatible chat completions
//              endpoint.
// Dependencies: gate-providers::llm::provider, reqwest, serde_json
// ============================================================================

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use serde_json::Value;
use serde_json::json;

use crate::llm::error::LlmError;
use crate::llm::provider::LlmProvider;
use crate::llm::provider::LlmResponse;
use crate::llm::provider::LlmUsage;

const PROVIDER_NAME: &str = "openai";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";
const USER_AGENT: &str = "omar-gate/0.1";

/// Chat-completions-shaped provider for OpenAI and OpenAI-compatible hosts.
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    client: Client,
}

impl OpenAiProvider {
    /// Creates a provider against the public OpenAI API.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Creates a provider against a custom base URL, for OpenAI-compatible
    /// self-hosted or proxy deployments.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ClientBuild`] if the HTTP client cannot be built.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, LlmError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()
            .map_err(|source| LlmError::ClientBuild { provider: PROVIDER_NAME, reason: source.to_string() })?;
        Ok(Self { api_key: api_key.into(), base_url: base_url.into(), client })
    }
}

impl LlmProvider for OpenAiProvider {
    fn call(
        &self,
        model: &str,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
        timeout: Duration,
    ) -> Result<LlmResponse, LlmError> {
        let body = json!({
            "model": model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "max_tokens": max_tokens,
            "temperature": temperature,
        });

        let response = self
            .client
            .post(&self.base_url)
            .timeout(timeout)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|source| {
                if source.is_timeout() {
                    LlmError::Timeout { provider: PROVIDER_NAME, timeout_secs: timeout.as_secs() }
                } else {
                    LlmError::RequestFailed { provider: PROVIDER_NAME, reason: source.to_string() }
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|source| LlmError::RequestFailed { provider: PROVIDER_NAME, reason: source.to_string() })?;

        if !status.is_success() {
            return Err(LlmError::HttpStatus { provider: PROVIDER_NAME, status: status.as_u16(), body: truncate(&text) });
        }

        parse_chat_completion(&text)
    }
}

/// Parses an OpenAI-shaped chat-completions response body into an
/// [`LlmResponse`]; shared with [`crate::llm::azure_openai`] since the
/// response shape is identical.
pub(crate) fn parse_chat_completion(text: &str) -> Result<LlmResponse, LlmError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|source| LlmError::InvalidResponse { provider: PROVIDER_NAME, reason: source.to_string() })?;

    let content = value
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| LlmError::InvalidResponse {
            provider: PROVIDER_NAME,
            reason: "missing choices[0].message.content".to_string(),
        })?;

    let model = value.get("model").and_then(Value::as_str).unwrap_or("unknown").to_string();
    let tokens_in = value.get("usage").and_then(|usage| usage.get("prompt_tokens")).and_then(Value::as_u64).unwrap_or(0);
    let tokens_out =
        value.get("usage").and_then(|usage| usage.get("completion_tokens")).and_then(Value::as_u64).unwrap_or(0);

    Ok(LlmResponse {
        text: content.to_string(),
        usage: LlmUsage {
            model,
            tokens_in: u32::try_from(tokens_in).unwrap_or(u32::MAX),
            tokens_out: u32::try_from(tokens_out).unwrap_or(u32::MAX),
            cost_usd: None,
        },
    })
}

fn truncate(text: &str) -> String {
    const MAX: usize = 500;
    if text.len() <= MAX {
        return text.to_string();
    }
    let mut end = MAX;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::parse_chat_completion;

    #[test]
    fn parses_well_formed_chat_completion() {
        let body = serde_json::json!({
            "model": "gpt-4.1",
            "choices": [{"message": {"content": "hello"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5},
        })
        .to_string();

        let response = parse_chat_completion(&body).expect("parses");
        assert_eq!(response.text, "hello");
        assert_eq!(response.usage.tokens_in, 10);
        assert_eq!(response.usage.tokens_out, 5);
        assert_eq!(response.usage.model, "gpt-4.1");
    }

    #[test]
    fn rejects_response_missing_message_content() {
        let body = serde_json::json!({"choices": [{"message": {}}]}).to_string();
        assert!(parse_chat_completion(&body).is_err());
    }
}
