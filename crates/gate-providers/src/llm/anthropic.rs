// gate-providers/src/llm/anthropic.rs
// ============================================================================
// Module: Anthropic Provider
// Description: `LlmProvider` over the Anthropic messages endpoint.
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

const PROVIDER_NAME: &str = "anthropic";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const USER_AGENT: &str = "omar-gate/0.1";

/// `LlmProvider` over the Anthropic messages endpoint.
pub struct AnthropicProvider {
    api_key: String,
    base_url: String,
    client: Client,
}

impl AnthropicProvider {
    /// Creates a provider against the public Anthropic API.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Creates a provider against a custom base URL.
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

impl LlmProvider for AnthropicProvider {
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
            "system": system,
            "messages": [{"role": "user", "content": user}],
            "max_tokens": max_tokens,
            "temperature": temperature,
        });

        let response = self
            .client
            .post(&self.base_url)
            .timeout(timeout)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
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

        parse_messages_response(&text)
    }
}

fn parse_messages_response(text: &str) -> Result<LlmResponse, LlmError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|source| LlmError::InvalidResponse { provider: PROVIDER_NAME, reason: source.to_string() })?;

    let completion = value
        .get("content")
        .and_then(Value::as_array)
        .and_then(|blocks| blocks.iter().find(|block| block.get("type").and_then(Value::as_str) == Some("text")))
        .and_then(|block| block.get("text"))
        .and_then(Value::as_str)
        .ok_or_else(|| LlmError::InvalidResponse {
            provider: PROVIDER_NAME,
            reason: "missing a text content block".to_string(),
        })?;

    let model = value.get("model").and_then(Value::as_str).unwrap_or("unknown").to_string();
    let tokens_in = value.get("usage").and_then(|usage| usage.get("input_tokens")).and_then(Value::as_u64).unwrap_or(0);
    let tokens_out =
        value.get("usage").and_then(|usage| usage.get("output_tokens")).and_then(Value::as_u64).unwrap_or(0);

    Ok(LlmResponse {
        text: completion.to_string(),
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
    use super::parse_messages_response;

    #[test]
    fn parses_well_formed_messages_response() {
        let body = serde_json::json!({
            "model": "claude-opus-4",
            "content": [{"type": "text", "text": "hello"}],
            "usage": {"input_tokens": 12, "output_tokens": 7},
        })
        .to_string();

        let response = parse_messages_response(&body).expect("parses");
        assert_eq!(response.text, "hello");
        assert_eq!(response.usage.tokens_in, 12);
        assert_eq!(response.usage.tokens_out, 7);
    }

    #[test]
    fn rejects_response_with_no_text_block() {
        let body = serde_json::json!({"content": [{"type": "tool_use"}]}).to_string();
        assert!(parse_messages_response(&body).is_err());
    }
}
