// gate-providers/src/llm/bedrock.rs
// ============================================================================
// Module: Bedrock Provider
// Description: `LlmProvider` over a managed-runtime hosted model endpoint.
// Purpose: Fourth reference provider, fronted by a bearer-token gateway
//          rather than request-signing, matching how most CI runners reach
//          a managed-runtime endpoint through an organization's own proxy.
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

const PROVIDER_NAME: &str = "bedrock";
const USER_AGENT: &str = "omar-gate/0.1";

/// `LlmProvider` over a managed-runtime hosted model, invoked through a
/// bearer-token-fronted endpoint rather than request-signing.
///
/// Native Bedrock access is normally reached through a signed request;
/// CI runners more commonly sit behind an organization-owned gateway that
/// terminates that signing and forwards a bearer token, which is the shape
/// this provider targets.
pub struct BedrockProvider {
    api_key: String,
    invoke_url: String,
    client: Client,
}

impl BedrockProvider {
    /// Creates a provider against `invoke_url`, an organization-fronted
    /// model-invocation endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, invoke_url: impl Into<String>) -> Result<Self, LlmError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()
            .map_err(|source| LlmError::ClientBuild { provider: PROVIDER_NAME, reason: source.to_string() })?;
        Ok(Self { api_key: api_key.into(), invoke_url: invoke_url.into(), client })
    }
}

impl LlmProvider for BedrockProvider {
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
            "modelId": model,
            "system": system,
            "messages": [{"role": "user", "content": user}],
            "max_tokens": max_tokens,
            "temperature": temperature,
        });

        let response = self
            .client
            .post(&self.invoke_url)
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
            return Err(LlmError::HttpStatus { provider: PROVIDER_NAME, status: status.as_u16(), body: text });
        }

        parse_invoke_response(&text)
    }
}

fn parse_invoke_response(text: &str) -> Result<LlmResponse, LlmError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|source| LlmError::InvalidResponse { provider: PROVIDER_NAME, reason: source.to_string() })?;

    let completion = value
        .get("output")
        .and_then(Value::as_str)
        .ok_or_else(|| LlmError::InvalidResponse { provider: PROVIDER_NAME, reason: "missing output field".to_string() })?;

    let model = value.get("modelId").and_then(Value::as_str).unwrap_or("unknown").to_string();
    let tokens_in = value.get("inputTokenCount").and_then(Value::as_u64).unwrap_or(0);
    let tokens_out = value.get("outputTokenCount").and_then(Value::as_u64).unwrap_or(0);

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

#[cfg(test)]
mod tests {
    use super::parse_invoke_response;

    #[test]
    fn parses_well_formed_invoke_response() {
        let body = serde_json::json!({
            "modelId": "anthropic.claude-v2",
            "output": "hello",
            "inputTokenCount": 8,
            "outputTokenCount": 3,
        })
        .to_string();

        let response = parse_invoke_response(&body).expect("parses");
        assert_eq!(response.text, "hello");
        assert_eq!(response.usage.tokens_in, 8);
    }

    #[test]
    fn rejects_response_missing_output() {
        let body = serde_json::json!({"modelId": "x"}).to_string();
        assert!(parse_invoke_response(&body).is_err());
    }
}
