// gate-providers/src/llm/azure_openai.rs
// ============================================================================
// Module: Azure OpenAI Provider
// Description: `LlmProvider` over an Azure-hosted OpenAI deployment.
// Purpose: Share the OpenAI-shaped request/response parsing with
//          `crate::llm::openai`; only the endpoint shape and the auth
//          header differ.
// Dependencies: gate-providers::llm::{openai, provider}, reqwest, serde_json
// ============================================================================

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use serde_json::json;

use crate::llm::error::LlmError;
use crate::llm::openai::parse_chat_completion;
use crate::llm::provider::LlmProvider;
use crate::llm::provider::LlmResponse;

const PROVIDER_NAME: &str = "azure_openai";
const DEFAULT_API_VERSION: &str = "2024-10-21";
const USER_AGENT: &str = "omar-gate/0.1";

/// `LlmProvider` over an Azure-hosted OpenAI deployment.
///
/// Azure's REST shape is `{resource}.openai.azure.com/openai/deployments/
/// {deployment}/chat/completions?api-version=...`, authenticated with the
/// `api-key` header rather than `Authorization: Bearer`; the request and
/// response bodies are otherwise identical to [`crate::llm::openai`].
pub struct AzureOpenAiProvider {
    api_key: String,
    endpoint_url: String,
    client: Client,
}

impl AzureOpenAiProvider {
    /// Creates a provider for one Azure OpenAI resource and deployment.
    ///
    /// `resource` is the Azure resource name (not a full URL) and
    /// `deployment` is the deployment name configured in that resource;
    /// the model passed to [`LlmProvider::call`] is ignored in favor of
    /// `deployment`, matching Azure's deployment-scoped routing.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, resource: &str, deployment: &str) -> Result<Self, LlmError> {
        let endpoint_url = format!(
            "https://{resource}.openai.azure.com/openai/deployments/{deployment}/chat/completions?api-version={DEFAULT_API_VERSION}"
        );
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()
            .map_err(|source| LlmError::ClientBuild { provider: PROVIDER_NAME, reason: source.to_string() })?;
        Ok(Self { api_key: api_key.into(), endpoint_url, client })
    }
}

impl LlmProvider for AzureOpenAiProvider {
    fn call(
        &self,
        _model: &str,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
        timeout: Duration,
    ) -> Result<LlmResponse, LlmError> {
        let body = json!({
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "max_tokens": max_tokens,
            "temperature": temperature,
        });

        let response = self
            .client
            .post(&self.endpoint_url)
            .timeout(timeout)
            .header("api-key", &self.api_key)
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

        parse_chat_completion(&text)
    }
}
