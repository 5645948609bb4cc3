// gate-providers/src/llm/provider.rs
// ============================================================================
// Module: LLM Provider Trait
// Description: The single entry point every reference provider implements.
// Purpose: Let the dispatch layer and tests treat OpenAI, Anthropic, Azure
//          OpenAI, and Bedrock identically.
// Dependencies: std
// ============================================================================

use std::time::Duration;

use crate::llm::error::LlmError;

/// Token usage and cost reported alongside a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmUsage {
    /// Model identifier that served the request (echoed back by the
    /// provider, which may differ from the requested alias).
    pub model: String,
    /// Input tokens billed.
    pub tokens_in: u32,
    /// Output tokens billed.
    pub tokens_out: u32,
    /// Estimated cost in US dollars, if the provider's pricing is known.
    pub cost_usd: Option<f64>,
}

/// A completed model call: the raw text plus its usage record.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    /// Raw completion text, not yet parsed for findings.
    pub text: String,
    /// Usage and cost for this call.
    pub usage: LlmUsage,
}

/// One reference chat-completion backend.
///
/// Implementors wrap a bounded `reqwest::blocking::Client` (explicit
/// timeout, user agent, redirects disabled) and translate `system`/`user`
/// into that provider's wire format.
pub trait LlmProvider {
    /// Issues one chat completion call.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] if the client could not be built, the request
    /// failed, the response could not be parsed, or `timeout` elapsed.
    fn call(
        &self,
        model: &str,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
        timeout: Duration,
    ) -> Result<LlmResponse, LlmError>;
}
