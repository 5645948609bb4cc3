// gate-providers/src/llm/mod.rs
// ============================================================================
// Module: LLM Analyzer
// Description: Provider trait, reference implementations, context assembly,
//              response parsing, retry/fallback dispatch, and the agentic
//              CLI adapter.
// Dependencies: gate-core, reqwest, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Submodule map:
//! - [`provider`] — the `LlmProvider` trait and its response/usage types.
//! - [`error`] — `LlmError`, shared by every provider and the agentic path.
//! - [`openai`], [`anthropic`], [`azure_openai`], [`bedrock`] — reference
//!   provider implementations, each a thin wrapper over a bounded
//!   `reqwest::blocking::Client`.
//! - [`context`] — `ContextBuilder`, which assembles and truncates the
//!   prompt sent to a provider.
//! - [`parser`] — `ResponseParser`, which turns a fenced NDJSON block back
//!   into `Finding`s.
//! - [`agentic`] — the narrower `AgenticAnalyzer` trait and
//!   `AgenticCliProvider`, the subprocess path.
//! - [`dispatch`] — `AnalysisRunner`, which sequences retry, fallback, and
//!   `LlmFailurePolicy` outcome selection on top of the above.

pub mod agentic;
pub mod anthropic;
pub mod azure_openai;
pub mod bedrock;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod openai;
pub mod parser;
pub mod provider;

pub use agentic::AgenticAnalyzer;
pub use agentic::AgenticCliProvider;
pub use anthropic::AnthropicProvider;
pub use azure_openai::AzureOpenAiProvider;
pub use bedrock::BedrockProvider;
pub use context::ContextBuilder;
pub use error::LlmError;
pub use openai::OpenAiProvider;
pub use parser::ResponseParser;
pub use provider::LlmProvider;
pub use provider::LlmResponse;
pub use provider::LlmUsage;
