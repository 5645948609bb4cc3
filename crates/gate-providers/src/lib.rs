// gate-providers/src/lib.rs
// ============================================================================
// Module: Omar Gate Providers
// Description: LLM analyzer providers, the analysis context builder, the
//              NDJSON response parser, the agentic CLI adapter, and the host
//              API client used by preflight and the publisher.
// Purpose: Give the orchestrator one crate that turns a worktree, a
//          QuickLearn summary, and a set of deterministic findings into a
//          bounded LLM call and a parsed `Vec<Finding>`, without gate-core
//          ever depending on an HTTP client.
// Dependencies: gate-core, reqwest, serde_json, thiserror
// ============================================================================

//! ## Overview
//! `gate-providers` is the only crate in this workspace that speaks HTTP or
//! shells out to an agentic CLI. It ships four reference [`llm::LlmProvider`]
//! implementations, a [`llm::ContextBuilder`] that assembles a
//! priority-truncated prompt, an [`llm::ResponseParser`] that turns fenced
//! NDJSON back into `Finding`s, and [`llm::AgenticCliProvider`] for the
//! subprocess-based analysis path. Orchestration (retry, fallback, failure
//! policy) lives in [`llm::dispatch`]. [`host::HostApiClient`] is the
//! separate collaborator trait preflight and the publisher depend on.

pub mod host;
pub mod llm;

pub use host::HostApiClient;
pub use llm::AgenticAnalyzer;
pub use llm::AgenticCliProvider;
pub use llm::AnthropicProvider;
pub use llm::AzureOpenAiProvider;
pub use llm::BedrockProvider;
pub use llm::ContextBuilder;
pub use llm::LlmError;
pub use llm::LlmProvider;
pub use llm::LlmResponse;
pub use llm::LlmUsage;
pub use llm::OpenAiProvider;
pub use llm::ResponseParser;
pub use llm::dispatch::AnalysisOutcome;
pub use llm::dispatch::AnalysisRunner;
pub use llm::dispatch::ModelAttempt;
