// gate-providers/src/llm/error.rs
// ============================================================================
// Module: LLM Error
// Description: Failure modes shared by every `LlmProvider`/`AgenticAnalyzer`
//              implementation and the dispatch layer above them.
// Dependencies: thiserror
// ============================================================================

/// Failure produced by an LLM provider call, the agentic CLI path, or the
/// dispatch layer that sequences retry/fallback across both.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The HTTP client could not be constructed (invalid timeout, TLS
    /// backend unavailable, …).
    #[error("could not build http client for provider {provider}: {reason}")]
    ClientBuild {
        /// Provider that failed to build its client.
        provider: &'static str,
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The outbound request failed before a response was received (network
    /// error, DNS failure, connection reset, …).
    #[error("request to provider {provider} failed: {reason}")]
    RequestFailed {
        /// Provider the request was sent to.
        provider: &'static str,
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The provider responded with a non-success HTTP status.
    #[error("provider {provider} returned status {status}: {body}")]
    HttpStatus {
        /// Provider that returned the error status.
        provider: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for inclusion in the error.
        body: String,
    },
    /// The provider's response body could not be parsed as the shape its
    /// API promises.
    #[error("provider {provider} returned a response this analyzer could not parse: {reason}")]
    InvalidResponse {
        /// Provider whose response failed to parse.
        provider: &'static str,
        /// Human-readable description of the parse failure.
        reason: String,
    },
    /// The request exceeded its configured timeout.
    #[error("request to provider {provider} exceeded its {timeout_secs}s timeout")]
    Timeout {
        /// Provider the request was sent to.
        provider: &'static str,
        /// Configured timeout, in seconds.
        timeout_secs: u64,
    },
    /// The agentic CLI binary is not present on `PATH`.
    #[error("agentic binary `{binary}` is not available on PATH")]
    AgenticBinaryUnavailable {
        /// Name of the unavailable binary.
        binary: String,
    },
    /// The agentic CLI process could not be spawned, exceeded its budget,
    /// or exited with a failure status.
    #[error("agentic analysis via `{binary}` failed: {reason}")]
    AgenticProcess {
        /// Binary that failed.
        binary: String,
        /// Human-readable description of the failure.
        reason: String,
    },
    /// Every configured attempt (primary, retry, fallback) failed and
    /// `LlmFailurePolicy::Block` is in effect.
    #[error("llm analysis failed after exhausting retry and fallback: {reason}")]
    AnalysisFailed {
        /// Human-readable description of the last failure.
        reason: String,
    },
}
