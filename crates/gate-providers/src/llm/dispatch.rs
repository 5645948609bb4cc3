// gate-providers/src/llm/dispatch.rs
// ============================================================================
// Module: Analysis Dispatch
// Description: Sequences retry, fallback-model, and `LlmFailurePolicy`
//              outcome selection on top of `LlmProvider` + `ResponseParser`.
// Purpose: Give the orchestrator one call that always terminates in an
//          `AnalysisOutcome` rather than a bare `Result`, since a failed LLM
//          stage is a policy decision, not automatically a run failure.
// Dependencies: gate-core, crate::llm::{error, parser, provider}
// ============================================================================

//! ## Overview
//! [`AnalysisRunner::run`] tries the primary model once, retries it once,
//! then tries the fallback model (if configured) once. If every attempt
//! fails, [`gate_core::LlmFailurePolicy`] decides what happens next: `Block`
//! surfaces the last [`LlmError`], `DeterministicOnly` proceeds with zero LLM
//! findings, and `AllowWithWarning` proceeds with zero findings plus a
//! recorded warning. A successful attempt at any point short-circuits the
//! remaining retries.

use std::time::Duration;

use gate_core::Finding;
use gate_core::LlmFailurePolicy;
use gate_core::RecordedError;
use gate_core::StageName;

use crate::llm::error::LlmError;
use crate::llm::parser::ResponseParser;
use crate::llm::provider::LlmProvider;

/// One configured model attempt: a provider plus the model string to send
/// it.
pub struct ModelAttempt<'a> {
    /// Provider this attempt calls.
    pub provider: &'a dyn LlmProvider,
    /// Model identifier passed to the provider.
    pub model: &'a str,
}

/// What the caller should do after [`AnalysisRunner::run`] returns.
pub enum AnalysisOutcome {
    /// An attempt succeeded; these are the parsed findings (possibly empty,
    /// if the model returned no fenced block).
    Findings(Vec<Finding>),
    /// Every attempt failed and `LlmFailurePolicy::DeterministicOnly` is in
    /// effect: proceed with zero LLM findings, no warning recorded.
    DeterministicOnly,
    /// Every attempt failed and `LlmFailurePolicy::AllowWithWarning` is in
    /// effect: proceed with zero LLM findings, recording this warning in
    /// `Summary.errors`.
    AllowedWithWarning(RecordedError),
    /// Every attempt failed and `LlmFailurePolicy::Block` is in effect: the
    /// orchestrator must not mark the evidence writer complete.
    Blocked(LlmError),
}

/// Sequences a primary model, one retry, and an optional fallback model
/// behind a single call, applying `LlmFailurePolicy` if all three fail.
pub struct AnalysisRunner<'a> {
    primary: ModelAttempt<'a>,
    fallback: Option<ModelAttempt<'a>>,
    failure_policy: LlmFailurePolicy,
    parser: ResponseParser,
}

impl<'a> AnalysisRunner<'a> {
    /// Creates a runner over a primary attempt, an optional fallback
    /// attempt, and the policy to apply if both are exhausted.
    #[must_use]
    pub const fn new(primary: ModelAttempt<'a>, fallback: Option<ModelAttempt<'a>>, failure_policy: LlmFailurePolicy) -> Self {
        Self { primary, fallback, failure_policy, parser: ResponseParser::new("llm") }
    }

    /// Runs the primary model, one retry, then the fallback model (if
    /// configured), returning the outcome of whichever attempt (if any)
    /// succeeded, or the policy-mediated outcome if none did.
    #[must_use]
    pub fn run(&self, system: &str, user: &str, max_tokens: u32, temperature: f32, timeout: Duration) -> AnalysisOutcome {
        let mut last_error = self.attempt(&self.primary, system, user, max_tokens, temperature, timeout);
        if let Ok(findings) = last_error {
            return AnalysisOutcome::Findings(findings);
        }

        last_error = self.attempt(&self.primary, system, user, max_tokens, temperature, timeout);
        if let Ok(findings) = last_error {
            return AnalysisOutcome::Findings(findings);
        }

        if let Some(fallback) = &self.fallback {
            last_error = self.attempt(fallback, system, user, max_tokens, temperature, timeout);
            if let Ok(findings) = last_error {
                return AnalysisOutcome::Findings(findings);
            }
        }

        let reason = match last_error {
            Ok(_) => unreachable!("Ok branches above all return early"),
            Err(error) => error,
        };
        self.apply_failure_policy(reason)
    }

    fn attempt(
        &self,
        attempt: &ModelAttempt<'_>,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Vec<Finding>, LlmError> {
        let response = attempt.provider.call(attempt.model, system, user, max_tokens, temperature, timeout)?;
        Ok(self.parser.parse(&response.text))
    }

    fn apply_failure_policy(&self, reason: LlmError) -> AnalysisOutcome {
        match self.failure_policy {
            LlmFailurePolicy::Block => AnalysisOutcome::Blocked(LlmError::AnalysisFailed { reason: reason.to_string() }),
            LlmFailurePolicy::DeterministicOnly => AnalysisOutcome::DeterministicOnly,
            LlmFailurePolicy::AllowWithWarning => {
                AnalysisOutcome::AllowedWithWarning(RecordedError::warning(StageName::Llm, reason.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AnalysisOutcome;
    use super::AnalysisRunner;
    use super::ModelAttempt;
    use crate::llm::error::LlmError;
    use crate::llm::provider::LlmProvider;
    use crate::llm::provider::LlmResponse;
    use crate::llm::provider::LlmUsage;
    use gate_core::LlmFailurePolicy;
    use std::cell::Cell;
    use std::time::Duration;

    struct AlwaysFails;

    impl LlmProvider for AlwaysFails {
        fn call(&self, _: &str, _: &str, _: &str, _: u32, _: f32, _: Duration) -> Result<LlmResponse, LlmError> {
            Err(LlmError::RequestFailed { provider: "test", reason: "boom".to_string() })
        }
    }

    struct SucceedsAfter {
        remaining_failures: Cell<u32>,
    }

    impl LlmProvider for SucceedsAfter {
        fn call(&self, _: &str, _: &str, _: &str, _: u32, _: f32, _: Duration) -> Result<LlmResponse, LlmError> {
            let remaining = self.remaining_failures.get();
            if remaining > 0 {
                self.remaining_failures.set(remaining - 1);
                return Err(LlmError::RequestFailed { provider: "test", reason: "boom".to_string() });
            }
            Ok(LlmResponse {
                text: "```\n{\"severity\":\"P2\",\"category\":\"auth\",\"file_path\":\"a.rs\",\"line_start\":1,\"line_end\":1,\"snippet\":\"\",\"message\":\"m\",\"recommendation\":\"r\"}\n```".to_string(),
                usage: LlmUsage { model: "test".to_string(), tokens_in: 1, tokens_out: 1, cost_usd: None },
            })
        }
    }

    #[test]
    fn retry_succeeds_on_second_primary_attempt() {
        let provider = SucceedsAfter { remaining_failures: Cell::new(1) };
        let runner = AnalysisRunner::new(ModelAttempt { provider: &provider, model: "m" }, None, LlmFailurePolicy::Block);
        let outcome = runner.run("sys", "usr", 100, 0.0, Duration::from_secs(1));
        assert!(matches!(outcome, AnalysisOutcome::Findings(findings) if findings.len() == 1));
    }

    #[test]
    fn falls_back_after_primary_exhausts_its_retry() {
        let primary = AlwaysFails;
        let fallback = SucceedsAfter { remaining_failures: Cell::new(0) };
        let runner = AnalysisRunner::new(
            ModelAttempt { provider: &primary, model: "m" },
            Some(ModelAttempt { provider: &fallback, model: "fb" }),
            LlmFailurePolicy::Block,
        );
        let outcome = runner.run("sys", "usr", 100, 0.0, Duration::from_secs(1));
        assert!(matches!(outcome, AnalysisOutcome::Findings(_)));
    }

    #[test]
    fn block_policy_surfaces_analysis_failed_after_exhausting_all_attempts() {
        let provider = AlwaysFails;
        let runner = AnalysisRunner::new(ModelAttempt { provider: &provider, model: "m" }, None, LlmFailurePolicy::Block);
        let outcome = runner.run("sys", "usr", 100, 0.0, Duration::from_secs(1));
        assert!(matches!(outcome, AnalysisOutcome::Blocked(LlmError::AnalysisFailed { .. })));
    }

    #[test]
    fn deterministic_only_policy_proceeds_with_no_findings() {
        let provider = AlwaysFails;
        let runner =
            AnalysisRunner::new(ModelAttempt { provider: &provider, model: "m" }, None, LlmFailurePolicy::DeterministicOnly);
        let outcome = runner.run("sys", "usr", 100, 0.0, Duration::from_secs(1));
        assert!(matches!(outcome, AnalysisOutcome::DeterministicOnly));
    }

    #[test]
    fn allow_with_warning_policy_records_a_warning() {
        let provider = AlwaysFails;
        let runner =
            AnalysisRunner::new(ModelAttempt { provider: &provider, model: "m" }, None, LlmFailurePolicy::AllowWithWarning);
        let outcome = runner.run("sys", "usr", 100, 0.0, Duration::from_secs(1));
        match outcome {
            AnalysisOutcome::AllowedWithWarning(warning) => assert!(warning.is_warning),
            _ => panic!("expected AllowedWithWarning"),
        }
    }
}
