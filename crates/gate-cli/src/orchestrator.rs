// gate-cli/src/orchestrator.rs
// ============================================================================
// Module: Pipeline Orchestrator
// Description: Sequences config/context, preflight admission, ingest, the
//              deterministic scanners and harness runner in parallel, the
//              LLM analyzer, merge/guardrails, evidence writing, gate
//              evaluation, publishing, and telemetry into one run.
// Purpose: Give `main.rs` a single call that returns the final `Outcome`,
//          with every collaborator injected as a trait object or borrowed
//          value rather than constructed from a global.
// Dependencies: gate-config, gate-core, gate-harness, gate-ingest,
//               gate-providers, gate-publish, gate-scanners
// ============================================================================

//! ## Overview
//! `run` is the C13 orchestrator. It never constructs a [`gate_providers::HostApiClient`]
//! or [`gate_publish::sink::Sink`] itself — both are passed in by `main.rs`,
//! which is the only place a real network client is built, so this module
//! stays unit-testable against fakes. Stage order matches the component
//! table: preflight short-circuits (dedupe, rate limit, fork policy) run
//! before ingest; deterministic scanners and the harness runner run
//! concurrently under [`std::thread::scope`]; the LLM analyzer only runs at
//! [`ScanScope::Full`]; evidence is written before the gate is evaluated, so
//! a crash between those two steps always leaves `writer_complete = false`
//! on disk instead of a result no evidence backs. A top-level wall-clock
//! deadline (`config.run_deadline_secs`) is checked before the scan/harness
//! stage and before the LLM stage; a stage not yet started when the
//! deadline has passed is skipped, never started, and the run still writes
//! evidence for whatever findings the earlier stages already produced.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;

use gate_config::GateConfig;
use gate_config::LlmProviderKind;
use gate_core::merge_findings;
use gate_core::Context;
use gate_core::EvidenceWriter;
use gate_core::Finding;
use gate_core::GateEvaluator;
use gate_core::GateStatus;
use gate_core::Ingest;
use gate_core::IngestFile;
use gate_core::MergeInputs;
use gate_core::RecordedError;
use gate_core::RepoPath;
use gate_core::RunId;
use gate_core::ScanMode;
use gate_core::StageName;
use gate_core::Summary;
use gate_ingest::build_quick_learn;
use gate_ingest::IngestLimits;
use gate_ingest::Walker;
use gate_providers::AgenticAnalyzer;
use gate_providers::AgenticCliProvider;
use gate_providers::AnalysisOutcome;
use gate_providers::AnalysisRunner;
use gate_providers::AnthropicProvider;
use gate_providers::AzureOpenAiProvider;
use gate_providers::BedrockProvider;
use gate_providers::ContextBuilder;
use gate_providers::HostApiClient;
use gate_providers::LlmProvider;
use gate_providers::ModelAttempt;
use gate_providers::OpenAiProvider;
use gate_publish::publisher::GithubPublisher;
use gate_publish::publisher::Publisher;
use gate_publish::sink::DispatchTarget;
use gate_publish::sink::Sink;
use gate_publish::telemetry::TelemetryAuth;
use gate_publish::telemetry::TelemetryReporter;
use gate_scanners::config_files::ConfigFileScanner;
use gate_scanners::engineering_quality::EngineeringQualityScanner;
use gate_scanners::pattern::PatternScanner;
use gate_scanners::secrets::SecretsScanner;
use gate_scanners::Scanner;

use crate::diff;
use crate::exit_code::Outcome;
use crate::preflight;
use crate::preflight::AdmissionDecision;
use crate::preflight::CostApprovalDecision;
use crate::preflight::ScanScope;

/// Per-host-call budget for the publisher's check-run/comment calls, matching
/// preflight's own host-call budget.
const PUBLISH_HOST_CALL_BUDGET: Duration = Duration::from_secs(10);
/// Fixed LLM sampling temperature; the analyzer asks for a deterministic,
/// low-variance findings list, not creative prose.
const LLM_TEMPERATURE: f32 = 0.0;
/// System prompt every LLM provider call is sent, describing the NDJSON
/// contract [`gate_providers::llm::parser::ResponseParser`] expects back.
const ANALYSIS_SYSTEM_PROMPT: &str = "You are a security and code-quality reviewer for a pull request. \
Read the supplied project orientation, file excerpts, and diff. Respond with exactly one fenced \
```ndjson``` code block, one JSON object per line, each with the fields: severity (P0-P3), \
category, file_path, line_start, line_end, snippet, message, recommendation, confidence (0.0-1.0). \
Only report issues grounded in the supplied text; do not invent file paths or line numbers.";

/// Everything the orchestrator needs that `main.rs` alone knows how to
/// construct: the worktree root and the collaborators that make real
/// network calls.
pub struct RunDeps<'a> {
    /// Root of the checked-out worktree the pipeline scans.
    pub worktree_root: &'a Path,
    /// Host API client used by preflight and the publisher.
    pub host: &'a dyn HostApiClient,
    /// Telemetry delivery sink.
    pub sink: &'a dyn Sink,
    /// Telemetry delivery destination.
    pub telemetry_target: DispatchTarget,
}

/// Runs the full pipeline for one triggering event and returns the final
/// [`Outcome`] `main.rs` maps to a process exit code.
#[must_use]
pub fn run(config: &GateConfig, context: &Context, deps: &RunDeps<'_>) -> Outcome {
    let run_start = Instant::now();
    let dedupe = gate_core::dedupe_key(
        &context.repo,
        context.pr_number,
        &context.head_sha,
        config.scan_mode,
        &config.policy_pack,
        &config.policy_pack_version,
        &config.action_major,
    );

    let scope = match admit(config, context, dedupe.as_str(), deps.host) {
        Ok(scope) => scope,
        Err(outcome) => return outcome,
    };

    let run_id = RunId::new(format!("{}-{}", dedupe.prefix(), std::process::id()));
    let run_dir = config.runs_dir.join(run_id.as_str());
    let timestamp_utc = now_rfc3339();
    let mut summary = Summary::incomplete(run_id, dedupe.as_str(), timestamp_utc, &config.policy_pack, &config.policy_pack_version);
    let mut stage_durations: BTreeMap<StageName, u64> = BTreeMap::new();

    if let Err(err) = fs::create_dir_all(&run_dir) {
        summary.errors.push(RecordedError::error(StageName::Evidence, format!("could not create run directory: {err}")));
        return finish(config, context, deps, &run_dir, summary, Vec::new(), run_start, &mut stage_durations);
    }

    let ingest_started = Instant::now();
    let limits = IngestLimits::default();
    let ingest = match Walker::new(limits).walk(deps.worktree_root) {
        Ok(ingest) => ingest,
        Err(err) => {
            summary.errors.push(RecordedError::error(StageName::Ingest, err.to_string()));
            return finish(config, context, deps, &run_dir, summary, Vec::new(), run_start, &mut stage_durations);
        }
    };
    stage_durations.insert(StageName::Ingest, elapsed_ms(ingest_started));
    summary.stages_completed.push(StageName::Ingest);

    let quicklearn = build_quick_learn(deps.worktree_root, &ingest);

    if matches!(scope, ScanScope::Full) {
        match preflight::check_cost_approval(&config.approval, &config.llm.model, &ingest.stats, config.max_input_tokens, context) {
            CostApprovalDecision::Approved => {}
            CostApprovalDecision::NeedsApproval => {
                // Mirrors preflight's own short-circuits: no findings exist yet,
                // so there is nothing evidence-worthy to write.
                return Outcome::NeedsApproval;
            }
        }
    }

    let pr_diff = if config.scan_mode == ScanMode::PrDiff {
        context.base_sha.as_ref().and_then(|base| match diff::fetch(deps.worktree_root, base.as_str(), context.head_sha.as_str()) {
            Ok(diff) => Some(diff),
            Err(err) => {
                summary.errors.push(RecordedError::warning(StageName::Merge, format!("pr-diff fetch failed, all findings will be demoted: {err}")));
                None
            }
        })
    } else {
        None
    };

    let deadline = Duration::from_secs(config.run_deadline_secs);

    let (deterministic_findings, harness_findings, tool_versions) = if run_start.elapsed() >= deadline {
        summary.errors.push(deadline_exceeded_warning(StageName::Scanners, deadline));
        (Vec::new(), Vec::new(), BTreeMap::new())
    } else {
        let scan_started = Instant::now();
        let (deterministic_findings, deterministic_warnings, harness) = run_scan_stage(deps.worktree_root, &ingest, context);
        stage_durations.insert(StageName::Scanners, elapsed_ms(scan_started));
        summary.stages_completed.push(StageName::Scanners);
        summary.errors.extend(deterministic_warnings);

        let harness_started = Instant::now();
        let (harness_findings, harness_warnings, tool_versions) = match harness {
            Ok(outcome) => (outcome.findings, outcome.warnings, outcome.tool_versions),
            Err(err) => (Vec::new(), vec![RecordedError::error(StageName::Harness, err.to_string())], BTreeMap::new()),
        };
        stage_durations.insert(StageName::Harness, elapsed_ms(harness_started));
        summary.stages_completed.push(StageName::Harness);
        summary.errors.extend(harness_warnings);
        (deterministic_findings, harness_findings, tool_versions)
    };
    summary.tool_versions = tool_versions;

    let llm_findings = if !matches!(scope, ScanScope::Full) {
        Vec::new()
    } else if run_start.elapsed() >= deadline {
        summary.errors.push(deadline_exceeded_warning(StageName::Llm, deadline));
        Vec::new()
    } else {
        let llm_started = Instant::now();
        let merged_so_far: Vec<Finding> = deterministic_findings.iter().chain(harness_findings.iter()).cloned().collect();
        let findings = run_llm_stage(config, context, &quicklearn, &merged_so_far, &ingest, deps.worktree_root, pr_diff.as_ref(), &mut summary);
        stage_durations.insert(StageName::Llm, elapsed_ms(llm_started));
        summary.stages_completed.push(StageName::Llm);
        findings
    };

    let merge_started = Instant::now();
    let tenant_salt = context.repo.as_str();
    let added_lines = pr_diff.as_ref().map(|diff| &diff.added_lines);
    let merged = merge_findings(MergeInputs {
        deterministic: deterministic_findings,
        harness: harness_findings,
        llm: llm_findings,
        ingest: &ingest,
        scan_mode: config.scan_mode,
        policy_version: &config.policy_pack_version,
        tenant_salt,
        added_lines,
    });
    stage_durations.insert(StageName::Merge, elapsed_ms(merge_started));
    summary.stages_completed.push(StageName::Merge);

    finish(config, context, deps, &run_dir, summary, merged, run_start, &mut stage_durations)
}

/// Runs preflight admission control (dedupe, rate limit, fork policy),
/// mapping every short-circuit to the matching terminal [`Outcome`].
fn admit(config: &GateConfig, context: &Context, dedupe_key: &str, host: &dyn HostApiClient) -> Result<ScanScope, Outcome> {
    if context.pr_number.is_none() {
        return Ok(ScanScope::Full);
    }
    match preflight::run_admission_checks(context, dedupe_key, &config.rate_limit, config.fork_policy, host) {
        AdmissionDecision::Proceed(scope) => Ok(scope),
        AdmissionDecision::Mirror(mirrored) => Err(Outcome::Mirrored(mirrored)),
        AdmissionDecision::ForkBlocked => Err(Outcome::ForkBlocked),
        AdmissionDecision::NeedsApproval => Err(Outcome::NeedsApproval),
    }
}

/// Runs the four deterministic scanners and the harness runner concurrently,
/// returning their findings, warnings, and the raw harness result.
fn run_scan_stage(
    worktree_root: &Path,
    ingest: &Ingest,
    context: &Context,
) -> (Vec<Finding>, Vec<RecordedError>, Result<gate_harness::HarnessRunOutcome, gate_harness::HarnessError>) {
    let scanners: Vec<Box<dyn Scanner>> = vec![
        Box::new(PatternScanner::new()),
        Box::new(SecretsScanner::new()),
        Box::new(ConfigFileScanner::new()),
        Box::new(EngineeringQualityScanner::new()),
    ];
    let files = &ingest.files;

    std::thread::scope(|scope| {
        let harness_handle = scope.spawn(|| gate_harness::HarnessRunner::new().run(worktree_root, context));

        let mut findings = Vec::new();
        let mut warnings = Vec::new();
        for scanner in &scanners {
            match run_scanner(scanner.as_ref(), files, worktree_root, context) {
                Ok(found) => findings.extend(found),
                Err(err) => warnings.push(RecordedError::warning(StageName::Scanners, err.to_string())),
            }
        }

        let harness_result = harness_handle.join().unwrap_or_else(|_| {
            Err(gate_harness::HarnessError::Io {
                tool: "harness-runner",
                source: io::Error::other("harness runner thread panicked"),
            })
        });

        (findings, warnings, harness_result)
    })
}

/// Runs one [`Scanner`] against `files`, supplying a `read` closure backed
/// by `worktree_root`.
fn run_scanner(
    scanner: &dyn Scanner,
    files: &[IngestFile],
    worktree_root: &Path,
    context: &Context,
) -> Result<Vec<Finding>, gate_scanners::ScannerError> {
    let read = |path: &RepoPath| -> io::Result<String> { fs::read_to_string(worktree_root.join(path.as_str())) };
    scanner.scan(files, &read, context)
}

/// Builds the reference [`LlmProvider`] for `kind` from `config.llm`. Azure
/// and Bedrock read their extra `resource`/`deployment`/`invoke_url` fields
/// from `config.llm`, defaulting to empty strings if unset so the provider
/// constructor itself, not this function, is the single place that rejects
/// a missing value.
fn build_provider(kind: LlmProviderKind, config: &gate_config::LlmConfig) -> Result<Box<dyn LlmProvider>, gate_providers::LlmError> {
    let api_key = config.api_key.expose();
    match kind {
        LlmProviderKind::OpenAi => Ok(Box::new(OpenAiProvider::new(api_key)?)),
        LlmProviderKind::Anthropic => Ok(Box::new(AnthropicProvider::new(api_key)?)),
        LlmProviderKind::AzureOpenAi => {
            let resource = config.azure_resource.as_deref().unwrap_or_default();
            let deployment = config.azure_deployment.as_deref().unwrap_or_default();
            Ok(Box::new(AzureOpenAiProvider::new(api_key, resource, deployment)?))
        }
        LlmProviderKind::Bedrock => {
            let invoke_url = config.bedrock_invoke_url.clone().unwrap_or_default();
            Ok(Box::new(BedrockProvider::new(api_key, invoke_url)?))
        }
    }
}

/// Runs the LLM analysis stage for one run: the agentic CLI path if
/// enabled, else the API path through [`AnalysisRunner`] with primary/
/// fallback provider dispatch. Folds a failed attempt into `summary.errors`
/// per `config.failure_policy` and returns an empty finding set rather than
/// propagating an error, since an analyzer failure never aborts the run.
#[allow(clippy::too_many_arguments, reason = "mirrors the context builder's own constructor shape")]
fn run_llm_stage(
    config: &GateConfig,
    context: &Context,
    quicklearn: &gate_core::QuickLearn,
    findings_so_far: &[Finding],
    ingest: &Ingest,
    worktree_root: &Path,
    pr_diff: Option<&diff::PrDiff>,
    summary: &mut Summary,
) -> Vec<Finding> {
    if config.llm.agentic_enabled {
        let provider = AgenticCliProvider::new(config.llm.agentic_binary.clone());
        let timeout = Duration::from_secs(config.llm.agentic_timeout_secs);
        return match provider.run(worktree_root, &config.llm.model, timeout) {
            Ok(findings) => findings,
            Err(err) => {
                summary.errors.push(llm_outcome_warning(&config.failure_policy, &err));
                Vec::new()
            }
        };
    }

    let primary_provider = match build_provider(config.llm.provider, &config.llm) {
        Ok(provider) => provider,
        Err(err) => {
            summary.errors.push(RecordedError::error(StageName::Llm, err.to_string()));
            return Vec::new();
        }
    };

    let fallback_provider = config.llm.fallback_provider().and_then(|kind| build_provider(kind, &config.llm).ok());
    let fallback_model = config.llm.fallback_model.as_deref();
    let fallback_attempt = match (&fallback_provider, fallback_model) {
        (Some(provider), Some(model)) => Some(ModelAttempt { provider: provider.as_ref(), model }),
        _ => None,
    };

    let runner = AnalysisRunner::new(
        ModelAttempt { provider: primary_provider.as_ref(), model: &config.llm.model },
        fallback_attempt,
        config.failure_policy,
    );

    let context_builder = ContextBuilder::new(quicklearn, findings_so_far, ingest, worktree_root, config.scan_mode, pr_diff.map(|diff| diff.text.as_str()));
    let user_prompt = context_builder.build(config.max_input_tokens as usize);
    let timeout = Duration::from_secs(config.llm.timeout_secs);

    match runner.run(ANALYSIS_SYSTEM_PROMPT, &user_prompt, config.max_input_tokens, LLM_TEMPERATURE, timeout) {
        AnalysisOutcome::Findings(findings) => findings,
        AnalysisOutcome::DeterministicOnly => Vec::new(),
        AnalysisOutcome::AllowedWithWarning(warning) => {
            summary.errors.push(warning);
            Vec::new()
        }
        AnalysisOutcome::Blocked(err) => {
            summary.errors.push(RecordedError::error(StageName::Llm, err.to_string()));
            Vec::new()
        }
    }
}

/// Records that `stage` was skipped because the top-level run deadline had
/// already elapsed when it was about to start. Any subprocess the skipped
/// stage would have spawned (harness tools, an LLM HTTP call, the agentic
/// CLI) never starts, so there is nothing to terminate; the run proceeds
/// straight to evidence writing with whatever findings earlier stages
/// already produced.
fn deadline_exceeded_warning(stage: StageName, deadline: Duration) -> RecordedError {
    RecordedError::warning(stage, format!("run exceeded its {}s deadline; stage skipped", deadline.as_secs()))
}

/// Maps an agentic-path [`gate_providers::LlmError`] to an error or warning
/// `RecordedError` depending on `failure_policy`, mirroring how
/// [`AnalysisRunner`] resolves the API path's own exhausted-retries case.
fn llm_outcome_warning(failure_policy: &gate_core::LlmFailurePolicy, err: &gate_providers::LlmError) -> RecordedError {
    match failure_policy {
        gate_core::LlmFailurePolicy::Block => RecordedError::error(StageName::Llm, err.to_string()),
        _ => RecordedError::warning(StageName::Llm, err.to_string()),
    }
}

/// Writes evidence, evaluates the gate, publishes, and uploads telemetry for
/// a run that reached ingest. Always runs to completion regardless of how
/// many earlier stages recorded errors, matching the fail-closed evidence
/// contract: a `Summary` is written even when the run is effectively empty.
fn finish(
    config: &GateConfig,
    context: &Context,
    deps: &RunDeps<'_>,
    run_dir: &Path,
    mut summary: Summary,
    findings: Vec<Finding>,
    run_start: Instant,
    stage_durations: &mut BTreeMap<StageName, u64>,
) -> Outcome {
    let evidence_started = Instant::now();
    let write_outcome = EvidenceWriter::write(run_dir, &findings, summary, None);
    stage_durations.insert(StageName::Evidence, elapsed_ms(evidence_started));

    let mut summary = match write_outcome {
        Ok(outcome) => {
            let mut summary = outcome.summary;
            summary.errors.extend(outcome.report_warnings);
            summary
        }
        Err(err) => {
            return report_config_error(config, context, deps, run_dir, err.to_string());
        }
    };
    summary.stages_completed.push(StageName::Evidence);

    let gate_started = Instant::now();
    let evaluator = GateEvaluator::new();
    let gate_result = match evaluator.evaluate(run_dir, config.severity_gate, &summary.dedupe_key) {
        Ok(result) => result,
        Err(err) => {
            return report_config_error(config, context, deps, run_dir, err.to_string());
        }
    };
    stage_durations.insert(StageName::Gate, elapsed_ms(gate_started));
    summary.stages_completed.push(StageName::Gate);

    let publish_started = Instant::now();
    if let Some(pr_number) = context.pr_number {
        let publisher = GithubPublisher::new(deps.host, PUBLISH_HOST_CALL_BUDGET);
        if let Err(err) = publisher.publish(context.repo.as_str(), pr_number, context.head_sha.as_str(), &gate_result, &findings) {
            let recorded = RecordedError::error(StageName::Publish, err.to_string());
            if config.publish.strict {
                summary.errors.push(recorded);
                stage_durations.insert(StageName::Publish, elapsed_ms(publish_started));
                summary.duration_ms = elapsed_ms(run_start);
                summary.stage_durations = stage_durations.clone();
                upload_telemetry(config, context, deps, &summary, &findings);
                return Outcome::Gate(GateStatus::Error);
            }
            summary.errors.push(RecordedError::warning(StageName::Publish, recorded.message));
        }
    }
    stage_durations.insert(StageName::Publish, elapsed_ms(publish_started));
    summary.stages_completed.push(StageName::Publish);

    summary.duration_ms = elapsed_ms(run_start);
    summary.stage_durations = stage_durations.clone();
    upload_telemetry(config, context, deps, &summary, &findings);

    Outcome::Gate(gate_result.status)
}

/// Records `reason` and returns [`Outcome::ConfigError`] for a failure so
/// severe that evidence could not be written or the gate could not be
/// evaluated — there is no `GateResult` to publish or report on.
fn report_config_error(config: &GateConfig, context: &Context, deps: &RunDeps<'_>, run_dir: &Path, reason: String) -> Outcome {
    let _ = fs::write(run_dir.join("ORCHESTRATOR_ERROR.txt"), &reason);
    let mut summary = Summary::incomplete(RunId::new("error"), "error", now_rfc3339(), &config.policy_pack, &config.policy_pack_version);
    summary.errors.push(RecordedError::error(StageName::Evidence, reason));
    upload_telemetry(config, context, deps, &summary, &[]);
    Outcome::ConfigError
}

/// Resolves auth and uploads this run's telemetry payload, recording a
/// `Tier1`-only warning if the sink rejected it. Never affects the returned
/// `Outcome` — telemetry failures are fail-open by design.
fn upload_telemetry(config: &GateConfig, context: &Context, deps: &RunDeps<'_>, summary: &Summary, findings: &[Finding]) {
    if config.telemetry_tier == gate_core::TelemetryTier::Off {
        return;
    }
    let auth = TelemetryAuth::resolve(TelemetryAuth::oidc_available_from_env(), config.telemetry_token.as_ref());
    let reporter = TelemetryReporter::new(deps.sink, deps.telemetry_target.clone(), config.telemetry_tier);
    let _ = reporter.upload(context.repo.as_str(), summary, findings, None, auth);
}

/// Converts an [`Instant::elapsed`] reading to milliseconds, saturating
/// instead of overflowing for an implausibly long stage.
fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Current UTC time as an RFC 3339 string, used for `Summary.timestamp_utc`.
fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gate_core::CommitSha;
    use gate_core::RepoFullName;
    use std::cell::RefCell;
    use std::time::Duration as StdDuration;

    struct NoopHost;

    impl HostApiClient for NoopHost {
        fn list_check_runs(&self, _: &str, _: &str, _: &str, _: StdDuration) -> Result<Vec<gate_providers::host::CheckRunSummary>, gate_providers::host::HostApiError> {
            Ok(Vec::new())
        }
        fn create_check_run(
            &self,
            _: &str,
            _: &str,
            _: &str,
            _: &str,
            _: &str,
            _: &[gate_providers::host::CheckRunAnnotation],
            _: &str,
            _: StdDuration,
        ) -> Result<(), gate_providers::host::HostApiError> {
            Ok(())
        }
        fn list_pr_comments(&self, _: &str, _: u64, _: StdDuration) -> Result<Vec<gate_providers::host::PrComment>, gate_providers::host::HostApiError> {
            Ok(Vec::new())
        }
        fn create_comment(&self, _: &str, _: u64, _: &str, _: StdDuration) -> Result<(), gate_providers::host::HostApiError> {
            Ok(())
        }
        fn update_comment(&self, _: &str, _: u64, _: &str, _: StdDuration) -> Result<(), gate_providers::host::HostApiError> {
            Ok(())
        }
        fn list_workflow_runs_last_24h(&self, _: &str, _: &str, _: StdDuration) -> Result<Vec<gate_providers::host::WorkflowRunSummary>, gate_providers::host::HostApiError> {
            Ok(Vec::new())
        }
    }

    /// Telemetry sink that records how many payloads it received, used to
    /// assert the orchestrator always attempts an upload.
    struct RecordingSink {
        delivered: RefCell<u32>,
    }

    impl Sink for RecordingSink {
        fn deliver(
            &self,
            target: &DispatchTarget,
            _payload: &gate_publish::telemetry::TelemetryPayload,
        ) -> Result<gate_publish::sink::DispatchReceipt, gate_publish::sink::SinkError> {
            *self.delivered.borrow_mut() += 1;
            Ok(gate_publish::sink::DispatchReceipt {
                dispatch_id: "t-1".to_string(),
                target: target.clone(),
                payload_hash: gate_core::HashDigest::new(gate_core::DEFAULT_HASH_ALGORITHM, b""),
                dispatcher: "test".to_string(),
            })
        }
    }

    fn push_context() -> Context {
        Context::new(RepoFullName::new("acme/widgets"), None, CommitSha::new("headsha"), None, "push", false, "octocat")
    }

    #[test]
    fn empty_repository_passes_with_complete_evidence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = gate_config::EnvSource::from_maps(std::collections::HashMap::new(), std::collections::HashMap::new());
        let mut config = gate_config::GateConfig::from_source(&source).expect("default config is valid");
        config.runs_dir = dir.path().join("runs");
        config.telemetry_tier = gate_core::TelemetryTier::Tier1;

        let host = NoopHost;
        let sink = RecordingSink { delivered: RefCell::new(0) };
        let deps = RunDeps {
            worktree_root: dir.path(),
            host: &host,
            sink: &sink,
            telemetry_target: DispatchTarget::Local { name: "test".to_string() },
        };

        let outcome = run(&config, &push_context(), &deps);
        assert_eq!(outcome, Outcome::Gate(GateStatus::Passed));
        assert_eq!(*sink.delivered.borrow(), 1);
    }

    #[test]
    fn expired_deadline_skips_remaining_stages_but_still_writes_evidence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = gate_config::EnvSource::from_maps(std::collections::HashMap::new(), std::collections::HashMap::new());
        let mut config = gate_config::GateConfig::from_source(&source).expect("default config is valid");
        config.runs_dir = dir.path().join("runs");
        config.telemetry_tier = gate_core::TelemetryTier::Tier1;
        config.run_deadline_secs = 0;

        let host = NoopHost;
        let sink = RecordingSink { delivered: RefCell::new(0) };
        let deps = RunDeps {
            worktree_root: dir.path(),
            host: &host,
            sink: &sink,
            telemetry_target: DispatchTarget::Local { name: "test".to_string() },
        };

        let outcome = run(&config, &push_context(), &deps);
        assert_eq!(outcome, Outcome::Gate(GateStatus::Passed));
        assert_eq!(*sink.delivered.borrow(), 1);

        let summary_path = dir.path().join("runs");
        let run_dir = fs::read_dir(&summary_path).expect("runs dir exists").next().expect("one run dir").expect("entry").path();
        let summary_text = fs::read_to_string(run_dir.join("PACK_SUMMARY.json")).expect("summary written");
        assert!(summary_text.contains("deadline"));
        assert!(!summary_text.contains("\"scanners\""));
    }
}
