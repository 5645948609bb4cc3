// gate-cli/src/preflight.rs
// ============================================================================
// Module: Preflight Admission Control
// Description: Dedupe lookup, rate-limit enforcement, fork policy, and
//              cost-threshold approval, sequenced ahead of (and, for cost
//              approval, just after) ingest.
// Purpose: Give the orchestrator one call per admission-control step, each
//          returning a typed outcome instead of a bare bool, so `main.rs`
//          never has to re-derive what a short-circuit means.
// Dependencies: gate-core, gate-config, gate-providers, gate-publish
// ============================================================================

//! ## Overview
//! Dedupe, rate-limit, and fork-policy all run before ingest, against
//! [`gate_providers::HostApiClient`] history. Cost approval runs after
//! ingest, since it needs [`gate_core::IngestStats`] — see `DESIGN.md` for
//! why this step is grouped here conceptually even though it executes later
//! in `main.rs`'s sequencing.

use std::fs;
use std::path::Path;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use gate_config::ApprovalConfig;
use gate_config::RateLimitConfig;
use gate_core::ApprovalMode;
use gate_core::Context;
use gate_core::ForkPolicy;
use gate_core::IngestStats;
use gate_core::RateLimitFailMode;
use gate_providers::HostApiClient;
use serde_json::Value;

/// Per-host-call budget during preflight (§5's "2 seconds per host call").
const HOST_CALL_BUDGET: Duration = Duration::from_secs(2);

/// Which scanners/analyzer stages run for this admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanScope {
    /// Deterministic scanners, harness, and the LLM analyzer all run.
    Full,
    /// Only deterministic scanners and the harness runner; no LLM call
    /// (fork PRs cannot be trusted with provider secrets).
    DeterministicOnly,
}

/// A prior run's mirrored conclusion, carried through a dedupe or
/// rate-limit skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirroredConclusion {
    /// The prior check run (or sticky comment) concluded successfully.
    Success,
    /// The prior check run concluded with a failure.
    Failure,
}

/// The outcome of the pre-ingest admission-control sequence
/// (dedupe → rate limit → fork policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// Proceed with the given scan scope.
    Proceed(ScanScope),
    /// Short-circuit, mirroring a prior run's conclusion without publishing
    /// a new comment (the legacy `10`/`11` codes, mapped to `0`/`1`).
    Mirror(MirroredConclusion),
    /// `fork_policy = block` and this is a fork PR: exit 12, no LLM call.
    ForkBlocked,
    /// A host-API error during rate-limit checking, with
    /// `rate_limit_fail_mode = closed`: exit 13.
    NeedsApproval,
}

/// Runs dedupe, rate-limit, and fork-policy checks in sequence, each able to
/// short-circuit the remainder.
///
/// # Errors
///
/// Never returns `Err` for host-API failures — those are folded into
/// [`AdmissionDecision::NeedsApproval`] or ignored per `rate_limit_fail_mode`.
/// This function only returns `Err` if the host API client itself cannot be
/// constructed by the caller, which is not a concern this function has.
#[must_use]
pub fn run_admission_checks(
    context: &Context,
    dedupe_key: &str,
    rate_limit: &RateLimitConfig,
    fork_policy: ForkPolicy,
    host: &dyn HostApiClient,
) -> AdmissionDecision {
    if let Some(mirrored) = check_dedupe(context, dedupe_key, host) {
        return AdmissionDecision::Mirror(mirrored);
    }

    match check_rate_limit(context, rate_limit, host) {
        RateLimitOutcome::Proceed => {}
        RateLimitOutcome::Skip(mirrored) => return AdmissionDecision::Mirror(mirrored),
        RateLimitOutcome::NeedsApproval => return AdmissionDecision::NeedsApproval,
    }

    check_fork_policy(context, fork_policy)
}

/// Queries prior check runs for `external_id == dedupe_key`, falling back
/// to a sticky-comment marker parse. A comment-only match carries no
/// conclusion, so it mirrors `Success` — a skip should never itself fail a
/// workflow that a prior run did not.
fn check_dedupe(context: &Context, dedupe_key: &str, host: &dyn HostApiClient) -> Option<MirroredConclusion> {
    if let Ok(runs) = host.list_check_runs(context.repo.as_str(), context.head_sha.as_str(), gate_publish::CHECK_RUN_NAME, HOST_CALL_BUDGET) {
        if let Some(run) = runs.iter().find(|run| run.external_id.as_deref() == Some(dedupe_key)) {
            return Some(match run.conclusion.as_deref() {
                Some("success") => MirroredConclusion::Success,
                Some(_) => MirroredConclusion::Failure,
                None => MirroredConclusion::Success,
            });
        }
    }

    let Some(pr_number) = context.pr_number else { return None };
    let marker = gate_publish::publisher::sticky_marker(context.repo.as_str(), pr_number);
    if let Ok(comments) = host.list_pr_comments(context.repo.as_str(), pr_number, HOST_CALL_BUDGET) {
        if comments.iter().any(|comment| comment.body.contains(marker.as_str())) {
            return Some(MirroredConclusion::Success);
        }
    }
    None
}

/// Outcome of the rate-limit step alone.
enum RateLimitOutcome {
    /// No cooldown or cap exceeded; continue to fork-policy checking.
    Proceed,
    /// Cooldown or daily cap exceeded; mirror the prior conclusion.
    Skip(MirroredConclusion),
    /// The host API errored and `fail_mode = closed`.
    NeedsApproval,
}

/// Enforces the min-interval cooldown and daily cap against the last 24h of
/// workflow runs for this head SHA. A host-API error is resolved by
/// `rate_limit.fail_mode`.
fn check_rate_limit(context: &Context, rate_limit: &RateLimitConfig, host: &dyn HostApiClient) -> RateLimitOutcome {
    let runs = match host.list_workflow_runs_last_24h(context.repo.as_str(), context.head_sha.as_str(), HOST_CALL_BUDGET) {
        Ok(runs) => runs,
        Err(_) => {
            return match rate_limit.fail_mode {
                RateLimitFailMode::Closed => RateLimitOutcome::NeedsApproval,
                RateLimitFailMode::Open => RateLimitOutcome::Proceed,
            };
        }
    };

    let matching: Vec<&gate_providers::host::WorkflowRunSummary> =
        runs.iter().filter(|run| run.head_sha == context.head_sha.as_str()).collect();

    let matching_count = u32::try_from(matching.len()).unwrap_or(u32::MAX);
    if matching_count >= rate_limit.daily_cap {
        return RateLimitOutcome::Skip(MirroredConclusion::Success);
    }

    if let Some(most_recent) = matching.iter().filter_map(|run| parse_rfc3339_epoch_secs(&run.created_at)).max() {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
        if now.saturating_sub(most_recent) < rate_limit.min_interval_secs {
            return RateLimitOutcome::Skip(MirroredConclusion::Success);
        }
    }

    RateLimitOutcome::Proceed
}

/// Parses a subset of RFC 3339 (`YYYY-MM-DDTHH:MM:SSZ`) into Unix epoch
/// seconds, sufficient for comparing two host-reported timestamps without
/// pulling in a full calendar-arithmetic dependency for this one call site.
fn parse_rfc3339_epoch_secs(value: &str) -> Option<u64> {
    let parsed = time::OffsetDateTime::parse(value, &time::format_description::well_known::Rfc3339).ok()?;
    u64::try_from(parsed.unix_timestamp()).ok()
}

/// Maps `fork_policy` against `context.is_fork`.
fn check_fork_policy(context: &Context, fork_policy: ForkPolicy) -> AdmissionDecision {
    if !context.is_fork {
        return AdmissionDecision::Proceed(ScanScope::Full);
    }
    match fork_policy {
        ForkPolicy::Block => AdmissionDecision::ForkBlocked,
        ForkPolicy::Limited => AdmissionDecision::Proceed(ScanScope::DeterministicOnly),
        ForkPolicy::Allow => AdmissionDecision::Proceed(ScanScope::Full),
    }
}

/// Outcome of the post-ingest cost-approval step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostApprovalDecision {
    /// Estimated cost is at or below the threshold, or approval was
    /// granted.
    Approved,
    /// Estimated cost exceeds the threshold and no approval was found.
    NeedsApproval,
}

/// Estimates the run's LLM cost from `stats` and `model`, requiring
/// approval (per `approval.mode`) if the estimate exceeds
/// `approval.cost_threshold_usd`.
#[must_use]
pub fn check_cost_approval(approval: &ApprovalConfig, model: &str, stats: &IngestStats, max_input_tokens: u32, context: &Context) -> CostApprovalDecision {
    let estimate = gate_config::estimate_cost_usd(model, stats, max_input_tokens);
    if estimate <= approval.cost_threshold_usd {
        return CostApprovalDecision::Approved;
    }

    let approved = match approval.mode {
        ApprovalMode::None => false,
        ApprovalMode::WorkflowDispatch => context.event_name == "workflow_dispatch",
        ApprovalMode::PrLabel => pr_has_label(&approval.label),
    };

    if approved { CostApprovalDecision::Approved } else { CostApprovalDecision::NeedsApproval }
}

/// Checks the triggering event payload's `pull_request.labels[].name` for
/// `label`, re-reading `GITHUB_EVENT_PATH` directly since
/// [`gate_core::Context`] does not carry labels (they matter to this one
/// approval mode only).
fn pr_has_label(label: &str) -> bool {
    let Ok(event_path) = std::env::var("GITHUB_EVENT_PATH") else { return false };
    let Ok(bytes) = fs::read(Path::new(&event_path)) else { return false };
    let Ok(payload) = serde_json::from_slice::<Value>(&bytes) else { return false };
    payload
        .pointer("/pull_request/labels")
        .and_then(Value::as_array)
        .is_some_and(|labels| labels.iter().any(|entry| entry.get("name").and_then(Value::as_str) == Some(label)))
}

#[cfg(test)]
mod tests {
    use super::check_fork_policy;
    use super::AdmissionDecision;
    use super::ScanScope;
    use gate_core::CommitSha;
    use gate_core::Context;
    use gate_core::ForkPolicy;
    use gate_core::RepoFullName;

    fn context(is_fork: bool) -> Context {
        Context::new(RepoFullName::new("acme/widgets"), Some(1), CommitSha::new("abc"), None, "pull_request", is_fork, "octocat")
    }

    #[test]
    fn non_fork_always_proceeds_full_regardless_of_policy() {
        let decision = check_fork_policy(&context(false), ForkPolicy::Block);
        assert_eq!(decision, AdmissionDecision::Proceed(ScanScope::Full));
    }

    #[test]
    fn fork_under_block_policy_is_blocked() {
        let decision = check_fork_policy(&context(true), ForkPolicy::Block);
        assert_eq!(decision, AdmissionDecision::ForkBlocked);
    }

    #[test]
    fn fork_under_limited_policy_proceeds_deterministic_only() {
        let decision = check_fork_policy(&context(true), ForkPolicy::Limited);
        assert_eq!(decision, AdmissionDecision::Proceed(ScanScope::DeterministicOnly));
    }

    #[test]
    fn fork_under_allow_policy_proceeds_full() {
        let decision = check_fork_policy(&context(true), ForkPolicy::Allow);
        assert_eq!(decision, AdmissionDecision::Proceed(ScanScope::Full));
    }
}
