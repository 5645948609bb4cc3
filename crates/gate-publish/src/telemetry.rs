// gate-publish/src/telemetry.rs
// ============================================================================
// Module: Telemetry
// Description: Tiered payload construction and best-effort upload.
// Purpose: Give the orchestrator one call that always succeeds from the
//          caller's point of view — every [`SinkError`] is swallowed and
//          returned as a plain boolean so it can be recorded as a
//          `Tier1`-only warning — regardless of which tier is configured or
//          which sink backs it.
// Dependencies: gate-config, gate-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`TelemetryReporter`] builds a [`TelemetryPayload`] from a completed
//! [`Summary`] at the configured [`TelemetryTier`] and hands it to a
//! [`crate::sink::Sink`]. Authentication is resolved in precedence order —
//! OIDC workload identity, then a caller-supplied bearer token, else
//! anonymous — and is recorded on the payload itself rather than attached as
//! a transport header, since the sink (not this module) owns the actual
//! network call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use gate_config::SecretString;
use gate_core::DEFAULT_HASH_ALGORITHM;
use gate_core::Finding;
use gate_core::HashDigest;
use gate_core::RunId;
use gate_core::Severity;
use gate_core::SeverityCounts;
use gate_core::StageName;
use gate_core::Summary;
use gate_core::TelemetryTier;
use serde::Serialize;

use crate::sink::DispatchTarget;
use crate::sink::Sink;

// ============================================================================
// SECTION: OIDC Environment
// ============================================================================

/// Env var GitHub Actions sets when an OIDC workload-identity token request
/// URL is available to the job.
const OIDC_TOKEN_URL_VAR: &str = "ACTIONS_ID_TOKEN_REQUEST_URL";
/// Env var GitHub Actions sets alongside [`OIDC_TOKEN_URL_VAR`].
const OIDC_TOKEN_VAR: &str = "ACTIONS_ID_TOKEN_REQUEST_TOKEN";

// ============================================================================
// SECTION: Telemetry Auth
// ============================================================================

/// Authentication resolved for one upload, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryAuth {
    /// OIDC workload identity token retrieved from the runner environment.
    Oidc,
    /// Caller-supplied bearer token from config.
    Bearer,
    /// No credential attached.
    Anonymous,
}

impl TelemetryAuth {
    /// Resolves auth in the documented precedence: OIDC, then a configured
    /// bearer token, else anonymous.
    #[must_use]
    pub fn resolve(oidc_available: bool, bearer_token: Option<&SecretString>) -> Self {
        if oidc_available {
            Self::Oidc
        } else if bearer_token.is_some_and(|token| !token.is_empty()) {
            Self::Bearer
        } else {
            Self::Anonymous
        }
    }

    /// True when the GitHub Actions OIDC environment variables are both
    /// present.
    #[must_use]
    pub fn oidc_available_from_env() -> bool {
        std::env::var_os(OIDC_TOKEN_URL_VAR).is_some() && std::env::var_os(OIDC_TOKEN_VAR).is_some()
    }
}

// ============================================================================
// SECTION: Payload Components
// ============================================================================

/// Per-finding metadata carried at [`TelemetryTier::Tier2`] and above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindingMetadata {
    /// Finding category tag.
    pub category: String,
    /// Finding severity.
    pub severity: Severity,
    /// Pipeline stage that produced the finding.
    pub source: &'static str,
}

impl FindingMetadata {
    fn from_finding(finding: &Finding) -> Self {
        Self {
            category: finding.category.as_str().to_string(),
            severity: finding.severity,
            source: match finding.source {
                gate_core::FindingSource::Deterministic => "deterministic",
                gate_core::FindingSource::Harness => "harness",
                gate_core::FindingSource::Llm => "llm",
            },
        }
    }
}

/// Pre-signed destination for a [`TelemetryTier::Tier3`] artifact upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactUpload {
    /// Pre-signed URL the host supplied for this run's artifact upload.
    pub destination_url: String,
    /// SHA-256 hex digest of `FINDINGS.jsonl`, echoed so the collector can
    /// verify the upload matches the evidence bundle this run produced.
    pub findings_file_sha256: String,
}

// ============================================================================
// SECTION: Telemetry Payload
// ============================================================================

/// Tiered telemetry payload built from a completed [`Summary`].
///
/// # Invariants
/// - `repo`, `dedupe_key`, `findings`, and `artifact` are only populated at
///   the tier that introduces them; a `Tier1` payload never carries repo
///   identity even if the caller passed one in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryPayload {
    /// Tier this payload was built at.
    pub tier: TelemetryTier,
    /// This run's identifier.
    pub run_id: RunId,
    /// RFC 3339 UTC timestamp copied from the run's [`Summary`].
    pub timestamp_utc: String,
    /// SHA-256 digest of the repository full name, present at every tier.
    pub repo_hash: HashDigest,
    /// Per-severity finding counts.
    pub counts: SeverityCounts,
    /// Total run duration, in milliseconds.
    pub duration_ms: u64,
    /// Per-stage duration, in milliseconds, keyed by stage name.
    pub stage_durations_ms: BTreeMap<&'static str, u64>,
    /// Repository full name, present from `Tier2` onward.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    /// Idempotency key, present from `Tier2` onward.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedupe_key: Option<String>,
    /// Per-finding metadata, present from `Tier2` onward.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub findings: Vec<FindingMetadata>,
    /// Artifact upload destination, present only at `Tier3`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactUpload>,
    /// Authentication used for this upload.
    pub auth: TelemetryAuth,
}

impl TelemetryPayload {
    /// Builds a payload for `tier` from `summary` and the run's merged
    /// `findings`. `artifact` is only attached when `tier` is
    /// [`TelemetryTier::Tier3`]; it is silently dropped otherwise so a
    /// misconfigured caller cannot leak a pre-signed URL at a lower tier.
    #[must_use]
    pub fn build(tier: TelemetryTier, repo: &str, summary: &Summary, findings: &[Finding], artifact: Option<ArtifactUpload>, auth: TelemetryAuth) -> Self {
        let repo_hash = HashDigest::new(DEFAULT_HASH_ALGORITHM, repo.as_bytes());
        let stage_durations_ms = summary.stage_durations.iter().map(|(stage, ms)| (stage_key(*stage), *ms)).collect();

        let (repo_field, dedupe_field, finding_metadata, artifact_field) = match tier {
            TelemetryTier::Off | TelemetryTier::Tier1 => (None, None, Vec::new(), None),
            TelemetryTier::Tier2 => (Some(repo.to_string()), Some(summary.dedupe_key.clone()), findings.iter().map(FindingMetadata::from_finding).collect(), None),
            TelemetryTier::Tier3 => (Some(repo.to_string()), Some(summary.dedupe_key.clone()), findings.iter().map(FindingMetadata::from_finding).collect(), artifact),
        };

        Self {
            tier,
            run_id: summary.run_id.clone(),
            timestamp_utc: summary.timestamp_utc.clone(),
            repo_hash,
            counts: summary.counts,
            duration_ms: summary.duration_ms,
            stage_durations_ms,
            repo: repo_field,
            dedupe_key: dedupe_field,
            findings: finding_metadata,
            artifact: artifact_field,
            auth,
        }
    }
}

/// Maps a [`StageName`] to its telemetry payload key.
const fn stage_key(stage: StageName) -> &'static str {
    match stage {
        StageName::Config => "config",
        StageName::Preflight => "preflight",
        StageName::Ingest => "ingest",
        StageName::Harness => "harness",
        StageName::Scanners => "scanners",
        StageName::Llm => "llm",
        StageName::Merge => "merge",
        StageName::Evidence => "evidence",
        StageName::Gate => "gate",
        StageName::Publish => "publish",
    }
}

// ============================================================================
// SECTION: Telemetry Reporter
// ============================================================================

/// Uploads a [`TelemetryPayload`] through one [`Sink`], swallowing failures.
///
/// Matches the "always upload, never fail" contract: every public method
/// returns `true` on a successful delivery and `false` otherwise, never an
/// `Err` the orchestrator would need to propagate.
pub struct TelemetryReporter<'a> {
    sink: &'a dyn Sink,
    target: DispatchTarget,
    tier: TelemetryTier,
}

impl<'a> TelemetryReporter<'a> {
    /// Creates a reporter that uploads through `sink` to `target` at `tier`.
    #[must_use]
    pub const fn new(sink: &'a dyn Sink, target: DispatchTarget, tier: TelemetryTier) -> Self {
        Self { sink, target, tier }
    }

    /// Builds and uploads a payload for this run, returning `true` if the
    /// sink accepted it. Returns `true` without dispatching anything when
    /// `tier` is [`TelemetryTier::Off`], since there is nothing to upload.
    /// Never propagates a sink failure; the caller records a `false` result
    /// as a `Tier1`-only warning, matching "failures during upload are
    /// swallowed."
    #[must_use]
    pub fn upload(&self, repo: &str, summary: &Summary, findings: &[Finding], artifact: Option<ArtifactUpload>, auth: TelemetryAuth) -> bool {
        if self.tier == TelemetryTier::Off {
            return true;
        }
        let payload = TelemetryPayload::build(self.tier, repo, summary, findings, artifact, auth);
        self.sink.deliver(&self.target, &payload).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use gate_core::Category;
    use gate_core::Confidence;
    use gate_core::Finding;
    use gate_core::FindingId;
    use gate_core::FindingSource;
    use gate_core::RepoPath;
    use gate_core::RunId;
    use gate_core::Severity;
    use gate_core::Summary;
    use gate_core::TelemetryTier;

    use super::ArtifactUpload;
    use super::TelemetryAuth;
    use super::TelemetryPayload;
    use super::TelemetryReporter;
    use crate::sink::DispatchTarget;
    use crate::sink::DispatchReceipt;
    use crate::sink::Sink;
    use crate::sink::SinkError;

    struct FailingSink;

    impl Sink for FailingSink {
        fn deliver(&self, _: &DispatchTarget, _: &super::TelemetryPayload) -> Result<DispatchReceipt, SinkError> {
            Err(SinkError::DeliveryFailed("unreachable".to_string()))
        }
    }

    struct RecordingSink {
        delivered: RefCell<Vec<super::TelemetryPayload>>,
    }

    impl Sink for RecordingSink {
        fn deliver(&self, target: &DispatchTarget, payload: &super::TelemetryPayload) -> Result<DispatchReceipt, SinkError> {
            self.delivered.borrow_mut().push(payload.clone());
            Ok(DispatchReceipt {
                dispatch_id: "rec-1".to_string(),
                target: target.clone(),
                payload_hash: gate_core::HashDigest::new(gate_core::DEFAULT_HASH_ALGORITHM, b""),
                dispatcher: "recording".to_string(),
            })
        }
    }

    fn sample_summary() -> Summary {
        let mut summary = Summary::incomplete(RunId::new("r-1"), "dk-1", "2026-01-01T00:00:00Z", "default", "1");
        summary.duration_ms = 1234;
        summary
    }

    fn sample_finding() -> Finding {
        Finding::new(FindingId::new("f-1"), Severity::P1, Category::new("secrets"), FindingSource::Deterministic, RepoPath::new("a.rs"), 1, 1, "s", "m", "r", Confidence::default()).expect("valid finding")
    }

    #[test]
    fn tier1_payload_omits_repo_identity_and_findings() {
        let payload = TelemetryPayload::build(TelemetryTier::Tier1, "acme/repo", &sample_summary(), &[sample_finding()], None, TelemetryAuth::Anonymous);
        assert!(payload.repo.is_none());
        assert!(payload.dedupe_key.is_none());
        assert!(payload.findings.is_empty());
        assert!(payload.artifact.is_none());
    }

    #[test]
    fn tier2_payload_includes_repo_identity_and_finding_metadata() {
        let payload = TelemetryPayload::build(TelemetryTier::Tier2, "acme/repo", &sample_summary(), &[sample_finding()], None, TelemetryAuth::Bearer);
        assert_eq!(payload.repo.as_deref(), Some("acme/repo"));
        assert_eq!(payload.dedupe_key.as_deref(), Some("dk-1"));
        assert_eq!(payload.findings.len(), 1);
        assert!(payload.artifact.is_none());
    }

    #[test]
    fn tier3_payload_carries_the_artifact_upload() {
        let artifact = ArtifactUpload { destination_url: "https://example.test/upload".to_string(), findings_file_sha256: "deadbeef".to_string() };
        let payload = TelemetryPayload::build(TelemetryTier::Tier3, "acme/repo", &sample_summary(), &[sample_finding()], Some(artifact.clone()), TelemetryAuth::Oidc);
        assert_eq!(payload.artifact, Some(artifact));
    }

    #[test]
    fn tier2_never_attaches_an_artifact_even_if_the_caller_passed_one() {
        let artifact = ArtifactUpload { destination_url: "https://example.test/upload".to_string(), findings_file_sha256: "deadbeef".to_string() };
        let payload = TelemetryPayload::build(TelemetryTier::Tier2, "acme/repo", &sample_summary(), &[], Some(artifact), TelemetryAuth::Bearer);
        assert!(payload.artifact.is_none());
    }

    #[test]
    fn auth_resolves_oidc_over_bearer_over_anonymous() {
        assert_eq!(TelemetryAuth::resolve(true, None), TelemetryAuth::Oidc);
        let token = gate_config::SecretString::new("tok");
        assert_eq!(TelemetryAuth::resolve(false, Some(&token)), TelemetryAuth::Bearer);
        assert_eq!(TelemetryAuth::resolve(false, None), TelemetryAuth::Anonymous);
        let empty = gate_config::SecretString::default();
        assert_eq!(TelemetryAuth::resolve(false, Some(&empty)), TelemetryAuth::Anonymous);
    }

    #[test]
    fn upload_swallows_sink_failures_and_reports_false() {
        let sink = FailingSink;
        let reporter = TelemetryReporter::new(&sink, DispatchTarget::Local { name: "test".to_string() }, TelemetryTier::Tier1);
        let ok = reporter.upload("acme/repo", &sample_summary(), &[], None, TelemetryAuth::Anonymous);
        assert!(!ok);
    }

    #[test]
    fn upload_is_a_noop_when_tier_is_off() {
        let sink = FailingSink;
        let reporter = TelemetryReporter::new(&sink, DispatchTarget::Local { name: "test".to_string() }, TelemetryTier::Off);
        let ok = reporter.upload("acme/repo", &sample_summary(), &[], None, TelemetryAuth::Anonymous);
        assert!(ok);
    }

    #[test]
    fn upload_delivers_through_a_recording_sink() {
        let sink = RecordingSink { delivered: RefCell::new(Vec::new()) };
        let reporter = TelemetryReporter::new(&sink, DispatchTarget::Local { name: "test".to_string() }, TelemetryTier::Tier1);
        let ok = reporter.upload("acme/repo", &sample_summary(), &[], None, TelemetryAuth::Anonymous);
        assert!(ok);
        assert_eq!(sink.delivered.borrow().len(), 1);
    }
}
