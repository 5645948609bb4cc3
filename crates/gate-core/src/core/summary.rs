// gate-core/src/core/summary.rs
// ============================================================================
// Module: Omar Gate Run Summary
// Description: The evidence-bundle header written alongside FINDINGS.jsonl.
// Purpose: Carry every piece of state the gate evaluator, the publisher, and
//          a human reviewer need without re-reading the findings file.
// Dependencies: crate::core::{identifiers, severity}, serde
// ============================================================================

//! ## Overview
//! `Summary` is written once, atomically, by `gate_core::evidence::EvidenceWriter`
//! as `PACK_SUMMARY.json`. Its `writer_complete` field is the fail-closed
//! signal the gate evaluator checks before trusting anything else in the
//! file — see `gate_core::core::gate`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RunId;
use crate::core::severity::Severity;

// ============================================================================
// SECTION: Severity Counts
// ============================================================================

/// Per-severity finding counts after merge and guardrails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    /// Count of `P0` findings.
    pub p0: u32,
    /// Count of `P1` findings.
    pub p1: u32,
    /// Count of `P2` findings.
    pub p2: u32,
    /// Count of `P3` findings.
    pub p3: u32,
}

impl SeverityCounts {
    /// Increments the counter for `severity` by one.
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::P0 => self.p0 += 1,
            Severity::P1 => self.p1 += 1,
            Severity::P2 => self.p2 += 1,
            Severity::P3 => self.p3 += 1,
        }
    }

    /// Total findings across all severities.
    #[must_use]
    pub const fn total(self) -> u32 {
        self.p0 + self.p1 + self.p2 + self.p3
    }

    /// Counts at or above `severity` (more severe or equal).
    #[must_use]
    pub const fn at_or_above(self, severity: Severity) -> u32 {
        match severity {
            Severity::P0 => self.p0,
            Severity::P1 => self.p0 + self.p1,
            Severity::P2 => self.p0 + self.p1 + self.p2,
            Severity::P3 => self.p0 + self.p1 + self.p2 + self.p3,
        }
    }
}

// ============================================================================
// SECTION: Stage Name
// ============================================================================

/// Named pipeline stage, used as a key for durations and completion tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    /// Config/context construction.
    Config,
    /// Preflight admission control.
    Preflight,
    /// Worktree ingest.
    Ingest,
    /// Sandboxed harness tools.
    Harness,
    /// Deterministic scanners.
    Scanners,
    /// LLM analyzer.
    Llm,
    /// Merge and guardrails.
    Merge,
    /// Evidence writer.
    Evidence,
    /// Gate evaluation.
    Gate,
    /// Publisher and telemetry.
    Publish,
}

// ============================================================================
// SECTION: Recorded Error
// ============================================================================

/// One non-fatal error or warning captured during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedError {
    /// Stage that recorded this error.
    pub stage: StageName,
    /// Human-readable error message.
    pub message: String,
    /// True if this entry is advisory only (did not change `GateResult`).
    pub is_warning: bool,
}

impl RecordedError {
    /// Creates a blocking-context error entry (still non-fatal to the run;
    /// only the evidence writer's own failure changes `GateResult` directly).
    #[must_use]
    pub fn error(stage: StageName, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            is_warning: false,
        }
    }

    /// Creates an advisory warning entry.
    #[must_use]
    pub fn warning(stage: StageName, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            is_warning: true,
        }
    }
}

// ============================================================================
// SECTION: Summary
// ============================================================================

/// Schema version for [`Summary`]'s on-disk JSON representation.
pub const SUMMARY_SCHEMA_VERSION: u32 = 1;

/// The evidence-bundle header written as `PACK_SUMMARY.json`.
///
/// # Invariants
/// - No constructor in this module can produce `writer_complete == true`;
///   only `gate_core::evidence::EvidenceWriter::write` sets it, after the
///   findings file has been written, fsynced, renamed, and hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Schema version, for forward-compatible parsing.
    pub schema_version: u32,
    /// This run's identifier.
    pub run_id: RunId,
    /// Idempotency key for this `(repo, pr, head_sha, scan_mode, policy)` tuple.
    pub dedupe_key: String,
    /// RFC 3339 UTC timestamp at summary-write time.
    pub timestamp_utc: String,
    /// Fail-closed completion flag; `false` until the writer's final step.
    pub writer_complete: bool,
    /// Per-severity finding counts.
    pub counts: SeverityCounts,
    /// Relative path to the findings file (`"FINDINGS.jsonl"`).
    pub findings_file: String,
    /// SHA-256 hex digest of the findings file's on-disk bytes.
    pub findings_file_sha256: String,
    /// Policy pack identifier in effect for this run.
    pub policy_pack: String,
    /// Policy pack version in effect for this run.
    pub policy_pack_version: String,
    /// Stages that completed successfully, in completion order.
    pub stages_completed: Vec<StageName>,
    /// Total run duration, in milliseconds.
    pub duration_ms: u64,
    /// Per-stage duration, in milliseconds.
    pub stage_durations: BTreeMap<StageName, u64>,
    /// Non-fatal errors and warnings recorded during the run.
    pub errors: Vec<RecordedError>,
    /// Tool name to version string, for every scanner/harness tool invoked.
    pub tool_versions: BTreeMap<String, String>,
}

impl Summary {
    /// Builds a not-yet-complete summary. `writer_complete` starts `false`
    /// and `findings_file_sha256` starts empty; only
    /// [`crate::evidence::EvidenceWriter::write`] may finalize both.
    #[must_use]
    #[allow(clippy::too_many_arguments, reason = "mirrors the flat Summary record")]
    pub fn incomplete(
        run_id: RunId,
        dedupe_key: impl Into<String>,
        timestamp_utc: impl Into<String>,
        policy_pack: impl Into<String>,
        policy_pack_version: impl Into<String>,
    ) -> Self {
        Self {
            schema_version: SUMMARY_SCHEMA_VERSION,
            run_id,
            dedupe_key: dedupe_key.into(),
            timestamp_utc: timestamp_utc.into(),
            writer_complete: false,
            counts: SeverityCounts::default(),
            findings_file: "FINDINGS.jsonl".to_string(),
            findings_file_sha256: String::new(),
            policy_pack: policy_pack.into(),
            policy_pack_version: policy_pack_version.into(),
            stages_completed: Vec::new(),
            duration_ms: 0,
            stage_durations: BTreeMap::new(),
            errors: Vec::new(),
            tool_versions: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Severity;
    use super::SeverityCounts;
    use super::Summary;
    use crate::core::identifiers::RunId;

    #[test]
    fn incomplete_summary_never_claims_writer_complete() {
        let summary = Summary::incomplete(RunId::new("r-1"), "dedupe", "2026-01-01T00:00:00Z", "default", "1");
        assert!(!summary.writer_complete);
        assert!(summary.findings_file_sha256.is_empty());
    }

    #[test]
    fn severity_counts_at_or_above_accumulates() {
        let mut counts = SeverityCounts::default();
        counts.record(Severity::P0);
        counts.record(Severity::P1);
        counts.record(Severity::P1);
        counts.record(Severity::P3);
        assert_eq!(counts.at_or_above(Severity::P1), 3);
        assert_eq!(counts.at_or_above(Severity::P0), 1);
        assert_eq!(counts.total(), 4);
    }
}
