// gate-core/src/gate.rs
// ============================================================================
// Module: Omar Gate Evaluator
// Description: Fail-closed evidence-integrity check plus severity-threshold
//              evaluation, producing the run's GateResult.
// Purpose: Keep gate evaluation a pure function of what is actually on disk
//          in the run directory — no network, no config beyond the
//          configured SeverityGate.
// Dependencies: crate::core::{gate_result, severity, summary}, ret-logic, sha2
// ============================================================================

//! ## Overview
//! [`GateEvaluator::evaluate`] never trusts an in-memory [`Summary`] value on
//! its own. It re-reads `PACK_SUMMARY.json` and `FINDINGS.jsonl` from
//! `run_dir` and checks four fail-closed integrity conditions — modeled as
//! `ret_logic::Requirement::Predicate` leaves combined with `Requirement::Or`
//! — before ever consulting severity counts. This mirrors the tri-state
//! requirement algebra used elsewhere in this workspace, adapted from
//! scenario conditions to evidence-integrity conditions: same "bridge a
//! requirement tree with a snapshot reader" shape, a different snapshot.
//!
//! No config flag relaxes these four conditions; they fire regardless of
//! `SeverityGate` or any other setting.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::path::Path;

use ret_logic::KleeneLogic;
use ret_logic::Requirement;
use ret_logic::RequirementTrace;
use ret_logic::TriState;
use ret_logic::TriStatePredicateEval;

use crate::core::gate_result::GateResult;
use crate::core::hashing::hash_bytes;
use crate::core::hashing::HashAlgorithm;
use crate::core::severity::SeverityGate;
use crate::core::summary::Summary;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors returned when the evaluator itself cannot run (distinct from the
/// integrity conditions it is checking for, which surface as
/// [`crate::core::gate_result::GateStatus::Error`] rather than `Err`).
#[derive(Debug, Clone, thiserror::Error)]
pub enum GateEvaluatorError {
    /// `run_dir` does not exist or is not a directory.
    #[error("run directory {0} does not exist")]
    RunDirMissing(String),
}

// ============================================================================
// SECTION: Integrity Conditions
// ============================================================================

/// One of the four fail-closed evidence-integrity leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum IntegrityCondition {
    /// `PACK_SUMMARY.json` is absent or fails to parse.
    MissingOrMalformedSummary,
    /// The summary parsed but `writer_complete` is not `true`.
    WriterIncomplete,
    /// The summary's `findings_file` is absent from `run_dir`.
    FindingsFileMissing,
    /// The findings file's on-disk SHA-256 does not match the summary.
    HashMismatch,
}

impl IntegrityCondition {
    /// All four conditions, in the fixed evaluation order used for tracing.
    const ALL: [Self; 4] = [
        Self::MissingOrMalformedSummary,
        Self::WriterIncomplete,
        Self::FindingsFileMissing,
        Self::HashMismatch,
    ];

    /// Human-readable name used in `GateResult.reason`.
    const fn label(self) -> &'static str {
        match self {
            Self::MissingOrMalformedSummary => "summary missing or malformed",
            Self::WriterIncomplete => "writer did not complete",
            Self::FindingsFileMissing => "findings file missing",
            Self::HashMismatch => "findings file hash mismatch",
        }
    }
}

// ============================================================================
// SECTION: Evidence Snapshot Reader
// ============================================================================

/// A one-shot read of `run_dir`'s evidence bundle, loaded once and consulted
/// by every [`IntegrityCondition`] leaf.
struct EvidenceSnapshot {
    /// Parsed summary, or `None` if the file is absent/unreadable/malformed.
    summary: Option<Summary>,
    /// SHA-256 of the findings file's on-disk bytes, or `None` if the file
    /// named by `summary.findings_file` could not be read.
    findings_file_hash: Option<String>,
}

impl EvidenceSnapshot {
    /// Reads `PACK_SUMMARY.json` and the findings file it names from
    /// `run_dir`. I/O failures collapse to `None` fields rather than
    /// propagating — a missing or unreadable file is exactly what the
    /// integrity conditions exist to detect.
    fn load(run_dir: &Path) -> Self {
        let summary = fs::read(run_dir.join(crate::evidence::SUMMARY_FILE_NAME))
            .ok()
            .and_then(|bytes| serde_json::from_slice::<Summary>(&bytes).ok());

        let findings_file_hash = summary.as_ref().and_then(|summary| {
            fs::read(run_dir.join(&summary.findings_file))
                .ok()
                .map(|bytes| hash_bytes(HashAlgorithm::Sha256, &bytes).value)
        });

        Self {
            summary,
            findings_file_hash,
        }
    }
}

impl TriStatePredicateEval for IntegrityCondition {
    type Reader<'a> = EvidenceSnapshot;

    fn eval_row_tristate(&self, reader: &Self::Reader<'_>, _row: ret_logic::Row) -> TriState {
        match self {
            Self::MissingOrMalformedSummary => reader.summary.is_none().into(),
            Self::WriterIncomplete => match &reader.summary {
                None => TriState::Unknown,
                Some(summary) => (!summary.writer_complete).into(),
            },
            Self::FindingsFileMissing => match &reader.summary {
                None => TriState::Unknown,
                Some(_) => reader.findings_file_hash.is_none().into(),
            },
            Self::HashMismatch => match (&reader.summary, &reader.findings_file_hash) {
                (Some(summary), Some(actual_hash)) => (actual_hash != &summary.findings_file_sha256).into(),
                _ => TriState::Unknown,
            },
        }
    }
}

// ============================================================================
// SECTION: Trace Collector
// ============================================================================

/// Records which integrity conditions evaluated to `True` or `Unknown`, in
/// evaluation order, for [`GateResult.reason`].
#[derive(Default)]
struct IntegrityTrace {
    /// Non-`False` leaves, in the order `eval_tristate_with_trace` visited them.
    fired: Vec<(IntegrityCondition, TriState)>,
}

impl RequirementTrace<IntegrityCondition> for IntegrityTrace {
    fn on_predicate_evaluated(&mut self, predicate: &IntegrityCondition, result: TriState) {
        if !matches!(result, TriState::False) {
            self.fired.push((*predicate, result));
        }
    }
}

impl fmt::Display for IntegrityTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fired
            .iter()
            .map(|(condition, state)| format!("{} ({state:?})", condition.label()))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

// ============================================================================
// SECTION: Gate Evaluator
// ============================================================================

/// Evaluates one run's evidence bundle against its configured severity gate.
///
/// Holds no state beyond the logic table, so one evaluator instance can be
/// reused across runs within a process.
pub struct GateEvaluator {
    /// Tri-state logic table. Always [`ret_logic::LogicMode::Kleene`] in
    /// practice; kept generic so tests can substitute other tables.
    logic: KleeneLogic,
}

impl Default for GateEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl GateEvaluator {
    /// Creates an evaluator using strong Kleene tri-state logic.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            logic: KleeneLogic,
        }
    }

    /// Evaluates `run_dir`'s evidence bundle against `severity_gate`.
    ///
    /// Reads `PACK_SUMMARY.json` and its findings file directly from disk;
    /// does not trust any `Summary` the caller may already hold in memory.
    ///
    /// # Errors
    ///
    /// Returns [`GateEvaluatorError::RunDirMissing`] if `run_dir` is not a
    /// directory. This is distinct from an evidence-integrity failure, which
    /// is reported as `Ok(GateResult { status: GateStatus::Error, .. })`.
    pub fn evaluate(
        &self,
        run_dir: &Path,
        severity_gate: SeverityGate,
        dedupe_key: &str,
    ) -> Result<GateResult, GateEvaluatorError> {
        if !run_dir.is_dir() {
            return Err(GateEvaluatorError::RunDirMissing(run_dir.display().to_string()));
        }

        let snapshot = EvidenceSnapshot::load(run_dir);
        let requirement = integrity_requirement();
        let mut trace = IntegrityTrace::default();
        let integrity_result =
            requirement.eval_tristate_with_trace(&snapshot, 0, &self.logic, &mut trace);

        if !matches!(integrity_result, TriState::False) {
            return Ok(GateResult::error(dedupe_key, format!("evidence integrity check failed: {trace}")));
        }

        let Some(summary) = snapshot.summary else {
            return Ok(GateResult::error(dedupe_key, "evidence integrity check failed: summary unreadable"));
        };

        let blocked = match severity_gate {
            SeverityGate::P0 => summary.counts.p0 > 0,
            SeverityGate::P1 => summary.counts.at_or_above(crate::core::severity::Severity::P1) > 0,
            SeverityGate::P2 => summary.counts.at_or_above(crate::core::severity::Severity::P2) > 0,
            SeverityGate::None => false,
        };

        if blocked {
            Ok(GateResult::blocked(
                summary.counts,
                dedupe_key,
                format!("severity gate {severity_gate:?} crossed: {:?}", summary.counts),
            ))
        } else {
            Ok(GateResult::passed(summary.counts, dedupe_key))
        }
    }
}

/// Builds the fixed four-leaf `Or` requirement tree evaluated by
/// [`GateEvaluator::evaluate`].
fn integrity_requirement() -> Requirement<IntegrityCondition> {
    Requirement::or(IntegrityCondition::ALL.into_iter().map(Requirement::predicate).collect())
}

#[cfg(test)]
mod tests {
    use super::GateEvaluator;
    use crate::core::finding::Confidence;
    use crate::core::finding::Finding;
    use crate::core::gate_result::GateStatus;
    use crate::core::identifiers::Category;
    use crate::core::identifiers::FindingId;
    use crate::core::identifiers::RepoPath;
    use crate::core::identifiers::RunId;
    use crate::core::severity::FindingSource;
    use crate::core::severity::Severity;
    use crate::core::severity::SeverityGate;
    use crate::core::summary::Summary;
    use crate::evidence::EvidenceWriter;

    fn finding(severity: Severity) -> Finding {
        Finding::new(
            FindingId::new("f-1"),
            severity,
            Category::new("secrets"),
            FindingSource::Deterministic,
            RepoPath::new("a.rs"),
            1,
            1,
            "snippet",
            "message",
            "fix",
            Confidence::default(),
        )
        .expect("valid range")
    }

    #[test]
    fn errors_when_run_dir_missing() {
        let evaluator = GateEvaluator::new();
        let result = evaluator.evaluate(std::path::Path::new("/nonexistent/path/xyz"), SeverityGate::P0, "d");
        assert!(result.is_err());
    }

    #[test]
    fn blocks_when_writer_never_ran() {
        let dir = tempfile::tempdir().expect("tempdir");
        let evaluator = GateEvaluator::new();
        let result = evaluator.evaluate(dir.path(), SeverityGate::P0, "d").expect("evaluates");
        assert_eq!(result.status, GateStatus::Error);
    }

    #[test]
    fn blocks_on_tampered_findings_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let summary = Summary::incomplete(RunId::new("r-1"), "d", "2026-01-01T00:00:00Z", "default", "1");
        EvidenceWriter::write(dir.path(), &[finding(Severity::P2)], summary, None).expect("write succeeds");

        std::fs::write(dir.path().join("FINDINGS.jsonl"), b"tampered\n").expect("overwrite findings");

        let evaluator = GateEvaluator::new();
        let result = evaluator.evaluate(dir.path(), SeverityGate::P0, "d").expect("evaluates");
        assert_eq!(result.status, GateStatus::Error);
        assert!(result.reason.contains("hash mismatch"));
    }

    #[test]
    fn passes_clean_run_under_p0_gate_with_only_p2_findings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let summary = Summary::incomplete(RunId::new("r-2"), "d", "2026-01-01T00:00:00Z", "default", "1");
        EvidenceWriter::write(dir.path(), &[finding(Severity::P2)], summary, None).expect("write succeeds");

        let evaluator = GateEvaluator::new();
        let result = evaluator.evaluate(dir.path(), SeverityGate::P0, "d").expect("evaluates");
        assert_eq!(result.status, GateStatus::Passed);
    }

    #[test]
    fn blocks_clean_run_when_p2_finding_crosses_p2_gate() {
        let dir = tempfile::tempdir().expect("tempdir");
        let summary = Summary::incomplete(RunId::new("r-3"), "d", "2026-01-01T00:00:00Z", "default", "1");
        EvidenceWriter::write(dir.path(), &[finding(Severity::P2)], summary, None).expect("write succeeds");

        let evaluator = GateEvaluator::new();
        let result = evaluator.evaluate(dir.path(), SeverityGate::P2, "d").expect("evaluates");
        assert_eq!(result.status, GateStatus::Blocked);
    }

    #[test]
    fn none_gate_never_blocks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let summary = Summary::incomplete(RunId::new("r-4"), "d", "2026-01-01T00:00:00Z", "default", "1");
        EvidenceWriter::write(dir.path(), &[finding(Severity::P0)], summary, None).expect("write succeeds");

        let evaluator = GateEvaluator::new();
        let result = evaluator.evaluate(dir.path(), SeverityGate::None, "d").expect("evaluates");
        assert_eq!(result.status, GateStatus::Passed);
    }
}
