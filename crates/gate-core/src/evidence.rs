// gate-core/src/evidence.rs
// ============================================================================
// Module: Omar Gate Evidence Writer
// Description: Atomic, fail-closed writer for FINDINGS.jsonl, PACK_SUMMARY.json,
//              and the best-effort human/ingest reports.
// Purpose: Guarantee that a partial PACK_SUMMARY.json can never exist on
//          disk — the gate evaluator's entire trust model rests on this.
// Dependencies: crate::core::{finding, hashing, ingest, summary}, serde_json, std::fs
// ============================================================================

//! ## Overview
//! [`EvidenceWriter::write`] performs, in strict order: findings file write
//! + fsync + rename, hash of the renamed file's on-disk bytes, then the
//! summary write (also fsync + rename) with `writer_complete = true`. If
//! either of the first two steps fails the function returns `Err` before
//! ever touching `PACK_SUMMARY.json`, so that file is either absent or
//! complete — never half-written, never `writer_complete = false` on disk.
//! Human reports and the ingest snapshot are written best-effort afterward;
//! their failures are recorded as warnings and never change the outcome.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::finding::Finding;
use crate::core::hashing::canonical_json_bytes;
use crate::core::hashing::hash_bytes;
use crate::core::hashing::HashAlgorithm;
use crate::core::ingest::Ingest;
use crate::core::summary::RecordedError;
use crate::core::summary::SeverityCounts;
use crate::core::summary::StageName;
use crate::core::summary::Summary;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Findings filename, relative to the run directory.
pub const FINDINGS_FILE_NAME: &str = "FINDINGS.jsonl";
/// Summary filename, relative to the run directory.
pub const SUMMARY_FILE_NAME: &str = "PACK_SUMMARY.json";
/// Human-readable audit report filename.
pub const AUDIT_REPORT_FILE_NAME: &str = "AUDIT_REPORT.md";
/// Human-readable reviewer brief filename.
pub const REVIEW_BRIEF_FILE_NAME: &str = "REVIEW_BRIEF.md";
/// Full ingest snapshot filename.
pub const INGEST_FILE_NAME: &str = "CODEBASE_INGEST.json";
/// Human-readable ingest summary filename.
pub const INGEST_SUMMARY_FILE_NAME: &str = "CODEBASE_INGEST_SUMMARY.md";
/// Artifact manifest filename.
pub const MANIFEST_FILE_NAME: &str = "ARTIFACT_MANIFEST.json";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal evidence-writer failures. Any `EvidenceError` always yields a
/// blocking `GateResult` — there is no configuration flag that relaxes
/// this.
#[derive(Debug, Error)]
pub enum EvidenceError {
    /// Findings file write, fsync, or rename failed.
    #[error("failed to write findings file: {0}")]
    FindingsWrite(String),
    /// Summary write, fsync, or rename failed.
    #[error("failed to write summary file: {0}")]
    SummaryWrite(String),
    /// A finding failed to serialize as canonical JSON.
    #[error("failed to serialize finding {0}: {1}")]
    FindingSerialize(String, String),
}

// ============================================================================
// SECTION: Write Outcome
// ============================================================================

/// Result of a successful [`EvidenceWriter::write`] call: the finalized,
/// `writer_complete = true` summary plus any non-fatal warnings recorded
/// while writing the best-effort reports.
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    /// The finalized summary, as written to `PACK_SUMMARY.json`.
    pub summary: Summary,
    /// Warnings recorded while writing best-effort reports (never affects
    /// `summary.writer_complete`).
    pub report_warnings: Vec<RecordedError>,
}

// ============================================================================
// SECTION: Evidence Writer
// ============================================================================

/// Writes one run's evidence bundle to `run_dir`.
pub struct EvidenceWriter;

impl EvidenceWriter {
    /// Writes `findings`, then `summary` (finalized with counts, hash, and
    /// `writer_complete = true`), then best-effort reports, to `run_dir`.
    ///
    /// `summary` should be a [`Summary::incomplete`] value; this function
    /// overwrites its `counts`, `findings_file_sha256`, and
    /// `writer_complete` fields — callers cannot pre-set `writer_complete`
    /// to `true` and have it stick, since this is the only code path that
    /// sets it.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceError`] if the findings file or the summary file
    /// cannot be written, fsynced, or renamed. When this happens,
    /// `PACK_SUMMARY.json` is guaranteed absent from `run_dir` (step 1/2
    /// failures return before step 3 ever runs).
    pub fn write(
        run_dir: &Path,
        findings: &[Finding],
        mut summary: Summary,
        ingest: Option<&Ingest>,
    ) -> Result<WriteOutcome, EvidenceError> {
        let findings_path = run_dir.join(FINDINGS_FILE_NAME);
        let findings_hash = write_findings_atomically(&findings_path, findings)?;

        let mut counts = SeverityCounts::default();
        for finding in findings {
            counts.record(finding.severity);
        }

        summary.counts = counts;
        summary.findings_file = FINDINGS_FILE_NAME.to_string();
        summary.findings_file_sha256 = findings_hash.value;
        summary.writer_complete = true;
        if !summary.stages_completed.contains(&StageName::Evidence) {
            summary.stages_completed.push(StageName::Evidence);
        }

        let summary_path = run_dir.join(SUMMARY_FILE_NAME);
        write_summary_atomically(&summary_path, &summary)?;

        let mut report_warnings = Vec::new();
        let mut manifest = Vec::new();
        manifest.push((FINDINGS_FILE_NAME.to_string(), summary.findings_file_sha256.clone()));
        if let Ok(bytes) = fs::read(&summary_path) {
            manifest.push((SUMMARY_FILE_NAME.to_string(), hash_bytes(HashAlgorithm::Sha256, &bytes).value));
        }

        write_best_effort(
            run_dir,
            AUDIT_REPORT_FILE_NAME,
            render_audit_report(&summary, findings).as_bytes(),
            &mut manifest,
            &mut report_warnings,
        );
        write_best_effort(
            run_dir,
            REVIEW_BRIEF_FILE_NAME,
            render_review_brief(&summary, findings).as_bytes(),
            &mut manifest,
            &mut report_warnings,
        );

        if let Some(ingest) = ingest {
            if let Ok(bytes) = serde_json::to_vec_pretty(ingest) {
                write_best_effort(run_dir, INGEST_FILE_NAME, &bytes, &mut manifest, &mut report_warnings);
            } else {
                report_warnings.push(RecordedError::warning(
                    StageName::Evidence,
                    "failed to serialize ingest snapshot",
                ));
            }
            write_best_effort(
                run_dir,
                INGEST_SUMMARY_FILE_NAME,
                render_ingest_summary(ingest).as_bytes(),
                &mut manifest,
                &mut report_warnings,
            );
        }

        if let Ok(bytes) = serde_json::to_vec_pretty(&manifest) {
            let manifest_path = run_dir.join(MANIFEST_FILE_NAME);
            if fs::write(&manifest_path, bytes).is_err() {
                report_warnings
                    .push(RecordedError::warning(StageName::Evidence, "failed to write artifact manifest"));
            }
        }

        Ok(WriteOutcome {
            summary,
            report_warnings,
        })
    }
}

// ============================================================================
// SECTION: Atomic Write Helpers
// ============================================================================

/// Writes each finding as one canonical-JSON line to a temp file in
/// `run_dir`, fsyncs, renames to `path`, then hashes the renamed file's
/// on-disk bytes (read back, not the in-memory buffer).
fn write_findings_atomically(
    path: &Path,
    findings: &[Finding],
) -> Result<crate::core::hashing::HashDigest, EvidenceError> {
    let tmp_path = sibling_tmp_path(path);
    {
        let mut file =
            File::create(&tmp_path).map_err(|err| EvidenceError::FindingsWrite(err.to_string()))?;
        for finding in findings {
            let bytes = canonical_json_bytes(finding).map_err(|err| {
                EvidenceError::FindingSerialize(finding.id.to_string(), err.to_string())
            })?;
            file.write_all(&bytes).map_err(|err| EvidenceError::FindingsWrite(err.to_string()))?;
            file.write_all(b"\n").map_err(|err| EvidenceError::FindingsWrite(err.to_string()))?;
        }
        file.sync_all().map_err(|err| EvidenceError::FindingsWrite(err.to_string()))?;
    }
    fs::rename(&tmp_path, path).map_err(|err| EvidenceError::FindingsWrite(err.to_string()))?;
    let bytes = fs::read(path).map_err(|err| EvidenceError::FindingsWrite(err.to_string()))?;
    Ok(hash_bytes(HashAlgorithm::Sha256, &bytes))
}

/// Writes `summary` to a temp file, fsyncs, and renames to `path`.
fn write_summary_atomically(path: &Path, summary: &Summary) -> Result<(), EvidenceError> {
    let tmp_path = sibling_tmp_path(path);
    {
        let mut file =
            File::create(&tmp_path).map_err(|err| EvidenceError::SummaryWrite(err.to_string()))?;
        let bytes = serde_json::to_vec_pretty(summary)
            .map_err(|err| EvidenceError::SummaryWrite(err.to_string()))?;
        file.write_all(&bytes).map_err(|err| EvidenceError::SummaryWrite(err.to_string()))?;
        file.sync_all().map_err(|err| EvidenceError::SummaryWrite(err.to_string()))?;
    }
    fs::rename(&tmp_path, path).map_err(|err| EvidenceError::SummaryWrite(err.to_string()))
}

/// Returns a `.tmp-`-prefixed sibling path for the atomic write discipline.
fn sibling_tmp_path(path: &Path) -> PathBuf {
    let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or("artifact");
    path.with_file_name(format!(".tmp-{file_name}"))
}

/// Writes `contents` to `run_dir/name`, recording the SHA-256 into
/// `manifest` on success or a warning into `warnings` on failure. Never
/// returns an error — this path is always best-effort.
fn write_best_effort(
    run_dir: &Path,
    name: &str,
    contents: &[u8],
    manifest: &mut Vec<(String, String)>,
    warnings: &mut Vec<RecordedError>,
) {
    let path = run_dir.join(name);
    match fs::write(&path, contents) {
        Ok(()) => manifest.push((name.to_string(), hash_bytes(HashAlgorithm::Sha256, contents).value)),
        Err(err) => {
            warnings.push(RecordedError::warning(StageName::Evidence, format!("failed to write {name}: {err}")));
        }
    }
}

// ============================================================================
// SECTION: Report Rendering
// ============================================================================

/// Renders `AUDIT_REPORT.md`: a full severity breakdown and every finding.
fn render_audit_report(summary: &Summary, findings: &[Finding]) -> String {
    let mut out = String::new();
    out.push_str("# Omar Gate Audit Report\n\n");
    out.push_str(&format!("Run: `{}`\n\n", summary.run_id));
    out.push_str(&format!(
        "P0: {} · P1: {} · P2: {} · P3: {}\n\n",
        summary.counts.p0, summary.counts.p1, summary.counts.p2, summary.counts.p3
    ));
    for finding in findings {
        out.push_str(&format!(
            "## [{}] {} — {}:{}-{}\n\n{}\n\n*Recommendation:* {}\n\n",
            finding.severity,
            finding.category.as_str(),
            finding.file_path,
            finding.line_start,
            finding.line_end,
            finding.message,
            finding.recommendation
        ));
    }
    out
}

/// Renders `REVIEW_BRIEF.md`: the top findings only, for a quick human read.
fn render_review_brief(summary: &Summary, findings: &[Finding]) -> String {
    const TOP_N: usize = 10;
    let mut sorted: Vec<&Finding> = findings.iter().collect();
    sorted.sort_by(|a, b| a.severity.cmp(&b.severity).then_with(|| a.fingerprint.cmp(&b.fingerprint)));

    let mut out = String::new();
    out.push_str("# Omar Gate Review Brief\n\n");
    out.push_str(&format!(
        "{} total findings (P0 {}, P1 {}, P2 {}, P3 {}).\n\n",
        summary.counts.total(),
        summary.counts.p0,
        summary.counts.p1,
        summary.counts.p2,
        summary.counts.p3
    ));
    for finding in sorted.into_iter().take(TOP_N) {
        out.push_str(&format!(
            "- **[{}]** {}:{} — {}\n",
            finding.severity, finding.file_path, finding.line_start, finding.message
        ));
    }
    out
}

/// Renders `CODEBASE_INGEST_SUMMARY.md`: a human-readable ingest digest.
fn render_ingest_summary(ingest: &Ingest) -> String {
    let mut out = String::new();
    out.push_str("# Codebase Ingest Summary\n\n");
    out.push_str(&format!(
        "{} total files, {} text, {} in scope, {} lines.\n\n",
        ingest.stats.total_files, ingest.stats.text_files, ingest.stats.in_scope_files, ingest.stats.total_lines
    ));
    if !ingest.tech_stack.is_empty() {
        out.push_str("## Tech Stack\n\n");
        for entry in &ingest.tech_stack {
            out.push_str(&format!("- {} ({})\n", entry.name, entry.evidence_path));
        }
        out.push('\n');
    }
    if !ingest.hotspots.is_empty() {
        out.push_str("## Hotspots\n\n");
        for (category, paths) in &ingest.hotspots {
            out.push_str(&format!("- {category:?}: {} file(s)\n", paths.len()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::EvidenceWriter;
    use super::FINDINGS_FILE_NAME;
    use super::SUMMARY_FILE_NAME;
    use crate::core::finding::Confidence;
    use crate::core::finding::Finding;
    use crate::core::hashing::hash_bytes;
    use crate::core::hashing::HashAlgorithm;
    use crate::core::identifiers::Category;
    use crate::core::identifiers::FindingId;
    use crate::core::identifiers::RepoPath;
    use crate::core::identifiers::RunId;
    use crate::core::severity::FindingSource;
    use crate::core::severity::Severity;
    use crate::core::summary::Summary;

    fn sample_finding() -> Finding {
        Finding::new(
            FindingId::new("f-1"),
            Severity::P0,
            Category::new("secrets"),
            FindingSource::Deterministic,
            RepoPath::new("config/prod.env"),
            1,
            1,
            "AWS_ACCESS_KEY_ID=AKIA...",
            "committed credential",
            "rotate and remove from history",
            Confidence::default(),
        )
        .expect("valid range")
    }

    #[test]
    fn write_produces_matching_hash_and_complete_summary() {
        let dir = tempfile::tempdir().expect("tempdir");
        let findings = vec![sample_finding()];
        let summary = Summary::incomplete(RunId::new("r-1"), "dedupe", "2026-01-01T00:00:00Z", "default", "1");

        let outcome = EvidenceWriter::write(dir.path(), &findings, summary, None).expect("write succeeds");
        assert!(outcome.summary.writer_complete);
        assert_eq!(outcome.summary.counts.p0, 1);

        let findings_bytes = std::fs::read(dir.path().join(FINDINGS_FILE_NAME)).expect("findings file exists");
        let recomputed = hash_bytes(HashAlgorithm::Sha256, &findings_bytes);
        assert_eq!(recomputed.value, outcome.summary.findings_file_sha256);

        let summary_bytes = std::fs::read(dir.path().join(SUMMARY_FILE_NAME)).expect("summary file exists");
        let reparsed: Summary = serde_json::from_slice(&summary_bytes).expect("summary parses");
        assert!(reparsed.writer_complete);
        assert_eq!(reparsed.findings_file_sha256, outcome.summary.findings_file_sha256);
    }

    #[test]
    fn write_with_empty_findings_still_completes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let summary = Summary::incomplete(RunId::new("r-2"), "dedupe", "2026-01-01T00:00:00Z", "default", "1");
        let outcome = EvidenceWriter::write(dir.path(), &[], summary, None).expect("write succeeds");
        assert!(outcome.summary.writer_complete);
        assert_eq!(outcome.summary.counts.total(), 0);
    }
}
