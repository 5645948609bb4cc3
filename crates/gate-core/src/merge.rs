// gate-core/src/merge.rs
// ============================================================================
// Module: Omar Gate Merge & Guardrails
// Description: De-duplicates findings by fingerprint and applies the LLM
//              corroboration and pr-diff demotion guardrails.
// Purpose: Give the orchestrator one pure function that turns three finding
//          vectors (deterministic, harness, llm) into the final merged set
//          written by the evidence writer.
// Dependencies: crate::core::{finding, hashing, identifiers, ingest, severity}
// ============================================================================

//! ## Overview
//! `merge_findings` stays a plain, linear function — the evidence-integrity
//! requirement tree in `gate_core::gate` is the only place this workspace
//! reaches for `ret-logic`'s tri-state machinery. Merge itself is simple
//! enough to stay inspectable without it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::finding::Finding;
use crate::core::hashing::hash_canonical_json;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::identifiers::RepoPath;
use crate::core::ingest::Ingest;
use crate::core::severity::FindingSource;
use crate::core::severity::ScanMode;
use crate::core::severity::Severity;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of hex characters kept from the full SHA-256 digest when forming
/// a finding's fingerprint.
pub const FINGERPRINT_HEX_LEN: usize = 32;

/// Line-range window (in either direction) a deterministic/harness finding
/// must fall within to corroborate a `P0`/`P1` LLM finding.
const CORROBORATION_WINDOW: u32 = 5;

// ============================================================================
// SECTION: Inputs
// ============================================================================

/// Inclusive 1-indexed line range, used for PR-diff added-line tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    /// First line of the range.
    pub start: u32,
    /// Last line of the range, inclusive.
    pub end: u32,
}

impl LineRange {
    /// Returns true if `self` overlaps `other`.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Everything `merge_findings` needs, gathered by the orchestrator after
/// the deterministic scanners, harness runner, and LLM analyzer have all
/// returned.
pub struct MergeInputs<'a> {
    /// Findings from the pattern/secrets/config/engineering-quality scanners.
    pub deterministic: Vec<Finding>,
    /// Findings from the sandboxed harness runner.
    pub harness: Vec<Finding>,
    /// Findings from the LLM analyzer (API or agentic CLI path).
    pub llm: Vec<Finding>,
    /// The ingest snapshot findings were produced against.
    pub ingest: &'a Ingest,
    /// The run's configured scan mode.
    pub scan_mode: ScanMode,
    /// Policy pack version, folded into the fingerprint hash.
    pub policy_version: &'a str,
    /// Per-tenant salt, folded into the fingerprint hash so fingerprints are
    /// not comparable across tenants.
    pub tenant_salt: &'a str,
    /// Added-line ranges per file from the PR diff, required only in
    /// [`ScanMode::PrDiff`]. `None` (or a file with no entry) means "no
    /// added lines for this file" — any finding touching it is demoted.
    pub added_lines: Option<&'a BTreeMap<RepoPath, Vec<LineRange>>>,
}

// ============================================================================
// SECTION: Fingerprint
// ============================================================================

/// Canonical tuple hashed to produce a finding's fingerprint.
#[derive(Serialize)]
struct FingerprintInputs<'a> {
    category: &'a str,
    severity: &'a str,
    file_path: &'a str,
    line_start: u32,
    snippet: String,
    policy_version: &'a str,
    tenant_salt: &'a str,
}

/// Computes the stable fingerprint for `finding`.
///
/// # Panics
///
/// Panics only if canonical JSON serialization of the input tuple fails,
/// which cannot happen for this plain-string/integer struct.
#[must_use]
pub fn fingerprint(finding: &Finding, policy_version: &str, tenant_salt: &str) -> String {
    let inputs = FingerprintInputs {
        category: finding.category.as_str(),
        severity: finding.severity.as_str(),
        file_path: finding.file_path.as_str(),
        line_start: finding.line_start,
        snippet: normalize_snippet(&finding.snippet),
        policy_version,
        tenant_salt,
    };
    let digest = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &inputs)
        .unwrap_or_else(|_| unreachable!("plain string/int tuple always canonicalizes"));
    digest.value.chars().take(FINGERPRINT_HEX_LEN).collect()
}

/// Normalizes a snippet for fingerprinting: strips leading line-number
/// tokens, collapses whitespace runs to a single space, strips `//…` and
/// `/*…*/` comment text, and lowercases. Whitespace/comment-only edits to a
/// snippet must not change its fingerprint (fingerprint stability).
#[must_use]
fn normalize_snippet(snippet: &str) -> String {
    let without_line_numbers = strip_leading_line_number(snippet);
    let without_comments = strip_comments(&without_line_numbers);
    let collapsed = without_comments.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

/// Strips a leading `"123: "`/`"123| "`/`"123 "`-style line-number token,
/// if present.
fn strip_leading_line_number(text: &str) -> String {
    let trimmed = text.trim_start();
    let digits_end = trimmed.find(|c: char| !c.is_ascii_digit()).unwrap_or(0);
    if digits_end == 0 {
        return text.to_string();
    }
    let rest = trimmed[digits_end..].trim_start_matches([':', '|', ' ', '\t']);
    rest.to_string()
}

/// Strips `//…` line comments and `/*…*/` block comments from `text`.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'/') {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
        } else if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'*') {
            i += 2;
            while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                i += 1;
            }
            i = (i + 2).min(bytes.len());
        } else {
            let ch_len = utf8_char_len(bytes[i]);
            let end = (i + ch_len).min(bytes.len());
            out.push_str(&text[i..end]);
            i = end;
        }
    }
    out
}

/// Returns the UTF-8 byte length of the character starting at `lead_byte`.
const fn utf8_char_len(lead_byte: u8) -> usize {
    if lead_byte & 0b1000_0000 == 0 {
        1
    } else if lead_byte & 0b1110_0000 == 0b1100_0000 {
        2
    } else if lead_byte & 0b1111_0000 == 0b1110_0000 {
        3
    } else {
        4
    }
}

// ============================================================================
// SECTION: Merge
// ============================================================================

/// Merges deterministic, harness, and LLM findings into the final set
/// written to `FINDINGS.jsonl`.
///
/// Order of operations (see module docs):
/// 1. Concatenate `deterministic ++ harness ++ llm`.
/// 2. Fingerprint every finding.
/// 3. Deduplicate by fingerprint, first occurrence wins.
/// 4. Apply LLM guardrails (scope, clamp, corroboration downgrade).
/// 5. In [`ScanMode::PrDiff`], demote findings outside added-line ranges.
#[must_use]
pub fn merge_findings(inputs: MergeInputs<'_>) -> Vec<Finding> {
    let MergeInputs {
        deterministic,
        harness,
        llm,
        ingest,
        scan_mode,
        policy_version,
        tenant_salt,
        added_lines,
    } = inputs;

    let mut ordered = Vec::with_capacity(deterministic.len() + harness.len() + llm.len());
    ordered.extend(deterministic);
    ordered.extend(harness);
    ordered.extend(llm);

    for finding in &mut ordered {
        finding.fingerprint = fingerprint(finding, policy_version, tenant_salt);
    }

    let mut seen = BTreeSet::new();
    let mut deduped = Vec::with_capacity(ordered.len());
    for finding in ordered {
        if seen.insert(finding.fingerprint.clone()) {
            deduped.push(finding);
        }
    }

    let authoritative: Vec<Finding> =
        deduped.iter().filter(|f| f.source.is_authoritative()).cloned().collect();

    let mut guarded = Vec::with_capacity(deduped.len());
    for finding in deduped {
        if finding.source != FindingSource::Llm {
            guarded.push(finding);
            continue;
        }
        if !ingest.contains(&finding.file_path) {
            continue;
        }
        let Some(line_count) = ingest.line_count(&finding.file_path) else {
            continue;
        };
        let Some(clamped) = finding.clamped_to(line_count) else {
            continue;
        };
        let finding = if matches!(clamped.severity, Severity::P0 | Severity::P1)
            && !has_corroboration(&clamped, &authoritative)
        {
            clamped.downgraded_to(Severity::P2)
        } else {
            clamped
        };
        guarded.push(finding);
    }

    if scan_mode == ScanMode::PrDiff {
        guarded = guarded
            .into_iter()
            .map(|finding| demote_unless_added(finding, added_lines))
            .collect();
    }

    guarded
}

/// Returns true if some authoritative finding in the same file and
/// category falls within [`CORROBORATION_WINDOW`] lines of `finding`.
fn has_corroboration(finding: &Finding, authoritative: &[Finding]) -> bool {
    authoritative.iter().any(|other| {
        other.file_path == finding.file_path
            && other.category == finding.category
            && finding.overlaps_within(other, CORROBORATION_WINDOW)
    })
}

/// Demotes `finding` to [`Severity::P3`] unless its line range overlaps a
/// recorded added-line range for its file. A file with no added-line entry
/// at all is treated as "touches only removed/unchanged lines" and is
/// always demoted.
fn demote_unless_added(
    finding: Finding,
    added_lines: Option<&BTreeMap<RepoPath, Vec<LineRange>>>,
) -> Finding {
    let range = LineRange {
        start: finding.line_start,
        end: finding.line_end,
    };
    let touches_added = added_lines
        .and_then(|map| map.get(&finding.file_path))
        .is_some_and(|ranges| ranges.iter().any(|added| added.overlaps(&range)));
    if touches_added {
        finding
    } else {
        finding.downgraded_to(Severity::P3)
    }
}

#[cfg(test)]
mod tests {
    use super::fingerprint;
    use super::merge_findings;
    use super::LineRange;
    use super::MergeInputs;
    use crate::core::finding::Confidence;
    use crate::core::finding::Finding;
    use crate::core::identifiers::Category;
    use crate::core::identifiers::FindingId;
    use crate::core::identifiers::RepoPath;
    use crate::core::ingest::FileCategory;
    use crate::core::ingest::Ingest;
    use crate::core::ingest::IngestFile;
    use crate::core::severity::FindingSource;
    use crate::core::severity::ScanMode;
    use crate::core::severity::Severity;
    use std::collections::BTreeMap;

    fn finding(
        id: &str,
        source: FindingSource,
        severity: Severity,
        file: &str,
        line: u32,
        snippet: &str,
    ) -> Finding {
        Finding::new(
            FindingId::new(id),
            severity,
            Category::new("secrets"),
            source,
            RepoPath::new(file),
            line,
            line,
            snippet,
            "message",
            "fix it",
            Confidence::default(),
        )
        .expect("valid range")
    }

    fn ingest_with(file: &str, lines: u32) -> Ingest {
        let mut ingest = Ingest::default();
        ingest.files.push(IngestFile {
            path: RepoPath::new(file),
            category: FileCategory::Source,
            language: Some("rust".to_string()),
            lines,
            bytes: u64::from(lines) * 10,
            is_hotspot: false,
            hotspot_reasons: Vec::new(),
        });
        ingest
    }

    #[test]
    fn fingerprint_is_stable_across_whitespace_and_comment_changes() {
        let a = finding("a", FindingSource::Deterministic, Severity::P1, "a.rs", 10, "let x = 1; // note");
        let b = finding("b", FindingSource::Deterministic, Severity::P1, "a.rs", 10, "let   x = 1;");
        assert_eq!(fingerprint(&a, "1", "salt"), fingerprint(&b, "1", "salt"));
    }

    #[test]
    fn fingerprint_changes_with_policy_version() {
        let a = finding("a", FindingSource::Deterministic, Severity::P1, "a.rs", 10, "x");
        assert_ne!(fingerprint(&a, "1", "salt"), fingerprint(&a, "2", "salt"));
    }

    #[test]
    fn dedup_prefers_deterministic_over_llm_on_tie() {
        let det = finding("d", FindingSource::Deterministic, Severity::P1, "a.rs", 10, "secret");
        let llm = finding("l", FindingSource::Llm, Severity::P1, "a.rs", 10, "secret");
        let ingest = ingest_with("a.rs", 20);
        let merged = merge_findings(MergeInputs {
            deterministic: vec![det],
            harness: vec![],
            llm: vec![llm],
            ingest: &ingest,
            scan_mode: ScanMode::Deep,
            policy_version: "1",
            tenant_salt: "salt",
            added_lines: None,
        });
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, FindingSource::Deterministic);
    }

    #[test]
    fn uncorroborated_llm_p0_downgrades_to_p2() {
        let llm = finding("l", FindingSource::Llm, Severity::P0, "auth.py", 42, "bypass check");
        let ingest = ingest_with("auth.py", 100);
        let merged = merge_findings(MergeInputs {
            deterministic: vec![],
            harness: vec![],
            llm: vec![llm],
            ingest: &ingest,
            scan_mode: ScanMode::Deep,
            policy_version: "1",
            tenant_salt: "salt",
            added_lines: None,
        });
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].severity, Severity::P2);
    }

    #[test]
    fn corroborated_llm_p0_stays_p0() {
        let det = finding("d", FindingSource::Deterministic, Severity::P1, "auth.py", 40, "weak check");
        let llm = finding("l", FindingSource::Llm, Severity::P0, "auth.py", 42, "bypass check");
        let ingest = ingest_with("auth.py", 100);
        let merged = merge_findings(MergeInputs {
            deterministic: vec![det],
            harness: vec![],
            llm: vec![llm],
            ingest: &ingest,
            scan_mode: ScanMode::Deep,
            policy_version: "1",
            tenant_salt: "salt",
            added_lines: None,
        });
        let llm_finding = merged.iter().find(|f| f.source == FindingSource::Llm).expect("llm finding kept");
        assert_eq!(llm_finding.severity, Severity::P0);
    }

    #[test]
    fn llm_finding_outside_ingest_scope_is_dropped() {
        let llm = finding("l", FindingSource::Llm, Severity::P2, "missing.py", 1, "x");
        let ingest = ingest_with("auth.py", 10);
        let merged = merge_findings(MergeInputs {
            deterministic: vec![],
            harness: vec![],
            llm: vec![llm],
            ingest: &ingest,
            scan_mode: ScanMode::Deep,
            policy_version: "1",
            tenant_salt: "salt",
            added_lines: None,
        });
        assert!(merged.is_empty());
    }

    #[test]
    fn pr_diff_demotes_findings_outside_added_lines() {
        let det = finding("d", FindingSource::Deterministic, Severity::P0, "a.rs", 10, "secret");
        let ingest = ingest_with("a.rs", 20);
        let mut added = BTreeMap::new();
        added.insert(RepoPath::new("a.rs"), vec![LineRange { start: 1, end: 5 }]);
        let merged = merge_findings(MergeInputs {
            deterministic: vec![det],
            harness: vec![],
            llm: vec![],
            ingest: &ingest,
            scan_mode: ScanMode::PrDiff,
            policy_version: "1",
            tenant_salt: "salt",
            added_lines: Some(&added),
        });
        assert_eq!(merged[0].severity, Severity::P3);
    }

    #[test]
    fn pr_diff_keeps_severity_for_added_line_hits() {
        let det = finding("d", FindingSource::Deterministic, Severity::P0, "a.rs", 3, "secret");
        let ingest = ingest_with("a.rs", 20);
        let mut added = BTreeMap::new();
        added.insert(RepoPath::new("a.rs"), vec![LineRange { start: 1, end: 5 }]);
        let merged = merge_findings(MergeInputs {
            deterministic: vec![det],
            harness: vec![],
            llm: vec![],
            ingest: &ingest,
            scan_mode: ScanMode::PrDiff,
            policy_version: "1",
            tenant_salt: "salt",
            added_lines: Some(&added),
        });
        assert_eq!(merged[0].severity, Severity::P0);
    }
}
