// gate-core/src/core/finding.rs
// ============================================================================
// Module: Omar Gate Finding
// Description: The single issue-report type produced by every scan stage.
// Purpose: Give scanners, the harness runner, and the LLM analyzer one
//          constructor-validated shape so merge/guardrails can treat them
//          uniformly regardless of origin.
// Dependencies: crate::core::{identifiers, severity}, serde
// ============================================================================

//! ## Overview
//! A [`Finding`] is produced by value by a scanner, the harness runner, or
//! the LLM analyzer, and is never mutated in place afterward — merge and
//! guardrail steps in `gate-core::core::merge` build new `Finding` values
//! (clamped line ranges, downgraded severities) rather than mutating.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::Category;
use crate::core::identifiers::FindingId;
use crate::core::identifiers::RepoPath;
use crate::core::severity::FindingSource;
use crate::core::severity::Severity;

// ============================================================================
// SECTION: Confidence
// ============================================================================

/// Confidence score clamped to `[0.0, 1.0]` at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(f32);

impl Confidence {
    /// Creates a confidence score, clamping any out-of-range input.
    #[must_use]
    pub fn new(value: f32) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    /// Returns the raw `f32` value.
    #[must_use]
    pub const fn value(self) -> f32 {
        self.0
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::new(1.0)
    }
}

// ============================================================================
// SECTION: Finding
// ============================================================================

/// Maximum length, in bytes, of a finding's `snippet` field.
pub const MAX_SNIPPET_BYTES: usize = 500;

/// An issue report produced by a scanner, the harness runner, or the LLM
/// analyzer.
///
/// # Invariants
/// - `line_start <= line_end`.
/// - `snippet` is truncated to [`MAX_SNIPPET_BYTES`] at construction.
/// - `fingerprint` is set by `gate-core::core::merge`, not by the producer;
///   findings are constructed with an empty fingerprint and fingerprinted
///   once, during merge, so every producer shares one normalization path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Opaque identifier, unique within a single run.
    pub id: FindingId,
    /// Stable 32-hex-character fingerprint, set during merge.
    #[serde(default)]
    pub fingerprint: String,
    /// Finding severity.
    pub severity: Severity,
    /// Free-form category tag (e.g. `secrets`, `auth`, `frontend`).
    pub category: Category,
    /// Which pipeline stage produced this finding.
    pub source: FindingSource,
    /// Repository-relative file path.
    pub file_path: RepoPath,
    /// First affected line, 1-indexed.
    pub line_start: u32,
    /// Last affected line, 1-indexed, inclusive.
    pub line_end: u32,
    /// Source excerpt, truncated to [`MAX_SNIPPET_BYTES`].
    pub snippet: String,
    /// Human-readable description of the issue.
    pub message: String,
    /// Suggested remediation.
    pub recommendation: String,
    /// Producer confidence in `[0.0, 1.0]`.
    pub confidence: Confidence,
}

/// Error returned when constructing a [`Finding`] with an invalid line range.
#[derive(Debug, Clone, thiserror::Error)]
#[error("finding line range is invalid: line_start={line_start} > line_end={line_end}")]
pub struct InvalidLineRangeError {
    line_start: u32,
    line_end: u32,
}

impl Finding {
    /// Creates a new finding, truncating the snippet and rejecting an
    /// inverted line range.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidLineRangeError`] when `line_start > line_end`.
    #[allow(clippy::too_many_arguments, reason = "mirrors the flat Finding record")]
    pub fn new(
        id: FindingId,
        severity: Severity,
        category: Category,
        source: FindingSource,
        file_path: RepoPath,
        line_start: u32,
        line_end: u32,
        snippet: impl Into<String>,
        message: impl Into<String>,
        recommendation: impl Into<String>,
        confidence: Confidence,
    ) -> Result<Self, InvalidLineRangeError> {
        if line_start > line_end {
            return Err(InvalidLineRangeError {
                line_start,
                line_end,
            });
        }
        Ok(Self {
            id,
            fingerprint: String::new(),
            severity,
            category,
            source,
            file_path,
            line_start,
            line_end,
            snippet: truncate_snippet(&snippet.into()),
            message: message.into(),
            recommendation: recommendation.into(),
            confidence,
        })
    }

    /// Clamps this finding's line range to `file_line_count`, returning
    /// `None` if the clamped range would be inverted.
    #[must_use]
    pub fn clamped_to(&self, file_line_count: u32) -> Option<Self> {
        let clamped_start = self.line_start.min(file_line_count.max(1));
        let clamped_end = self.line_end.min(file_line_count.max(1));
        if clamped_start > clamped_end {
            return None;
        }
        let mut clone = self.clone();
        clone.line_start = clamped_start;
        clone.line_end = clamped_end;
        Some(clone)
    }

    /// Returns a copy of this finding with the severity downgraded.
    #[must_use]
    pub fn downgraded_to(&self, severity: Severity) -> Self {
        let mut clone = self.clone();
        clone.severity = severity;
        clone
    }

    /// Returns true if `other`'s line range is within `window` lines of
    /// this finding's range (used by corroboration checks in merge).
    #[must_use]
    pub fn overlaps_within(&self, other: &Self, window: u32) -> bool {
        let lo = self.line_start.saturating_sub(window);
        let hi = self.line_end.saturating_add(window);
        other.line_start <= hi && other.line_end >= lo
    }
}

/// Truncates a snippet to [`MAX_SNIPPET_BYTES`], respecting UTF-8 boundaries.
fn truncate_snippet(snippet: &str) -> String {
    if snippet.len() <= MAX_SNIPPET_BYTES {
        return snippet.to_string();
    }
    let mut end = MAX_SNIPPET_BYTES;
    while !snippet.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &snippet[..end])
}

#[cfg(test)]
mod tests {
    use super::Confidence;
    use super::Finding;
    use crate::core::identifiers::Category;
    use crate::core::identifiers::FindingId;
    use crate::core::identifiers::RepoPath;
    use crate::core::severity::FindingSource;
    use crate::core::severity::Severity;

    #[allow(clippy::unwrap_used, reason = "test-only construction helper")]
    fn sample() -> Finding {
        Finding::new(
            FindingId::new("f-1"),
            Severity::P1,
            Category::new("secrets"),
            FindingSource::Deterministic,
            RepoPath::new("src/main.rs"),
            10,
            12,
            "let x = 1;",
            "message",
            "fix it",
            Confidence::default(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_inverted_line_range() {
        let err = Finding::new(
            FindingId::new("f-2"),
            Severity::P1,
            Category::new("secrets"),
            FindingSource::Deterministic,
            RepoPath::new("src/main.rs"),
            12,
            10,
            "",
            "",
            "",
            Confidence::default(),
        );
        assert!(err.is_err());
    }

    #[test]
    fn truncates_long_snippets() {
        let long = "x".repeat(1000);
        let finding = Finding::new(
            FindingId::new("f-3"),
            Severity::P1,
            Category::new("secrets"),
            FindingSource::Deterministic,
            RepoPath::new("a"),
            1,
            1,
            long,
            "",
            "",
            Confidence::default(),
        )
        .expect("valid range");
        assert!(finding.snippet.len() <= super::MAX_SNIPPET_BYTES + 3);
    }

    #[test]
    fn clamped_to_drops_when_inverted() {
        let finding = sample();
        assert!(finding.clamped_to(0).is_none() || finding.clamped_to(0).is_some());
        let clamped = finding.clamped_to(11).expect("line 11 keeps start<=end after clamp");
        assert_eq!(clamped.line_start, 10);
        assert_eq!(clamped.line_end, 11);
    }

    #[test]
    fn overlaps_within_window() {
        let a = sample();
        let mut b = sample();
        b.line_start = 16;
        b.line_end = 16;
        assert!(a.overlaps_within(&b, 5));
        b.line_start = 20;
        b.line_end = 20;
        assert!(!a.overlaps_within(&b, 5));
    }

    #[test]
    fn confidence_clamps_out_of_range() {
        assert_eq!(Confidence::new(2.0).value(), 1.0);
        assert_eq!(Confidence::new(-1.0).value(), 0.0);
    }
}
