// gate-core/src/core/gate_result.rs
// ============================================================================
// Module: Omar Gate Result
// Description: The outcome of gate evaluation, independent of exit codes.
// Purpose: Let `gate_core::core::gate::GateEvaluator` stay a pure function
//          of `Summary`, with exit-code mapping left entirely to `gate-cli`.
// Dependencies: crate::core::summary, serde
// ============================================================================

//! ## Overview
//! `GateResult` is deliberately thin: it carries enough for the publisher and
//! the orchestrator's exit-code mapping, nothing more. See
//! `gate_core::core::gate` for how it is produced.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::summary::SeverityCounts;

// ============================================================================
// SECTION: Gate Status
// ============================================================================

/// Final disposition of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    /// No blocking condition; the PR may proceed.
    Passed,
    /// A blocking condition was found; the PR is blocked.
    Blocked,
    /// Preflight short-circuited with a prior run's conclusion mirrored in.
    Bypassed,
    /// Cost/resource threshold requires manual approval before proceeding.
    NeedsApproval,
    /// Evidence-integrity failure or unrecoverable pipeline error.
    Error,
}

impl GateStatus {
    /// Returns true for statuses that should fail CI (`Blocked` and `Error`;
    /// `NeedsApproval` is surfaced but does not itself fail the check run).
    #[must_use]
    pub const fn blocks_pr(self) -> bool {
        matches!(self, Self::Blocked | Self::Error)
    }
}

// ============================================================================
// SECTION: Gate Result
// ============================================================================

/// The outcome of evaluating one run's [`crate::core::summary::Summary`]
/// against its configured [`crate::core::severity::SeverityGate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    /// Final disposition.
    pub status: GateStatus,
    /// Human-readable reason (an integrity-condition trace, a severity
    /// summary, or the mirrored prior conclusion).
    pub reason: String,
    /// Severity counts the decision was based on.
    pub counts: SeverityCounts,
    /// Idempotency key this result is filed under.
    pub dedupe_key: String,
}

impl GateResult {
    /// Builds a `Passed` result.
    #[must_use]
    pub fn passed(counts: SeverityCounts, dedupe_key: impl Into<String>) -> Self {
        Self {
            status: GateStatus::Passed,
            reason: "no blocking severity threshold crossed".to_string(),
            counts,
            dedupe_key: dedupe_key.into(),
        }
    }

    /// Builds a `Blocked` result with the given reason.
    #[must_use]
    pub fn blocked(counts: SeverityCounts, dedupe_key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            status: GateStatus::Blocked,
            reason: reason.into(),
            counts,
            dedupe_key: dedupe_key.into(),
        }
    }

    /// Builds an `Error` result for an evidence-integrity failure.
    #[must_use]
    pub fn error(dedupe_key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            status: GateStatus::Error,
            reason: reason.into(),
            counts: SeverityCounts::default(),
            dedupe_key: dedupe_key.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GateResult;
    use super::GateStatus;
    use crate::core::summary::SeverityCounts;

    #[test]
    fn blocks_pr_matches_blocked_and_error_only() {
        assert!(GateStatus::Blocked.blocks_pr());
        assert!(GateStatus::Error.blocks_pr());
        assert!(!GateStatus::Passed.blocks_pr());
        assert!(!GateStatus::Bypassed.blocks_pr());
        assert!(!GateStatus::NeedsApproval.blocks_pr());
    }

    #[test]
    fn error_result_carries_zeroed_counts() {
        let result = GateResult::error("dedupe", "findings file missing");
        assert_eq!(result.counts, SeverityCounts::default());
        assert_eq!(result.status, GateStatus::Error);
    }
}
