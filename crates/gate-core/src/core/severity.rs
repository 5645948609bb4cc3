// gate-core/src/core/severity.rs
// ============================================================================
// Module: Omar Gate Severity & Mode Enums
// Description: Tagged enums shared by findings, config, and the gate evaluator.
// Purpose: Replace the source system's dynamically-typed string fields with
//          exhaustively-matched, constructor-validated variants.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every field that the distilled system represented as a free-form string
//! with an implicit finite set of legal values (severities, scan modes,
//! failure/fork policies, …) is modeled here as a proper enum. Parsing from
//! the `INPUT_*` environment strings lives in `gate-config`; this module only
//! owns the type and its canonical string form.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Severity
// ============================================================================

/// Finding severity, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Critical: committed credentials, SQL injection, auth bypass.
    P0,
    /// High.
    P1,
    /// Medium.
    P2,
    /// Low / advisory.
    P3,
}

impl Severity {
    /// All severities, most to least severe.
    pub const ALL: [Self; 4] = [Self::P0, Self::P1, Self::P2, Self::P3];

    /// Returns the canonical uppercase string form (`"P0"`, …).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::P0 => "P0",
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a severity string does not match `P0|P1|P2|P3`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid severity {0:?}, expected one of P0, P1, P2, P3")]
pub struct ParseSeverityError(String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P0" => Ok(Self::P0),
            "P1" => Ok(Self::P1),
            "P2" => Ok(Self::P2),
            "P3" => Ok(Self::P3),
            other => Err(ParseSeverityError(other.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Severity Gate Threshold
// ============================================================================

/// Configured blocking threshold for the gate evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityGate {
    /// Block on any `P0`.
    P0,
    /// Block on any `P0` or `P1`.
    P1,
    /// Block on any `P0`, `P1`, or `P2`.
    P2,
    /// Never block; report-only.
    None,
}

/// Error returned when a severity gate string does not match the legal set.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid severity gate {0:?}, expected one of P0, P1, P2, none")]
pub struct ParseSeverityGateError(String);

impl FromStr for SeverityGate {
    type Err = ParseSeverityGateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P0" => Ok(Self::P0),
            "P1" => Ok(Self::P1),
            "P2" => Ok(Self::P2),
            "none" => Ok(Self::None),
            other => Err(ParseSeverityGateError(other.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Finding Source
// ============================================================================

/// Which stage of the pipeline produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingSource {
    /// Pattern, secrets, config, or engineering-quality scanner.
    Deterministic,
    /// Sandboxed third-party CLI (dep audit, secrets-in-git, …).
    Harness,
    /// LLM analyzer (API or agentic CLI path).
    Llm,
}

impl FindingSource {
    /// Returns true for sources whose findings are authoritative (never
    /// demoted by the merge guardrails in `gate-core::core::merge`).
    #[must_use]
    pub const fn is_authoritative(self) -> bool {
        matches!(self, Self::Deterministic | Self::Harness)
    }
}

// ============================================================================
// SECTION: Scan Mode
// ============================================================================

/// Selected scan mode for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMode {
    /// Only the PR diff may produce blocking severities.
    PrDiff,
    /// Full worktree, no diff-based demotion.
    Deep,
    /// Scheduled full-repository run.
    Nightly,
}

/// Error returned when a scan mode string does not match the legal set.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid scan mode {0:?}, expected one of pr-diff, deep, nightly")]
pub struct ParseScanModeError(String);

impl FromStr for ScanMode {
    type Err = ParseScanModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pr-diff" => Ok(Self::PrDiff),
            "deep" => Ok(Self::Deep),
            "nightly" => Ok(Self::Nightly),
            other => Err(ParseScanModeError(other.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Failure / Fork / Approval Policy
// ============================================================================

/// Behavior when the LLM analyzer exhausts its retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmFailurePolicy {
    /// Record an error; the gate will block via the recorded failure.
    Block,
    /// Succeed with deterministic and harness findings only.
    DeterministicOnly,
    /// Succeed and embed a warning in the summary.
    AllowWithWarning,
}

/// Fork-PR admission policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForkPolicy {
    /// Fork PRs never run (no LLM path, secrets unavailable).
    Block,
    /// Fork PRs run deterministic/harness scanners only.
    Limited,
    /// Fork PRs run the full pipeline.
    Allow,
}

/// Behavior when a host-API call fails during preflight rate-limit checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitFailMode {
    /// Unknown state blocks: require manual approval.
    Closed,
    /// Unknown state is ignored: skip rate-limit enforcement.
    Open,
}

/// Cost-estimate approval mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    /// Approved when a specific PR label is present.
    PrLabel,
    /// Approved when the triggering event is a manual `workflow_dispatch`.
    WorkflowDispatch,
    /// Cost approval is disabled; estimates never block.
    None,
}

/// Telemetry upload tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryTier {
    /// No telemetry upload.
    Off,
    /// Anonymous payload: repo hash, run id, counts, stage durations.
    Tier1,
    /// Adds repo identity and per-finding metadata.
    Tier2,
    /// Adds artifact upload via a pre-signed destination.
    Tier3,
}

#[cfg(test)]
mod tests {
    use super::Severity;
    use super::SeverityGate;

    #[test]
    fn severity_orders_most_to_least_severe() {
        assert!(Severity::P0 < Severity::P1);
        assert!(Severity::P1 < Severity::P2);
        assert!(Severity::P2 < Severity::P3);
    }

    #[test]
    fn severity_gate_parses_legal_set() {
        assert_eq!("P0".parse::<SeverityGate>().unwrap(), SeverityGate::P0);
        assert_eq!("none".parse::<SeverityGate>().unwrap(), SeverityGate::None);
        assert!("P9".parse::<SeverityGate>().is_err());
    }
}
