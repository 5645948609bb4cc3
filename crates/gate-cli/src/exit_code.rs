// gate-cli/src/exit_code.rs
// ============================================================================
// Module: Exit Code Mapping
// Description: Translates the orchestrator's final outcome into the process
//              exit code GitHub Actions reads to pass or fail the job.
// Purpose: Keep the `0/1/2/12/13` mapping in one place instead of scattered
//          `std::process::exit` calls through `main.rs`.
// Dependencies: gate-core, std::process
// ============================================================================

//! ## Overview
//! `0` passed; `1` blocked; `2` configuration/context error; `12` fork
//! blocked; `13` needs approval. The legacy `10`/`11` dedupe/rate-limit codes
//! are not emitted — a mirrored skip reuses `0`/`1`, matching the prior run's
//! own conclusion rather than inventing a third disposition for it.

use std::process::ExitCode;

use gate_core::GateStatus;

use crate::preflight::MirroredConclusion;

/// The orchestrator's final disposition, one level above `GateStatus`:
/// covers the short-circuit paths that never reach gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A dedupe or rate-limit check found a prior run and mirrored its
    /// conclusion without publishing a new comment.
    Mirrored(MirroredConclusion),
    /// `fork_policy = block` and this is a fork PR.
    ForkBlocked,
    /// A cost estimate (or rate-limit host-API failure under
    /// `fail_mode = closed`) requires manual approval.
    NeedsApproval,
    /// Config parsing or event-context derivation failed before the
    /// pipeline could run at all.
    ConfigError,
    /// The gate evaluator produced a result; this is its status.
    Gate(GateStatus),
}

/// Maps `outcome` to the raw numeric exit code.
#[must_use]
pub fn exit_code_value(outcome: Outcome) -> u8 {
    match outcome {
        Outcome::Mirrored(MirroredConclusion::Success) => 0,
        Outcome::Mirrored(MirroredConclusion::Failure) => 1,
        Outcome::Gate(GateStatus::Passed | GateStatus::Bypassed) => 0,
        Outcome::Gate(GateStatus::Blocked | GateStatus::Error) => 1,
        Outcome::ConfigError => 2,
        Outcome::ForkBlocked => 12,
        Outcome::NeedsApproval | Outcome::Gate(GateStatus::NeedsApproval) => 13,
    }
}

/// Maps `outcome` to the [`ExitCode`] GitHub Actions reads from the process.
#[must_use]
pub fn exit_code_for(outcome: Outcome) -> ExitCode {
    ExitCode::from(exit_code_value(outcome))
}

#[cfg(test)]
mod tests {
    use super::exit_code_value;
    use super::Outcome;
    use crate::preflight::MirroredConclusion;
    use gate_core::GateStatus;

    #[test]
    fn mirrored_success_exits_zero() {
        assert_eq!(exit_code_value(Outcome::Mirrored(MirroredConclusion::Success)), 0);
    }

    #[test]
    fn mirrored_failure_exits_one() {
        assert_eq!(exit_code_value(Outcome::Mirrored(MirroredConclusion::Failure)), 1);
    }

    #[test]
    fn fork_blocked_exits_twelve() {
        assert_eq!(exit_code_value(Outcome::ForkBlocked), 12);
    }

    #[test]
    fn needs_approval_exits_thirteen() {
        assert_eq!(exit_code_value(Outcome::NeedsApproval), 13);
        assert_eq!(exit_code_value(Outcome::Gate(GateStatus::NeedsApproval)), 13);
    }

    #[test]
    fn config_error_exits_two() {
        assert_eq!(exit_code_value(Outcome::ConfigError), 2);
    }

    #[test]
    fn gate_blocked_and_error_both_exit_one() {
        assert_eq!(exit_code_value(Outcome::Gate(GateStatus::Blocked)), 1);
        assert_eq!(exit_code_value(Outcome::Gate(GateStatus::Error)), 1);
    }
}
