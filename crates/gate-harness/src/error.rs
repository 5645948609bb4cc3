// gate-harness/src/error.rs
// ============================================================================
// Module: Harness Errors
// Description: Failure modes of a single harness tool invocation.
// Purpose: Distinguish an absent trusted binary (a warning) from a process
//          that ran and failed, or one that had to be killed on timeout.
// Dependencies: thiserror
// ============================================================================

use std::time::Duration;

/// Failure produced while preparing for or running one harness tool.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The tool's binary is not present on `PATH`. Recorded as a
    /// `summary.errors[]` warning by the orchestrator, never a hard failure.
    #[error("tool `{tool}` is not available on PATH")]
    ToolUnavailable {
        /// Name of the unavailable tool.
        tool: &'static str,
    },
    /// The read-only worktree copy could not be prepared.
    #[error("could not prepare read-only worktree for `{tool}`: {source}")]
    WorktreePrepare {
        /// Name of the tool the worktree was being prepared for.
        tool: &'static str,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The child process could not be spawned.
    #[error("tool `{tool}` could not be spawned: {source}")]
    Spawn {
        /// Name of the tool that failed to spawn.
        tool: &'static str,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The tool ran past its allotted budget and was killed.
    #[error("tool `{tool}` exceeded its {budget:?} budget and was killed")]
    TimedOut {
        /// Name of the tool that timed out.
        tool: &'static str,
        /// Budget that was exceeded.
        budget: Duration,
    },
    /// The tool's stdout could not be parsed as the format it promises.
    #[error("tool `{tool}` produced output this harness could not parse: {reason}")]
    MalformedOutput {
        /// Name of the tool whose output failed to parse.
        tool: &'static str,
        /// Human-readable description of the parse failure.
        reason: String,
    },
    /// A finding could not be constructed from tool output.
    #[error("tool `{tool}` produced an invalid finding: {reason}")]
    InvalidFinding {
        /// Name of the tool that failed.
        tool: &'static str,
        /// Human-readable description of the failure.
        reason: String,
    },
    /// A tool that inspects the worktree directly (no subprocess) failed a
    /// plain filesystem read.
    #[error("tool `{tool}` could not read worktree file: {source}")]
    Io {
        /// Name of the tool that failed.
        tool: &'static str,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
