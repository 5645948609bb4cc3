// gate-harness/src/tool.rs
// ============================================================================
// Module: Harness Tool Trait
// Description: The dependency-injection seam every trusted external check
//              implements, so `HarnessRunner` never special-cases one tool.
// Purpose: Let the runner own a `Vec<Box<dyn HarnessTool>>` it iterates
//          uniformly, matching the `Scanner` trait's shape in `gate-scanners`.
// Dependencies: gate-core
// ============================================================================

use std::path::Path;
use std::time::Duration;

use gate_core::Context;
use gate_core::Finding;

use crate::error::HarnessError;

/// Per-suite wall-clock budget. Exceeding it kills the child and records a
/// `HarnessError::TimedOut`, never blocks the pipeline indefinitely.
pub const PER_SUITE_BUDGET: Duration = Duration::from_secs(60);

/// Aggregate wall-clock budget across every suite in one harness run.
pub const AGGREGATE_BUDGET: Duration = Duration::from_secs(180);

/// A single trusted, whitelisted external check run over a read-only copy
/// of the worktree.
///
/// Implementations never invoke repository-provided scripts (`npm install`,
/// `postinstall`, project test commands) — only fixed audit/scan
/// subcommands of tools this crate whitelists by name.
pub trait HarnessTool {
    /// Short, stable name used in `Summary.tool_versions` and in
    /// `HarnessError` messages.
    fn name(&self) -> &'static str;

    /// Returns true if this tool applies to the given worktree (e.g. a
    /// manifest file it depends on is present) and its binary, if any, is
    /// reachable on `PATH`.
    fn applies(&self, worktree_root: &Path) -> bool;

    /// Runs this tool against the read-only worktree copy rooted at
    /// `worktree_root`, returning the findings it produced.
    ///
    /// # Errors
    /// Returns [`HarnessError`] if the tool's binary is unavailable, the
    /// process could not be spawned or timed out, or its output could not
    /// be parsed.
    fn run(&self, worktree_root: &Path, context: &Context) -> Result<Vec<Finding>, HarnessError>;
}
