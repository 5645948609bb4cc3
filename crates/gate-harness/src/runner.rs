// gate-harness/src/runner.rs
// ============================================================================
// Module: Harness Runner
// Description: Prepares one read-only worktree copy and iterates the fixed
//              tool whitelist under a shared aggregate budget.
// Purpose: The single entry point the orchestrator calls for C6; callers
//          never touch `HarnessTool`, `process`, or `worktree` directly.
// Dependencies: gate-core
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use gate_core::Context;
use gate_core::Finding;
use gate_core::RecordedError;
use gate_core::StageName;

use crate::error::HarnessError;
use crate::tool::HarnessTool;
use crate::tool::AGGREGATE_BUDGET;
use crate::tools::CargoAuditTool;
use crate::tools::CiWorkflowPermissionsTool;
use crate::tools::LockfileIntegrityTool;
use crate::tools::NpmAuditTool;
use crate::tools::PipAuditTool;
use crate::tools::SecretsInGitTool;
use crate::worktree;

/// Everything one harness run produced: findings, non-fatal warnings
/// suitable for `Summary.errors[]`, and the tool-name-to-invocation-marker
/// map suitable for `Summary.tool_versions`.
#[derive(Debug, Default)]
pub struct HarnessRunOutcome {
    /// Findings from every tool that ran and applied.
    pub findings: Vec<Finding>,
    /// Non-fatal issues (unavailable tool, timeout, unparseable output).
    pub warnings: Vec<RecordedError>,
    /// Tool name to a short invocation marker, for ones that actually ran.
    pub tool_versions: BTreeMap<String, String>,
}

/// Orchestrates the fixed harness tool whitelist over one read-only worktree
/// copy under a shared [`AGGREGATE_BUDGET`].
pub struct HarnessRunner {
    tools: Vec<Box<dyn HarnessTool + Send + Sync>>,
}

impl HarnessRunner {
    /// Builds a runner with the fixed tool whitelist: dependency audit
    /// (pip/npm/cargo), last-N-commits secrets scan, lockfile integrity,
    /// and CI workflow permissions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: vec![
                Box::new(PipAuditTool),
                Box::new(NpmAuditTool),
                Box::new(CargoAuditTool),
                Box::new(SecretsInGitTool),
                Box::new(LockfileIntegrityTool),
                Box::new(CiWorkflowPermissionsTool),
            ],
        }
    }

    /// Prepares one read-only copy of `worktree_root` and runs every
    /// applicable tool against it in sequence, stopping early (and
    /// recording a warning per skipped tool) once [`AGGREGATE_BUDGET`] is
    /// exhausted.
    ///
    /// # Errors
    /// Returns [`HarnessError::WorktreePrepare`] only if the read-only copy
    /// itself cannot be created; individual tool failures are recorded as
    /// warnings in the returned [`HarnessRunOutcome`], never propagated.
    pub fn run(&self, worktree_root: &Path, context: &Context) -> Result<HarnessRunOutcome, HarnessError> {
        let copy = worktree::prepare_readonly_copy("harness-runner", worktree_root)?;
        let mut outcome = HarnessRunOutcome::default();
        let started = Instant::now();

        for tool in &self.tools {
            if !tool.applies(copy.path()) {
                continue;
            }
            if started.elapsed() >= AGGREGATE_BUDGET {
                outcome.warnings.push(RecordedError::warning(
                    StageName::Harness,
                    format!("`{}` skipped: aggregate harness budget exhausted", tool.name()),
                ));
                continue;
            }

            match tool.run(copy.path(), context) {
                Ok(findings) => {
                    outcome.tool_versions.insert(tool.name().to_string(), "ran".to_string());
                    outcome.findings.extend(findings);
                }
                Err(HarnessError::ToolUnavailable { tool: name }) => {
                    outcome
                        .warnings
                        .push(RecordedError::warning(StageName::Harness, format!("`{name}` is not available on PATH")));
                }
                Err(other) => {
                    outcome.warnings.push(RecordedError::warning(StageName::Harness, other.to_string()));
                }
            }
        }

        Ok(outcome)
    }
}

impl Default for HarnessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::HarnessRunner;
    use gate_core::Context;
    use gate_core::RepoFullName;
    use std::fs;

    fn sample_context() -> Context {
        Context::new(RepoFullName::new("acme/widgets"), Some(1), gate_core::CommitSha::new("abc123"), None, "pull_request", false, "octocat")
    }

    #[test]
    fn empty_worktree_produces_no_findings_and_no_applicable_tools() {
        let dir = tempfile::tempdir().expect("tempdir");
        let outcome = HarnessRunner::new().run(dir.path(), &sample_context()).expect("run succeeds");
        assert!(outcome.findings.is_empty());
        assert!(outcome.tool_versions.is_empty());
    }

    #[test]
    fn missing_lockfile_is_reported_without_any_subprocess_tool() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"x\"\n").expect("write");

        let outcome = HarnessRunner::new().run(dir.path(), &sample_context()).expect("run succeeds");
        assert!(outcome.findings.iter().any(|finding| finding.category.as_str() == "dependency-audit"));
    }
}
