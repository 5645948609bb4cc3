// gate-harness/src/tools/ci_workflow_permissions.rs
// ============================================================================
// Module: CI Workflow Permissions Tool
// Description: Flags GitHub Actions workflows with no explicit top-level
//              `permissions:` block.
// Purpose: An omitted `permissions:` block still runs with the repository's
//          default `GITHUB_TOKEN` scope, which is commonly broad — distinct
//          from (and complementary to) the deterministic config scanner's
//          explicit `permissions: write-all` check.
// Dependencies: gate-core, serde_yaml
// ============================================================================

use std::fs;
use std::path::Path;

use gate_core::Category;
use gate_core::Confidence;
use gate_core::Context;
use gate_core::Finding;
use gate_core::FindingId;
use gate_core::FindingSource;
use gate_core::RepoPath;
use gate_core::Severity;

use crate::error::HarnessError;
use crate::tool::HarnessTool;

const WORKFLOWS_DIR: &str = ".github/workflows";

/// Checks every workflow file under `.github/workflows/` for a top-level
/// `permissions:` key, independent of subprocess tooling.
pub struct CiWorkflowPermissionsTool;

impl HarnessTool for CiWorkflowPermissionsTool {
    fn name(&self) -> &'static str {
        "ci-workflow-permissions"
    }

    fn applies(&self, worktree_root: &Path) -> bool {
        worktree_root.join(WORKFLOWS_DIR).is_dir()
    }

    fn run(&self, worktree_root: &Path, _context: &Context) -> Result<Vec<Finding>, HarnessError> {
        let dir = worktree_root.join(WORKFLOWS_DIR);
        let entries =
            fs::read_dir(&dir).map_err(|source| HarnessError::Io { tool: self.name(), source })?;

        let mut findings = Vec::new();
        let mut next_id: u64 = 0;

        for entry in entries {
            let entry = entry.map_err(|source| HarnessError::Io { tool: self.name(), source })?;
            let path = entry.path();
            let is_workflow = path.extension().is_some_and(|ext| ext == "yml" || ext == "yaml");
            if !is_workflow {
                continue;
            }

            let text = fs::read_to_string(&path).map_err(|source| HarnessError::Io { tool: self.name(), source })?;
            let document: serde_yaml::Value = serde_yaml::from_str(&text).map_err(|source| {
                HarnessError::MalformedOutput { tool: self.name(), reason: source.to_string() }
            })?;

            let has_permissions = document.get("permissions").is_some();
            if has_permissions {
                continue;
            }

            let repo_path = RepoPath::new(format!(
                "{WORKFLOWS_DIR}/{}",
                path.file_name().and_then(|name| name.to_str()).unwrap_or("workflow.yml")
            ));
            next_id += 1;
            let finding = Finding::new(
                FindingId::new(format!("ci-workflow-permissions-{next_id}")),
                Severity::P2,
                Category::new("ci-cd"),
                FindingSource::Harness,
                repo_path,
                1,
                1,
                first_line(&text),
                "Workflow has no top-level `permissions:` block and runs with the repository's default GITHUB_TOKEN scope.",
                "Add an explicit `permissions:` block scoped to only what the workflow needs.",
                Confidence::default(),
            )
            .map_err(|source| HarnessError::InvalidFinding { tool: self.name(), reason: source.to_string() })?;
            findings.push(finding);
        }

        Ok(findings)
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::CiWorkflowPermissionsTool;
    use crate::tool::HarnessTool;
    use gate_core::Context;
    use gate_core::RepoFullName;
    use std::fs;

    fn sample_context() -> Context {
        Context::new(RepoFullName::new("acme/widgets"), Some(1), gate_core::CommitSha::new("abc123"), None, "pull_request", false, "octocat")
    }

    #[test]
    fn flags_workflow_without_permissions_block() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join(".github/workflows")).expect("mkdir");
        fs::write(
            dir.path().join(".github/workflows/ci.yml"),
            "name: ci\njobs:\n  build:\n    runs-on: ubuntu-latest\n",
        )
        .expect("write");

        let tool = CiWorkflowPermissionsTool;
        assert!(tool.applies(dir.path()));
        let findings = tool.run(dir.path(), &sample_context()).expect("run succeeds");
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn allows_workflow_with_scoped_permissions() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join(".github/workflows")).expect("mkdir");
        fs::write(
            dir.path().join(".github/workflows/ci.yml"),
            "name: ci\npermissions:\n  contents: read\njobs:\n  build:\n    runs-on: ubuntu-latest\n",
        )
        .expect("write");

        let findings = CiWorkflowPermissionsTool.run(dir.path(), &sample_context()).expect("run succeeds");
        assert!(findings.is_empty());
    }
}
