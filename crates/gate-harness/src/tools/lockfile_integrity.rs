// gate-harness/src/tools/lockfile_integrity.rs
// ============================================================================
// Module: Lockfile Integrity Tool
// Description: Flags dependency manifests that declare dependencies without
//              a corresponding lockfile committed alongside them.
// Purpose: A missing lockfile means every install floats to whatever the
//          registry serves at build time — the dependency audit tools
//          upstream of this one can only audit what a lockfile pinned.
// Dependencies: gate-core
// ============================================================================

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

/// One ecosystem's manifest/lockfile pairing.
struct Ecosystem {
    manifest: &'static str,
    lockfile_candidates: &'static [&'static str],
}

const ECOSYSTEMS: &[Ecosystem] = &[
    Ecosystem { manifest: "Cargo.toml", lockfile_candidates: &["Cargo.lock"] },
    Ecosystem {
        manifest: "package.json",
        lockfile_candidates: &["package-lock.json", "yarn.lock", "pnpm-lock.yaml"],
    },
    Ecosystem { manifest: "go.mod", lockfile_candidates: &["go.sum"] },
];

/// Checks, per detected ecosystem, that a manifest never ships without a
/// lockfile. This performs no network or subprocess call — it is a fixed
/// filesystem check — but stays a `HarnessTool` so it runs under the same
/// read-only worktree and is reported alongside the other trusted checks.
pub struct LockfileIntegrityTool;

impl HarnessTool for LockfileIntegrityTool {
    fn name(&self) -> &'static str {
        "lockfile-integrity"
    }

    fn applies(&self, worktree_root: &Path) -> bool {
        ECOSYSTEMS.iter().any(|ecosystem| worktree_root.join(ecosystem.manifest).is_file())
    }

    fn run(&self, worktree_root: &Path, _context: &Context) -> Result<Vec<Finding>, HarnessError> {
        let mut findings = Vec::new();
        let mut next_id: u64 = 0;

        for ecosystem in ECOSYSTEMS {
            let manifest_path = worktree_root.join(ecosystem.manifest);
            if !manifest_path.is_file() {
                continue;
            }
            let has_lockfile =
                ecosystem.lockfile_candidates.iter().any(|candidate| worktree_root.join(candidate).is_file());
            if has_lockfile {
                continue;
            }

            next_id += 1;
            let finding = Finding::new(
                FindingId::new(format!("lockfile-integrity-{next_id}")),
                Severity::P2,
                Category::new("dependency-audit"),
                FindingSource::Harness,
                RepoPath::new(ecosystem.manifest),
                1,
                1,
                ecosystem.manifest,
                format!(
                    "{} declares dependencies but no lockfile ({}) is committed alongside it.",
                    ecosystem.manifest,
                    ecosystem.lockfile_candidates.join(" or ")
                ),
                "Commit the lockfile so dependency versions are reproducible and auditable.",
                Confidence::default(),
            )
            .map_err(|source| HarnessError::InvalidFinding { tool: self.name(), reason: source.to_string() })?;
            findings.push(finding);
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::LockfileIntegrityTool;
    use crate::tool::HarnessTool;
    use gate_core::Context;
    use gate_core::RepoFullName;
    use std::fs;

    fn sample_context() -> Context {
        Context::new(RepoFullName::new("acme/widgets"), Some(1), gate_core::CommitSha::new("abc123"), None, "pull_request", false, "octocat")
    }

    #[test]
    fn flags_manifest_without_lockfile() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"x\"\n").expect("write");

        let tool = LockfileIntegrityTool;
        assert!(tool.applies(dir.path()));
        let findings = tool.run(dir.path(), &sample_context()).expect("run succeeds");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, gate_core::Severity::P2);
    }

    #[test]
    fn allows_manifest_with_lockfile() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"x\"\n").expect("write");
        fs::write(dir.path().join("Cargo.lock"), "").expect("write");

        let findings = LockfileIntegrityTool.run(dir.path(), &sample_context()).expect("run succeeds");
        assert!(findings.is_empty());
    }

    #[test]
    fn does_not_apply_without_any_known_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(!LockfileIntegrityTool.applies(dir.path()));
    }
}
