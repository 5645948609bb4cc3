// gate-harness/src/tools/mod.rs
// ============================================================================
// Module: Harness Tool Whitelist
// Description: Declares and re-exports every `HarnessTool` implementation
//              `HarnessRunner` is allowed to invoke.
// Purpose: One place that enumerates the closed whitelist — adding a tool
//          means adding a module here, never a dynamic registration call.
// Dependencies: (none of its own; re-exports submodules)
// ============================================================================

/// CI workflow permissions check (no subprocess; pure YAML inspection).
pub mod ci_workflow_permissions;
/// `pip-audit`/`npm audit`/`cargo audit` dependency vulnerability checks.
pub mod dependency_audit;
/// Lockfile-presence check (no subprocess; pure filesystem inspection).
pub mod lockfile_integrity;
/// Last-N-commits secrets scan over `git log -p` output.
pub mod secrets_in_git;

pub use ci_workflow_permissions::CiWorkflowPermissionsTool;
pub use dependency_audit::CargoAuditTool;
pub use dependency_audit::NpmAuditTool;
pub use dependency_audit::PipAuditTool;
pub use lockfile_integrity::LockfileIntegrityTool;
pub use secrets_in_git::SecretsInGitTool;
