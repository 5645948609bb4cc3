// gate-harness/src/tools/dependency_audit.rs
// ============================================================================
// Module: Dependency Audit Tools
// Description: Thin `HarnessTool` wrappers around `pip-audit`, `npm audit`,
//              and `cargo audit`.
// Purpose: Surface known-vulnerable dependencies without this crate ever
//          parsing a lockfile format itself — the audit tool already did.
// Dependencies: gate-core, serde_json
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
use serde_json::Value;

use crate::error::HarnessError;
use crate::process;
use crate::tool::HarnessTool;
use crate::tool::PER_SUITE_BUDGET;

/// Runs `pip-audit -f json` against a Python-dependency worktree.
pub struct PipAuditTool;

impl HarnessTool for PipAuditTool {
    fn name(&self) -> &'static str {
        "pip-audit"
    }

    fn applies(&self, worktree_root: &Path) -> bool {
        has_any(worktree_root, &["requirements.txt", "pyproject.toml", "Pipfile"])
    }

    fn run(&self, worktree_root: &Path, _context: &Context) -> Result<Vec<Finding>, HarnessError> {
        if !process::is_on_path("pip-audit") {
            return Err(HarnessError::ToolUnavailable { tool: self.name() });
        }
        let output =
            process::run_with_timeout(self.name(), "pip-audit", &["-f", "json"], worktree_root, &["HOME"], PER_SUITE_BUDGET)?;
        parse_pip_audit(self.name(), &process::lossy(&output.stdout))
    }
}

fn parse_pip_audit(tool: &'static str, stdout: &str) -> Result<Vec<Finding>, HarnessError> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }
    let parsed: Value = serde_json::from_str(stdout)
        .map_err(|source| HarnessError::MalformedOutput { tool, reason: source.to_string() })?;
    let dependencies = parsed.get("dependencies").and_then(Value::as_array).cloned().unwrap_or_default();

    let mut findings = Vec::new();
    let mut next_id: u64 = 0;
    for dependency in &dependencies {
        let name = dependency.get("name").and_then(Value::as_str).unwrap_or("unknown-package");
        let version = dependency.get("version").and_then(Value::as_str).unwrap_or("unknown");
        let vulns = dependency.get("vulns").and_then(Value::as_array).cloned().unwrap_or_default();
        for vuln in &vulns {
            let vuln_id = vuln.get("id").and_then(Value::as_str).unwrap_or("unknown-advisory");
            let description = vuln.get("description").and_then(Value::as_str).unwrap_or("");
            next_id += 1;
            findings.push(build(tool, &mut next_id, name, Severity::P1, vuln_id, description)?);
        }
    }
    let _ = next_id;
    Ok(findings)
}

/// Runs `npm audit --json` against a Node-dependency worktree.
pub struct NpmAuditTool;

impl HarnessTool for NpmAuditTool {
    fn name(&self) -> &'static str {
        "npm-audit"
    }

    fn applies(&self, worktree_root: &Path) -> bool {
        has_any(worktree_root, &["package-lock.json", "package.json"])
    }

    fn run(&self, worktree_root: &Path, _context: &Context) -> Result<Vec<Finding>, HarnessError> {
        if !process::is_on_path("npm") {
            return Err(HarnessError::ToolUnavailable { tool: self.name() });
        }
        let output = process::run_with_timeout(self.name(), "npm", &["audit", "--json"], worktree_root, &[], PER_SUITE_BUDGET)?;
        parse_npm_audit(self.name(), &process::lossy(&output.stdout))
    }
}

fn parse_npm_audit(tool: &'static str, stdout: &str) -> Result<Vec<Finding>, HarnessError> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }
    let parsed: Value = serde_json::from_str(stdout)
        .map_err(|source| HarnessError::MalformedOutput { tool, reason: source.to_string() })?;
    let Some(vulnerabilities) = parsed.get("vulnerabilities").and_then(Value::as_object) else {
        return Ok(Vec::new());
    };

    let mut findings = Vec::new();
    let mut next_id: u64 = 0;
    for (package, entry) in vulnerabilities {
        let npm_severity = entry.get("severity").and_then(Value::as_str).unwrap_or("moderate");
        let severity = map_npm_severity(npm_severity);
        let via_summary = entry
            .get("via")
            .and_then(Value::as_array)
            .map(|via| {
                via.iter()
                    .filter_map(|v| v.as_str().or_else(|| v.get("title").and_then(Value::as_str)))
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .unwrap_or_default();
        next_id += 1;
        findings.push(build(tool, &mut next_id, package, severity, npm_severity, &via_summary)?);
    }
    Ok(findings)
}

fn map_npm_severity(severity: &str) -> Severity {
    match severity {
        "critical" => Severity::P0,
        "high" => Severity::P1,
        "low" => Severity::P3,
        _ => Severity::P2,
    }
}

/// Runs `cargo audit --json` against a Rust-dependency worktree.
pub struct CargoAuditTool;

impl HarnessTool for CargoAuditTool {
    fn name(&self) -> &'static str {
        "cargo-audit"
    }

    fn applies(&self, worktree_root: &Path) -> bool {
        has_any(worktree_root, &["Cargo.lock"])
    }

    fn run(&self, worktree_root: &Path, _context: &Context) -> Result<Vec<Finding>, HarnessError> {
        if !process::is_on_path("cargo-audit") {
            return Err(HarnessError::ToolUnavailable { tool: self.name() });
        }
        let output =
            process::run_with_timeout(self.name(), "cargo-audit", &["audit", "--json"], worktree_root, &[], PER_SUITE_BUDGET)?;
        parse_cargo_audit(self.name(), &process::lossy(&output.stdout))
    }
}

fn parse_cargo_audit(tool: &'static str, stdout: &str) -> Result<Vec<Finding>, HarnessError> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }
    let parsed: Value = serde_json::from_str(stdout)
        .map_err(|source| HarnessError::MalformedOutput { tool, reason: source.to_string() })?;
    let list = parsed
        .get("vulnerabilities")
        .and_then(|v| v.get("list"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut findings = Vec::new();
    let mut next_id: u64 = 0;
    for entry in &list {
        let advisory = entry.get("advisory");
        let advisory_id = advisory.and_then(|a| a.get("id")).and_then(Value::as_str).unwrap_or("unknown-advisory");
        let title = advisory.and_then(|a| a.get("title")).and_then(Value::as_str).unwrap_or("");
        let package = entry.get("package").and_then(|p| p.get("name")).and_then(Value::as_str).unwrap_or("unknown-crate");
        next_id += 1;
        findings.push(build(tool, &mut next_id, package, Severity::P1, advisory_id, title)?);
    }
    Ok(findings)
}

fn has_any(root: &Path, names: &[&str]) -> bool {
    names.iter().any(|name| root.join(name).is_file())
}

#[allow(clippy::too_many_arguments, reason = "thin wrapper mirroring Finding::new")]
fn build(
    tool: &'static str,
    next_id: &mut u64,
    package: &str,
    severity: Severity,
    advisory_id: &str,
    detail: &str,
) -> Result<Finding, HarnessError> {
    *next_id += 1;
    Finding::new(
        FindingId::new(format!("{tool}-{next_id}")),
        severity,
        Category::new("dependency-audit"),
        FindingSource::Harness,
        RepoPath::new(manifest_path_for(tool)),
        1,
        1,
        format!("{package}: {advisory_id}"),
        if detail.is_empty() {
            format!("{package} has a known vulnerability ({advisory_id}) per {tool}.")
        } else {
            format!("{package} has a known vulnerability ({advisory_id}): {detail}")
        },
        "Upgrade the dependency to a patched version, or pin an alternative if no patch exists yet.",
        Confidence::default(),
    )
    .map_err(|source| HarnessError::InvalidFinding { tool, reason: source.to_string() })
}

fn manifest_path_for(tool: &'static str) -> &'static str {
    match tool {
        "cargo-audit" => "Cargo.lock",
        "npm-audit" => "package-lock.json",
        _ => "requirements.txt",
    }
}
