// gate-scanners/src/config_files.rs
// ============================================================================
// Module: Config File Scanner
// Description: Path- and content-keyed rules over committed config and
//              infrastructure-as-code files.
// Purpose: Catch `.env` commits, overly broad workflow permissions, missing
//          Dockerfile USER directives, and Terraform without a remote
//          backend — issues a generic pattern scanner would miss because
//          they depend on the file's role, not its syntax.
// Dependencies: gate-core, regex
// ============================================================================

//! ## Overview
//! Each rule in [`ConfigFileScanner`] inspects a single file whose *path*
//! identifies its role (`.env`, a workflow under `.github/workflows/`, a
//! `Dockerfile`, a `*.tf` file) and applies a narrow, role-specific check
//! to its content. This is deliberately not pattern matching over arbitrary
//! source — these are facts about how one particular, recognizable file is
//! configured.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::sync::LazyLock;

use gate_core::Category;
use gate_core::Confidence;
use gate_core::Context;
use gate_core::Finding;
use gate_core::FindingId;
use gate_core::FindingSource;
use gate_core::IngestFile;
use gate_core::RepoPath;
use gate_core::Severity;
use regex::Regex;

use crate::Scanner;
use crate::ScannerError;

static WORKFLOW_SECRET: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used, reason = "fixed pattern, covered by tests")]
    Regex::new(r#"(?im)^\s*[A-Za-z0-9_]*(token|password|secret|api[_-]?key)\s*:\s*['"]?[A-Za-z0-9/_\-+=]{12,}"#)
        .unwrap()
});

/// Builder for sequential, per-file finding ids scoped to this scanner.
struct IdGen(u64);

impl IdGen {
    fn next(&mut self) -> FindingId {
        self.0 += 1;
        FindingId::new(format!("config-{}", self.0))
    }
}

/// Path- and content-keyed config/infrastructure rule scanner.
#[derive(Default)]
pub struct ConfigFileScanner;

impl ConfigFileScanner {
    /// Creates a new config file scanner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Scanner for ConfigFileScanner {
    fn name(&self) -> &'static str {
        "config"
    }

    fn scan(
        &self,
        files: &[IngestFile],
        read: &dyn Fn(&RepoPath) -> io::Result<String>,
        _context: &Context,
    ) -> Result<Vec<Finding>, ScannerError> {
        let mut findings = Vec::new();
        let mut ids = IdGen(0);

        for file in files {
            if matches!(file.category, gate_core::FileCategory::Binary) {
                continue;
            }
            let path = file.path.as_str();

            if is_committed_dotenv(path) {
                let text = read_text(read, file)?;
                findings.push(build(
                    &mut ids,
                    Severity::P0,
                    "config",
                    file,
                    1,
                    first_line(&text),
                    "A `.env` file is committed to the repository.",
                    "Remove the file from version control, rotate any values it held, and add it to .gitignore.",
                )?);
                continue;
            }

            if is_github_workflow(path) {
                let text = read_text(read, file)?;
                if let Some(line) = find_line(&text, "permissions:", "write-all") {
                    findings.push(build(
                        &mut ids,
                        Severity::P1,
                        "ci-cd",
                        file,
                        line,
                        snippet_at(&text, line),
                        "Workflow grants `write-all` permissions to the default GITHUB_TOKEN.",
                        "Scope permissions to only the access levels the workflow actually needs.",
                    )?);
                }
                if let Some(caps) = WORKFLOW_SECRET.captures(&text) {
                    let whole = caps.get(0).expect("match 0 always present");
                    let line = line_number(&text, whole.start());
                    findings.push(build(
                        &mut ids,
                        Severity::P0,
                        "secrets",
                        file,
                        line,
                        snippet_at(&text, line),
                        "Workflow YAML contains a hardcoded secret-shaped value instead of a secrets reference.",
                        "Move the value to repository/organization secrets and reference it via `${{ secrets.NAME }}`.",
                    )?);
                }
                continue;
            }

            if is_dockerfile(path) {
                let text = read_text(read, file)?;
                if !text.lines().any(|line| line.trim_start().to_uppercase().starts_with("USER ")) {
                    findings.push(build(
                        &mut ids,
                        Severity::P2,
                        "infrastructure",
                        file,
                        1,
                        first_line(&text),
                        "Dockerfile never switches to a non-root USER.",
                        "Add a `USER` instruction so the container does not run as root.",
                    )?);
                }
                continue;
            }

            if is_terraform(path) {
                let text = read_text(read, file)?;
                if !has_remote_backend(&text) {
                    findings.push(build(
                        &mut ids,
                        Severity::P2,
                        "infrastructure",
                        file,
                        1,
                        first_line(&text),
                        "Terraform configuration has no remote backend block.",
                        "Configure a remote backend (e.g. S3, GCS, Azure Blob, Terraform Cloud) so state is not local-only.",
                    )?);
                }
            }
        }

        Ok(findings)
    }
}

// ============================================================================
// SECTION: Path Predicates
// ============================================================================

fn is_committed_dotenv(path: &str) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    (file_name == ".env" || file_name.starts_with(".env.") || file_name.ends_with(".env"))
        && !file_name.contains("example")
        && !file_name.contains("template")
        && !file_name.contains("sample")
}

fn is_github_workflow(path: &str) -> bool {
    path.starts_with(".github/workflows/") && (path.ends_with(".yml") || path.ends_with(".yaml"))
}

fn is_dockerfile(path: &str) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name == "Dockerfile" || file_name.starts_with("Dockerfile.")
}

fn is_terraform(path: &str) -> bool {
    path.ends_with(".tf")
}

fn has_remote_backend(text: &str) -> bool {
    const REMOTE_KINDS: &[&str] = &["s3", "gcs", "azurerm", "remote", "http", "consul", "etcd", "pg", "cos"];
    let backend_re_pos = text.find("backend \"");
    match backend_re_pos {
        None => false,
        Some(pos) => {
            let rest = &text[pos + "backend \"".len()..];
            let kind = rest.split('"').next().unwrap_or("");
            REMOTE_KINDS.contains(&kind) && kind != "local"
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn read_text(read: &dyn Fn(&RepoPath) -> io::Result<String>, file: &IngestFile) -> Result<String, ScannerError> {
    read(&file.path).map_err(|source| ScannerError::Read {
        scanner: "config",
        path: file.path.clone(),
        source,
    })
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

fn snippet_at(text: &str, line: u32) -> &str {
    text.lines().nth(line.saturating_sub(1) as usize).unwrap_or("")
}

fn line_number(text: &str, byte_offset: usize) -> u32 {
    u32::try_from(text[..byte_offset].bytes().filter(|&b| b == b'\n').count() + 1).unwrap_or(u32::MAX)
}

/// Finds the 1-indexed line of the first line containing both `key` and
/// `value` (order-independent anywhere in the same line, case-insensitive).
fn find_line(text: &str, key: &str, value: &str) -> Option<u32> {
    text.lines().enumerate().find_map(|(idx, line)| {
        let lower = line.to_lowercase();
        (lower.contains(&key.to_lowercase()) && lower.contains(&value.to_lowercase()))
            .then(|| u32::try_from(idx + 1).unwrap_or(u32::MAX))
    })
}

#[allow(clippy::too_many_arguments, reason = "thin wrapper mirroring Finding::new")]
fn build(
    ids: &mut IdGen,
    severity: Severity,
    category: &str,
    file: &IngestFile,
    line: u32,
    snippet: &str,
    message: &str,
    recommendation: &str,
) -> Result<Finding, ScannerError> {
    Finding::new(
        ids.next(),
        severity,
        Category::new(category),
        FindingSource::Deterministic,
        file.path.clone(),
        line,
        line,
        snippet,
        message,
        recommendation,
        Confidence::default(),
    )
    .map_err(|source| ScannerError::InvalidFinding {
        scanner: "config",
        reason: source.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::ConfigFileScanner;
    use crate::Scanner;
    use gate_core::Context;
    use gate_core::FileCategory;
    use gate_core::IngestFile;
    use gate_core::RepoPath;
    use std::collections::HashMap;

    fn sample_context() -> Context {
        Context::new(
            gate_core::RepoFullName::new("acme/widgets"),
            Some(1),
            gate_core::CommitSha::new("abc123"),
            None,
            "pull_request",
            false,
            "octocat",
        )
    }

    fn ingest_file(path: &str) -> IngestFile {
        IngestFile {
            path: RepoPath::new(path),
            category: FileCategory::Config,
            language: None,
            lines: 1,
            bytes: 10,
            is_hotspot: false,
            hotspot_reasons: Vec::new(),
        }
    }

    fn run(contents: HashMap<String, String>, file: IngestFile) -> Vec<gate_core::Finding> {
        ConfigFileScanner::new()
            .scan(
                &[file],
                &|path| contents.get(path.as_str()).cloned().ok_or_else(|| std::io::Error::other("missing")),
                &sample_context(),
            )
            .expect("scan succeeds")
    }

    #[test]
    fn flags_committed_dotenv_as_p0() {
        let mut contents = HashMap::new();
        contents.insert("config/prod.env".to_string(), "AWS_ACCESS_KEY_ID=AKIA...\n".to_string());
        let findings = run(contents, ingest_file("config/prod.env"));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, gate_core::Severity::P0);
    }

    #[test]
    fn allows_dotenv_example() {
        let mut contents = HashMap::new();
        contents.insert(".env.example".to_string(), "KEY=placeholder\n".to_string());
        let findings = run(contents, ingest_file(".env.example"));
        assert!(findings.is_empty());
    }

    #[test]
    fn flags_workflow_write_all_permissions() {
        let mut contents = HashMap::new();
        contents.insert(
            ".github/workflows/ci.yml".to_string(),
            "name: ci\npermissions: write-all\njobs:\n  build:\n    runs-on: ubuntu-latest\n".to_string(),
        );
        let findings = run(contents, ingest_file(".github/workflows/ci.yml"));
        assert!(findings.iter().any(|f| f.category.as_str() == "ci-cd" && f.severity == gate_core::Severity::P1));
    }

    #[test]
    fn flags_dockerfile_without_user() {
        let mut contents = HashMap::new();
        contents.insert("Dockerfile".to_string(), "FROM ubuntu\nRUN apt-get update\n".to_string());
        let findings = run(contents, ingest_file("Dockerfile"));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, gate_core::Severity::P2);
    }

    #[test]
    fn allows_dockerfile_with_user() {
        let mut contents = HashMap::new();
        contents.insert("Dockerfile".to_string(), "FROM ubuntu\nUSER app\n".to_string());
        let findings = run(contents, ingest_file("Dockerfile"));
        assert!(findings.is_empty());
    }

    #[test]
    fn flags_terraform_without_remote_backend() {
        let mut contents = HashMap::new();
        contents.insert("main.tf".to_string(), "resource \"aws_instance\" \"x\" {}\n".to_string());
        let findings = run(contents, ingest_file("main.tf"));
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn allows_terraform_with_s3_backend() {
        let mut contents = HashMap::new();
        contents.insert(
            "main.tf".to_string(),
            "terraform {\n  backend \"s3\" {\n    bucket = \"x\"\n  }\n}\n".to_string(),
        );
        let findings = run(contents, ingest_file("main.tf"));
        assert!(findings.is_empty());
    }
}
