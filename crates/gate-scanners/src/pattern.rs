// gate-scanners/src/pattern.rs
// ============================================================================
// Module: Pattern Scanner
// Description: Baked-in regex rule table, keyed by language and glob.
// Purpose: Catch known-bad constructs (weak crypto, unsafe deserialization,
//          shell injection, disabled TLS verification) by source text alone.
// Dependencies: gate-core, regex
// ============================================================================

//! ## Overview
//! Rules are not user-loadable: the table in [`RULES`] is the entire rule
//! set, compiled once in [`PatternScanner::new`]. For JavaScript/TypeScript
//! files, comments and string literals are blanked (replaced with spaces,
//! preserving byte and line offsets) before matching, via
//! [`blank_js_comments_and_strings`] — a small state-machine lexer, not a
//! full parser, so a regex rule never fires on a string literal that merely
//! mentions a dangerous function by name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;

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

// ============================================================================
// SECTION: Rule Table
// ============================================================================

/// One baked-in pattern rule.
struct PatternRule {
    /// Language this rule applies to, or `None` for any language.
    language: Option<&'static str>,
    /// Regex pattern, compiled once at scanner construction.
    pattern: &'static str,
    /// Category tag applied to findings from this rule.
    category: &'static str,
    /// Severity applied to findings from this rule.
    severity: Severity,
    /// Human-readable message.
    message: &'static str,
    /// Suggested remediation.
    recommendation: &'static str,
}

/// The complete, baked-in pattern rule set.
const RULES: &[PatternRule] = &[
    PatternRule {
        language: Some("python"),
        pattern: r"\bos\.system\(|\bsubprocess\.(call|run|Popen)\([^)]*shell\s*=\s*True",
        category: "command-injection",
        severity: Severity::P1,
        message: "Shell command built from a string, risking command injection.",
        recommendation: "Pass argv as a list and avoid shell=True; use subprocess with shell=False.",
    },
    PatternRule {
        language: Some("python"),
        pattern: r"\bpickle\.loads?\(",
        category: "unsafe-deserialization",
        severity: Severity::P1,
        message: "Deserializing untrusted data with pickle can execute arbitrary code.",
        recommendation: "Use a safe serialization format (JSON) for untrusted input.",
    },
    PatternRule {
        language: Some("python"),
        pattern: r"\byaml\.load\(\s*[^)]*\)",
        category: "unsafe-deserialization",
        severity: Severity::P2,
        message: "yaml.load without a safe loader can execute arbitrary code on crafted input.",
        recommendation: "Use yaml.safe_load or pass Loader=yaml.SafeLoader explicitly.",
    },
    PatternRule {
        language: None,
        pattern: r#"\bmd5\(|\bhashlib\.md5\(|MD5\.Create\(|crypto\.createHash\(['"]md5['"]\)"#,
        category: "weak-crypto",
        severity: Severity::P2,
        message: "MD5 is not collision-resistant and should not be used for security purposes.",
        recommendation: "Use SHA-256 or a purpose-built password hash (bcrypt, argon2).",
    },
    PatternRule {
        language: None,
        pattern: r#"\bDES\.new\(|\bDES3\.new\(|createCipheriv\(['"]des"#,
        category: "weak-crypto",
        severity: Severity::P1,
        message: "DES/3DES is broken for modern use and should not protect sensitive data.",
        recommendation: "Use AES-256-GCM or another modern AEAD cipher.",
    },
    PatternRule {
        language: Some("python"),
        pattern: r"verify\s*=\s*False",
        category: "tls-verification-disabled",
        severity: Severity::P1,
        message: "TLS certificate verification is explicitly disabled.",
        recommendation: "Remove verify=False and fix the underlying certificate trust issue.",
    },
    PatternRule {
        language: None,
        pattern: r#"NODE_TLS_REJECT_UNAUTHORIZED\s*=\s*.?0|rejectUnauthorized\s*:\s*false"#,
        category: "tls-verification-disabled",
        severity: Severity::P1,
        message: "TLS certificate verification is disabled for Node.js HTTPS requests.",
        recommendation: "Remove the override and fix the certificate chain instead.",
    },
    PatternRule {
        language: None,
        pattern: r"InsecureSkipVerify\s*:\s*true",
        category: "tls-verification-disabled",
        severity: Severity::P1,
        message: "Go TLS client configured to skip certificate verification.",
        recommendation: "Remove InsecureSkipVerify and supply a proper certificate pool.",
    },
    PatternRule {
        language: Some("javascript"),
        pattern: r"\bchild_process\.exec\(",
        category: "command-injection",
        severity: Severity::P1,
        message: "child_process.exec runs a shell command string, risking injection.",
        recommendation: "Use child_process.execFile or spawn with an explicit argv array.",
    },
    PatternRule {
        language: None,
        pattern: r"Math\.random\(\)[^;]{0,40}(token|password|secret|session)",
        category: "insecure-randomness",
        severity: Severity::P2,
        message: "Math.random is not cryptographically secure and should not seed tokens or secrets.",
        recommendation: "Use crypto.randomBytes or another CSPRNG for security-sensitive values.",
    },
];

// ============================================================================
// SECTION: JS/TS Comment and String Blanking
// ============================================================================

/// Replaces comments and string literal contents in `source` with spaces,
/// preserving byte length and line structure, so pattern rules never match
/// inside a string or comment. This is a small lexer over `//`, `/* */`,
/// `'`, `"`, and template literals — not a full JavaScript/TypeScript
/// parser.
#[must_use]
pub fn blank_js_comments_and_strings(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out: Vec<u8> = bytes.to_vec();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    blank_byte(&mut out, i);
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                blank_byte(&mut out, i);
                blank_byte(&mut out, i + 1);
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    blank_byte(&mut out, i);
                    i += 1;
                }
                if i + 1 < bytes.len() {
                    blank_byte(&mut out, i);
                    blank_byte(&mut out, i + 1);
                    i += 2;
                }
            }
            quote @ (b'\'' | b'"' | b'`') => {
                blank_byte(&mut out, i);
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' && i + 1 < bytes.len() {
                        blank_byte(&mut out, i);
                        blank_byte(&mut out, i + 1);
                        i += 2;
                        continue;
                    }
                    blank_byte(&mut out, i);
                    i += 1;
                }
                if i < bytes.len() {
                    blank_byte(&mut out, i);
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    // SAFETY-free: `out` only ever replaces ASCII bytes with a single ASCII
    // space, so UTF-8 validity of the original source is preserved.
    String::from_utf8(out).unwrap_or_else(|_| source.to_string())
}

/// Replaces byte `index` with a space unless it is a newline, preserving
/// line structure for downstream line-number reporting.
fn blank_byte(out: &mut [u8], index: usize) {
    if out[index] != b'\n' {
        out[index] = b' ';
    }
}

// ============================================================================
// SECTION: Scanner
// ============================================================================

/// Compiled rule paired with its source table entry.
struct CompiledRule {
    /// Source table entry this regex was compiled from.
    rule: &'static PatternRule,
    /// Compiled regex.
    regex: Regex,
}

/// Baked-in regex pattern scanner.
pub struct PatternScanner {
    /// Every rule in [`RULES`], compiled once.
    compiled: Vec<CompiledRule>,
}

impl PatternScanner {
    /// Builds the scanner, compiling every rule in [`RULES`].
    ///
    /// # Panics
    /// Panics if a baked-in rule's regex fails to compile; this indicates a
    /// bug in [`RULES`] itself and can only happen at construction, not at
    /// scan time.
    #[must_use]
    #[allow(clippy::expect_used, reason = "RULES is a fixed, test-covered table; a bad regex is a build-time bug")]
    pub fn new() -> Self {
        let compiled = RULES
            .iter()
            .map(|rule| CompiledRule {
                rule,
                regex: Regex::new(rule.pattern).expect("baked-in pattern rule must compile"),
            })
            .collect();
        Self { compiled }
    }
}

impl Default for PatternScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner for PatternScanner {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn scan(
        &self,
        files: &[IngestFile],
        read: &dyn Fn(&RepoPath) -> io::Result<String>,
        _context: &Context,
    ) -> Result<Vec<Finding>, ScannerError> {
        let mut findings = Vec::new();
        let mut next_id: u64 = 0;

        for file in files {
            if !matches!(file.category, gate_core::FileCategory::Source) {
                continue;
            }
            let Some(language) = file.language.as_deref() else {
                continue;
            };
            let text = read(&file.path).map_err(|source| ScannerError::Read {
                scanner: "pattern",
                path: file.path.clone(),
                source,
            })?;
            let searched = if matches!(language, "javascript" | "typescript") {
                blank_js_comments_and_strings(&text)
            } else {
                text
            };

            for compiled in &self.compiled {
                if let Some(rule_language) = compiled.rule.language {
                    if rule_language != language {
                        continue;
                    }
                }
                for mat in compiled.regex.find_iter(&searched) {
                    let line = searched[..mat.start()].bytes().filter(|&b| b == b'\n').count() as u32 + 1;
                    next_id += 1;
                    let finding = Finding::new(
                        FindingId::new(format!("pattern-{next_id}")),
                        compiled.rule.severity,
                        Category::new(compiled.rule.category),
                        FindingSource::Deterministic,
                        file.path.clone(),
                        line,
                        line,
                        mat.as_str(),
                        compiled.rule.message,
                        compiled.rule.recommendation,
                        Confidence::default(),
                    )
                    .map_err(|source| ScannerError::InvalidFinding {
                        scanner: "pattern",
                        reason: source.to_string(),
                    })?;
                    findings.push(finding);
                }
            }
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::blank_js_comments_and_strings;
    use super::PatternScanner;
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

    fn ingest_file(path: &str, language: &str) -> IngestFile {
        IngestFile {
            path: RepoPath::new(path),
            category: FileCategory::Source,
            language: Some(language.to_string()),
            lines: 1,
            bytes: 40,
            is_hotspot: false,
            hotspot_reasons: Vec::new(),
        }
    }

    #[test]
    fn blanking_preserves_length_and_line_count() {
        let source = "const a = \"os.system('rm -rf /')\"; // os.system(\"x\")\nconst b = 1;\n";
        let blanked = blank_js_comments_and_strings(source);
        assert_eq!(blanked.len(), source.len());
        assert_eq!(blanked.lines().count(), source.lines().count());
        assert!(!blanked.contains("os.system"));
    }

    #[test]
    fn flags_shell_true_in_python() {
        let mut contents = HashMap::new();
        contents.insert(
            "app.py".to_string(),
            "subprocess.run(cmd, shell=True)\n".to_string(),
        );
        let file = ingest_file("app.py", "python");
        let scanner = PatternScanner::new();
        let findings = scanner
            .scan(&[file], &|path| contents.get(path.as_str()).cloned().ok_or_else(|| std::io::Error::other("missing")), &sample_context())
            .expect("scan succeeds");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category.as_str(), "command-injection");
    }

    #[test]
    fn does_not_flag_mention_inside_js_string_literal() {
        let mut contents = HashMap::new();
        contents.insert(
            "app.js".to_string(),
            "const msg = \"never call child_process.exec() here\";\n".to_string(),
        );
        let file = ingest_file("app.js", "javascript");
        let scanner = PatternScanner::new();
        let findings = scanner
            .scan(&[file], &|path| contents.get(path.as_str()).cloned().ok_or_else(|| std::io::Error::other("missing")), &sample_context())
            .expect("scan succeeds");
        assert!(findings.is_empty());
    }

    #[test]
    fn ignores_binary_and_non_source_files() {
        let mut contents = HashMap::new();
        contents.insert("data.bin".to_string(), "os.system('x')".to_string());
        let mut file = ingest_file("data.bin", "python");
        file.category = FileCategory::Binary;
        let scanner = PatternScanner::new();
        let findings = scanner
            .scan(&[file], &|path| contents.get(path.as_str()).cloned().ok_or_else(|| std::io::Error::other("missing")), &sample_context())
            .expect("scan succeeds");
        assert!(findings.is_empty());
    }
}
