// gate-providers/src/llm/context.rs
// ============================================================================
// Module: Analysis Context Builder
// Description: Assembles the bounded prompt body sent to an `LlmProvider`.
// Purpose: Turn a QuickLearn summary, the deterministic findings already on
//          hand, and the walked worktree into one token-budgeted block of
//          text, dropping whole sections before truncating within one.
// Dependencies: gate-core
// ============================================================================

use std::fs;
use std::path::Path;

use gate_core::Finding;
use gate_core::Ingest;
use gate_core::QuickLearn;
use gate_core::ScanMode;
use gate_core::Severity;

/// Number of lines of surrounding context included on either side of a
/// finding's line range when excerpting a hotspot file.
const HOTSPOT_WINDOW_LINES: usize = 5;

/// Maximum number of hotspot files excerpted, regardless of budget, so a
/// repository with hundreds of hotspot matches doesn't dominate assembly
/// time before truncation even runs.
const MAX_HOTSPOT_FILES: usize = 20;

/// Maximum number of general (entry-point) files excerpted.
const MAX_GENERAL_FILES: usize = 5;

/// Lines of a general excerpt file shown when no finding narrows it down.
const GENERAL_EXCERPT_LINES: usize = 40;

/// Assembles the bounded analysis prompt from QuickLearn, deterministic
/// findings, the ingest snapshot, and (in [`ScanMode::PrDiff`]) the PR diff.
pub struct ContextBuilder<'a> {
    quicklearn: &'a QuickLearn,
    findings: &'a [Finding],
    ingest: &'a Ingest,
    worktree_root: &'a Path,
    scan_mode: ScanMode,
    pr_diff: Option<&'a str>,
}

impl<'a> ContextBuilder<'a> {
    /// Creates a builder over one run's already-computed inputs.
    #[must_use]
    pub const fn new(
        quicklearn: &'a QuickLearn,
        findings: &'a [Finding],
        ingest: &'a Ingest,
        worktree_root: &'a Path,
        scan_mode: ScanMode,
        pr_diff: Option<&'a str>,
    ) -> Self {
        Self { quicklearn, findings, ingest, worktree_root, scan_mode, pr_diff }
    }

    /// Assembles the prompt body, truncated to `max_input_tokens`
    /// whitespace-split tokens.
    ///
    /// The QuickLearn summary and the deterministic-findings summary are
    /// always included; hotspot excerpts, general excerpts, and the PR diff
    /// are dropped whole, from lowest to highest priority (general first,
    /// then hotspot, then diff), before the remaining text is truncated
    /// within its own section.
    #[must_use]
    pub fn build(&self, max_input_tokens: usize) -> String {
        let mandatory = format!("{}\n\n{}", quicklearn_section(self.quicklearn), findings_section(self.findings));

        let diff = (self.scan_mode == ScanMode::PrDiff).then_some(self.pr_diff).flatten();
        let hotspot_text = hotspot_excerpts(self.findings, self.ingest, self.worktree_root);
        let general_text = general_excerpts(self.quicklearn, self.worktree_root);

        let mut sections: Vec<(u8, &'static str, String)> = Vec::new();
        if !general_text.is_empty() {
            sections.push((1, "general excerpts", general_text));
        }
        if !hotspot_text.is_empty() {
            sections.push((2, "hotspot excerpts", hotspot_text));
        }
        if let Some(diff_text) = diff {
            if !diff_text.is_empty() {
                sections.push((3, "pr diff", diff_text.to_string()));
            }
        }

        while !sections.is_empty() {
            let total = token_count(&mandatory) + sections.iter().map(|(_, _, text)| token_count(text)).sum::<usize>();
            if total <= max_input_tokens {
                break;
            }
            let Some(drop_index) = sections.iter().enumerate().min_by_key(|(_, (priority, _, _))| *priority).map(|(index, _)| index) else {
                break;
            };
            sections.remove(drop_index);
        }

        // Restore display order (hotspot, then general, then diff) regardless
        // of the priority order used above to decide what survived.
        sections.sort_by_key(|(priority, _, _)| match priority {
            2 => 0,
            1 => 1,
            _ => 2,
        });

        let mut assembled = mandatory;
        for (_, label, text) in &sections {
            assembled.push_str("\n\n## ");
            assembled.push_str(label);
            assembled.push('\n');
            assembled.push_str(text);
        }

        if token_count(&assembled) > max_input_tokens {
            assembled = truncate_tokens(&assembled, max_input_tokens);
        }

        assembled
    }
}

fn quicklearn_section(quicklearn: &QuickLearn) -> String {
    format!(
        "## project summary\nname: {}\ndescription: {}\ntech stack: {}\narchitecture: {}\n\n{}",
        quicklearn.project_name,
        quicklearn.description,
        quicklearn.tech_stack.join(", "),
        quicklearn.architecture,
        quicklearn.raw_excerpt,
    )
}

fn findings_section(findings: &[Finding]) -> String {
    let mut by_severity: Vec<(Severity, Vec<&Finding>)> =
        Severity::ALL.into_iter().map(|severity| (severity, Vec::new())).collect();
    for finding in findings {
        if let Some((_, bucket)) = by_severity.iter_mut().find(|(severity, _)| *severity == finding.severity) {
            bucket.push(finding);
        }
    }

    let mut out = format!("## deterministic findings ({} total)\n", findings.len());
    for (severity, bucket) in &by_severity {
        if bucket.is_empty() {
            continue;
        }
        out.push_str(&format!("{severity} ({} found):\n", bucket.len()));
        for finding in bucket.iter().take(5) {
            out.push_str(&format!(
                "- {}:{}-{} [{}] {}\n",
                finding.file_path, finding.line_start, finding.line_end, finding.category, finding.message
            ));
        }
    }
    out
}

fn hotspot_excerpts(findings: &[Finding], ingest: &Ingest, worktree_root: &Path) -> String {
    let mut paths: Vec<&gate_core::RepoPath> = ingest.hotspots.values().flatten().collect();
    paths.sort_by_key(|path| path.as_str());
    paths.dedup();
    paths.truncate(MAX_HOTSPOT_FILES);

    let mut out = String::new();
    for path in paths {
        let Ok(contents) = fs::read_to_string(worktree_root.join(path.as_str())) else {
            continue;
        };
        let lines: Vec<&str> = contents.lines().collect();

        let findings_in_file: Vec<&Finding> = findings.iter().filter(|finding| &finding.file_path == path).collect();
        let windows: Vec<(usize, usize)> = if findings_in_file.is_empty() {
            vec![(0, GENERAL_EXCERPT_LINES.min(lines.len()))]
        } else {
            findings_in_file
                .iter()
                .map(|finding| {
                    let start = (finding.line_start as usize).saturating_sub(1).saturating_sub(HOTSPOT_WINDOW_LINES);
                    let end = ((finding.line_end as usize) + HOTSPOT_WINDOW_LINES).min(lines.len());
                    (start, end)
                })
                .collect()
        };

        for (start, end) in windows {
            if start >= end {
                continue;
            }
            out.push_str(&format!("### {path} (lines {}-{})\n", start + 1, end));
            out.push_str(&lines[start..end].join("\n"));
            out.push('\n');
        }
    }
    out
}

fn general_excerpts(quicklearn: &QuickLearn, worktree_root: &Path) -> String {
    let mut out = String::new();
    for path in quicklearn.entry_points.iter().take(MAX_GENERAL_FILES) {
        let Ok(contents) = fs::read_to_string(worktree_root.join(path.as_str())) else {
            continue;
        };
        let excerpt: Vec<&str> = contents.lines().take(GENERAL_EXCERPT_LINES).collect();
        out.push_str(&format!("### {path}\n"));
        out.push_str(&excerpt.join("\n"));
        out.push('\n');
    }
    out
}

fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn truncate_tokens(text: &str, max_tokens: usize) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() <= max_tokens {
        return text.to_string();
    }
    tokens[..max_tokens].join(" ")
}

#[cfg(test)]
mod tests {
    use super::ContextBuilder;
    use gate_core::Category;
    use gate_core::Confidence;
    use gate_core::Finding;
    use gate_core::FindingId;
    use gate_core::FindingSource;
    use gate_core::Ingest;
    use gate_core::QuickLearn;
    use gate_core::RepoPath;
    use gate_core::ScanMode;
    use gate_core::Severity;
    use std::fs;

    fn sample_finding() -> Finding {
        Finding::new(
            FindingId::new("f-1"),
            Severity::P1,
            Category::new("auth"),
            FindingSource::Deterministic,
            RepoPath::new("src/auth.rs"),
            10,
            12,
            "snippet",
            "missing check",
            "add check",
            Confidence::default(),
        )
        .expect("valid range")
    }

    #[test]
    fn build_includes_mandatory_sections_even_at_a_tiny_budget() {
        let quicklearn = QuickLearn::new("demo", "a service", vec!["rust".to_string()], "single service", Vec::new(), None, "readme text");
        let findings = vec![sample_finding()];
        let ingest = Ingest::default();
        let dir = tempfile::tempdir().expect("tempdir");

        let builder = ContextBuilder::new(&quicklearn, &findings, &ingest, dir.path(), ScanMode::Deep, None);
        let text = builder.build(10);

        assert!(text.contains("project summary"));
        assert!(text.contains("deterministic findings"));
    }

    #[test]
    fn diff_is_omitted_outside_pr_diff_mode() {
        let quicklearn = QuickLearn::default();
        let findings = Vec::new();
        let ingest = Ingest::default();
        let dir = tempfile::tempdir().expect("tempdir");

        let builder = ContextBuilder::new(&quicklearn, &findings, &ingest, dir.path(), ScanMode::Deep, Some("+ line"));
        let text = builder.build(5_000);

        assert!(!text.contains("pr diff"));
    }

    #[test]
    fn diff_survives_truncation_before_general_excerpts() {
        let quicklearn = QuickLearn::new(
            "demo",
            "d",
            Vec::new(),
            "a",
            vec![RepoPath::new("src/main.rs")],
            None,
            "",
        );
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("src")).expect("mkdir");
        fs::write(dir.path().join("src/main.rs"), "fn main() {}\n".repeat(100)).expect("write");

        let findings = Vec::new();
        let ingest = Ingest::default();
        let diff_text = "diff --git a/src/main.rs b/src/main.rs\n".repeat(5);

        let builder = ContextBuilder::new(&quicklearn, &findings, &ingest, dir.path(), ScanMode::PrDiff, Some(&diff_text));
        let text = builder.build(30);

        assert!(text.contains("pr diff"));
    }
}
