// gate-cli/src/diff.rs
// ============================================================================
// Module: PR Diff
// Description: Shells out to `git diff` for the head-vs-base unified diff and
//              parses it into per-file added-line ranges.
// Purpose: Give merge's PR-diff guardrail the `added_lines` map it needs,
//          and the LLM context builder the raw diff text, without either of
//          those crates depending on a git binary directly.
// Dependencies: gate-core, std::process
// ============================================================================

//! ## Overview
//! [`fetch`] runs `git diff --unified=0 <base>..<head>` against the checked
//! out worktree, the same explicit-argv, no-shell discipline
//! `gate_harness::process` uses for its subprocess tools. Only `ScanMode::PrDiff`
//! runs ever call this; other scan modes have no base commit to diff against.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;
use std::process::Stdio;

use gate_core::RepoPath;
use gate_core::merge::LineRange;

/// Failure produced while fetching or parsing the PR diff.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// `git` could not be spawned.
    #[error("failed to spawn git diff: {0}")]
    Spawn(String),
    /// `git diff` exited non-zero.
    #[error("git diff exited with status {0}")]
    NonZeroExit(i32),
    /// The diff output was not valid UTF-8.
    #[error("git diff output was not utf-8")]
    NotUtf8,
}

/// The head-vs-base diff: raw unified text plus the added-line ranges per
/// file that [`gate_core::merge::MergeInputs::added_lines`] expects.
pub struct PrDiff {
    /// Raw unified diff text, passed to the LLM context builder verbatim.
    pub text: String,
    /// Added-line ranges, one entry per touched file, in hunk order.
    pub added_lines: BTreeMap<RepoPath, Vec<LineRange>>,
}

/// Runs `git diff --unified=0 base..head` in `worktree_root` and parses the
/// result.
///
/// # Errors
///
/// Returns [`DiffError`] if `git` cannot be spawned, exits non-zero, or
/// produces non-UTF-8 output.
pub fn fetch(worktree_root: &Path, base_sha: &str, head_sha: &str) -> Result<PrDiff, DiffError> {
    let range = format!("{base_sha}..{head_sha}");
    let output = Command::new("git")
        .args(["diff", "--unified=0", "--no-color", &range])
        .current_dir(worktree_root)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| DiffError::Spawn(source.to_string()))?;

    if !output.status.success() {
        return Err(DiffError::NonZeroExit(output.status.code().unwrap_or(-1)));
    }

    let text = String::from_utf8(output.stdout).map_err(|_| DiffError::NotUtf8)?;
    let added_lines = parse_added_lines(&text);
    Ok(PrDiff { text, added_lines })
}

/// Parses a `--unified=0` diff into per-file added-line ranges, reading only
/// `+++ b/<path>` file headers and `@@ -a,b +c,d @@` hunk headers.
fn parse_added_lines(diff_text: &str) -> BTreeMap<RepoPath, Vec<LineRange>> {
    let mut result: BTreeMap<RepoPath, Vec<LineRange>> = BTreeMap::new();
    let mut current_file: Option<RepoPath> = None;

    for line in diff_text.lines() {
        if let Some(path) = line.strip_prefix("+++ b/") {
            current_file = Some(RepoPath::new(path));
            continue;
        }
        if line.starts_with("+++ /dev/null") {
            current_file = None;
            continue;
        }
        if let Some(hunk) = line.strip_prefix("@@ ") {
            let Some(file) = current_file.clone() else { continue };
            if let Some(range) = parse_hunk_new_range(hunk) {
                result.entry(file).or_default().push(range);
            }
        }
    }

    result
}

/// Parses the `+c,d` (or `+c`) portion of a `@@ -a,b +c,d @@ ...` hunk
/// header into an inclusive [`LineRange`]. Returns `None` for a zero-length
/// (pure deletion) hunk, which adds no lines.
fn parse_hunk_new_range(hunk: &str) -> Option<LineRange> {
    let plus_field = hunk.split('+').nth(1)?.split(' ').next()?;
    let mut parts = plus_field.splitn(2, ',');
    let start: u32 = parts.next()?.parse().ok()?;
    let len: u32 = parts.next().map_or(Ok(1), str::parse).ok()?;
    if len == 0 {
        return None;
    }
    Some(LineRange { start, end: start + len - 1 })
}

#[cfg(test)]
mod tests {
    use super::parse_added_lines;

    #[test]
    fn single_hunk_added_lines_are_captured() {
        let diff = "diff --git a/src/auth.rs b/src/auth.rs\n\
                    --- a/src/auth.rs\n\
                    +++ b/src/auth.rs\n\
                    @@ -10,0 +11,3 @@\n\
                    +fn new_fn() {}\n";
        let added = parse_added_lines(diff);
        let ranges = added.get(&gate_core::RepoPath::new("src/auth.rs")).expect("file present");
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start, 11);
        assert_eq!(ranges[0].end, 13);
    }

    #[test]
    fn pure_deletion_hunk_adds_no_range() {
        let diff = "diff --git a/a.rs b/a.rs\n\
                    --- a/a.rs\n\
                    +++ b/a.rs\n\
                    @@ -5,3 +5,0 @@\n\
                    -removed line\n";
        let added = parse_added_lines(diff);
        assert!(added.get(&gate_core::RepoPath::new("a.rs")).is_none());
    }
}
