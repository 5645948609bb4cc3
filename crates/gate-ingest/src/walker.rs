// gate-ingest/src/walker.rs
// ============================================================================
// Module: Worktree Walker
// Description: Walks a checked-out worktree into a populated `Ingest`.
// Purpose: Give every downstream stage (scanners, harness, merge guardrails)
//          one consistent, size-bounded inventory of the files at scan time.
// Dependencies: ignore, gate-core, crate::classify, crate::hotspots
// ============================================================================

//! ## Overview
//! [`Walker`] wraps an [`ignore::WalkBuilder`] configured with the fixed
//! exclusion list below plus `.gitignore`/`.sentinelayerignore` semantics,
//! and folds every visited file through [`crate::classify`] and
//! [`crate::hotspots`] into a [`gate_core::Ingest`]. Limits are enforced by
//! truncating the walk rather than by failing it: a repository that exceeds
//! a cap still gets a best-effort scan of what fit, with
//! [`gate_core::Ingest::truncated`] set so downstream stages and the summary
//! can say so.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use gate_core::FileCategory;
use gate_core::HotspotCategory;
use gate_core::Ingest;
use gate_core::IngestFile;
use gate_core::IngestStats;
use gate_core::RepoPath;
use gate_core::TechStackEntry;
use ignore::WalkBuilder;

use crate::classify;
use crate::hotspots;
use crate::techstack;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure reading the worktree root.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// `root` does not exist or is not a directory.
    #[error("ingest root `{0}` is not a directory")]
    RootNotADirectory(PathBuf),
}

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Size and count bounds applied while walking. Files beyond any bound are
/// skipped (not included in [`Ingest::files`]) and
/// [`Ingest::truncated`] is set, rather than aborting the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestLimits {
    /// Maximum bytes read from a single file; larger files are recorded as
    /// present but not content-classified (treated as [`FileCategory::Other`]
    /// with a zero line count).
    pub max_file_bytes: u64,
    /// Maximum number of in-scope files walked before the remainder of the
    /// tree is skipped.
    pub max_total_files: u32,
    /// Maximum cumulative bytes across all in-scope files before the
    /// remainder of the tree is skipped.
    pub max_total_bytes: u64,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: 1024 * 1024,
            max_total_files: 1000,
            max_total_bytes: 50 * 1024 * 1024,
        }
    }
}

// ============================================================================
// SECTION: Directory Exclusions
// ============================================================================

/// Directory basenames never descended into, regardless of `.gitignore`
/// contents. Matched case-sensitively against the directory's own name.
const EXCLUDED_DIR_NAMES: [&str; 14] = [
    ".git",
    "node_modules",
    "vendor",
    "dist",
    "build",
    "target",
    ".venv",
    "venv",
    "__pycache__",
    ".tox",
    ".idea",
    ".vscode",
    ".cache",
    ".next",
];

/// The custom ignore-file name consulted in addition to `.gitignore`,
/// letting a repository exclude paths from Omar Gate's ingest specifically
/// without affecting version control.
pub const CUSTOM_IGNORE_FILE: &str = ".sentinelayerignore";

/// Returns true if any path component of `path` is an excluded directory
/// name.
fn has_excluded_component(path: &Path) -> bool {
    path.components()
        .filter_map(|c| c.as_os_str().to_str())
        .any(|name| EXCLUDED_DIR_NAMES.contains(&name))
}

// ============================================================================
// SECTION: Walker
// ============================================================================

/// Walks a worktree root into a populated [`Ingest`].
#[derive(Debug, Clone, Copy)]
pub struct Walker {
    /// Size and count bounds applied to the walk.
    limits: IngestLimits,
}

impl Walker {
    /// Creates a walker with the given limits.
    #[must_use]
    pub fn new(limits: IngestLimits) -> Self {
        Self { limits }
    }

    /// Walks `root` and returns the resulting [`Ingest`].
    ///
    /// # Errors
    /// Returns [`IngestError::RootNotADirectory`] if `root` is not an
    /// existing directory.
    pub fn walk(&self, root: &Path) -> Result<Ingest, IngestError> {
        if !root.is_dir() {
            return Err(IngestError::RootNotADirectory(root.to_path_buf()));
        }

        let mut files = Vec::new();
        let mut hotspots: BTreeMap<HotspotCategory, Vec<RepoPath>> = BTreeMap::new();
        let mut tech_stack: Vec<TechStackEntry> = Vec::new();
        let mut stats = IngestStats::default();
        let mut total_bytes: u64 = 0;
        let mut truncated = false;

        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(false)
            .git_ignore(true)
            .git_exclude(true)
            .parents(true)
            .add_custom_ignore_filename(CUSTOM_IGNORE_FILE);

        for entry in builder.build() {
            let Ok(entry) = entry else {
                continue;
            };
            let path = entry.path();

            if path == root {
                continue;
            }
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            if has_excluded_component(relative) {
                continue;
            }

            let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
            if !is_file {
                continue;
            }

            if stats.total_files >= self.limits.max_total_files || total_bytes >= self.limits.max_total_bytes {
                truncated = true;
                continue;
            }

            let metadata = match fs::metadata(path) {
                Ok(metadata) => metadata,
                Err(_) => continue,
            };
            let byte_len = metadata.len();

            let repo_path = RepoPath::new(relative.to_string_lossy().replace('\\', "/"));

            if byte_len > self.limits.max_file_bytes {
                stats.total_files += 1;
                files.push(IngestFile {
                    path: repo_path,
                    category: FileCategory::Other,
                    language: None,
                    lines: 0,
                    bytes: byte_len,
                    is_hotspot: false,
                    hotspot_reasons: Vec::new(),
                });
                truncated = true;
                continue;
            }

            let Ok(contents) = fs::read(path) else {
                continue;
            };
            let sample_len = contents.len().min(classify::BINARY_SAMPLE_BYTES);
            let is_binary = classify::looks_binary(&contents[..sample_len]);
            let language = classify::infer_language(relative);
            let category = classify::classify(relative, is_binary, language.as_deref());

            let line_count = if is_binary {
                0
            } else {
                u32::try_from(contents.iter().filter(|&&b| b == b'\n').count().saturating_add(1)).unwrap_or(u32::MAX)
            };

            let hotspot_reasons = hotspots::matching_categories(relative);
            let is_hotspot = !hotspot_reasons.is_empty();
            for category in &hotspot_reasons {
                hotspots.entry(*category).or_default().push(repo_path.clone());
            }

            if let Some(entry) = techstack::from_manifest(relative) {
                push_unique_tech(&mut tech_stack, entry);
            }
            if let Some(entry) = techstack::from_terraform(relative) {
                push_unique_tech(&mut tech_stack, entry);
            }
            if !is_binary && is_readme(relative) {
                if let Ok(text) = String::from_utf8(contents.clone()) {
                    for entry in techstack::from_readme(relative, &text) {
                        push_unique_tech(&mut tech_stack, entry);
                    }
                }
            }

            stats.total_files += 1;
            total_bytes += byte_len;
            if !is_binary {
                stats.text_files += 1;
                stats.total_lines += u64::from(line_count);
            }
            if !matches!(category, FileCategory::Binary | FileCategory::Vendored) {
                stats.in_scope_files += 1;
            }

            files.push(IngestFile {
                path: repo_path,
                category,
                language,
                lines: line_count,
                bytes: byte_len,
                is_hotspot,
                hotspot_reasons,
            });
        }

        Ok(Ingest { stats, files, hotspots, tech_stack, truncated })
    }
}

/// Returns true if `path`'s basename starts with `readme` (case-insensitive).
fn is_readme(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.to_ascii_lowercase().starts_with("readme"))
}

/// Appends `entry` to `tech_stack` unless a same-named entry is already
/// present, preserving first-seen order.
fn push_unique_tech(tech_stack: &mut Vec<TechStackEntry>, entry: TechStackEntry) {
    if !tech_stack.iter().any(|existing| existing.name == entry.name) {
        tech_stack.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::IngestLimits;
    use super::Walker;
    use gate_core::FileCategory;
    use gate_core::HotspotCategory;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn walks_a_small_tree_and_classifies_files() {
        let dir = tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("src/auth")).expect("mkdir");
        fs::write(dir.path().join("src/auth/login.rs"), "fn login() {}\n").expect("write");
        fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"demo\"\n").expect("write");
        fs::write(dir.path().join("README.md"), "# Demo\n\nBuilt with React.\n").expect("write");

        let walker = Walker::new(IngestLimits::default());
        let ingest = walker.walk(dir.path()).expect("walk succeeds");

        assert_eq!(ingest.stats.total_files, 3);
        assert!(ingest.contains(&gate_core::RepoPath::new("src/auth/login.rs")));
        assert!(ingest.hotspots.get(&HotspotCategory::Auth).is_some());
        assert!(ingest.tech_stack.iter().any(|t| t.name == "Cargo (Rust)"));
        assert!(ingest.tech_stack.iter().any(|t| t.name == "React"));
    }

    #[test]
    fn excludes_git_and_vendor_directories() {
        let dir = tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join(".git")).expect("mkdir");
        fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/main\n").expect("write");
        fs::create_dir_all(dir.path().join("vendor/lib")).expect("mkdir");
        fs::write(dir.path().join("vendor/lib/x.rs"), "fn x() {}\n").expect("write");
        fs::write(dir.path().join("main.rs"), "fn main() {}\n").expect("write");

        let walker = Walker::new(IngestLimits::default());
        let ingest = walker.walk(dir.path()).expect("walk succeeds");

        assert_eq!(ingest.stats.total_files, 1);
        assert!(ingest.contains(&gate_core::RepoPath::new("main.rs")));
    }

    #[test]
    fn respects_sentinelayerignore() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join(".sentinelayerignore"), "secret_dump.txt\n").expect("write");
        fs::write(dir.path().join("secret_dump.txt"), "should be skipped\n").expect("write");
        fs::write(dir.path().join("main.rs"), "fn main() {}\n").expect("write");

        let walker = Walker::new(IngestLimits::default());
        let ingest = walker.walk(dir.path()).expect("walk succeeds");

        assert!(!ingest.contains(&gate_core::RepoPath::new("secret_dump.txt")));
        assert!(ingest.contains(&gate_core::RepoPath::new("main.rs")));
    }

    #[test]
    fn oversized_file_is_marked_other_and_truncates() {
        let dir = tempdir().expect("tempdir");
        let limits = IngestLimits { max_file_bytes: 10, ..IngestLimits::default() };
        fs::write(dir.path().join("big.txt"), "this file is definitely over ten bytes\n").expect("write");

        let walker = Walker::new(limits);
        let ingest = walker.walk(dir.path()).expect("walk succeeds");

        assert!(ingest.truncated);
        let file = ingest.files.iter().find(|f| f.path.as_str() == "big.txt").expect("present");
        assert_eq!(file.category, FileCategory::Other);
        assert_eq!(file.lines, 0);
    }

    #[test]
    fn file_count_cap_truncates_walk() {
        let dir = tempdir().expect("tempdir");
        for i in 0..5 {
            fs::write(dir.path().join(format!("f{i}.rs")), "fn f() {}\n").expect("write");
        }
        let limits = IngestLimits { max_total_files: 2, ..IngestLimits::default() };

        let walker = Walker::new(limits);
        let ingest = walker.walk(dir.path()).expect("walk succeeds");

        assert!(ingest.truncated);
        assert_eq!(ingest.stats.total_files, 2);
    }

    #[test]
    fn missing_root_is_an_error() {
        let walker = Walker::new(IngestLimits::default());
        assert!(walker.walk(std::path::Path::new("/does/not/exist")).is_err());
    }
}
