// gate-core/src/core/ingest.rs
// ============================================================================
// Module: Omar Gate Ingest Snapshot
// Description: The worktree inventory produced by gate-ingest and consumed
//              by every scanner, the harness runner, and merge guardrails.
// Purpose: Give every downstream stage one read-only view of "what files
//          exist, what are they, and which ones matter".
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! `gate-ingest` is the only crate that constructs an [`Ingest`]. Everything
//! downstream — scanners, the harness runner, merge guardrails, the evidence
//! writer — treats it as a read-only snapshot of the worktree at scan time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RepoPath;

// ============================================================================
// SECTION: File Classification
// ============================================================================

/// Coarse classification assigned to every walked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    /// Source code in a recognized language.
    Source,
    /// Build/project configuration (manifests, lockfiles, IaC).
    Config,
    /// Test code.
    Test,
    /// Documentation.
    Doc,
    /// Generated or vendored code, still walked but never a scan target.
    Vendored,
    /// Binary file (sampled and found non-text).
    Binary,
    /// Anything that doesn't fit the above.
    Other,
}

/// Hotspot category a file may be flagged under, keyed by path/filename
/// pattern rather than content analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotspotCategory {
    /// Authentication/session code.
    Auth,
    /// Payment processing code.
    Payment,
    /// Cryptographic primitives or key handling.
    Crypto,
    /// Inbound webhook handlers.
    Webhook,
    /// Database access layers.
    Database,
    /// Deployment/infrastructure-as-code.
    Infrastructure,
}

// ============================================================================
// SECTION: Ingest File
// ============================================================================

/// One walked file and its derived metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestFile {
    /// Repository-relative path.
    pub path: RepoPath,
    /// Coarse classification.
    pub category: FileCategory,
    /// Detected language, if any (e.g. `"rust"`, `"python"`).
    pub language: Option<String>,
    /// Line count (text files only; zero for binary).
    pub lines: u32,
    /// Byte size on disk.
    pub bytes: u64,
    /// True if any hotspot pattern matched this file.
    pub is_hotspot: bool,
    /// Which hotspot categories matched, in match order.
    pub hotspot_reasons: Vec<HotspotCategory>,
}

// ============================================================================
// SECTION: Tech Stack
// ============================================================================

/// One detected technology, keyed by the manifest or marker file that
/// surfaced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechStackEntry {
    /// Human-readable technology name (e.g. `"Cargo (Rust)"`).
    pub name: String,
    /// Repository-relative path to the manifest that revealed it.
    pub evidence_path: RepoPath,
}

// ============================================================================
// SECTION: Ingest Stats
// ============================================================================

/// Aggregate counters over the walked file set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    /// Total files visited by the walker, including excluded/binary files.
    pub total_files: u32,
    /// Files classified as text (non-binary).
    pub text_files: u32,
    /// Files eligible for scanning (in-scope, not vendored/excluded).
    pub in_scope_files: u32,
    /// Sum of `lines` across all text files.
    pub total_lines: u64,
}

// ============================================================================
// SECTION: Ingest
// ============================================================================

/// The full worktree inventory for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ingest {
    /// Aggregate counters.
    pub stats: IngestStats,
    /// Every walked, in-scope file.
    pub files: Vec<IngestFile>,
    /// Hotspot category to matching paths, in walk order.
    pub hotspots: BTreeMap<HotspotCategory, Vec<RepoPath>>,
    /// Detected technologies, insertion order preserved (first manifest
    /// found for a technology wins; a `Vec` is used deliberately instead of
    /// a `HashSet` so this order is stable across runs).
    pub tech_stack: Vec<TechStackEntry>,
    /// True if the walk hit a size/count/byte cap before completing.
    pub truncated: bool,
}

impl Ingest {
    /// Returns true if `path` was walked and classified as in-scope.
    #[must_use]
    pub fn contains(&self, path: &RepoPath) -> bool {
        self.files.iter().any(|file| &file.path == path)
    }

    /// Returns the line count recorded for `path`, if it was walked.
    #[must_use]
    pub fn line_count(&self, path: &RepoPath) -> Option<u32> {
        self.files
            .iter()
            .find(|file| &file.path == path)
            .map(|file| file.lines)
    }
}

#[cfg(test)]
mod tests {
    use super::FileCategory;
    use super::Ingest;
    use super::IngestFile;
    use crate::core::identifiers::RepoPath;

    fn sample_file(path: &str, lines: u32) -> IngestFile {
        IngestFile {
            path: RepoPath::new(path),
            category: FileCategory::Source,
            language: Some("rust".to_string()),
            lines,
            bytes: u64::from(lines) * 20,
            is_hotspot: false,
            hotspot_reasons: Vec::new(),
        }
    }

    #[test]
    fn contains_and_line_count_reflect_walked_files() {
        let mut ingest = Ingest::default();
        ingest.files.push(sample_file("src/main.rs", 42));

        assert!(ingest.contains(&RepoPath::new("src/main.rs")));
        assert!(!ingest.contains(&RepoPath::new("src/other.rs")));
        assert_eq!(ingest.line_count(&RepoPath::new("src/main.rs")), Some(42));
        assert_eq!(ingest.line_count(&RepoPath::new("src/other.rs")), None);
    }
}
