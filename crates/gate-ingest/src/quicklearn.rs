// gate-ingest/src/quicklearn.rs
// ============================================================================
// Module: QuickLearn Builder
// Description: Derives a `QuickLearn` project orientation from the walked
//              `Ingest` and the worktree's manifests/README, with no model
//              call involved.
// Purpose: Give the LLM analyzer and published summary a cheap project
//          orientation before any LLM call is made.
// Dependencies: gate-core::core::quicklearn, crate::walker
// ============================================================================

//! ## Overview
//! Every field here is derived from bytes already on disk: the nearest
//! manifest's name field, the first `README*` found, and a short list of
//! recognized entry-point file names. This module has no dependency on
//! `gate-providers`, which is what keeps [`gate_core::QuickLearn`]
//! structurally incapable of an LLM round trip.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use gate_core::Ingest;
use gate_core::QuickLearn;
use gate_core::RepoPath;

// ============================================================================
// SECTION: Entry Point Detection
// ============================================================================

/// File basenames recognized as language entry points, checked against each
/// ingested file's final path component.
const ENTRY_POINT_NAMES: [&str; 7] = ["main.rs", "main.py", "main.go", "index.js", "index.ts", "app.py", "server.js"];

/// Returns every ingested file whose basename is a recognized entry point,
/// in walk order.
fn entry_points(ingest: &Ingest) -> Vec<RepoPath> {
    ingest
        .files
        .iter()
        .filter(|file| {
            Path::new(file.path.as_str())
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| ENTRY_POINT_NAMES.contains(&name))
        })
        .map(|file| file.path.clone())
        .collect()
}

// ============================================================================
// SECTION: Manifest Name/Description Extraction
// ============================================================================

/// Pulls a quoted value following `key = "` (TOML) or `"key": "` (JSON) out
/// of `text`, returning the first match.
fn extract_quoted_field(text: &str, key: &str) -> Option<String> {
    for pattern in [format!("{key} = \""), format!("\"{key}\": \""), format!("\"{key}\":\"")] {
        if let Some(start) = text.find(pattern.as_str()) {
            let rest = &text[start + pattern.len()..];
            if let Some(end) = rest.find('"') {
                return Some(rest[..end].to_string());
            }
        }
    }
    None
}

/// Reads the nearest manifest's `name` and `description` fields, if present.
fn manifest_identity(root: &Path, ingest: &Ingest) -> (Option<String>, Option<String>) {
    const MANIFEST_NAMES: [&str; 3] = ["Cargo.toml", "package.json", "pyproject.toml"];

    for manifest_name in MANIFEST_NAMES {
        let found = ingest.files.iter().find(|file| {
            Path::new(file.path.as_str()).file_name().and_then(|n| n.to_str()) == Some(manifest_name)
        });
        let Some(file) = found else {
            continue;
        };
        let Ok(text) = fs::read_to_string(root.join(file.path.as_str())) else {
            continue;
        };
        let name = extract_quoted_field(&text, "name");
        let description = extract_quoted_field(&text, "description");
        if name.is_some() || description.is_some() {
            return (name, description);
        }
    }
    (None, None)
}

// ============================================================================
// SECTION: Architecture Heuristic
// ============================================================================

/// Counts top-level manifest occurrences across the ingest to guess whether
/// this is a monorepo (more than one manifest of the same kind, or manifests
/// at more than one directory depth) or a single service.
fn architecture_note(ingest: &Ingest) -> String {
    const MANIFEST_NAMES: [&str; 4] = ["Cargo.toml", "package.json", "pyproject.toml", "go.mod"];
    let manifest_count = ingest
        .files
        .iter()
        .filter(|file| {
            Path::new(file.path.as_str()).file_name().and_then(|n| n.to_str()).is_some_and(|n| MANIFEST_NAMES.contains(&n))
        })
        .count();
    if manifest_count > 1 {
        "monorepo".to_string()
    } else {
        "single service".to_string()
    }
}

// ============================================================================
// SECTION: README Discovery
// ============================================================================

/// Returns the first ingested `README*` file's path and contents, if any.
fn readme(root: &Path, ingest: &Ingest) -> Option<(RepoPath, String)> {
    let file = ingest.files.iter().find(|file| {
        Path::new(file.path.as_str()).file_name().and_then(|n| n.to_str()).is_some_and(|n| n.to_ascii_lowercase().starts_with("readme"))
    })?;
    let text = fs::read_to_string(root.join(file.path.as_str())).ok()?;
    Some((file.path.clone(), text))
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds a [`QuickLearn`] from `root` and its already-walked `ingest`.
#[must_use]
pub fn build(root: &Path, ingest: &Ingest) -> QuickLearn {
    let (manifest_name, manifest_description) = manifest_identity(root, ingest);
    let (source_doc, raw_excerpt) = match readme(root, ingest) {
        Some((path, text)) => (Some(path), text),
        None => (None, String::new()),
    };

    let project_name = manifest_name.unwrap_or_else(|| {
        root.file_name().and_then(|n| n.to_str()).map(str::to_string).unwrap_or_else(|| "unknown".to_string())
    });
    let description = manifest_description.unwrap_or_default();
    let tech_stack = ingest.tech_stack.iter().map(|entry| entry.name.clone()).collect();
    let architecture = architecture_note(ingest);
    let entry_points = entry_points(ingest);

    QuickLearn::new(project_name, description, tech_stack, architecture, entry_points, source_doc, raw_excerpt)
}

#[cfg(test)]
mod tests {
    use super::build;
    use crate::walker::IngestLimits;
    use crate::walker::Walker;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn derives_project_name_from_cargo_manifest() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"widget-gate\"\ndescription = \"a widget\"\n")
            .expect("write");
        fs::create_dir_all(dir.path().join("src")).expect("mkdir");
        fs::write(dir.path().join("src/main.rs"), "fn main() {}\n").expect("write");

        let ingest = Walker::new(IngestLimits::default()).walk(dir.path()).expect("walk");
        let quick_learn = build(dir.path(), &ingest);

        assert_eq!(quick_learn.project_name, "widget-gate");
        assert_eq!(quick_learn.description, "a widget");
        assert_eq!(quick_learn.architecture, "single service");
        assert!(quick_learn.entry_points.iter().any(|p| p.as_str() == "src/main.rs"));
    }

    #[test]
    fn falls_back_to_directory_name_without_manifest() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("notes.txt"), "no manifest here\n").expect("write");

        let ingest = Walker::new(IngestLimits::default()).walk(dir.path()).expect("walk");
        let quick_learn = build(dir.path(), &ingest);

        assert!(!quick_learn.project_name.is_empty());
        assert!(quick_learn.source_doc.is_none());
    }

    #[test]
    fn multiple_manifests_are_reported_as_monorepo() {
        let dir = tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("service-a")).expect("mkdir");
        fs::create_dir_all(dir.path().join("service-b")).expect("mkdir");
        fs::write(dir.path().join("service-a/package.json"), "{\"name\": \"a\"}").expect("write");
        fs::write(dir.path().join("service-b/package.json"), "{\"name\": \"b\"}").expect("write");

        let ingest = Walker::new(IngestLimits::default()).walk(dir.path()).expect("walk");
        let quick_learn = build(dir.path(), &ingest);

        assert_eq!(quick_learn.architecture, "monorepo");
    }
}
