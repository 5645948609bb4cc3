// gate-ingest/src/techstack.rs
// ============================================================================
// Module: Tech Stack Detection
// Description: Manifest- and README-based technology inference.
// Purpose: Populate `Ingest.tech_stack` and drive stack-aware scanner
//          selection in gate-scanners, without ever invoking an LLM.
// Dependencies: gate-core::core::ingest
// ============================================================================

//! ## Overview
//! Detection is purely name- and content-pattern based: a manifest file's
//! presence, or a README keyword, maps to a fixed technology name. No
//! heuristic here ever calls out to [`gate_core`]'s LLM collaborator traits
//! (there is no dependency edge to do so) — this keeps `QuickLearn`
//! structurally incapable of an LLM round trip.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use gate_core::RepoPath;
use gate_core::TechStackEntry;

// ============================================================================
// SECTION: Manifest-Based Detection
// ============================================================================

/// One manifest file name (matched as the file's basename, case-sensitive
/// for names that are conventionally cased) mapped to the technology name
/// it reveals.
const MANIFEST_MARKERS: [(&str, &str); 9] = [
    ("package.json", "Node.js"),
    ("package-lock.json", "npm"),
    ("yarn.lock", "Yarn"),
    ("pnpm-lock.yaml", "pnpm"),
    ("pyproject.toml", "Python (pyproject)"),
    ("requirements.txt", "Python (pip)"),
    ("go.mod", "Go modules"),
    ("Cargo.toml", "Cargo (Rust)"),
    ("Dockerfile", "Docker"),
];

/// Returns a [`TechStackEntry`] if `path`'s basename is a recognized
/// manifest marker.
#[must_use]
pub fn from_manifest(path: &Path) -> Option<TechStackEntry> {
    let name = path.file_name()?.to_str()?;
    MANIFEST_MARKERS.iter().find(|(marker, _)| *marker == name).map(|(_, tech)| TechStackEntry {
        name: (*tech).to_string(),
        evidence_path: RepoPath::new(path.to_string_lossy().replace('\\', "/")),
    })
}

/// Returns `Some("Terraform")` if `path` has a `.tf`/`.tfvars` extension.
#[must_use]
pub fn from_terraform(path: &Path) -> Option<TechStackEntry> {
    let ext = path.extension()?.to_str()?;
    if matches!(ext, "tf" | "tfvars") {
        Some(TechStackEntry {
            name: "Terraform".to_string(),
            evidence_path: RepoPath::new(path.to_string_lossy().replace('\\', "/")),
        })
    } else {
        None
    }
}

// ============================================================================
// SECTION: README-Based Framework Detection
// ============================================================================

/// Case-insensitive keyword to framework-name mapping, checked against the
/// first 80 lines of a `README*` file.
const README_FRAMEWORK_KEYWORDS: [(&str, &str); 8] = [
    ("react", "React"),
    ("vue", "Vue"),
    ("angular", "Angular"),
    ("next.js", "Next.js"),
    ("django", "Django"),
    ("flask", "Flask"),
    ("fastapi", "FastAPI"),
    ("express", "Express"),
];

/// Maximum number of leading README lines inspected.
pub const README_SCAN_LINES: usize = 80;

/// Scans up to [`README_SCAN_LINES`] of `readme_text` for framework
/// keywords, returning one [`TechStackEntry`] per distinct match, in
/// [`README_FRAMEWORK_KEYWORDS`] order.
#[must_use]
pub fn from_readme(readme_path: &Path, readme_text: &str) -> Vec<TechStackEntry> {
    let head: String = readme_text.lines().take(README_SCAN_LINES).collect::<Vec<_>>().join("\n").to_ascii_lowercase();
    README_FRAMEWORK_KEYWORDS
        .iter()
        .filter(|(keyword, _)| head.contains(keyword))
        .map(|(_, name)| TechStackEntry {
            name: (*name).to_string(),
            evidence_path: RepoPath::new(readme_path.to_string_lossy().replace('\\', "/")),
        })
        .collect()
}

/// Returns true if a frontend framework appears in `tech_stack`'s names,
/// used by `gate-scanners` to gate frontend-only engineering-quality rules.
#[must_use]
pub fn has_frontend_framework(tech_stack: &[TechStackEntry]) -> bool {
    const FRONTEND_NAMES: [&str; 4] = ["React", "Vue", "Angular", "Next.js"];
    tech_stack.iter().any(|entry| FRONTEND_NAMES.contains(&entry.name.as_str()))
}

/// Returns true if a server-side backend technology appears in
/// `tech_stack`'s names, used by `gate-scanners` to gate backend-only
/// engineering-quality rules.
#[must_use]
pub fn has_backend_stack(tech_stack: &[TechStackEntry]) -> bool {
    const BACKEND_NAMES: [&str; 9] =
        ["Node.js", "Python (pyproject)", "Python (pip)", "Go modules", "Cargo (Rust)", "Django", "Flask", "FastAPI", "Express"];
    tech_stack.iter().any(|entry| BACKEND_NAMES.contains(&entry.name.as_str()))
}

#[cfg(test)]
mod tests {
    use super::from_manifest;
    use super::from_readme;
    use super::has_backend_stack;
    use super::has_frontend_framework;
    use std::path::Path;

    #[test]
    fn detects_cargo_manifest() {
        let entry = from_manifest(Path::new("Cargo.toml")).expect("matches");
        assert_eq!(entry.name, "Cargo (Rust)");
    }

    #[test]
    fn ignores_unrelated_files() {
        assert!(from_manifest(Path::new("src/main.rs")).is_none());
    }

    #[test]
    fn detects_react_in_readme_head() {
        let text = "# Demo\n\nBuilt with React and Express.\n";
        let entries = from_readme(Path::new("README.md"), text);
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"React"));
        assert!(names.contains(&"Express"));
    }

    #[test]
    fn frontend_and_backend_detection_are_independent() {
        let entries = from_readme(Path::new("README.md"), "React app with FastAPI backend");
        assert!(has_frontend_framework(&entries));
        assert!(has_backend_stack(&entries));
    }
}
