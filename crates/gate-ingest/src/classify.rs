// gate-ingest/src/classify.rs
// ============================================================================
// Module: File Classification
// Description: Binary detection, language inference, and coarse category
//              assignment for one walked file.
// Purpose: Give the walker a single place to decide "what is this file" so
//          hotspot/tech-stack detection and every scanner see a consistent
//          `FileCategory`/`language` pair.
// Dependencies: gate-core::core::ingest
// ============================================================================

//! ## Overview
//! Classification never opens a file twice: [`classify`] is handed the
//! sampled bytes the walker already read for binary detection, plus the
//! path, and returns both the [`gate_core::FileCategory`] and the inferred
//! language in one pass.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use gate_core::FileCategory;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of leading bytes sampled for binary detection.
pub const BINARY_SAMPLE_BYTES: usize = 4096;

/// Fraction of non-printable bytes in the sample above which a file is
/// classified binary.
const BINARY_NON_TEXT_RATIO: f64 = 0.30;

// ============================================================================
// SECTION: Binary Detection
// ============================================================================

/// Returns true if `sample` (the first up-to-[`BINARY_SAMPLE_BYTES`] of a
/// file) looks binary: any NUL byte, or more than 30% non-printable bytes.
#[must_use]
pub fn looks_binary(sample: &[u8]) -> bool {
    if sample.is_empty() {
        return false;
    }
    if sample.contains(&0) {
        return true;
    }
    let non_text = sample
        .iter()
        .filter(|&&b| !(b.is_ascii_graphic() || b.is_ascii_whitespace()))
        .count();
    (non_text as f64) / (sample.len() as f64) > BINARY_NON_TEXT_RATIO
}

// ============================================================================
// SECTION: Language Inference
// ============================================================================

/// Infers a language name from a file extension, if recognized.
#[must_use]
pub fn infer_language(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let name = match ext.as_str() {
        "rs" => "rust",
        "py" => "python",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "javascript",
        "ts" => "typescript",
        "tsx" => "typescript",
        "go" => "go",
        "rb" => "ruby",
        "java" => "java",
        "kt" => "kotlin",
        "c" => "c",
        "h" => "c",
        "cpp" | "cc" | "cxx" | "hpp" => "cpp",
        "cs" => "csharp",
        "php" => "php",
        "sh" | "bash" => "shell",
        "tf" | "tfvars" => "terraform",
        "yml" | "yaml" => "yaml",
        "json" => "json",
        "toml" => "toml",
        "md" | "markdown" => "markdown",
        "sql" => "sql",
        _ => return None,
    };
    Some(name.to_string())
}

// ============================================================================
// SECTION: File Category
// ============================================================================

/// Path fragments, checked case-insensitively against path components, that
/// mark a file as test code.
const TEST_MARKERS: [&str; 6] = ["test", "tests", "__tests__", "spec", "specs", "fixtures"];

/// Path fragments that mark a file as documentation.
const DOC_MARKERS: [&str; 3] = ["doc", "docs", "documentation"];

/// Manifest/config file names recognized regardless of directory.
const CONFIG_FILE_NAMES: [&str; 12] = [
    "cargo.toml",
    "package.json",
    "pyproject.toml",
    "go.mod",
    "dockerfile",
    "docker-compose.yml",
    "docker-compose.yaml",
    ".env",
    "makefile",
    "requirements.txt",
    "gemfile",
    "poetry.lock",
];

/// Classifies `path` into a [`FileCategory`] using its binary sample, name,
/// and position in the directory tree. `is_binary` must already reflect
/// [`looks_binary`] on the same sample passed to the walker.
#[must_use]
pub fn classify(path: &Path, is_binary: bool, language: Option<&str>) -> FileCategory {
    if is_binary {
        return FileCategory::Binary;
    }

    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_ascii_lowercase();
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_ascii_lowercase();

    if CONFIG_FILE_NAMES.contains(&file_name.as_str())
        || matches!(extension.as_str(), "tf" | "tfvars" | "yml" | "yaml" | "toml")
        || file_name.ends_with(".lock")
    {
        return FileCategory::Config;
    }

    let components: Vec<String> =
        path.components().filter_map(|c| c.as_os_str().to_str()).map(str::to_ascii_lowercase).collect();

    if components.iter().any(|c| TEST_MARKERS.contains(&c.as_str()))
        || file_name.starts_with("test_")
        || file_name.ends_with("_test.rs")
        || file_name.ends_with(".test.js")
        || file_name.ends_with(".test.ts")
        || file_name.ends_with(".spec.js")
        || file_name.ends_with(".spec.ts")
    {
        return FileCategory::Test;
    }

    if components.iter().any(|c| DOC_MARKERS.contains(&c.as_str())) || extension == "md" || extension == "markdown" {
        return FileCategory::Doc;
    }

    if language.is_some() {
        return FileCategory::Source;
    }

    FileCategory::Other
}

#[cfg(test)]
mod tests {
    use super::classify;
    use super::infer_language;
    use super::looks_binary;
    use gate_core::FileCategory;
    use std::path::Path;

    #[test]
    fn nul_byte_marks_binary() {
        assert!(looks_binary(&[0u8, 1, 2, 3]));
    }

    #[test]
    fn plain_text_is_not_binary() {
        assert!(!looks_binary(b"fn main() {}\n"));
    }

    #[test]
    fn high_non_text_ratio_marks_binary() {
        let sample: Vec<u8> = (0..200).map(|i| (i % 256) as u8).filter(|b| *b != 0).collect();
        assert!(looks_binary(&sample));
    }

    #[test]
    fn infers_rust_and_python() {
        assert_eq!(infer_language(Path::new("src/main.rs")), Some("rust".to_string()));
        assert_eq!(infer_language(Path::new("app.py")), Some("python".to_string()));
        assert_eq!(infer_language(Path::new("README")), None);
    }

    #[test]
    fn classifies_test_files_by_directory() {
        let category = classify(Path::new("tests/auth_test.rs"), false, Some("rust"));
        assert_eq!(category, FileCategory::Test);
    }

    #[test]
    fn classifies_manifests_as_config() {
        assert_eq!(classify(Path::new("Cargo.toml"), false, None), FileCategory::Config);
        assert_eq!(classify(Path::new("package.json"), false, None), FileCategory::Config);
    }

    #[test]
    fn classifies_source_when_language_known() {
        assert_eq!(classify(Path::new("src/lib.rs"), false, Some("rust")), FileCategory::Source);
    }
}
