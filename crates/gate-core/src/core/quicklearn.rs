// gate-core/src/core/quicklearn.rs
// ============================================================================
// Module: Omar Gate QuickLearn
// Description: The heuristic project summary derived purely from ingest data.
// Purpose: Give the LLM analyzer and the published summary a cheap, fast
//          project orientation with no model call involved.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! `QuickLearn` is built by `gate-ingest` from manifests and `README*` text
//! alone. It must never depend on an [`crate::providers::LlmProvider`] call —
//! that boundary is enforced structurally by `gate-ingest` having no
//! dependency edge on `gate-providers`, not by a runtime check here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RepoPath;

/// Maximum length, in bytes, of `QuickLearn::description`.
pub const MAX_DESCRIPTION_BYTES: usize = 100;

/// Maximum length, in whitespace-split tokens, of `QuickLearn::raw_excerpt`.
pub const MAX_RAW_EXCERPT_TOKENS: usize = 600;

/// Heuristic project orientation derived from manifests and README text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickLearn {
    /// Project name, taken from the nearest manifest's `name` field.
    pub project_name: String,
    /// One-line project description, truncated to [`MAX_DESCRIPTION_BYTES`].
    pub description: String,
    /// Detected technology names, in manifest-discovery order.
    pub tech_stack: Vec<String>,
    /// Free-form architecture note (e.g. `"monorepo"`, `"single service"`).
    pub architecture: String,
    /// Paths recognized as entry points (`main.rs`, `index.js`, …).
    pub entry_points: Vec<RepoPath>,
    /// The `README*` file this summary was derived from, if any.
    pub source_doc: Option<RepoPath>,
    /// Verbatim excerpt of `source_doc`, truncated to
    /// [`MAX_RAW_EXCERPT_TOKENS`] whitespace-split tokens.
    pub raw_excerpt: String,
}

impl QuickLearn {
    /// Builds a `QuickLearn`, truncating `description` and `raw_excerpt` to
    /// their documented caps.
    #[must_use]
    pub fn new(
        project_name: impl Into<String>,
        description: impl Into<String>,
        tech_stack: Vec<String>,
        architecture: impl Into<String>,
        entry_points: Vec<RepoPath>,
        source_doc: Option<RepoPath>,
        raw_excerpt: impl Into<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            description: truncate_bytes(&description.into(), MAX_DESCRIPTION_BYTES),
            tech_stack,
            architecture: architecture.into(),
            entry_points,
            source_doc,
            raw_excerpt: truncate_tokens(&raw_excerpt.into(), MAX_RAW_EXCERPT_TOKENS),
        }
    }
}

/// Truncates `text` to at most `max_bytes`, respecting UTF-8 boundaries.
fn truncate_bytes(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

/// Truncates `text` to at most `max_tokens` whitespace-split tokens.
fn truncate_tokens(text: &str, max_tokens: usize) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() <= max_tokens {
        return text.to_string();
    }
    tokens[..max_tokens].join(" ")
}

#[cfg(test)]
mod tests {
    use super::QuickLearn;

    #[test]
    fn truncates_description_to_byte_cap() {
        let quick_learn = QuickLearn::new(
            "demo",
            "x".repeat(200),
            Vec::new(),
            "single service",
            Vec::new(),
            None,
            "",
        );
        assert!(quick_learn.description.len() <= super::MAX_DESCRIPTION_BYTES);
    }

    #[test]
    fn truncates_raw_excerpt_to_token_cap() {
        let words = vec!["word"; 1000].join(" ");
        let quick_learn = QuickLearn::new("demo", "", Vec::new(), "", Vec::new(), None, words);
        assert_eq!(
            quick_learn.raw_excerpt.split_whitespace().count(),
            super::MAX_RAW_EXCERPT_TOKENS
        );
    }
}
