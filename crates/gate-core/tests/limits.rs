// gate-core/tests/limits.rs
// ============================================================================
// Module: Size Limit Tests
// Description: Integration-level tests for the byte/token caps scanners,
//              the harness runner, and the LLM analyzer all build against.
// ============================================================================
//! ## Overview
//! Unit tests colocated with each type cover the truncation logic itself;
//! these tests exercise the caps as every collaborator crate actually sees
//! them, through the public `gate-core` API surface.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only construction and assertions are permitted."
)]

use gate_core::Category;
use gate_core::Confidence;
use gate_core::Finding;
use gate_core::FindingId;
use gate_core::FindingSource;
use gate_core::QuickLearn;
use gate_core::RepoPath;
use gate_core::Severity;
use gate_core::MAX_DESCRIPTION_BYTES;
use gate_core::MAX_RAW_EXCERPT_TOKENS;
use gate_core::MAX_SNIPPET_BYTES;

#[test]
fn finding_snippet_never_exceeds_the_cap_on_construction() {
    let oversized = "a".repeat(MAX_SNIPPET_BYTES * 4);
    let finding = Finding::new(
        FindingId::new("f-1"),
        Severity::P2,
        Category::new("pattern"),
        FindingSource::Deterministic,
        RepoPath::new("src/lib.rs"),
        1,
        1,
        oversized,
        "oversized snippet",
        "n/a",
        Confidence::default(),
    )
    .expect("valid line range");

    assert!(finding.snippet.len() <= MAX_SNIPPET_BYTES + "…".len());
}

#[test]
fn finding_snippet_truncation_respects_utf8_boundaries() {
    // Every character is multi-byte, so a byte-indexed truncation that does
    // not back off to a char boundary would panic or split a codepoint.
    let multibyte = "é".repeat(MAX_SNIPPET_BYTES);
    let finding = Finding::new(
        FindingId::new("f-2"),
        Severity::P2,
        Category::new("pattern"),
        FindingSource::Deterministic,
        RepoPath::new("src/lib.rs"),
        1,
        1,
        multibyte,
        "multibyte snippet",
        "n/a",
        Confidence::default(),
    )
    .expect("valid line range");

    assert!(finding.snippet.is_char_boundary(finding.snippet.len()));
}

#[test]
fn quicklearn_description_and_excerpt_are_capped() {
    let description = "d".repeat(MAX_DESCRIPTION_BYTES * 3);
    let excerpt = (0..MAX_RAW_EXCERPT_TOKENS * 5).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");

    let learn = QuickLearn::new(
        "widgets-api",
        description,
        vec!["rust".to_string(), "postgres".to_string()],
        "service",
        vec![RepoPath::new("src/main.rs")],
        None,
        excerpt,
    );

    assert!(learn.description.len() <= MAX_DESCRIPTION_BYTES + "…".len());
    assert!(learn.raw_excerpt.split_whitespace().count() <= MAX_RAW_EXCERPT_TOKENS);
}
