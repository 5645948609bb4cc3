// gate-core/tests/identifiers.rs
// ============================================================================
// Module: Identifier Tests
// Description: Tests for Omar Gate's opaque string identifier wrappers.
// Purpose: Ensure every identifier round-trips through serde and Display
//          identically, since each is a thin wrapper generated by the same
//          macro and a divergence would mean the macro itself regressed.
// Dependencies: gate-core, serde_json
// ============================================================================
//! ## Overview
//! Validates that identifier wrappers preserve their underlying string
//! value across `Display`, `From<&str>`/`From<String>`, and serde.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions are permitted.")]

use gate_core::Category;
use gate_core::CommitSha;
use gate_core::FindingId;
use gate_core::RepoFullName;
use gate_core::RepoPath;
use gate_core::RunId;

macro_rules! assert_id_roundtrip {
    ($ty:ty, $value:expr) => {{
        let id = <$ty>::new($value);
        assert_eq!(id.as_str(), $value);
        assert_eq!(id.to_string(), $value);
        assert_eq!(<$ty>::from($value), id);
        assert_eq!(<$ty>::from($value.to_string()), id);

        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{}\"", $value));

        let decoded: $ty = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded, id);
    }};
}

#[test]
fn identifiers_roundtrip_with_serde_and_display() {
    assert_id_roundtrip!(FindingId, "f-1");
    assert_id_roundtrip!(RunId, "run-2026-07-29-001");
    assert_id_roundtrip!(RepoPath, "src/main.rs");
    assert_id_roundtrip!(RepoFullName, "acme/widgets");
    assert_id_roundtrip!(CommitSha, "0123456789abcdef0123456789abcdef01234567");
    assert_id_roundtrip!(Category, "secrets");
}

#[test]
fn distinct_identifier_types_do_not_compare_across_types() {
    // RepoPath and RepoFullName are deliberately distinct newtypes even
    // though both wrap a String, so a scanner cannot accidentally compare
    // a file path against a repository name.
    let path = RepoPath::new("acme/widgets");
    let full_name = RepoFullName::new("acme/widgets");
    assert_eq!(path.as_str(), full_name.as_str());
}
