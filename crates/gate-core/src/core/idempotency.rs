// gate-core/src/core/idempotency.rs
// ============================================================================
// Module: Omar Gate Idempotency Key
// Description: The dedupe key preflight and the gate evaluator file results
//              under.
// Purpose: Let two runs of the same head SHA, policy, and scan mode agree on
//          a single 64-hex digest without any shared mutable state.
// Dependencies: crate::core::{hashing, identifiers, severity}, serde
// ============================================================================

//! ## Overview
//! `dedupe_key` hashes a canonical JSON tuple of its inputs with the existing
//! RFC 8785 + SHA-256 helper in `core::hashing`. It is a pure function: the
//! same inputs always yield the same key, which is the property preflight's
//! `check_dedupe` step and the sticky-comment/check-run `external_id` rely
//! on.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::hashing::hash_canonical_json;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::identifiers::CommitSha;
use crate::core::identifiers::RepoFullName;
use crate::core::severity::ScanMode;

// ============================================================================
// SECTION: Dedupe Key
// ============================================================================

/// 64-hex-character idempotency key, with an 8-hex prefix for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupeKey(String);

impl DedupeKey {
    /// Returns the full 64-hex key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the 8-hex-character display prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

/// Canonical input tuple hashed to produce a [`DedupeKey`].
#[derive(Serialize)]
struct DedupeKeyInputs<'a> {
    repo: &'a str,
    pr_number: Option<u64>,
    head_sha: &'a str,
    scan_mode: &'a str,
    policy_pack: &'a str,
    policy_pack_version: &'a str,
    action_major: &'a str,
}

/// Computes the idempotency key for one `(repo, pr, head_sha, scan_mode,
/// policy_pack, policy_pack_version, action_major)` tuple.
///
/// # Panics
///
/// Panics only if canonical JSON serialization of the input tuple fails,
/// which cannot happen for this plain-string/integer struct.
#[must_use]
#[allow(clippy::too_many_arguments, reason = "mirrors the documented key inputs")]
pub fn dedupe_key(
    repo: &RepoFullName,
    pr_number: Option<u64>,
    head_sha: &CommitSha,
    scan_mode: ScanMode,
    policy_pack: &str,
    policy_pack_version: &str,
    action_major: &str,
) -> DedupeKey {
    let inputs = DedupeKeyInputs {
        repo: repo.as_str(),
        pr_number,
        head_sha: head_sha.as_str(),
        scan_mode: scan_mode_key(scan_mode),
        policy_pack,
        policy_pack_version,
        action_major,
    };
    let digest = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &inputs)
        .unwrap_or_else(|_| unreachable!("plain string/int tuple always canonicalizes"));
    DedupeKey(digest.value)
}

/// Stable string form of `scan_mode` for hashing, independent of serde's
/// wire representation so a future rename there cannot change existing keys.
const fn scan_mode_key(scan_mode: ScanMode) -> &'static str {
    match scan_mode {
        ScanMode::PrDiff => "pr-diff",
        ScanMode::Deep => "deep",
        ScanMode::Nightly => "nightly",
    }
}

#[cfg(test)]
mod tests {
    use super::dedupe_key;
    use crate::core::identifiers::CommitSha;
    use crate::core::identifiers::RepoFullName;
    use crate::core::severity::ScanMode;

    #[test]
    fn same_inputs_yield_same_key() {
        let repo = RepoFullName::new("acme/widgets");
        let sha = CommitSha::new("deadbeef");
        let a = dedupe_key(&repo, Some(42), &sha, ScanMode::PrDiff, "default", "1", "1");
        let b = dedupe_key(&repo, Some(42), &sha, ScanMode::PrDiff, "default", "1", "1");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert_eq!(a.prefix().len(), 8);
    }

    #[test]
    fn differing_pr_number_changes_key() {
        let repo = RepoFullName::new("acme/widgets");
        let sha = CommitSha::new("deadbeef");
        let a = dedupe_key(&repo, Some(42), &sha, ScanMode::PrDiff, "default", "1", "1");
        let b = dedupe_key(&repo, Some(43), &sha, ScanMode::PrDiff, "default", "1", "1");
        assert_ne!(a, b);
    }
}
