// gate-core/src/core/context.rs
// ============================================================================
// Module: Omar Gate Run Context
// Description: The immutable facts about the triggering event every stage
//              reads but none may mutate.
// Purpose: Give scanners, the harness runner, preflight, and the publisher
//          one shared, already-validated view of "which PR, which commits,
//          whose fork" without re-parsing the event payload.
// Dependencies: crate::core::identifiers
// ============================================================================

//! ## Overview
//! [`Context`] is built exactly once, by `gate-config::context::from_event`,
//! and never mutated afterward: there is no `&mut self` method on this type.
//! Everything downstream treats it as a read-only snapshot, the same
//! ownership discipline [`crate::core::ingest::Ingest`] follows for the
//! worktree.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::CommitSha;
use crate::core::identifiers::RepoFullName;

// ============================================================================
// SECTION: Context
// ============================================================================

/// Immutable facts about the triggering event, built once and read by every
/// downstream stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Fully-qualified repository name (`owner/name`).
    pub repo: RepoFullName,
    /// Pull request number, if the triggering event is PR-shaped.
    pub pr_number: Option<u64>,
    /// Commit SHA being scanned.
    pub head_sha: CommitSha,
    /// Base commit SHA, present for PR-shaped events.
    pub base_sha: Option<CommitSha>,
    /// GitHub event name (`pull_request`, `workflow_dispatch`, …).
    pub event_name: String,
    /// True when the head repository differs from the base repository.
    pub is_fork: bool,
    /// Login of the user or bot that triggered the event.
    pub actor: String,
}

impl Context {
    /// Creates a new context from its already-parsed fields.
    #[must_use]
    pub fn new(
        repo: RepoFullName,
        pr_number: Option<u64>,
        head_sha: CommitSha,
        base_sha: Option<CommitSha>,
        event_name: impl Into<String>,
        is_fork: bool,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            pr_number,
            head_sha,
            base_sha,
            event_name: event_name.into(),
            is_fork,
            actor: actor.into(),
        }
    }

    /// Returns true if this context describes a pull request event.
    #[must_use]
    pub const fn is_pull_request(&self) -> bool {
        self.pr_number.is_some()
    }
}
