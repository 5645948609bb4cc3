// gate-scanners/src/lib.rs
// ============================================================================
// Crate: gate-scanners
// Description: Deterministic, config-free scanners over the ingested
//              worktree: pattern, secrets, config-file, and engineering
//              quality rules.
// Purpose: Produce `FindingSource::Deterministic` findings with no model
//          call and no plugin/registry indirection.
// Dependencies: gate-core, regex, rustpython-parser
// ============================================================================

//! ## Overview
//! Every scanner implements [`Scanner`] and is composed by value into a
//! `Vec<Box<dyn Scanner>>` the orchestrator owns directly — there is no
//! reflection-based registry here, matching the dependency-injection style
//! the rest of this workspace uses for its other collaborator traits.
//! Scanners never open files themselves: all content comes through the
//! `read` closure the orchestrator supplies, which is what makes scan
//! output reproducible given the same `Ingest` and worktree contents.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Committed `.env`, workflow permission, and infrastructure config rules.
pub mod config_files;
/// Stack-aware frontend/backend/infrastructure code-quality rules.
pub mod engineering_quality;
/// Baked-in regex rule table, language- and glob-keyed.
pub mod pattern;
/// Three-stage credential detection: identifier, context, entropy.
pub mod secrets;

use std::io;

use gate_core::Context;
use gate_core::Finding;
use gate_core::IngestFile;
use gate_core::RepoPath;

// ============================================================================
// SECTION: Scanner Trait
// ============================================================================

/// A deterministic scanner over the ingested file set.
pub trait Scanner {
    /// Returns a short, stable name for this scanner, used in
    /// `Summary.tool_versions` and error attribution.
    fn name(&self) -> &'static str;

    /// Scans `files`, reading content through `read`, and returns the
    /// findings it produced.
    ///
    /// # Errors
    /// Returns [`ScannerError`] if a required file cannot be read or a
    /// scanner-internal invariant (e.g. an unparseable `Finding` line
    /// range) is violated.
    fn scan(
        &self,
        files: &[IngestFile],
        read: &dyn Fn(&RepoPath) -> io::Result<String>,
        context: &Context,
    ) -> Result<Vec<Finding>, ScannerError>;
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure produced while running a scanner.
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    /// A file the scanner needed to read could not be read.
    #[error("scanner `{scanner}` could not read `{path}`: {source}")]
    Read {
        /// Name of the scanner that failed.
        scanner: &'static str,
        /// Path that could not be read.
        path: RepoPath,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A finding could not be constructed from scanner output (e.g. an
    /// inverted line range), indicating a scanner-internal bug rather than
    /// a malformed input file.
    #[error("scanner `{scanner}` produced an invalid finding: {reason}")]
    InvalidFinding {
        /// Name of the scanner that failed.
        scanner: &'static str,
        /// Human-readable description of the failure.
        reason: String,
    },
}
