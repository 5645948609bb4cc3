// gate-cli/src/lib.rs
// ============================================================================
// Module: Omar Gate CLI Library
// Description: Shared orchestration pieces behind the `omar-gate` binary.
// Purpose: Keep `main.rs` a thin argument-parsing shell over the testable
//          modules here — preflight admission control, PR-diff fetching,
//          exit-code mapping, and the pipeline orchestrator itself.
// Dependencies: gate-config, gate-core, gate-harness, gate-ingest,
//               gate-providers, gate-publish, gate-scanners
// ============================================================================

//! ## Overview
//! `gate-cli` wires the other crates in this workspace into one sequential
//! run: [`preflight`] decides whether the pipeline runs at all, [`diff`]
//! supplies the PR-diff guardrail's added-line map, [`orchestrator`] drives
//! ingest through evidence writing and gate evaluation, and [`exit_code`]
//! maps the result to the process exit status GitHub Actions reads.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Head-vs-base `git diff` fetch and added-line parsing.
pub mod diff;
/// Exit-code mapping from the orchestrator's final outcome.
pub mod exit_code;
/// The sequenced pipeline: ingest, scan, merge, write, evaluate, publish.
pub mod orchestrator;
/// Dedupe, rate-limit, fork-policy, and cost-approval admission control.
pub mod preflight;
