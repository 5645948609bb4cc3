// gate-core/src/lib.rs
// ============================================================================
// Module: Omar Gate Core Library
// Description: Public API surface for the Omar Gate core data model.
// Purpose: Expose the Finding/Ingest/Summary/GateResult schema, canonical
//          hashing, merge/guardrail logic, the evidence writer, and the gate
//          evaluator that every other crate in this workspace builds on.
// Dependencies: crate::core, crate::evidence, crate::gate, crate::merge, ret-logic
// ============================================================================

//! ## Overview
//! `gate-core` has no dependency edge on any collaborator crate
//! (`gate-ingest`, `gate-scanners`, `gate-harness`, `gate-providers`,
//! `gate-publish`) — it owns the shared data model plus the three stages
//! (`merge`, `evidence`, `gate`) that must behave identically regardless of
//! which crate produced a `Finding`. This keeps `Finding`, `Ingest`, and
//! `Summary` a single source of truth instead of duplicated structs per
//! crate.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod evidence;
pub mod gate;
pub mod merge;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::context::Context;
pub use core::finding::Confidence;
pub use core::finding::Finding;
pub use core::finding::InvalidLineRangeError;
pub use core::finding::MAX_SNIPPET_BYTES;
pub use core::gate_result::GateResult;
pub use core::gate_result::GateStatus;
pub use core::hashing::canonical_json_bytes;
pub use core::hashing::hash_bytes;
pub use core::hashing::hash_canonical_json;
pub use core::hashing::HashAlgorithm;
pub use core::hashing::HashDigest;
pub use core::hashing::HashError;
pub use core::hashing::DEFAULT_HASH_ALGORITHM;
pub use core::idempotency::dedupe_key;
pub use core::idempotency::DedupeKey;
pub use core::identifiers::Category;
pub use core::identifiers::CommitSha;
pub use core::identifiers::FindingId;
pub use core::identifiers::RepoFullName;
pub use core::identifiers::RepoPath;
pub use core::identifiers::RunId;
pub use core::ingest::FileCategory;
pub use core::ingest::HotspotCategory;
pub use core::ingest::Ingest;
pub use core::ingest::IngestFile;
pub use core::ingest::IngestStats;
pub use core::ingest::TechStackEntry;
pub use core::quicklearn::QuickLearn;
pub use core::quicklearn::MAX_DESCRIPTION_BYTES;
pub use core::quicklearn::MAX_RAW_EXCERPT_TOKENS;
pub use core::severity::ApprovalMode;
pub use core::severity::FindingSource;
pub use core::severity::ForkPolicy;
pub use core::severity::LlmFailurePolicy;
pub use core::severity::RateLimitFailMode;
pub use core::severity::ScanMode;
pub use core::severity::Severity;
pub use core::severity::SeverityGate;
pub use core::severity::TelemetryTier;
pub use core::summary::RecordedError;
pub use core::summary::SeverityCounts;
pub use core::summary::StageName;
pub use core::summary::Summary;
pub use core::summary::SUMMARY_SCHEMA_VERSION;
pub use evidence::EvidenceError;
pub use evidence::EvidenceWriter;
pub use evidence::WriteOutcome;
pub use gate::GateEvaluator;
pub use gate::GateEvaluatorError;
pub use merge::merge_findings;
pub use merge::MergeInputs;
