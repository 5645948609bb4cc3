// gate-core/src/core/mod.rs
// ============================================================================
// Module: Omar Gate Core Types
// Description: Canonical Omar Gate data model (Finding, Ingest, QuickLearn,
//              Summary, GateResult) and the identifiers/enums they share.
// Purpose: Provide stable, serializable types every scanner, the harness
//          runner, the LLM analyzer, and the evidence writer build on.
// Dependencies: serde, serde_jcs, sha2, thiserror
// ============================================================================

//! ## Overview
//! These types are the canonical source of truth for the evidence bundle.
//! Nothing downstream (scanners, harness, LLM analyzer, publisher) defines
//! its own copy of `Finding`, `Ingest`, or `Summary` — they import these.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod context;
pub mod finding;
pub mod gate_result;
pub mod hashing;
pub mod idempotency;
pub mod identifiers;
pub mod ingest;
pub mod quicklearn;
pub mod severity;
pub mod summary;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use context::Context;
pub use finding::Confidence;
pub use finding::Finding;
pub use finding::InvalidLineRangeError;
pub use finding::MAX_SNIPPET_BYTES;
pub use gate_result::GateResult;
pub use gate_result::GateStatus;
pub use hashing::canonical_json_bytes;
pub use hashing::hash_bytes;
pub use hashing::hash_canonical_json;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use idempotency::dedupe_key;
pub use idempotency::DedupeKey;
pub use identifiers::Category;
pub use identifiers::CommitSha;
pub use identifiers::FindingId;
pub use identifiers::RepoFullName;
pub use identifiers::RepoPath;
pub use identifiers::RunId;
pub use ingest::FileCategory;
pub use ingest::HotspotCategory;
pub use ingest::Ingest;
pub use ingest::IngestFile;
pub use ingest::IngestStats;
pub use ingest::TechStackEntry;
pub use quicklearn::QuickLearn;
pub use quicklearn::MAX_DESCRIPTION_BYTES;
pub use quicklearn::MAX_RAW_EXCERPT_TOKENS;
pub use severity::ApprovalMode;
pub use severity::FindingSource;
pub use severity::ForkPolicy;
pub use severity::LlmFailurePolicy;
pub use severity::RateLimitFailMode;
pub use severity::ScanMode;
pub use severity::Severity;
pub use severity::SeverityGate;
pub use severity::TelemetryTier;
pub use summary::RecordedError;
pub use summary::SeverityCounts;
pub use summary::StageName;
pub use summary::Summary;
pub use summary::SUMMARY_SCHEMA_VERSION;
