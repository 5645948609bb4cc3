// gate-core/src/core/identifiers.rs
// ============================================================================
// Module: Omar Gate Identifiers
// Description: Canonical opaque identifiers for runs, findings, and commits.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the canonical string-based identifiers used throughout
//! Omar Gate. Identifiers are opaque and serialize as strings. Validation is
//! handled at the boundary that constructs them (config parsing, event
//! payload parsing) rather than within these simple wrappers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Newtype Macro
// ============================================================================

/// Defines an opaque, serializable string identifier with the standard
/// constructor/accessor/Display/From impls shared by every id in this module.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new [`", stringify!($name), "`].")]
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

string_id!(
    /// Opaque identifier for a single [`crate::core::finding::Finding`].
    FindingId
);
string_id!(
    /// Identifier for one orchestrator run, used as the run directory name.
    RunId
);
string_id!(
    /// Repository-relative file path, kept as a distinct type from raw
    /// `String` so ingest scope checks cannot accidentally compare against
    /// an absolute or host path.
    RepoPath
);
string_id!(
    /// Fully-qualified repository name (`owner/name`).
    RepoFullName
);
string_id!(
    /// Git commit SHA (head or base), stored without case normalization
    /// since hosts already return lowercase hex.
    CommitSha
);
string_id!(
    /// Free-form finding category tag (e.g. `secrets`, `auth`, `frontend`).
    Category
);

#[cfg(test)]
mod tests {
    use super::FindingId;

    #[test]
    fn round_trips_through_display_and_as_str() {
        let id = FindingId::new("f-1");
        assert_eq!(id.as_str(), "f-1");
        assert_eq!(id.to_string(), "f-1");
        assert_eq!(FindingId::from("f-1"), id);
    }
}
