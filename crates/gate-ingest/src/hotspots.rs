// gate-ingest/src/hotspots.rs
// ============================================================================
// Module: Hotspot Detection
// Description: Baked-in path/filename patterns for risk-bearing file
//              categories.
// Purpose: Flag auth/payment/crypto/webhook/database/infrastructure files by
//          name alone, cheaply and before any scanner touches file content.
// Dependencies: gate-core::core::ingest
// ============================================================================

//! ## Overview
//! Hotspot patterns are baked in, matching the pattern scanner's "rules are
//! not user-loadable" constraint — there is no config surface that adds or
//! removes a pattern here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use gate_core::HotspotCategory;

// ============================================================================
// SECTION: Pattern Table
// ============================================================================

/// One hotspot category and the lowercase substrings that, if present
/// anywhere in a file's lowercased repo-relative path, flag a match.
const PATTERNS: [(HotspotCategory, &[&str]); 6] = [
    (HotspotCategory::Auth, &["auth", "login", "session", "oauth", "jwt", "credential"]),
    (HotspotCategory::Payment, &["payment", "billing", "stripe", "invoice", "checkout", "paypal"]),
    (HotspotCategory::Crypto, &["crypto", "cipher", "encrypt", "decrypt", "keypair", "signing", "signature"]),
    (HotspotCategory::Webhook, &["webhook", "hook"]),
    (HotspotCategory::Database, &["database", "/db/", "db.", "migration", "models", "schema.sql", "repository"]),
    (
        HotspotCategory::Infrastructure,
        &["terraform", ".tf", "dockerfile", "docker-compose", "k8s", "kubernetes", "helm", ".github/workflows", "infra", "deploy"],
    ),
];

// ============================================================================
// SECTION: Matching
// ============================================================================

/// Returns every [`HotspotCategory`] whose pattern matches `path`'s
/// lowercased repo-relative form, in [`PATTERNS`] order.
#[must_use]
pub fn matching_categories(path: &Path) -> Vec<HotspotCategory> {
    let lowered = path.to_string_lossy().to_ascii_lowercase().replace('\\', "/");
    PATTERNS
        .iter()
        .filter(|(_, needles)| needles.iter().any(|needle| lowered.contains(needle)))
        .map(|(category, _)| *category)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::matching_categories;
    use gate_core::HotspotCategory;
    use std::path::Path;

    #[test]
    fn flags_auth_paths() {
        let categories = matching_categories(Path::new("src/auth/login.rs"));
        assert!(categories.contains(&HotspotCategory::Auth));
    }

    #[test]
    fn flags_infra_workflow_files() {
        let categories = matching_categories(Path::new(".github/workflows/deploy.yml"));
        assert!(categories.contains(&HotspotCategory::Infrastructure));
    }

    #[test]
    fn unrelated_path_matches_nothing() {
        assert!(matching_categories(Path::new("src/lib.rs")).is_empty());
    }

    #[test]
    fn a_path_can_match_multiple_categories() {
        let categories = matching_categories(Path::new("infra/webhook_auth.tf"));
        assert!(categories.contains(&HotspotCategory::Infrastructure));
        assert!(categories.contains(&HotspotCategory::Webhook));
        assert!(categories.contains(&HotspotCategory::Auth));
    }
}
