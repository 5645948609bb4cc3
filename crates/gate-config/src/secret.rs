// gate-config/src/secret.rs
// ============================================================================
// Module: Secret String
// Description: A string wrapper whose Debug/Display never print the value.
// Purpose: Guarantee API keys and host tokens cannot leak into logs, error
//          messages, or the masked config representation `summary.errors[]`
//          or a PR comment might otherwise carry verbatim.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`SecretString`] mirrors the masking discipline an `HttpProviderConfig`
//! applies to API-key-bearing fields: the value is
//! reachable only through [`SecretString::expose`], while every trait a
//! config struct derives for free (`Debug`, and `Display` where implemented)
//! prints the literal string `"***"`.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// A string that is never printed verbatim.
#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    /// Wraps a plain string as a secret.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the underlying value. Callers must not log or print this.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// True if the secret is empty (not configured).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"***\"")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretString {}

#[cfg(test)]
mod tests {
    use super::SecretString;

    #[test]
    fn debug_and_display_never_print_the_value() {
        let secret = SecretString::new("ghp_supersecret");
        assert_eq!(format!("{secret:?}"), "\"***\"");
        assert_eq!(format!("{secret}"), "***");
        assert_eq!(secret.expose(), "ghp_supersecret");
    }

    #[test]
    fn empty_is_reported() {
        assert!(SecretString::default().is_empty());
        assert!(!SecretString::new("x").is_empty());
    }
}
