// gate-config/src/context.rs
// ============================================================================
// Module: Event Context
// Description: Builds a `gate_core::Context` from the GitHub Actions runner
//              environment and event payload.
// Purpose: Give the orchestrator one place that resolves "which repo, which
//          PR, which commits, is this a fork" instead of scattering
//          `env::var` calls across every stage.
// Dependencies: gate-core, serde_json
// ============================================================================

//! ## Overview
//! [`from_event`] reads `GITHUB_EVENT_PATH` (a JSON file the runner
//! writes before invoking an action), plus `GITHUB_REPOSITORY`,
//! `GITHUB_SHA`, `GITHUB_EVENT_NAME`, and `GITHUB_ACTOR`, and assembles a
//! [`gate_core::Context`]. A pull-request event's fork flag is derived by
//! comparing `pull_request.head.repo.full_name` against
//! `pull_request.base.repo.full_name`; any required field missing from the
//! payload is a [`ConfigError::MissingEventField`] rather than a silent
//! default, since a wrong fork determination would let an untrusted PR run
//! with secrets.

use std::env;
use std::fs;
use std::path::Path;

use gate_core::CommitSha;
use gate_core::Context;
use gate_core::RepoFullName;
use serde_json::Value;

use crate::config::ConfigError;

/// Environment variable holding the path to the event payload JSON file.
pub const GITHUB_EVENT_PATH_VAR: &str = "GITHUB_EVENT_PATH";
/// Environment variable holding `owner/repo`.
pub const GITHUB_REPOSITORY_VAR: &str = "GITHUB_REPOSITORY";
/// Environment variable holding the checked-out commit SHA.
pub const GITHUB_SHA_VAR: &str = "GITHUB_SHA";
/// Environment variable holding the triggering event name.
pub const GITHUB_EVENT_NAME_VAR: &str = "GITHUB_EVENT_NAME";
/// Environment variable holding the actor that triggered the run.
pub const GITHUB_ACTOR_VAR: &str = "GITHUB_ACTOR";

/// Builds a [`Context`] from the current process environment and, for
/// pull-request events, the JSON file named by `GITHUB_EVENT_PATH`.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEventField`] if a required environment
/// variable is unset, or if the event payload is required but missing,
/// unreadable, not valid JSON, or lacks a field this function needs.
pub fn from_event() -> Result<Context, ConfigError> {
    let repo = required_env(GITHUB_REPOSITORY_VAR)?;
    let head_sha = required_env(GITHUB_SHA_VAR)?;
    let event_name = required_env(GITHUB_EVENT_NAME_VAR)?;
    let actor = env::var(GITHUB_ACTOR_VAR).unwrap_or_else(|_| "unknown".to_string());

    if event_name != "pull_request" && event_name != "pull_request_target" {
        return Ok(Context::new(
            RepoFullName::new(repo),
            None,
            CommitSha::new(head_sha),
            None,
            event_name,
            false,
            actor,
        ));
    }

    let event_path = required_env(GITHUB_EVENT_PATH_VAR)?;
    let payload = read_event_payload(Path::new(&event_path))?;

    let pr_number = payload
        .pointer("/pull_request/number")
        .or_else(|| payload.pointer("/number"))
        .and_then(Value::as_u64)
        .ok_or_else(|| ConfigError::MissingEventField("pull_request.number".to_string()))?;

    let head_sha = payload
        .pointer("/pull_request/head/sha")
        .and_then(Value::as_str)
        .ok_or_else(|| ConfigError::MissingEventField("pull_request.head.sha".to_string()))?
        .to_string();
    let base_sha = payload
        .pointer("/pull_request/base/sha")
        .and_then(Value::as_str)
        .ok_or_else(|| ConfigError::MissingEventField("pull_request.base.sha".to_string()))?
        .to_string();

    let head_repo_full_name = payload
        .pointer("/pull_request/head/repo/full_name")
        .and_then(Value::as_str);
    let base_repo_full_name = payload
        .pointer("/pull_request/base/repo/full_name")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ConfigError::MissingEventField("pull_request.base.repo.full_name".to_string())
        })?;

    // A deleted/inaccessible head repo (e.g. a PR from a deleted fork) has no
    // `head.repo`; treat that as a fork for safety rather than failing open.
    let is_fork = match head_repo_full_name {
        Some(head_full_name) => head_full_name != base_repo_full_name,
        None => true,
    };

    Ok(Context::new(
        RepoFullName::new(repo),
        Some(pr_number),
        CommitSha::new(head_sha),
        Some(CommitSha::new(base_sha)),
        event_name,
        is_fork,
        actor,
    ))
}

/// Reads an environment variable, mapping an unset value to
/// [`ConfigError::MissingEventField`].
fn required_env(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingEventField(name.to_string()))
}

/// Reads and parses the event payload JSON file at `path`.
fn read_event_payload(path: &Path) -> Result<Value, ConfigError> {
    let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|err| ConfigError::Parse(err.to_string()))
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;

    use tempfile::NamedTempFile;

    use super::from_event;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn write_event(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("tempfile");
        file.write_all(body.as_bytes()).expect("write event payload");
        file
    }

    #[test]
    #[allow(unsafe_code, reason = "mutating process env vars is the only way to test from_event")]
    fn pull_request_event_populates_fork_flag() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let event = write_event(
            r#"{
                "number": 42,
                "pull_request": {
                    "number": 42,
                    "head": {"sha": "abc123", "repo": {"full_name": "someone/fork"}},
                    "base": {"sha": "def456", "repo": {"full_name": "owner/repo"}}
                }
            }"#,
        );
        // SAFETY (test-only, single-threaded via ENV_LOCK): mutating process
        // env vars for the duration of this test.
        unsafe {
            env::set_var("GITHUB_REPOSITORY", "owner/repo");
            env::set_var("GITHUB_SHA", "abc123");
            env::set_var("GITHUB_EVENT_NAME", "pull_request");
            env::set_var("GITHUB_ACTOR", "someone");
            env::set_var("GITHUB_EVENT_PATH", event.path());
        }

        let context = from_event().expect("valid context");
        assert!(context.is_pull_request());
        assert!(context.is_fork);
        assert_eq!(context.pr_number, Some(42));

        // SAFETY: cleaning up the vars this test set, same thread as above.
        unsafe {
            env::remove_var("GITHUB_REPOSITORY");
            env::remove_var("GITHUB_SHA");
            env::remove_var("GITHUB_EVENT_NAME");
            env::remove_var("GITHUB_ACTOR");
            env::remove_var("GITHUB_EVENT_PATH");
        }
    }

    #[test]
    #[allow(unsafe_code, reason = "mutating process env vars is the only way to test from_event")]
    fn push_event_skips_pull_request_fields() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        // SAFETY (test-only, single-threaded via ENV_LOCK).
        unsafe {
            env::set_var("GITHUB_REPOSITORY", "owner/repo");
            env::set_var("GITHUB_SHA", "abc123");
            env::set_var("GITHUB_EVENT_NAME", "push");
            env::remove_var("GITHUB_ACTOR");
            env::remove_var("GITHUB_EVENT_PATH");
        }

        let context = from_event().expect("valid context for push event");
        assert!(!context.is_pull_request());
        assert!(!context.is_fork);

        // SAFETY: cleaning up the vars this test set, same thread as above.
        unsafe {
            env::remove_var("GITHUB_REPOSITORY");
            env::remove_var("GITHUB_SHA");
            env::remove_var("GITHUB_EVENT_NAME");
        }
    }
}
