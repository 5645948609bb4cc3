// gate-harness/src/process.rs
// ============================================================================
// Module: Sandboxed Process Invocation
// Description: Runs a single trusted binary with an explicit argv, an
//              environment allow-list, and a hard wall-clock budget.
// Purpose: The one place in this crate that touches `std::process::Command`,
//          so every tool gets the same spawn/timeout/kill discipline.
// Dependencies: std
// ============================================================================

use std::env;
use std::path::Path;
use std::process::Command;
use std::process::Output;
use std::process::Stdio;
use std::sync::mpsc;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::error::HarnessError;

/// Returns true if `binary` resolves to an executable file on `PATH`.
///
/// This never shells out — it is a pure filesystem check, used to decide
/// whether a tool's absence should be a warning rather than a spawn failure.
#[must_use]
pub fn is_on_path(binary: &str) -> bool {
    let Some(path_var) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&path_var).any(|dir| is_executable_file(&dir.join(binary)))
}

#[cfg(unix)]
fn is_executable_file(candidate: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(candidate)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(candidate: &Path) -> bool {
    candidate.is_file()
}

/// Runs `binary args…` in `cwd`, with only `env_allowlist` variables (plus
/// `PATH`) inherited from this process's environment, killing the child if
/// it has not exited within `budget`.
///
/// # Errors
/// Returns [`HarnessError::Spawn`] if the child cannot be started, or
/// [`HarnessError::TimedOut`] if `budget` elapses first.
pub fn run_with_timeout(
    tool: &'static str,
    binary: &str,
    args: &[&str],
    cwd: &Path,
    env_allowlist: &[&str],
    budget: Duration,
) -> Result<Output, HarnessError> {
    let mut command = Command::new(binary);
    command.args(args).current_dir(cwd).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

    command.env_clear();
    if let Some(path) = env::var_os("PATH") {
        command.env("PATH", path);
    }
    for key in env_allowlist {
        if let Some(value) = env::var_os(key) {
            command.env(key, value);
        }
    }

    spawn_with_budget(tool, &mut command, budget)
}

/// Spawns `command`, which must already have its argv/cwd/env fully
/// configured, and enforces `budget` by killing the child on a watchdog
/// thread if it has not produced output in time.
fn spawn_with_budget(tool: &'static str, command: &mut Command, budget: Duration) -> Result<Output, HarnessError> {
    let child = command.spawn().map_err(|source| HarnessError::Spawn { tool, source })?;
    let slot = Arc::new(Mutex::new(Some(child)));
    let waiter_slot = Arc::clone(&slot);

    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        let taken = {
            #[allow(clippy::expect_used, reason = "poisoning here would indicate a prior panic in this same thread")]
            waiter_slot.lock().expect("harness process mutex poisoned").take()
        };
        if let Some(child) = taken {
            let _ = tx.send(child.wait_with_output());
        }
    });

    match rx.recv_timeout(budget) {
        Ok(Ok(output)) => {
            let _ = worker.join();
            Ok(output)
        }
        Ok(Err(source)) => {
            let _ = worker.join();
            Err(HarnessError::Spawn { tool, source })
        }
        Err(mpsc::RecvTimeoutError::Timeout | mpsc::RecvTimeoutError::Disconnected) => {
            #[allow(clippy::expect_used, reason = "poisoning here would indicate a prior panic in this same thread")]
            if let Some(mut child) = slot.lock().expect("harness process mutex poisoned").take() {
                let _ = child.kill();
                let _ = child.wait();
            }
            let _ = worker.join();
            Err(HarnessError::TimedOut { tool, budget })
        }
    }
}

/// Returns true if `output` exited successfully.
#[must_use]
pub fn succeeded(output: &Output) -> bool {
    output.status.success()
}

/// Decodes `bytes` as UTF-8, lossily, for inclusion in an error message.
#[must_use]
pub fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Joins `args` for inclusion in a log line without building a shell string
/// that could be mistaken for one.
#[must_use]
pub fn argv_display(binary: &str, args: &[&str]) -> String {
    let mut parts = vec![binary];
    parts.extend(args.iter().copied());
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::is_on_path;

    #[test]
    fn sh_is_on_path_on_unix_ci_runners() {
        assert!(is_on_path("sh"));
    }

    #[test]
    fn nonexistent_binary_is_not_on_path() {
        assert!(!is_on_path("this-binary-does-not-exist-anywhere-xyz"));
    }
}
