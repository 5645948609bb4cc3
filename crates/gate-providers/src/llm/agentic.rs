// gate-providers/src/llm/agentic.rs
// ============================================================================
// Module: Agentic CLI Analysis Path
// Description: A second `Finding`-producing path that shells out to a
//              third-party agentic code CLI instead of calling an
//              `LlmProvider` directly.
// Purpose: Give `dispatch::AnalysisRunner` an interchangeable analysis
//          source: the API path and the CLI path both end in
//          `Vec<Finding>`, parsed by the same `ResponseParser`.
// Dependencies: gate-core, crate::llm::{error, parser}, std::process
// ============================================================================

//! ## Overview
//! [`AgenticCliProvider`] invokes a binary on `PATH` as
//! `exec --model <model> --sandbox read-only --timeout <secs>`, piping its
//! stdout back through [`crate::llm::parser::ResponseParser`] exactly as the
//! API path parses a provider's raw text. This crate has no dependency edge
//! on `gate-harness`, so the spawn/timeout/kill discipline is reimplemented
//! here in miniature rather than shared — the same watchdog-thread shape
//! `gate_harness::process` uses, scoped to this one caller.

use std::env;
use std::io;
use std::path::Path;
use std::process::Command;
use std::process::Output;
use std::process::Stdio;
use std::sync::mpsc;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use gate_core::Finding;

use crate::llm::error::LlmError;
use crate::llm::parser::ResponseParser;

/// Default agentic CLI timeout, in seconds (see the concurrency and
/// resource model in SPEC_FULL.md §5).
pub const DEFAULT_AGENTIC_TIMEOUT_SECS: u64 = 300;

/// A `Finding`-producing analysis path that does not go through
/// [`crate::llm::provider::LlmProvider`] at all.
pub trait AgenticAnalyzer {
    /// Runs the agentic analysis over `worktree_root`, returning the
    /// findings it produced.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::AgenticBinaryUnavailable`] if the binary is not
    /// on `PATH`, or [`LlmError::AgenticProcess`] if it could not be
    /// spawned, exceeded `timeout`, or exited with a failure status.
    fn run(&self, worktree: &Path, model: &str, timeout: Duration) -> Result<Vec<Finding>, LlmError>;
}

/// Invokes a third-party agentic code CLI under a read-only sandbox flag
/// and a bounded wall-clock timeout, parsing its stdout as NDJSON findings.
pub struct AgenticCliProvider {
    binary: String,
    parser: ResponseParser,
}

impl AgenticCliProvider {
    /// Creates a provider invoking `binary` (resolved against `PATH`).
    #[must_use]
    pub const fn new(binary: String) -> Self {
        Self {
            binary,
            parser: ResponseParser::new("agentic"),
        }
    }
}

impl AgenticAnalyzer for AgenticCliProvider {
    fn run(&self, worktree: &Path, model: &str, timeout: Duration) -> Result<Vec<Finding>, LlmError> {
        if !is_on_path(&self.binary) {
            return Err(LlmError::AgenticBinaryUnavailable { binary: self.binary.clone() });
        }

        let timeout_secs = timeout.as_secs().to_string();
        let mut command = Command::new(&self.binary);
        command
            .args(["exec", "--model", model, "--sandbox", "read-only", "--timeout", &timeout_secs])
            .current_dir(worktree)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = spawn_with_budget(&self.binary, &mut command, timeout)?;

        if !output.status.success() {
            return Err(LlmError::AgenticProcess {
                binary: self.binary.clone(),
                reason: format!("exited with status {}: {}", output.status, String::from_utf8_lossy(&output.stderr)),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(self.parser.parse(&stdout))
    }
}

/// Returns true if `binary` resolves to an executable file on `PATH`.
fn is_on_path(binary: &str) -> bool {
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

/// Spawns `command` and enforces `budget` with a watchdog thread, killing
/// the child if it has not produced output in time.
fn spawn_with_budget(binary: &str, command: &mut Command, budget: Duration) -> Result<Output, LlmError> {
    let child = command.spawn().map_err(|source| agentic_spawn_error(binary, &source))?;
    let slot = Arc::new(Mutex::new(Some(child)));
    let waiter_slot = Arc::clone(&slot);

    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        let taken = {
            #[allow(clippy::expect_used, reason = "poisoning here would indicate a prior panic in this same thread")]
            waiter_slot.lock().expect("agentic process mutex poisoned").take()
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
            Err(agentic_spawn_error(binary, &source))
        }
        Err(mpsc::RecvTimeoutError::Timeout | mpsc::RecvTimeoutError::Disconnected) => {
            #[allow(clippy::expect_used, reason = "poisoning here would indicate a prior panic in this same thread")]
            if let Some(mut child) = slot.lock().expect("agentic process mutex poisoned").take() {
                let _ = child.kill();
                let _ = child.wait();
            }
            let _ = worker.join();
            Err(LlmError::AgenticProcess {
                binary: binary.to_string(),
                reason: format!("exceeded its {budget:?} budget and was killed"),
            })
        }
    }
}

fn agentic_spawn_error(binary: &str, source: &io::Error) -> LlmError {
    LlmError::AgenticProcess { binary: binary.to_string(), reason: source.to_string() }
}
