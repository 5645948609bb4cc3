// gate-cli/src/main.rs
// ============================================================================
// Module: Omar Gate CLI Entry Point
// Description: Thin argument-parsing shell over `gate_cli::orchestrator::run`.
// Purpose: Resolve configuration and event context, construct the real host
//          API client and telemetry sink, run the pipeline, and map its
//          outcome to the process exit code GitHub Actions reads.
// Dependencies: clap, gate-config, gate-core, gate-providers, gate-publish
// ============================================================================

//! ## Overview
//! `main` never touches pipeline logic itself. It resolves [`GateConfig`]
//! and [`gate_core::Context`] from the runner environment, builds the one
//! real [`GithubHostApiClient`] and [`Sink`] this process uses, and hands
//! everything to [`gate_cli::orchestrator::run`]. A failure to resolve
//! config or context never reaches the orchestrator at all: it is mapped
//! straight to [`Outcome::ConfigError`] (exit code `2`).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use gate_cli::exit_code;
use gate_cli::exit_code::Outcome;
use gate_cli::orchestrator;
use gate_cli::orchestrator::RunDeps;
use gate_config::GateConfig;
use gate_providers::host::GithubHostApiClient;
use gate_publish::sink::DispatchTarget;
use gate_publish::sink::HttpTelemetrySink;
use gate_publish::sink::LogSink;
use gate_publish::sink::Sink;

/// Environment variable naming the worktree `omar-gate` scans, defaulting to
/// the current working directory (the layout every `actions/checkout` step
/// leaves behind).
const WORKTREE_ROOT_VAR: &str = "GITHUB_WORKSPACE";
/// Environment variable naming an optional telemetry collector endpoint. Its
/// absence selects [`LogSink`] over [`HttpTelemetrySink`].
const TELEMETRY_ENDPOINT_VAR: &str = "TELEMETRY_ENDPOINT";
/// Bound on a telemetry upload over HTTP, mirroring the publisher's own
/// per-call budget.
const HOST_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// `omar-gate`: runs the pull-request security gate for one triggering
/// event and exits with the status GitHub Actions reads.
#[derive(Parser, Debug)]
#[command(name = "omar-gate", version, about)]
struct Cli {
    /// Print the resolved worktree root and exit without scanning, for
    /// debugging a runner's checkout step.
    #[arg(long)]
    show_worktree: bool,
}

/// CLI entry point. Never panics on a bad environment: every fallible step
/// maps to an [`Outcome`] before reaching [`exit_code::exit_code_for`].
fn main() -> ExitCode {
    let cli = Cli::parse();

    let worktree_root = match env::var(WORKTREE_ROOT_VAR) {
        Ok(path) => PathBuf::from(path),
        Err(_) => match env::current_dir() {
            Ok(cwd) => cwd,
            Err(err) => return fatal(&format!("could not resolve current directory: {err}")),
        },
    };

    if cli.show_worktree {
        let _ = writeln!(std::io::stdout(), "{}", worktree_root.display());
        return ExitCode::SUCCESS;
    }

    let config = match GateConfig::from_env() {
        Ok(config) => config,
        Err(err) => return exit_code::exit_code_for(report_config_error(&err.to_string())),
    };
    let context = match gate_config::context::from_event() {
        Ok(context) => context,
        Err(err) => return exit_code::exit_code_for(report_config_error(&err.to_string())),
    };

    let host = match GithubHostApiClient::new(config.host_token.expose()) {
        Ok(host) => host,
        Err(err) => return exit_code::exit_code_for(report_config_error(&err.to_string())),
    };

    let (sink, telemetry_target): (Box<dyn Sink>, DispatchTarget) = match env::var(TELEMETRY_ENDPOINT_VAR) {
        Ok(endpoint) => match HttpTelemetrySink::new(HOST_CALL_TIMEOUT, config.telemetry_token.clone()) {
            Ok(sink) => (Box::new(sink), DispatchTarget::Collector { endpoint }),
            Err(err) => return exit_code::exit_code_for(report_config_error(&err.to_string())),
        },
        Err(_) => (Box::new(LogSink::new(std::io::stderr())), DispatchTarget::Local { name: "stderr-log".to_string() }),
    };

    let deps = RunDeps { worktree_root: &worktree_root, host: &host, sink: sink.as_ref(), telemetry_target };

    let outcome = orchestrator::run(&config, &context, &deps);
    exit_code::exit_code_for(outcome)
}

/// Writes `reason` to stderr and returns [`Outcome::ConfigError`], for a
/// failure so early that no run directory exists to record it in.
fn report_config_error(reason: &str) -> Outcome {
    let _ = writeln!(std::io::stderr(), "omar-gate: configuration error: {reason}");
    Outcome::ConfigError
}

/// Writes `message` to stderr and returns `ExitCode::FAILURE`, for a failure
/// so early it predates even configuration loading.
fn fatal(message: &str) -> ExitCode {
    let _ = writeln!(std::io::stderr(), "omar-gate: {message}");
    ExitCode::FAILURE
}
