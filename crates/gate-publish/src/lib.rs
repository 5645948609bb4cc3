// gate-publish/src/lib.rs
// ============================================================================
// Module: Omar Gate Publish Library
// Description: The sticky PR comment / check run publisher (C11) and the
//              best-effort telemetry uploader (C12).
// Purpose: Give the orchestrator the two calls it makes after a gate
//          decision is computed — publish the result to the host, then
//          upload a tiered telemetry payload regardless of outcome.
// Dependencies: gate-config, gate-core, gate-providers, reqwest, serde,
//               serde_json, thiserror
// ============================================================================

//! ## Overview
//! `gate-publish` owns two independent external-interface seams. [`publisher`]
//! renders a [`gate_core::GateResult`] into a sticky PR comment and a named
//! check run via [`gate_providers::HostApiClient`]. [`telemetry`] builds a
//! tiered payload from a completed [`gate_core::Summary`] and hands it to a
//! [`sink::Sink`] — a log file by default, or an HTTP/callback/channel
//! destination the orchestrator wires in.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod publisher;
pub mod sink;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use publisher::GithubPublisher;
pub use publisher::PublishError;
pub use publisher::Publisher;
pub use publisher::CHECK_RUN_NAME;
pub use sink::CallbackSink;
pub use sink::ChannelSink;
pub use sink::DispatchMessage;
pub use sink::DispatchReceipt;
pub use sink::DispatchTarget;
pub use sink::HttpTelemetrySink;
pub use sink::LogSink;
pub use sink::Sink;
pub use sink::SinkError;
pub use telemetry::ArtifactUpload;
pub use telemetry::FindingMetadata;
pub use telemetry::TelemetryAuth;
pub use telemetry::TelemetryPayload;
pub use telemetry::TelemetryReporter;
