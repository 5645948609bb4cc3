// gate-publish/src/sink.rs
// ============================================================================
// Module: Telemetry Sink
// Description: The delivery seam telemetry payloads cross on their way out
//              of the process.
// Purpose: Let the orchestrator swap a real HTTP destination for a log file
//          or an in-memory channel in tests without touching `telemetry.rs`.
// Dependencies: gate-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! `Sink` + `LogSink`/`CallbackSink`/`ChannelSink`/`HttpTelemetrySink` +
//! `ReceiptFactory`, simplified relative to a general-purpose broker: there
//! is no source-resolution step, because a [`crate::telemetry::TelemetryPayload`]
//! is always built in-process, never fetched from an external reference.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod callback;
mod channel;
mod http;
mod log;

pub use callback::CallbackSink;
pub use channel::ChannelSink;
pub use channel::DispatchMessage;
pub use http::HttpTelemetrySink;
pub use log::LogSink;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use gate_core::DEFAULT_HASH_ALGORITHM;
use gate_core::HashDigest;
use serde::Serialize;
use thiserror::Error;

use crate::telemetry::TelemetryPayload;

// ============================================================================
// SECTION: Dispatch Target
// ============================================================================

/// Delivery destination for one telemetry payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DispatchTarget {
    /// The vendor's hosted telemetry collector, reached over HTTP.
    Collector {
        /// Upload endpoint URL.
        endpoint: String,
    },
    /// An in-process or test destination, named for diagnostics only.
    Local {
        /// Destination name, e.g. `"stdout-log"` or `"test-channel"`.
        name: String,
    },
}

// ============================================================================
// SECTION: Dispatch Receipt
// ============================================================================

/// Proof a telemetry payload was handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReceipt {
    /// Sink-scoped, monotonically increasing identifier.
    pub dispatch_id: String,
    /// Destination the payload was delivered to.
    pub target: DispatchTarget,
    /// Content hash of the serialized payload, for audit correlation.
    pub payload_hash: HashDigest,
    /// Name of the sink that produced this receipt.
    pub dispatcher: String,
}

// ============================================================================
// SECTION: Sink Error
// ============================================================================

/// Failure produced while delivering a telemetry payload.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The log sink's writer rejected a write.
    #[error("telemetry log write failed: {0}")]
    LogWriteFailed(String),
    /// The destination refused or could not accept the payload.
    #[error("telemetry delivery failed: {0}")]
    DeliveryFailed(String),
}

// ============================================================================
// SECTION: Sink Trait
// ============================================================================

/// Delivers one resolved telemetry payload to one destination.
pub trait Sink: Send + Sync {
    /// Delivers `payload` to `target`, returning a receipt on success.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the destination could not be reached or
    /// rejected the payload. Callers in `telemetry.rs` treat every
    /// [`SinkError`] as fail-open: the error is recorded, never propagated.
    fn deliver(&self, target: &DispatchTarget, payload: &TelemetryPayload) -> Result<DispatchReceipt, SinkError>;
}

// ============================================================================
// SECTION: Receipt Factory
// ============================================================================

/// Issues deterministic, monotonically increasing dispatch IDs for one sink.
#[derive(Debug)]
pub(crate) struct ReceiptFactory {
    dispatcher: String,
    sequence: AtomicU64,
}

impl ReceiptFactory {
    pub(crate) fn new(dispatcher: impl Into<String>) -> Self {
        Self { dispatcher: dispatcher.into(), sequence: AtomicU64::new(0) }
    }

    pub(crate) fn next(&self, target: &DispatchTarget, payload: &TelemetryPayload) -> DispatchReceipt {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let payload_bytes = serde_json::to_vec(payload).unwrap_or_default();
        DispatchReceipt {
            dispatch_id: format!("{}-{seq}", self.dispatcher),
            target: target.clone(),
            payload_hash: HashDigest::new(DEFAULT_HASH_ALGORITHM, &payload_bytes),
            dispatcher: self.dispatcher.clone(),
        }
    }
}
