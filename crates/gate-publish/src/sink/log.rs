// gate-publish/src/sink/log.rs
// ============================================================================
// Module: Telemetry Log Sink
// Description: Log-only sink for audit-grade delivery records.
// Purpose: Give local and CI runs a zero-network default sink that still
//          produces a receipt and an NDJSON audit trail.
// Dependencies: serde_json, std
// ============================================================================

//! ## Overview
//! `LogSink` writes one NDJSON record per payload and never leaves the
//! process. It is the default sink wired in when no telemetry endpoint is
//! configured.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;

use serde_json::json;

use crate::sink::DispatchReceipt;
use crate::sink::DispatchTarget;
use crate::sink::ReceiptFactory;
use crate::sink::Sink;
use crate::sink::SinkError;
use crate::telemetry::TelemetryPayload;

// ============================================================================
// SECTION: Log Sink
// ============================================================================

/// Log-only telemetry sink.
pub struct LogSink<W: Write + Send> {
    /// Output writer for log records.
    writer: Mutex<W>,
    /// Receipt factory for deterministic dispatch IDs.
    receipts: ReceiptFactory,
}

impl<W: Write + Send> LogSink<W> {
    /// Creates a log sink with the default dispatcher name.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer: Mutex::new(writer), receipts: ReceiptFactory::new("log") }
    }

    /// Creates a log sink with a custom dispatcher name.
    #[must_use]
    pub fn with_dispatcher(writer: W, dispatcher: impl Into<String>) -> Self {
        Self { writer: Mutex::new(writer), receipts: ReceiptFactory::new(dispatcher) }
    }
}

impl<W: Write + Send> Sink for LogSink<W> {
    fn deliver(&self, target: &DispatchTarget, payload: &TelemetryPayload) -> Result<DispatchReceipt, SinkError> {
        let receipt = self.receipts.next(target, payload);
        let record = json!({
            "dispatch_id": receipt.dispatch_id,
            "dispatcher": receipt.dispatcher,
            "target": receipt.target,
            "tier": payload.tier,
            "run_id": payload.run_id,
            "payload_hash": receipt.payload_hash,
        });
        let mut guard = self.writer.lock().map_err(|_| SinkError::LogWriteFailed("log writer mutex poisoned".to_string()))?;
        serde_json::to_writer(&mut *guard, &record).map_err(|err| SinkError::LogWriteFailed(err.to_string()))?;
        guard.write_all(b"\n").map_err(|err| SinkError::LogWriteFailed(err.to_string()))?;
        drop(guard);
        Ok(receipt)
    }
}
