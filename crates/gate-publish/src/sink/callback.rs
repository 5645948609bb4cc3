// gate-publish/src/sink/callback.rs
// ============================================================================
// Module: Telemetry Callback Sink
// Description: Callback-based sink for caller-supplied delivery logic.
// Purpose: Let the orchestrator wire in a real HTTP uploader (or a test
//          double) without this crate depending on that transport directly.
// Dependencies: std
// ============================================================================

//! ## Overview
//! [`CallbackSink`] delivers payloads by invoking a user-supplied function
//! and returning the receipt it produces.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::sink::DispatchReceipt;
use crate::sink::DispatchTarget;
use crate::sink::Sink;
use crate::sink::SinkError;
use crate::telemetry::TelemetryPayload;

// ============================================================================
// SECTION: Callback Sink
// ============================================================================

/// Callback-based telemetry sink.
#[derive(Clone)]
pub struct CallbackSink {
    /// Handler invoked with the target and payload.
    handler: Arc<CallbackHandler>,
}

/// Callback handler signature used by the sink.
type CallbackHandler = dyn Fn(&DispatchTarget, &TelemetryPayload) -> Result<DispatchReceipt, SinkError> + Send + Sync;

impl CallbackSink {
    /// Creates a callback sink from a handler function.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&DispatchTarget, &TelemetryPayload) -> Result<DispatchReceipt, SinkError> + Send + Sync + 'static,
    {
        Self { handler: Arc::new(handler) }
    }
}

impl Sink for CallbackSink {
    fn deliver(&self, target: &DispatchTarget, payload: &TelemetryPayload) -> Result<DispatchReceipt, SinkError> {
        (self.handler)(target, payload)
    }
}
