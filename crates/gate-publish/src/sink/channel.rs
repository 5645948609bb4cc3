// gate-publish/src/sink/channel.rs
// ============================================================================
// Module: Telemetry Channel Sink
// Description: Channel-based sink for asynchronous, in-memory delivery.
// Purpose: Let tests and an in-process collector observe telemetry payloads
//          without standing up a real HTTP endpoint.
// Dependencies: std
// ============================================================================

//! ## Overview
//! [`ChannelSink`] delivers payloads by sending a [`DispatchMessage`] into a
//! bounded `std::sync::mpsc` channel, matching the workspace's no-async-runtime
//! convention.
//!
//! # Invariants
//! - Each successful delivery enqueues exactly one [`DispatchMessage`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::mpsc::SyncSender;

use crate::sink::DispatchReceipt;
use crate::sink::DispatchTarget;
use crate::sink::ReceiptFactory;
use crate::sink::Sink;
use crate::sink::SinkError;
use crate::telemetry::TelemetryPayload;

// ============================================================================
// SECTION: Dispatch Message
// ============================================================================

/// One payload plus its receipt, as enqueued by [`ChannelSink`].
#[derive(Debug, Clone)]
pub struct DispatchMessage {
    /// Destination the payload was delivered to.
    pub target: DispatchTarget,
    /// The delivered payload.
    pub payload: TelemetryPayload,
    /// Receipt produced for this delivery.
    pub receipt: DispatchReceipt,
}

// ============================================================================
// SECTION: Channel Sink
// ============================================================================

/// Channel-based telemetry sink.
///
/// # Invariants
/// - Each successful delivery emits a message with a matching receipt.
#[derive(Debug)]
pub struct ChannelSink {
    /// Sender used to dispatch messages.
    sender: SyncSender<DispatchMessage>,
    /// Receipt factory for deterministic dispatch IDs.
    receipts: ReceiptFactory,
}

impl ChannelSink {
    /// Creates a channel sink with the default dispatcher name.
    #[must_use]
    pub fn new(sender: SyncSender<DispatchMessage>) -> Self {
        Self { sender, receipts: ReceiptFactory::new("channel") }
    }

    /// Creates a channel sink with a custom dispatcher name.
    #[must_use]
    pub fn with_dispatcher(sender: SyncSender<DispatchMessage>, dispatcher: impl Into<String>) -> Self {
        Self { sender, receipts: ReceiptFactory::new(dispatcher) }
    }
}

impl Sink for ChannelSink {
    fn deliver(&self, target: &DispatchTarget, payload: &TelemetryPayload) -> Result<DispatchReceipt, SinkError> {
        let receipt = self.receipts.next(target, payload);
        let message = DispatchMessage { target: target.clone(), payload: payload.clone(), receipt: receipt.clone() };
        self.sender.try_send(message).map_err(|err| SinkError::DeliveryFailed(err.to_string()))?;
        Ok(receipt)
    }
}
