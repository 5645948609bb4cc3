// gate-publish/tests/telemetry_sinks.rs
// ============================================================================
// Module: Telemetry Sink Integration Tests
// Description: Exercises LogSink, CallbackSink, and ChannelSink through the
//              public gate-publish API.
// ============================================================================
//! ## Overview
//! Unit tests colocated with each sink cover its own construction logic;
//! these tests exercise the three ready-made sinks the way the orchestrator
//! actually calls them — through `TelemetryReporter::upload`.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only construction and assertions are permitted.")]

use std::sync::Mutex;
use std::sync::mpsc::sync_channel;

use gate_core::RunId;
use gate_core::Summary;
use gate_core::TelemetryTier;
use gate_publish::CallbackSink;
use gate_publish::ChannelSink;
use gate_publish::DispatchTarget;
use gate_publish::LogSink;
use gate_publish::TelemetryAuth;
use gate_publish::TelemetryReporter;

fn sample_summary() -> Summary {
    Summary::incomplete(RunId::new("r-1"), "dk-1", "2026-01-01T00:00:00Z", "default", "1")
}

#[test]
fn log_sink_writes_one_ndjson_record_per_upload() {
    let buffer: Mutex<Vec<u8>> = Mutex::new(Vec::new());
    struct SharedWriter<'a>(&'a Mutex<Vec<u8>>);
    impl std::io::Write for SharedWriter<'_> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("unpoisoned").extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let sink = LogSink::new(SharedWriter(&buffer));
    let reporter = TelemetryReporter::new(&sink, DispatchTarget::Local { name: "log".to_string() }, TelemetryTier::Tier1);

    assert!(reporter.upload("acme/repo", &sample_summary(), &[], None, TelemetryAuth::Anonymous));

    let contents = buffer.lock().expect("unpoisoned");
    let text = String::from_utf8(contents.clone()).expect("utf8");
    assert_eq!(text.lines().count(), 1);
    let record: serde_json::Value = serde_json::from_str(text.lines().next().expect("one record")).expect("valid json");
    assert_eq!(record["dispatcher"], "log");
}

#[test]
fn callback_sink_invokes_the_supplied_handler() {
    let sink = CallbackSink::new(|target, payload| {
        assert_eq!(payload.tier, TelemetryTier::Tier2);
        Ok(gate_publish::DispatchReceipt {
            dispatch_id: "cb-1".to_string(),
            target: target.clone(),
            payload_hash: gate_core::HashDigest::new(gate_core::DEFAULT_HASH_ALGORITHM, b""),
            dispatcher: "callback".to_string(),
        })
    });
    let reporter = TelemetryReporter::new(&sink, DispatchTarget::Collector { endpoint: "https://example.test".to_string() }, TelemetryTier::Tier2);

    assert!(reporter.upload("acme/repo", &sample_summary(), &[], None, TelemetryAuth::Bearer));
}

#[test]
fn channel_sink_delivers_a_dispatch_message_the_receiver_can_read() {
    let (sender, receiver) = sync_channel(4);
    let sink = ChannelSink::new(sender);
    let reporter = TelemetryReporter::new(&sink, DispatchTarget::Local { name: "test-channel".to_string() }, TelemetryTier::Tier1);

    assert!(reporter.upload("acme/repo", &sample_summary(), &[], None, TelemetryAuth::Anonymous));

    let message = receiver.try_recv().expect("message enqueued");
    assert_eq!(message.payload.tier, TelemetryTier::Tier1);
    assert_eq!(message.receipt.dispatcher, "channel");
}

#[test]
fn upload_is_a_noop_when_telemetry_is_off() {
    let (sender, receiver) = sync_channel(4);
    let sink = ChannelSink::new(sender);
    let reporter = TelemetryReporter::new(&sink, DispatchTarget::Local { name: "test-channel".to_string() }, TelemetryTier::Off);

    assert!(reporter.upload("acme/repo", &sample_summary(), &[], None, TelemetryAuth::Anonymous));
    assert!(receiver.try_recv().is_err());
}
