// gate-publish/src/sink/http.rs
// ============================================================================
// Module: HTTP Telemetry Sink
// Description: Reference sink that uploads telemetry payloads over HTTP.
// Purpose: Give the orchestrator a real destination for Tier1-3 payloads
//          without requiring a caller-supplied callback for the common case.
// Dependencies: reqwest
// ============================================================================

//! ## Overview
//! [`HttpTelemetrySink`] mirrors `gate_providers::host::GithubHostApiClient`'s
//! bounded `reqwest::blocking::Client` shape — explicit timeout, user agent,
//! redirects disabled — posting the serialized [`TelemetryPayload`] as the
//! request body. It only accepts [`DispatchTarget::Collector`] destinations;
//! a [`DispatchTarget::Local`] target is a caller error, not a transport
//! failure, so it is rejected before any network call is attempted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use gate_config::SecretString;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;

use crate::sink::DispatchReceipt;
use crate::sink::DispatchTarget;
use crate::sink::ReceiptFactory;
use crate::sink::Sink;
use crate::sink::SinkError;
use crate::telemetry::TelemetryPayload;

/// User agent sent with every telemetry upload.
const USER_AGENT: &str = "omar-gate-telemetry/0.1";

// ============================================================================
// SECTION: Http Telemetry Sink
// ============================================================================

/// Reference [`Sink`] that POSTs a [`TelemetryPayload`] to a collector
/// endpoint.
pub struct HttpTelemetrySink {
    client: Client,
    bearer_token: Option<SecretString>,
    timeout: Duration,
    receipts: ReceiptFactory,
}

impl HttpTelemetrySink {
    /// Creates a sink bounding every upload by `timeout`, authenticating
    /// with `bearer_token` when present.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::DeliveryFailed`] if the underlying HTTP client
    /// cannot be built.
    pub fn new(timeout: Duration, bearer_token: Option<SecretString>) -> Result<Self, SinkError> {
        let client = Client::builder().user_agent(USER_AGENT).redirect(Policy::none()).build().map_err(|source| SinkError::DeliveryFailed(source.to_string()))?;
        Ok(Self { client, bearer_token, timeout, receipts: ReceiptFactory::new("http") })
    }
}

impl Sink for HttpTelemetrySink {
    fn deliver(&self, target: &DispatchTarget, payload: &TelemetryPayload) -> Result<DispatchReceipt, SinkError> {
        let DispatchTarget::Collector { endpoint } = target else {
            return Err(SinkError::DeliveryFailed("http telemetry sink requires a Collector target".to_string()));
        };

        let mut request = self.client.post(endpoint).timeout(self.timeout).json(payload);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token.expose());
        }

        let response = request.send().map_err(|source| SinkError::DeliveryFailed(source.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::DeliveryFailed(format!("telemetry collector returned status {status}")));
        }

        Ok(self.receipts.next(target, payload))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only http server setup and assertions are permitted.")]

    use std::time::Duration;

    use gate_core::RunId;
    use gate_core::Summary;
    use gate_core::TelemetryTier;

    use super::HttpTelemetrySink;
    use crate::sink::DispatchTarget;
    use crate::sink::Sink;
    use crate::telemetry::TelemetryAuth;
    use crate::telemetry::TelemetryPayload;

    #[test]
    fn rejects_a_local_target_without_attempting_a_network_call() {
        let sink = HttpTelemetrySink::new(Duration::from_secs(1), None).expect("client build");
        let summary = Summary::incomplete(RunId::new("r-1"), "dk-1", "2026-01-01T00:00:00Z", "default", "1");
        let payload = TelemetryPayload::build(TelemetryTier::Tier1, "acme/repo", &summary, &[], None, TelemetryAuth::Anonymous);

        let err = sink.deliver(&DispatchTarget::Local { name: "test".to_string() }, &payload).unwrap_err();
        assert!(err.to_string().contains("Collector"));
    }

    #[test]
    fn delivers_to_a_local_test_server() {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("bind test server");
        let addr = server.server_addr();
        let endpoint = format!("http://{addr}/telemetry");

        let handle = std::thread::spawn(move || {
            let request = server.recv().expect("request received");
            request.respond(tiny_http::Response::from_string("ok")).expect("respond");
        });

        let sink = HttpTelemetrySink::new(Duration::from_secs(5), None).expect("client build");
        let summary = Summary::incomplete(RunId::new("r-1"), "dk-1", "2026-01-01T00:00:00Z", "default", "1");
        let payload = TelemetryPayload::build(TelemetryTier::Tier1, "acme/repo", &summary, &[], None, TelemetryAuth::Anonymous);

        let receipt = sink.deliver(&DispatchTarget::Collector { endpoint }, &payload).expect("delivered");
        assert_eq!(receipt.dispatcher, "http");

        handle.join().expect("server thread");
    }
}
