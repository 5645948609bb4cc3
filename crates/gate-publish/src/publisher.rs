// gate-publish/src/publisher.rs
// ============================================================================
// Module: Publisher
// Description: Renders a gate decision into a sticky PR comment and a named
//              check run.
// Purpose: Give the orchestrator one call that leaves a PR in a consistent,
//          idempotent published state regardless of how many times the same
//          head SHA is re-run.
// Dependencies: gate-core, gate-providers
// ============================================================================

//! ## Overview
//! [`GithubPublisher`] locates its own prior comment by a stable marker
//! (`<!-- sentinellayer:omar-gate:v1:{repo}:{pr_number} -->`), updating it in
//! place if found and creating it otherwise, then files a check run named
//! `Omar Gate` with `external_id` set to the run's dedupe key so a future
//! preflight dedupe lookup (`gate_providers::host::HostApiClient::list_check_runs`)
//! can find it again. Annotation count is clamped to the host's 50-per-run
//! limit before the call is made, not inside [`gate_providers::host`].

use std::time::Duration;

use gate_core::Finding;
use gate_core::GateResult;
use gate_core::GateStatus;
use gate_core::Severity;
use gate_providers::HostApiClient;
use gate_providers::host::CheckRunAnnotation;
use gate_providers::host::HostApiError;
use thiserror::Error;

/// Maximum annotations attached to a single check run.
const MAX_ANNOTATIONS: usize = 50;

/// Check run name published for every run, reused by preflight's dedupe
/// lookup.
pub const CHECK_RUN_NAME: &str = "Omar Gate";

/// Returns the stable sticky-comment marker for one `(repo, pr_number)`.
#[must_use]
pub fn sticky_marker(repo: &str, pr_number: u64) -> String {
    format!("<!-- sentinellayer:omar-gate:v1:{repo}:{pr_number} -->")
}

/// Failure produced while publishing a gate decision.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The host API call failed.
    #[error("publisher host api call failed: {0}")]
    Host(#[from] HostApiError),
}

/// Publishes a [`GateResult`] to the code host.
pub trait Publisher {
    /// Publishes the sticky PR comment and check run for one run's outcome.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] if any underlying host API call fails.
    fn publish(&self, repo: &str, pr_number: u64, head_sha: &str, result: &GateResult, findings: &[Finding]) -> Result<(), PublishError>;
}

/// Reference [`Publisher`] over [`gate_providers::host::HostApiClient`].
pub struct GithubPublisher<'a> {
    host: &'a dyn HostApiClient,
    timeout: Duration,
}

impl<'a> GithubPublisher<'a> {
    /// Creates a publisher issuing every host API call with `timeout`.
    #[must_use]
    pub const fn new(host: &'a dyn HostApiClient, timeout: Duration) -> Self {
        Self { host, timeout }
    }

    fn find_sticky_comment(&self, repo: &str, pr_number: u64) -> Result<Option<u64>, PublishError> {
        let marker = sticky_marker(repo, pr_number);
        let comments = self.host.list_pr_comments(repo, pr_number, self.timeout)?;
        Ok(comments.into_iter().find(|comment| comment.body.contains(&marker)).map(|comment| comment.id))
    }

    fn render_comment(&self, repo: &str, pr_number: u64, result: &GateResult) -> String {
        let marker = sticky_marker(repo, pr_number);
        let verdict = match result.status {
            GateStatus::Passed => "✅ Passed",
            GateStatus::Blocked => "❌ Blocked",
            GateStatus::Bypassed => "⏭️ Bypassed (prior run mirrored)",
            GateStatus::NeedsApproval => "⏳ Needs approval",
            GateStatus::Error => "⚠️ Error",
        };
        format!(
            "{marker}\n## Omar Gate — {verdict}\n\n{}\n\n| P0 | P1 | P2 | P3 |\n|---|---|---|---|\n| {} | {} | {} | {} |\n",
            result.reason, result.counts.p0, result.counts.p1, result.counts.p2, result.counts.p3
        )
    }

    fn top_findings(findings: &[Finding]) -> Vec<&Finding> {
        let mut sorted: Vec<&Finding> = findings.iter().collect();
        sorted.sort_by(|a, b| a.severity.cmp(&b.severity).then_with(|| a.fingerprint.cmp(&b.fingerprint)));
        sorted.truncate(MAX_ANNOTATIONS);
        sorted
    }
}

impl Publisher for GithubPublisher<'_> {
    fn publish(&self, repo: &str, pr_number: u64, head_sha: &str, result: &GateResult, findings: &[Finding]) -> Result<(), PublishError> {
        let body = self.render_comment(repo, pr_number, result);
        match self.find_sticky_comment(repo, pr_number)? {
            Some(comment_id) => self.host.update_comment(repo, comment_id, &body, self.timeout)?,
            None => self.host.create_comment(repo, pr_number, &body, self.timeout)?,
        }

        let blocking: Vec<&Finding> = Self::top_findings(findings).into_iter().filter(|finding| finding.severity <= Severity::P1).collect();
        let annotations: Vec<CheckRunAnnotation> = blocking.iter().map(|finding| annotation_for(finding)).collect();

        let conclusion = if result.status.blocks_pr() { "failure" } else { "success" };
        self.host.create_check_run(repo, head_sha, CHECK_RUN_NAME, conclusion, &result.reason, &annotations, &result.dedupe_key, self.timeout)?;

        Ok(())
    }
}

fn annotation_for(finding: &Finding) -> CheckRunAnnotation {
    CheckRunAnnotation {
        path: finding.file_path.as_str().to_string(),
        start_line: finding.line_start,
        end_line: finding.line_end,
        level: match finding.severity {
            Severity::P0 => "failure",
            Severity::P1 => "failure",
            Severity::P2 => "warning",
            Severity::P3 => "notice",
        },
        title: format!("[{}] {}", finding.severity, finding.category),
        message: format!("{}\n\nRecommendation: {}", finding.message, finding.recommendation),
    }
}

#[cfg(test)]
mod tests {
    use super::sticky_marker;
    use super::GithubPublisher;
    use super::Publisher;
    use gate_core::Category;
    use gate_core::Confidence;
    use gate_core::Finding;
    use gate_core::FindingId;
    use gate_core::FindingSource;
    use gate_core::GateResult;
    use gate_core::RepoPath;
    use gate_core::Severity;
    use gate_core::SeverityCounts;
    use gate_providers::host::CheckRunAnnotation;
    use gate_providers::host::CheckRunSummary;
    use gate_providers::host::HostApiClient;
    use gate_providers::host::HostApiError;
    use gate_providers::host::PrComment;
    use gate_providers::host::WorkflowRunSummary;
    use std::cell::RefCell;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeHost {
        comments: RefCell<Vec<PrComment>>,
        created_comments: RefCell<Vec<String>>,
        updated_comments: RefCell<Vec<(u64, String)>>,
        check_runs_created: RefCell<Vec<(String, usize)>>,
    }

    impl HostApiClient for FakeHost {
        fn list_check_runs(&self, _: &str, _: &str, _: &str, _: Duration) -> Result<Vec<CheckRunSummary>, HostApiError> {
            Ok(Vec::new())
        }

        fn create_check_run(
            &self,
            _: &str,
            _: &str,
            _: &str,
            conclusion: &str,
            _: &str,
            annotations: &[CheckRunAnnotation],
            _: &str,
            _: Duration,
        ) -> Result<(), HostApiError> {
            self.check_runs_created.borrow_mut().push((conclusion.to_string(), annotations.len()));
            Ok(())
        }

        fn list_pr_comments(&self, _: &str, _: u64, _: Duration) -> Result<Vec<PrComment>, HostApiError> {
            Ok(self.comments.borrow().clone())
        }

        fn create_comment(&self, _: &str, _: u64, body: &str, _: Duration) -> Result<(), HostApiError> {
            self.created_comments.borrow_mut().push(body.to_string());
            Ok(())
        }

        fn update_comment(&self, _: &str, comment_id: u64, body: &str, _: Duration) -> Result<(), HostApiError> {
            self.updated_comments.borrow_mut().push((comment_id, body.to_string()));
            Ok(())
        }

        fn list_workflow_runs_last_24h(&self, _: &str, _: &str, _: Duration) -> Result<Vec<WorkflowRunSummary>, HostApiError> {
            Ok(Vec::new())
        }
    }

    impl Clone for PrComment {
        fn clone(&self) -> Self {
            Self { id: self.id, body: self.body.clone() }
        }
    }

    fn sample_finding(severity: Severity) -> Finding {
        Finding::new(
            FindingId::new("f-1"),
            severity,
            Category::new("auth"),
            FindingSource::Deterministic,
            RepoPath::new("src/auth.rs"),
            1,
            1,
            "snippet",
            "message",
            "recommendation",
            Confidence::default(),
        )
        .expect("valid finding")
    }

    #[test]
    fn creates_a_comment_when_no_sticky_marker_exists() {
        let host = FakeHost::default();
        let publisher = GithubPublisher::new(&host, Duration::from_secs(5));
        let result = GateResult::passed(SeverityCounts::default(), "dk-1");

        publisher.publish("acme/repo", 42, "abc123", &result, &[]).expect("publish");

        assert_eq!(host.created_comments.borrow().len(), 1);
        assert!(host.created_comments.borrow()[0].contains(&sticky_marker("acme/repo", 42)));
        assert_eq!(host.check_runs_created.borrow()[0].0, "success");
    }

    #[test]
    fn updates_the_existing_sticky_comment_instead_of_creating_a_new_one() {
        let host = FakeHost::default();
        host.comments.borrow_mut().push(PrComment { id: 7, body: sticky_marker("acme/repo", 42) });
        let publisher = GithubPublisher::new(&host, Duration::from_secs(5));
        let result = GateResult::blocked(SeverityCounts::default(), "dk-1", "p0 finding");

        publisher.publish("acme/repo", 42, "abc123", &result, &[sample_finding(Severity::P0)]).expect("publish");

        assert!(host.created_comments.borrow().is_empty());
        assert_eq!(host.updated_comments.borrow()[0].0, 7);
        assert_eq!(host.check_runs_created.borrow()[0].0, "failure");
        assert_eq!(host.check_runs_created.borrow()[0].1, 1);
    }
}
