// gate-providers/src/llm/parser.rs
// ============================================================================
// Module: LLM Response Parser
// Description: Extracts NDJSON findings from a fenced code block in a
//              provider's raw completion text.
// Purpose: Turn an `LlmResponse`'s `text` into `Vec<Finding>` without ever
//          trusting a malformed line enough to propagate an error — a bad
//          line is dropped, not fatal, per the response-parser contract.
// Dependencies: gate-core, serde_json
// ============================================================================

//! ## Overview
//! The analyzer prompt asks the model for one fenced ```` ```ndjson ```` (or
//! plain ` ``` `) block containing one JSON object per line. [`ResponseParser`]
//! locates the first fenced block, parses each non-blank line independently,
//! and silently drops any line that isn't valid JSON, is missing a required
//! field, or produces an invalid [`Finding`] (e.g. an inverted line range).
//! This mirrors the scanner contract's "errors are per-item, not per-batch"
//! shape: one bad finding from the model never discards the rest.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use gate_core::Category;
use gate_core::Confidence;
use gate_core::Finding;
use gate_core::FindingId;
use gate_core::FindingSource;
use gate_core::RepoPath;
use gate_core::Severity;
use serde::Deserialize;
use serde_json::Value;

/// One line of the model's NDJSON finding report, before it becomes a
/// `Finding`. Every field is required; a missing one drops the line.
#[derive(Deserialize)]
struct RawFinding {
    severity: String,
    category: String,
    file_path: String,
    line_start: u32,
    line_end: u32,
    snippet: String,
    message: String,
    recommendation: String,
    #[serde(default)]
    confidence: Option<f32>,
}

/// Extracts `Finding`s from a fenced NDJSON block in `text`.
///
/// Holds no state beyond the id counter used to mint stable-within-a-call
/// `FindingId`s, so one instance per analysis call is the expected usage.
pub struct ResponseParser {
    next_id: AtomicU64,
    id_prefix: &'static str,
}

impl ResponseParser {
    /// Creates a parser whose minted ids are prefixed `{id_prefix}-N`.
    #[must_use]
    pub const fn new(id_prefix: &'static str) -> Self {
        Self {
            next_id: AtomicU64::new(0),
            id_prefix,
        }
    }

    /// Parses every findable line of the first fenced code block in `text`,
    /// dropping malformed or invalid lines rather than failing the call.
    #[must_use]
    pub fn parse(&self, text: &str) -> Vec<Finding> {
        let Some(block) = extract_fenced_block(text) else {
            return Vec::new();
        };

        block
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| self.parse_line(line))
            .collect()
    }

    fn parse_line(&self, line: &str) -> Option<Finding> {
        let value: Value = serde_json::from_str(line).ok()?;
        let raw: RawFinding = serde_json::from_value(value).ok()?;
        let severity: Severity = raw.severity.parse().ok()?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Finding::new(
            FindingId::new(format!("{}-{id}", self.id_prefix)),
            severity,
            Category::new(raw.category),
            FindingSource::Llm,
            RepoPath::new(raw.file_path),
            raw.line_start,
            raw.line_end,
            raw.snippet,
            raw.message,
            raw.recommendation,
            raw.confidence.map_or_else(Confidence::default, Confidence::new),
        )
        .ok()
    }
}

/// Returns the contents of the first fenced code block in `text` (any
/// language tag, including none), or `None` if no closed fence is present.
fn extract_fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_open = &text[start + 3..];
    let line_end = after_open.find('\n').unwrap_or(0);
    let body_start = line_end + 1;
    let close = after_open[body_start..].find("```")?;
    Some(&after_open[body_start..body_start + close])
}

#[cfg(test)]
mod tests {
    use super::ResponseParser;

    #[test]
    fn parses_well_formed_ndjson_block() {
        let text = "here are the findings:\n```ndjson\n{\"severity\":\"P1\",\"category\":\"auth\",\"file_path\":\"src/auth.py\",\"line_start\":42,\"line_end\":42,\"snippet\":\"if true:\",\"message\":\"bypass\",\"recommendation\":\"fix\"}\n```\n";
        let findings = ResponseParser::new("llm").parse(text);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].file_path.as_str(), "src/auth.py");
    }

    #[test]
    fn drops_lines_missing_a_required_field() {
        let text = "```\n{\"severity\":\"P1\",\"category\":\"auth\"}\n```\n";
        let findings = ResponseParser::new("llm").parse(text);
        assert!(findings.is_empty());
    }

    #[test]
    fn drops_lines_with_invalid_severity() {
        let text = "```\n{\"severity\":\"P9\",\"category\":\"auth\",\"file_path\":\"a.py\",\"line_start\":1,\"line_end\":1,\"snippet\":\"\",\"message\":\"m\",\"recommendation\":\"r\"}\n```\n";
        let findings = ResponseParser::new("llm").parse(text);
        assert!(findings.is_empty());
    }

    #[test]
    fn one_bad_line_does_not_drop_good_lines_in_the_same_block() {
        let text = "```\n{\"severity\":\"bogus\"}\n{\"severity\":\"P2\",\"category\":\"secrets\",\"file_path\":\"b.py\",\"line_start\":3,\"line_end\":3,\"snippet\":\"\",\"message\":\"m\",\"recommendation\":\"r\"}\n```\n";
        let findings = ResponseParser::new("llm").parse(text);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].file_path.as_str(), "b.py");
    }

    #[test]
    fn no_fenced_block_yields_no_findings() {
        let findings = ResponseParser::new("llm").parse("no code fence here");
        assert!(findings.is_empty());
    }
}
