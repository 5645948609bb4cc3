// gate-scanners/src/engineering_quality.rs
// ============================================================================
// Module: Engineering-Quality Scanner
// Description: Stack-aware frontend/backend/infrastructure rules, with
//              opaque `EQ-NNN` rule identifiers.
// Purpose: Catch issues that depend on which part of the stack a file
//          belongs to (a missing `useEffect` cleanup only matters in
//          frontend code; a fail-open rate limiter only matters in a
//          backend handler) rather than on language syntax alone.
// Dependencies: gate-core, regex, rustpython-parser
// ============================================================================

//! ## Overview
//! [`EngineeringQualityScanner`] runs three rule subsets: frontend rules
//! (skipped entirely when [`detect_frontend_framework`] finds no evidence
//! of one), backend rules, and infrastructure rules, which always run.
//! Every rule except Python `eval`/`exec` detection is regex-based, in
//! keeping with this crate's other scanners; Python `eval`/`exec` is
//! walked from a parsed AST via [`rustpython_parser`] specifically so a
//! docstring or comment that merely mentions `eval()` can never self-match,
//! per [`find_python_eval_exec`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::sync::LazyLock;

use gate_core::Category;
use gate_core::Confidence;
use gate_core::Context;
use gate_core::Finding;
use gate_core::FindingId;
use gate_core::FindingSource;
use gate_core::IngestFile;
use gate_core::RepoPath;
use gate_core::Severity;
use regex::Regex;
use rustpython_parser::ast;
use rustpython_parser::Parse;

use crate::Scanner;
use crate::ScannerError;

// ============================================================================
// SECTION: Frontend Framework Detection
// ============================================================================

static FRONTEND_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used, reason = "fixed pattern, covered by tests")]
    Regex::new(r#""(react|vue|svelte|@angular/core|next|preact)"\s*:\s*"[^"]*""#).unwrap()
});

/// True if any `package.json` among `files` names a recognized frontend
/// framework as a dependency, or any file has a `.jsx`/`.tsx`/`.vue`/`.svelte`
/// extension.
fn detect_frontend_framework(files: &[IngestFile], read: &dyn Fn(&RepoPath) -> io::Result<String>) -> bool {
    for file in files {
        let path = file.path.as_str();
        if path.ends_with(".jsx") || path.ends_with(".tsx") || path.ends_with(".vue") || path.ends_with(".svelte") {
            return true;
        }
        if path.rsplit('/').next() == Some("package.json") {
            if let Ok(text) = read(&file.path) {
                if FRONTEND_MARKER.is_match(&text) {
                    return true;
                }
            }
        }
    }
    false
}

// ============================================================================
// SECTION: Rule Regexes
// ============================================================================

static STATE_SETTER: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used, reason = "fixed pattern, covered by tests")]
    Regex::new(r"\bset[A-Z]\w*\(").unwrap()
});
static LOOP_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used, reason = "fixed pattern, covered by tests")]
    Regex::new(r"\bfor\s*\(|\bwhile\s*\(|\.forEach\(|\.map\(").unwrap()
});
static USE_EFFECT_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used, reason = "fixed pattern, covered by tests")]
    Regex::new(r"useEffect\(\s*\(\)\s*=>\s*\{").unwrap()
});
static SUBSCRIBE_CALL: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used, reason = "fixed pattern, covered by tests")]
    Regex::new(r"addEventListener\(|\.subscribe\(|setInterval\(").unwrap()
});
static INLINE_JSX_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used, reason = "fixed pattern, covered by tests")]
    Regex::new(r"\bon[A-Z]\w*=\{\s*\([^)]*\)\s*=>").unwrap()
});
static JS_EVAL_OR_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used, reason = "fixed pattern, covered by tests")]
    Regex::new(r"\beval\(|new\s+Function\(").unwrap()
});
static SQL_STRING_CONCAT: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used, reason = "fixed pattern, covered by tests")]
    Regex::new(
        r#"(?i)(['"])\s*(select|insert|update|delete)\b[^'"]*\1\s*(\+|f['"]|%\s*\()|f['"](select|insert|update|delete)\b[^'"]*\{"#,
    )
    .unwrap()
});
static HTTP_CALL_NO_TIMEOUT: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used, reason = "fixed pattern, covered by tests")]
    Regex::new(r"requests\.(get|post|put|delete)\(|axios\.(get|post|put|delete)\(|\bfetch\(").unwrap()
});
static RATE_LIMIT_EMPTY_CATCH: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used, reason = "fixed pattern, covered by tests")]
    Regex::new(r"(?i)rate.?limit[^\n]{0,80}\n\s*(pass|\{\s*\}|//\s*ignore)").unwrap()
});
static K8S_DEPLOYMENT: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used, reason = "fixed pattern, covered by tests")]
    Regex::new(r"(?m)^kind:\s*Deployment\s*$").unwrap()
});

// ============================================================================
// SECTION: Python eval/exec AST Walk
// ============================================================================

/// Returns the 1-indexed lines of every real call to `eval` or `exec` found
/// by walking the parsed AST of `source`. Unparseable source yields an
/// empty result rather than an error — a scan-breaking syntax error is not
/// this scanner's concern.
#[must_use]
fn find_python_eval_exec(source: &str) -> Vec<u32> {
    let Ok(suite) = ast::Suite::parse(source, "<module>") else {
        return Vec::new();
    };
    let mut hits = Vec::new();
    for stmt in &suite {
        walk_stmt(stmt, source, &mut hits);
    }
    hits.sort_unstable();
    hits.dedup();
    hits
}

fn byte_offset_to_line(source: &str, offset: usize) -> u32 {
    let clamped = offset.min(source.len());
    u32::try_from(source.as_bytes()[..clamped].iter().filter(|&&b| b == b'\n').count() + 1).unwrap_or(u32::MAX)
}

fn walk_stmt(stmt: &ast::Stmt, source: &str, hits: &mut Vec<u32>) {
    match stmt {
        ast::Stmt::FunctionDef(s) => s.body.iter().for_each(|inner| walk_stmt(inner, source, hits)),
        ast::Stmt::AsyncFunctionDef(s) => s.body.iter().for_each(|inner| walk_stmt(inner, source, hits)),
        ast::Stmt::ClassDef(s) => s.body.iter().for_each(|inner| walk_stmt(inner, source, hits)),
        ast::Stmt::Return(s) => {
            if let Some(value) = &s.value {
                walk_expr(value, source, hits);
            }
        }
        ast::Stmt::Assign(s) => walk_expr(&s.value, source, hits),
        ast::Stmt::AugAssign(s) => walk_expr(&s.value, source, hits),
        ast::Stmt::AnnAssign(s) => {
            if let Some(value) = &s.value {
                walk_expr(value, source, hits);
            }
        }
        ast::Stmt::For(s) => {
            walk_expr(&s.iter, source, hits);
            s.body.iter().for_each(|inner| walk_stmt(inner, source, hits));
            s.orelse.iter().for_each(|inner| walk_stmt(inner, source, hits));
        }
        ast::Stmt::AsyncFor(s) => {
            walk_expr(&s.iter, source, hits);
            s.body.iter().for_each(|inner| walk_stmt(inner, source, hits));
        }
        ast::Stmt::While(s) => {
            walk_expr(&s.test, source, hits);
            s.body.iter().for_each(|inner| walk_stmt(inner, source, hits));
        }
        ast::Stmt::If(s) => {
            walk_expr(&s.test, source, hits);
            s.body.iter().for_each(|inner| walk_stmt(inner, source, hits));
            s.orelse.iter().for_each(|inner| walk_stmt(inner, source, hits));
        }
        ast::Stmt::With(s) => s.body.iter().for_each(|inner| walk_stmt(inner, source, hits)),
        ast::Stmt::AsyncWith(s) => s.body.iter().for_each(|inner| walk_stmt(inner, source, hits)),
        ast::Stmt::Try(s) => {
            s.body.iter().for_each(|inner| walk_stmt(inner, source, hits));
            s.orelse.iter().for_each(|inner| walk_stmt(inner, source, hits));
            s.finalbody.iter().for_each(|inner| walk_stmt(inner, source, hits));
        }
        ast::Stmt::Assert(s) => walk_expr(&s.test, source, hits),
        ast::Stmt::Expr(s) => walk_expr(&s.value, source, hits),
        _ => {}
    }
}

fn walk_expr(expr: &ast::Expr, source: &str, hits: &mut Vec<u32>) {
    if let ast::Expr::Call(call) = expr {
        if let ast::Expr::Name(name) = call.func.as_ref() {
            if matches!(name.id.as_str(), "eval" | "exec") {
                let offset = u32::from(call.range.start()) as usize;
                hits.push(byte_offset_to_line(source, offset));
            }
        }
        walk_expr(&call.func, source, hits);
        for arg in &call.args {
            walk_expr(arg, source, hits);
        }
        return;
    }
    match expr {
        ast::Expr::BoolOp(e) => e.values.iter().for_each(|v| walk_expr(v, source, hits)),
        ast::Expr::BinOp(e) => {
            walk_expr(&e.left, source, hits);
            walk_expr(&e.right, source, hits);
        }
        ast::Expr::UnaryOp(e) => walk_expr(&e.operand, source, hits),
        ast::Expr::Lambda(e) => walk_expr(&e.body, source, hits),
        ast::Expr::IfExp(e) => {
            walk_expr(&e.test, source, hits);
            walk_expr(&e.body, source, hits);
            walk_expr(&e.orelse, source, hits);
        }
        ast::Expr::Compare(e) => {
            walk_expr(&e.left, source, hits);
            e.comparators.iter().for_each(|c| walk_expr(c, source, hits));
        }
        ast::Expr::Attribute(e) => walk_expr(&e.value, source, hits),
        ast::Expr::Subscript(e) => {
            walk_expr(&e.value, source, hits);
            walk_expr(&e.slice, source, hits);
        }
        ast::Expr::Starred(e) => walk_expr(&e.value, source, hits),
        ast::Expr::Tuple(e) => e.elts.iter().for_each(|el| walk_expr(el, source, hits)),
        ast::Expr::List(e) => e.elts.iter().for_each(|el| walk_expr(el, source, hits)),
        ast::Expr::Await(e) => walk_expr(&e.value, source, hits),
        _ => {}
    }
}

// ============================================================================
// SECTION: Scanner
// ============================================================================

struct IdGen(u64);

impl IdGen {
    fn next(&mut self) -> FindingId {
        self.0 += 1;
        FindingId::new(format!("eq-{}", self.0))
    }
}

/// Stack-aware engineering-quality scanner.
#[derive(Default)]
pub struct EngineeringQualityScanner;

impl EngineeringQualityScanner {
    /// Creates a new engineering-quality scanner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Scanner for EngineeringQualityScanner {
    fn name(&self) -> &'static str {
        "engineering-quality"
    }

    fn scan(
        &self,
        files: &[IngestFile],
        read: &dyn Fn(&RepoPath) -> io::Result<String>,
        _context: &Context,
    ) -> Result<Vec<Finding>, ScannerError> {
        let mut findings = Vec::new();
        let mut ids = IdGen(0);
        let frontend_present = detect_frontend_framework(files, read);

        for file in files {
            if !matches!(file.category, gate_core::FileCategory::Source) {
                continue;
            }
            let text = read(&file.path).map_err(|source| ScannerError::Read {
                scanner: "engineering-quality",
                path: file.path.clone(),
                source,
            })?;
            let language = file.language.as_deref().unwrap_or("");

            if frontend_present && matches!(language, "javascript" | "typescript") {
                scan_frontend(&text, file, &mut ids, &mut findings)?;
            }

            match language {
                "javascript" | "typescript" => scan_js_backend(&text, file, &mut ids, &mut findings)?,
                "python" => scan_python_backend(&text, file, &mut ids, &mut findings)?,
                _ => {}
            }

            if file.path.as_str().ends_with(".yaml") || file.path.as_str().ends_with(".yml") {
                scan_infrastructure(&text, file, &mut ids, &mut findings)?;
            }
        }

        Ok(findings)
    }
}

fn scan_frontend(
    text: &str,
    file: &IngestFile,
    ids: &mut IdGen,
    findings: &mut Vec<Finding>,
) -> Result<(), ScannerError> {
    let lines: Vec<&str> = text.lines().collect();

    for (idx, line) in lines.iter().enumerate() {
        if STATE_SETTER.is_match(line) {
            let window_start = idx.saturating_sub(5);
            let window = lines.get(window_start..idx).unwrap_or(&[]).join("\n");
            if LOOP_OPEN.is_match(&window) {
                findings.push(build(
                    ids,
                    Severity::P2,
                    "frontend",
                    file,
                    u32::try_from(idx + 1).unwrap_or(u32::MAX),
                    line,
                    "State setter called inside a loop; each call schedules a separate re-render.",
                    "Accumulate values and call the state setter once after the loop, or use the functional updater form.",
                )?);
            }
        }
        if INLINE_JSX_HANDLER.is_match(line) {
            findings.push(build(
                ids,
                Severity::P3,
                "frontend",
                file,
                u32::try_from(idx + 1).unwrap_or(u32::MAX),
                line,
                "Inline arrow function passed as a JSX event handler allocates a new closure on every render.",
                "Hoist the handler to a memoized callback (useCallback) or a stable function reference.",
            )?);
        }
    }

    if let Some(start) = USE_EFFECT_OPEN.find(text) {
        if let Some(end) = matching_brace_end(text, start.end() - 1) {
            let body = &text[start.end()..end];
            if SUBSCRIBE_CALL.is_match(body) && !body.contains("return () =>") && !body.contains("return function") {
                let line = u32::try_from(text[..start.start()].matches('\n').count() + 1).unwrap_or(u32::MAX);
                findings.push(build(
                    ids,
                    Severity::P2,
                    "frontend",
                    file,
                    line,
                    lines.get((line - 1) as usize).copied().unwrap_or(""),
                    "Effect subscribes to an event/interval/observable without returning a cleanup function.",
                    "Return a function from the effect that unsubscribes, removes the listener, or clears the interval.",
                )?);
            }
        }
    }

    Ok(())
}

fn scan_js_backend(
    text: &str,
    file: &IngestFile,
    ids: &mut IdGen,
    findings: &mut Vec<Finding>,
) -> Result<(), ScannerError> {
    for mat in JS_EVAL_OR_FUNCTION.find_iter(text) {
        let line = u32::try_from(text[..mat.start()].matches('\n').count() + 1).unwrap_or(u32::MAX);
        findings.push(build(
            ids,
            Severity::P0,
            "backend",
            file,
            line,
            mat.as_str(),
            "Dynamic code execution via eval()/Function() on data that may be attacker-influenced.",
            "Replace dynamic evaluation with an explicit parser or a fixed set of allowed operations.",
        )?);
    }
    scan_sql_and_http(text, file, ids, findings)
}

fn scan_python_backend(
    text: &str,
    file: &IngestFile,
    ids: &mut IdGen,
    findings: &mut Vec<Finding>,
) -> Result<(), ScannerError> {
    let lines: Vec<&str> = text.lines().collect();
    for line_no in find_python_eval_exec(text) {
        let snippet = lines.get((line_no.saturating_sub(1)) as usize).copied().unwrap_or("");
        findings.push(build(
            ids,
            Severity::P0,
            "backend",
            file,
            line_no,
            snippet,
            "Call to eval()/exec() on data that may be attacker-influenced.",
            "Replace dynamic evaluation with an explicit parser or a fixed set of allowed operations.",
        )?);
    }
    scan_sql_and_http(text, file, ids, findings)
}

fn scan_sql_and_http(
    text: &str,
    file: &IngestFile,
    ids: &mut IdGen,
    findings: &mut Vec<Finding>,
) -> Result<(), ScannerError> {
    for mat in SQL_STRING_CONCAT.find_iter(text) {
        let line = u32::try_from(text[..mat.start()].matches('\n').count() + 1).unwrap_or(u32::MAX);
        findings.push(build(
            ids,
            Severity::P0,
            "backend",
            file,
            line,
            mat.as_str(),
            "SQL query built by string concatenation/interpolation instead of parameter binding.",
            "Use parameterized queries or an ORM/query builder that binds values separately from the query text.",
        )?);
    }

    for mat in HTTP_CALL_NO_TIMEOUT.find_iter(text) {
        let line_idx = text[..mat.start()].matches('\n').count();
        let lines: Vec<&str> = text.lines().collect();
        let window = lines.get(line_idx..(line_idx + 1).min(lines.len())).unwrap_or(&[]).join("\n");
        if !window.to_lowercase().contains("timeout") {
            findings.push(build(
                ids,
                Severity::P2,
                "backend",
                file,
                u32::try_from(line_idx + 1).unwrap_or(u32::MAX),
                mat.as_str(),
                "Outbound HTTP call has no explicit timeout and can hang the request indefinitely.",
                "Pass an explicit timeout/deadline on every outbound HTTP call.",
            )?);
        }
    }

    if let Some(mat) = RATE_LIMIT_EMPTY_CATCH.find(text) {
        let line = u32::try_from(text[..mat.start()].matches('\n').count() + 1).unwrap_or(u32::MAX);
        findings.push(build(
            ids,
            Severity::P1,
            "backend",
            file,
            line,
            mat.as_str(),
            "Rate-limit error is caught and silently ignored, failing open under load.",
            "Fail closed on rate-limit errors, or apply a bounded retry/backoff instead of swallowing the error.",
        )?);
    }

    Ok(())
}

fn scan_infrastructure(
    text: &str,
    file: &IngestFile,
    ids: &mut IdGen,
    findings: &mut Vec<Finding>,
) -> Result<(), ScannerError> {
    if K8S_DEPLOYMENT.is_match(text) && !text.contains("resources:") {
        findings.push(build(
            ids,
            Severity::P2,
            "infrastructure",
            file,
            1,
            text.lines().next().unwrap_or(""),
            "Kubernetes Deployment has no resource requests/limits.",
            "Set CPU/memory requests and limits so the scheduler and kubelet can enforce fair sharing.",
        )?);
    }
    Ok(())
}

/// Returns the byte offset just past the `{` at `open_brace_offset`'s
/// matching `}`, or `None` if the braces are unbalanced.
fn matching_brace_end(text: &str, open_brace_offset: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut i = open_brace_offset;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[allow(clippy::too_many_arguments, reason = "thin wrapper mirroring Finding::new")]
fn build(
    ids: &mut IdGen,
    severity: Severity,
    category: &str,
    file: &IngestFile,
    line: u32,
    snippet: &str,
    message: &str,
    recommendation: &str,
) -> Result<Finding, ScannerError> {
    Finding::new(
        ids.next(),
        severity,
        Category::new(category),
        FindingSource::Deterministic,
        file.path.clone(),
        line,
        line,
        snippet,
        message,
        recommendation,
        Confidence::default(),
    )
    .map_err(|source| ScannerError::InvalidFinding {
        scanner: "engineering-quality",
        reason: source.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::find_python_eval_exec;
    use super::EngineeringQualityScanner;
    use crate::Scanner;
    use gate_core::Context;
    use gate_core::FileCategory;
    use gate_core::IngestFile;
    use gate_core::RepoPath;
    use std::collections::HashMap;

    fn sample_context() -> Context {
        Context::new(
            gate_core::RepoFullName::new("acme/widgets"),
            Some(1),
            gate_core::CommitSha::new("abc123"),
            None,
            "pull_request",
            false,
            "octocat",
        )
    }

    fn source_file(path: &str, language: &str) -> IngestFile {
        IngestFile {
            path: RepoPath::new(path),
            category: FileCategory::Source,
            language: Some(language.to_string()),
            lines: 1,
            bytes: 10,
            is_hotspot: false,
            hotspot_reasons: Vec::new(),
        }
    }

    #[test]
    fn python_docstring_mentioning_eval_is_not_a_call() {
        let hits = find_python_eval_exec("\"\"\" use eval() carefully \"\"\"\n");
        assert!(hits.is_empty());
    }

    #[test]
    fn python_real_eval_call_is_found() {
        let hits = find_python_eval_exec("def f(x):\n    return eval(x)\n");
        assert_eq!(hits, vec![2]);
    }

    #[test]
    fn python_eval_call_inside_comment_line_is_ignored() {
        let hits = find_python_eval_exec("# eval(user_input) is dangerous\nx = 1\n");
        assert!(hits.is_empty());
    }

    #[test]
    fn flags_python_eval_as_p0_backend_finding() {
        let mut contents = HashMap::new();
        contents.insert("app.py".to_string(), "def run(expr):\n    return eval(expr)\n".to_string());
        let scanner = EngineeringQualityScanner::new();
        let findings = scanner
            .scan(
                &[source_file("app.py", "python")],
                &|path| contents.get(path.as_str()).cloned().ok_or_else(|| std::io::Error::other("missing")),
                &sample_context(),
            )
            .expect("scan succeeds");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, gate_core::Severity::P0);
    }

    #[test]
    fn flags_sql_string_concatenation() {
        let mut contents = HashMap::new();
        contents.insert(
            "db.py".to_string(),
            "query = \"SELECT * FROM users WHERE id = \" + user_id\n".to_string(),
        );
        let scanner = EngineeringQualityScanner::new();
        let findings = scanner
            .scan(
                &[source_file("db.py", "python")],
                &|path| contents.get(path.as_str()).cloned().ok_or_else(|| std::io::Error::other("missing")),
                &sample_context(),
            )
            .expect("scan succeeds");
        assert!(findings.iter().any(|f| f.category.as_str() == "backend" && f.severity == gate_core::Severity::P0));
    }

    #[test]
    fn frontend_rules_skipped_without_framework_evidence() {
        let mut contents = HashMap::new();
        contents.insert(
            "widget.js".to_string(),
            "for (const x of xs) {\n  setCount(x)\n}\n".to_string(),
        );
        let scanner = EngineeringQualityScanner::new();
        let findings = scanner
            .scan(
                &[source_file("widget.js", "javascript")],
                &|path| contents.get(path.as_str()).cloned().ok_or_else(|| std::io::Error::other("missing")),
                &sample_context(),
            )
            .expect("scan succeeds");
        assert!(!findings.iter().any(|f| f.category.as_str() == "frontend"));
    }

    #[test]
    fn flags_state_setter_in_loop_when_frontend_detected() {
        let mut contents = HashMap::new();
        contents.insert(
            "package.json".to_string(),
            "{ \"dependencies\": { \"react\": \"18.0.0\" } }\n".to_string(),
        );
        contents.insert(
            "widget.jsx".to_string(),
            "function C(xs) {\n  for (const x of xs) {\n    setCount(x)\n  }\n}\n".to_string(),
        );
        let scanner = EngineeringQualityScanner::new();
        let findings = scanner
            .scan(
                &[source_file("package.json", "json"), source_file("widget.jsx", "javascript")],
                &|path| contents.get(path.as_str()).cloned().ok_or_else(|| std::io::Error::other("missing")),
                &sample_context(),
            )
            .expect("scan succeeds");
        assert!(findings.iter().any(|f| f.category.as_str() == "frontend"));
    }
}
