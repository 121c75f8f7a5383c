//! Pipeline orchestration.
//!
//! One request runs the state machine
//! `Validate → (Transpile) → Parse → Rewrite → Render → Done`, with an
//! `Errored` absorbing state reachable from any stage. No stage is ever
//! retried; all request-scoped state (source map, diagnostic batch,
//! trees) is owned by the invocation and discarded with it.
//!
//! Expected failures never raise: each stage returns tagged
//! result/diagnostic values, and this module is the only place that
//! turns the accumulated batch into a failure. A rendering fault is the
//! one exception — it indicates the rewriter broke its contract and
//! propagates as a panic.

use cajole_ast::diag::{DiagnosticBatch, Severity};
use cajole_ast::foundation::{SourceMap, Span};
use cajole_dialect::DialectTranspiler;
use cajole_lexer::Token;
use cajole_parser::{parse_program, ParseError};
use cajole_render::{RenderMode, RenderedOutput};
use cajole_rewrite::{rewrite, RewriteError, RewriteOptions};
use logos::Logos;
use std::ops::Range;

#[cfg(test)]
mod tests;

/// Admission bound on request source size, in bytes.
pub const MAX_SOURCE_BYTES: usize = 102_400;

/// Label under which the request source is registered in diagnostics.
pub const SOURCE_LABEL: &str = "<request>";

/// Raw key/value input, before validation.
///
/// Field presence mirrors the transport: any of them may be missing,
/// and Validate is the stage that decides what that means.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    /// Program text
    pub source: Option<String>,
    /// Input kind selector (`"js"` or `"coffee"`)
    pub kind: Option<String>,
    /// Render selector (`"1"` selects pretty output)
    pub pretty: Option<String>,
}

/// What the request's source text is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Plain script, parsed directly
    Script,
    /// Higher-level dialect, transpiled first
    Dialect,
}

/// A validated compilation request. Immutable, one per invocation.
#[derive(Debug, Clone)]
pub struct CompileRequest {
    pub source: String,
    pub kind: SourceKind,
    pub mode: RenderMode,
}

/// How a request failed.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileFailure {
    /// Bad input the caller must fix; never retried. Maps to HTTP 400.
    Client(String),
    /// The pipeline rejected the program: dialect, parse, or rewrite
    /// diagnostics, in detection order. Maps to HTTP 500.
    Rejected(DiagnosticBatch),
}

/// Pipeline stage names for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Validate,
    Transpile,
    Parse,
    Rewrite,
    Render,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::Validate => "validate",
            Stage::Transpile => "transpile",
            Stage::Parse => "parse",
            Stage::Rewrite => "rewrite",
            Stage::Render => "render",
        }
    }
}

/// Validate raw input into a compile request.
///
/// Distinct client errors for missing source, oversized source,
/// missing kind, and unrecognized kind — the caller must fix the
/// request; nothing downstream runs.
pub fn validate(raw: &RawRequest) -> Result<CompileRequest, CompileFailure> {
    let Some(source) = &raw.source else {
        return Err(CompileFailure::Client(
            "The `source` parameter was not specified.".to_string(),
        ));
    };

    if source.len() > MAX_SOURCE_BYTES {
        return Err(CompileFailure::Client(
            "The `source` parameter value is too long!".to_string(),
        ));
    }

    let Some(kind) = &raw.kind else {
        return Err(CompileFailure::Client(
            "The `type` parameter was not specified.".to_string(),
        ));
    };

    let kind = match kind.as_str() {
        "js" => SourceKind::Script,
        "coffee" => SourceKind::Dialect,
        _ => {
            return Err(CompileFailure::Client(
                "Unknown `type` parameter value.".to_string(),
            ));
        }
    };

    let mode = match raw.pretty.as_deref() {
        Some("1") => RenderMode::Pretty,
        _ => RenderMode::Minimal,
    };

    Ok(CompileRequest {
        source: source.clone(),
        kind,
        mode,
    })
}

/// Run one request through the whole pipeline.
///
/// The transpiler is only consulted for [`SourceKind::Dialect`]
/// requests. All mutable state is request-scoped; the only shared
/// value a transpiler may consult is its own immutable base
/// environment.
pub fn compile(
    raw: RawRequest,
    transpiler: &dyn DialectTranspiler,
) -> Result<RenderedOutput, CompileFailure> {
    let request = validate(&raw)?;
    tracing::debug!(stage = Stage::Validate.as_str(), bytes = request.source.len(), "request admitted");

    let mut batch = DiagnosticBatch::new();

    // Transpile (dialect requests only). The transpiler's message is
    // surfaced verbatim as a single diagnostic.
    let script = match request.kind {
        SourceKind::Script => request.source.clone(),
        SourceKind::Dialect => match transpiler.transpile(&request.source) {
            Ok(script) => {
                tracing::debug!(stage = Stage::Transpile.as_str(), "dialect transpiled");
                script
            }
            Err(err) => {
                batch.record(Severity::Error, err.message, err.line, 1);
                tracing::debug!(stage = Stage::Transpile.as_str(), "dialect rejected");
                return Err(CompileFailure::Rejected(batch));
            }
        },
    };

    // From here on, positions refer to the (possibly transpiled) script
    let mut source_map = SourceMap::new();
    let file_id = source_map.add_source(SOURCE_LABEL.to_string(), script.clone());

    // Parse: lexing and parsing failures are positional diagnostics
    let tokens = match lex(&script, &source_map, file_id) {
        Ok(tokens) => tokens,
        Err(lex_batch) => {
            batch.merge(lex_batch);
            tracing::debug!(stage = Stage::Parse.as_str(), "lexing rejected");
            return Err(CompileFailure::Rejected(batch));
        }
    };

    let program = match parse_program(&tokens, file_id) {
        Ok(program) => program,
        Err(errors) => {
            for error in &errors {
                record_parse_error(&mut batch, &source_map, error);
            }
            tracing::debug!(
                stage = Stage::Parse.as_str(),
                errors = errors.len(),
                "parsing rejected"
            );
            return Err(CompileFailure::Rejected(batch));
        }
    };

    // Rewrite: Error-severity findings abort; warnings are preserved
    // alongside any earlier diagnostics
    let module = match rewrite(&program, &RewriteOptions::default()) {
        Ok((module, warnings)) => {
            for warning in &warnings {
                record_rewrite_finding(&mut batch, &source_map, warning);
            }
            module
        }
        Err(findings) => {
            for finding in &findings {
                record_rewrite_finding(&mut batch, &source_map, finding);
            }
            tracing::debug!(
                stage = Stage::Rewrite.as_str(),
                findings = findings.len(),
                "rewrite rejected"
            );
            return Err(CompileFailure::Rejected(batch));
        }
    };
    tracing::debug!(
        stage = Stage::Rewrite.as_str(),
        capabilities = module.instantiate_signature.len(),
        "module confined"
    );

    // Render: total over confined modules; an internal fault here is a
    // pipeline defect and panics rather than becoming a diagnostic
    let output = RenderedOutput::new(&module, request.mode);
    tracing::debug!(
        stage = Stage::Render.as_str(),
        bytes = output.text.len(),
        "request done"
    );
    Ok(output)
}

/// Tokenize the script, converting lex failures into diagnostics.
///
/// All invalid tokens are reported, not just the first.
fn lex(
    script: &str,
    source_map: &SourceMap,
    file_id: u16,
) -> Result<Vec<(Token, Range<usize>)>, DiagnosticBatch> {
    let mut lexer = Token::lexer(script);
    let mut tokens = Vec::new();
    let mut batch = DiagnosticBatch::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                let position = Span::new(file_id, span.start as u32, span.end as u32, 0);
                let (line, column) = source_map.line_col(&position);
                batch.record(
                    Severity::Error,
                    format!("invalid token `{}`", &script[span.clone()]),
                    line,
                    column,
                );
            }
        }
    }

    if batch.is_empty() {
        Ok(tokens)
    } else {
        Err(batch)
    }
}

fn record_parse_error(batch: &mut DiagnosticBatch, source_map: &SourceMap, error: &ParseError) {
    let (line, column) = source_map.line_col(&error.span);
    batch.record(Severity::Error, error.message.clone(), line, column);
}

fn record_rewrite_finding(
    batch: &mut DiagnosticBatch,
    source_map: &SourceMap,
    finding: &RewriteError,
) {
    let (line, column) = source_map.line_col(&finding.span);
    batch.record(finding.severity, finding.message.clone(), line, column);
}
