//! Pipeline orchestration tests, including the end-to-end request
//! scenarios the service contract specifies.

use super::*;
use cajole_dialect::{ArrowDialect, DialectError};

fn raw(source: &str, kind: Option<&str>, pretty: Option<&str>) -> RawRequest {
    RawRequest {
        source: Some(source.to_string()),
        kind: kind.map(str::to_string),
        pretty: pretty.map(str::to_string),
    }
}

fn run(request: RawRequest) -> Result<RenderedOutput, CompileFailure> {
    compile(request, &ArrowDialect::new())
}

fn rejected(request: RawRequest) -> DiagnosticBatch {
    match run(request) {
        Err(CompileFailure::Rejected(batch)) => batch,
        other => panic!("expected rejection, got {:?}", other),
    }
}

fn client_error(request: RawRequest) -> String {
    match run(request) {
        Err(CompileFailure::Client(message)) => message,
        other => panic!("expected client error, got {:?}", other),
    }
}

#[test]
fn test_simple_script_minimal() {
    // source="1+1", type="js", no pretty
    let output = run(raw("1+1", Some("js"), None)).unwrap();
    assert_eq!(output.mode, RenderMode::Minimal);
    assert_eq!(output.text, "(function(caps__){\"use strict\";1+1;});");
}

#[test]
fn test_missing_type_parameter() {
    // source="", type omitted
    let message = client_error(raw("", None, None));
    assert_eq!(message, "The `type` parameter was not specified.");
}

#[test]
fn test_missing_source_parameter() {
    let message = client_error(RawRequest {
        source: None,
        kind: Some("js".to_string()),
        pretty: None,
    });
    assert_eq!(message, "The `source` parameter was not specified.");
}

#[test]
fn test_unknown_type_parameter() {
    let message = client_error(raw("1", Some("python"), None));
    assert_eq!(message, "Unknown `type` parameter value.");
}

#[test]
fn test_banned_construct_reports_position() {
    // Line 2, column 1 holds the `with`
    let batch = rejected(raw("var a = 1;\nwith (o) { a; }", Some("js"), None));
    assert!(batch.has_error());
    let diagnostic = batch.iter().next().unwrap();
    assert!(diagnostic.message.contains("with"));
    assert_eq!(diagnostic.line, 2);
    assert_eq!(diagnostic.column, 1);
}

#[test]
fn test_dialect_request_confines_and_renders() {
    // source="square = (x) -> x * x", type="coffee"
    let output = run(raw("square = (x) -> x * x", Some("coffee"), None)).unwrap();
    assert_eq!(
        output.text,
        "(function(caps__){\"use strict\";var square=function(x){return x*x;};});"
    );
}

#[test]
fn test_dialect_failure_surfaces_message_verbatim() {
    let batch = rejected(raw("f = (x", Some("coffee"), None));
    let diagnostic = batch.iter().next().unwrap();
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(diagnostic.message, "unbalanced brackets");
    assert_eq!(diagnostic.line, 1);
}

#[test]
fn test_pretty_and_minimal_differ_for_same_source() {
    let minimal = run(raw("f(1)", Some("js"), None)).unwrap();
    let pretty = run(raw("f(1)", Some("js"), Some("1"))).unwrap();

    assert_eq!(minimal.mode, RenderMode::Minimal);
    assert_eq!(pretty.mode, RenderMode::Pretty);
    assert_ne!(minimal.text, pretty.text);

    // Same program modulo whitespace
    let squash = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    assert_eq!(squash(&minimal.text), squash(&pretty.text));
}

#[test]
fn test_pretty_selector_is_exactly_one() {
    // Any value other than "1" selects minimal
    let output = run(raw("f(1)", Some("js"), Some("yes"))).unwrap();
    assert_eq!(output.mode, RenderMode::Minimal);
}

#[test]
fn test_source_exactly_at_bound_is_admitted() {
    // 102400 bytes of a valid program: "1+1;" then padding comment
    let mut source = String::from("1+1;//");
    source.push_str(&"x".repeat(MAX_SOURCE_BYTES - source.len()));
    assert_eq!(source.len(), MAX_SOURCE_BYTES);

    let output = run(raw(&source, Some("js"), None)).unwrap();
    assert!(output.text.contains("1+1;"));
}

#[test]
fn test_source_over_bound_is_a_client_error() {
    let mut source = String::from("1+1;//");
    source.push_str(&"x".repeat(MAX_SOURCE_BYTES - source.len() + 1));
    assert_eq!(source.len(), MAX_SOURCE_BYTES + 1);

    let message = client_error(raw(&source, Some("js"), None));
    assert_eq!(message, "The `source` parameter value is too long!");
}

#[test]
fn test_parse_failure_is_positional() {
    let batch = rejected(raw("var x = ;", Some("js"), None));
    assert!(batch.has_error());
    let diagnostic = batch.iter().next().unwrap();
    assert_eq!(diagnostic.line, 1);
    assert_eq!(diagnostic.column, 9);
}

#[test]
fn test_multiple_parse_errors_in_detection_order() {
    let batch = rejected(raw("var = 1;\nvar y = ;", Some("js"), None));
    assert!(batch.len() >= 2);
    let lines: Vec<u32> = batch.iter().map(|d| d.line).collect();
    let mut sorted = lines.clone();
    sorted.sort_unstable();
    assert_eq!(lines, sorted, "diagnostics must stay in detection order");
}

#[test]
fn test_lex_failure_is_positional() {
    let batch = rejected(raw("var x = `1`;", Some("js"), None));
    assert!(batch.has_error());
    let diagnostic = batch.iter().next().unwrap();
    assert!(diagnostic.message.contains("invalid token"));
    assert_eq!(diagnostic.line, 1);
}

#[test]
fn test_rewrite_rejection_keeps_warnings_before_errors() {
    // The free write to `out` warns; the `with` errors. Both survive,
    // construct errors first (pass order), then capability warnings.
    let batch = rejected(raw("out = 1;\nwith (o) {}", Some("js"), None));
    let severities: Vec<Severity> = batch.iter().map(|d| d.severity).collect();
    assert!(severities.contains(&Severity::Warning));
    assert!(severities.contains(&Severity::Error));
}

#[test]
fn test_empty_script_compiles_to_empty_module() {
    let output = run(raw("", Some("js"), None)).unwrap();
    assert_eq!(output.text, "(function(caps__){\"use strict\";});");
}

#[test]
fn test_capability_signature_reaches_output() {
    let output = run(raw("alert(msg)", Some("js"), None)).unwrap();
    assert!(output.text.contains("caps__.alert(caps__.msg)"));
}

#[test]
fn test_validation_runs_before_any_stage() {
    // Oversized dialect source must fail validation, not transpilation
    struct PanickingTranspiler;
    impl DialectTranspiler for PanickingTranspiler {
        fn transpile(&self, _source: &str) -> Result<String, DialectError> {
            panic!("transpiler must not run for oversized input");
        }
    }

    let source = "x".repeat(MAX_SOURCE_BYTES + 1);
    let result = compile(raw(&source, Some("coffee"), None), &PanickingTranspiler);
    assert!(matches!(result, Err(CompileFailure::Client(_))));
}

#[test]
fn test_requests_are_isolated() {
    // The same transpiler instance serves both; request-local declared
    // state must not leak (second request still declares `x`)
    let transpiler = ArrowDialect::new();
    let first = compile(raw("x = 1", Some("coffee"), None), &transpiler).unwrap();
    let second = compile(raw("x = 2", Some("coffee"), None), &transpiler).unwrap();
    assert!(first.text.contains("var x=1;"));
    assert!(second.text.contains("var x=2;"));
}
