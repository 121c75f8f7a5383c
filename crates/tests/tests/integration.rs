//! Integration tests for end-to-end confinement compilation.
//!
//! These tests verify the full pipeline:
//! Validate → (Transpile) → Parse → Rewrite → Render

use cajole::{CompileFailure, RenderMode, Severity, MAX_SOURCE_BYTES};
use cajole_tests::{request, Pipeline};

/// A bare expression is wrapped in a confined module and rendered
/// minimally when `pretty` is unset.
#[test]
fn test_simple_expression_minimal() {
    let pipeline = Pipeline::new();
    let output = pipeline.script("1+1").expect("compile failed");

    assert_eq!(output.mode, RenderMode::Minimal);
    assert_eq!(output.text, "(function(caps__){\"use strict\";1+1;});");
}

/// A request without a kind selector is a client error with the exact
/// servlet-compatible message.
#[test]
fn test_missing_kind_is_client_error() {
    let pipeline = Pipeline::new();
    let result = pipeline.run(request("", None, None));

    match result {
        Err(CompileFailure::Client(message)) => {
            assert_eq!(message, "The `type` parameter was not specified.");
        }
        other => panic!("expected client error, got {:?}", other),
    }
}

/// A banned construct produces a positioned diagnostic citing its
/// line and column.
#[test]
fn test_banned_construct_cites_position() {
    let pipeline = Pipeline::new();
    let batch = pipeline.script_rejected("var a = 1;\nwith (o) { a; }");

    assert!(batch.has_error());
    let diagnostic = batch.iter().next().expect("diagnostic present");
    assert_eq!((diagnostic.line, diagnostic.column), (2, 1));
}

/// Dialect source is transpiled to script syntax, then confined and
/// rendered.
#[test]
fn test_dialect_source_roundtrip() {
    let pipeline = Pipeline::new();
    let output = pipeline
        .dialect("square = (x) -> x * x")
        .expect("compile failed");

    assert_eq!(
        output.text,
        "(function(caps__){\"use strict\";var square=function(x){return x*x;};});"
    );
}

/// The same source rendered with and without `pretty` yields two
/// different texts representing the same module.
#[test]
fn test_render_modes_same_module() {
    let pipeline = Pipeline::new();
    let source = "var total = 0; for (var i = 0; i < n; i++) { total += i; }";

    let minimal = pipeline.script(source).expect("minimal compile failed");
    let pretty = pipeline.script_pretty(source).expect("pretty compile failed");

    assert_ne!(minimal.text, pretty.text);

    let squash = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    assert_eq!(squash(&minimal.text), squash(&pretty.text));
}

/// Soundness: every rejected construct yields at least one Error
/// diagnostic and no module (no accept-by-omission).
#[test]
fn test_soundness_banned_constructs_never_produce_output() {
    let pipeline = Pipeline::new();
    let banned = [
        "with (o) { x; }",
        "debugger;",
        "eval(\"1\");",
        "var eval = 1;",
        "function f() { return arguments[0]; }",
        "var sneaky__ = 1;",
        "this.document;",
        "o.__proto__;",
        "o.constructor;",
        "var o = {}, k = \"p\" + 1; o[k];",
        "var x = 1; delete x;",
    ];

    for source in banned {
        let batch = pipeline.script_rejected(source);
        assert!(
            batch.iter().any(|d| d.severity == Severity::Error),
            "no Error diagnostic for {:?}",
            source
        );
    }
}

/// Capability closure: free variables appear in the rendered output
/// only as reads through the capability record.
#[test]
fn test_capability_closure_in_rendered_text() {
    let pipeline = Pipeline::new();
    let output = pipeline
        .script("alert(msg); counter = counter + 1;")
        .expect("compile failed");

    for name in ["alert", "msg", "counter"] {
        let threaded = format!("caps__.{}", name);
        let occurrences = output.text.matches(name).count();
        let via_record = output.text.matches(threaded.as_str()).count();
        assert_eq!(
            occurrences, via_record,
            "`{}` appears outside the capability record in {}",
            name, output.text
        );
    }
}

/// Declared names stay direct; only genuinely free names thread
/// through the record.
#[test]
fn test_locals_are_not_threaded() {
    let pipeline = Pipeline::new();
    let output = pipeline
        .script("var local = 1; use(local);")
        .expect("compile failed");

    assert!(output.text.contains("caps__.use(local)"));
    assert!(!output.text.contains("caps__.local"));
}

/// Rendering the same module twice in the same mode is deterministic.
#[test]
fn test_idempotent_rendering() {
    let pipeline = Pipeline::new();
    let source = "function f(a) { return a * 2; } f(21);";

    let first = pipeline.script(source).expect("compile failed");
    let second = pipeline.script(source).expect("compile failed");
    assert_eq!(first.text, second.text);

    let first_pretty = pipeline.script_pretty(source).expect("compile failed");
    let second_pretty = pipeline.script_pretty(source).expect("compile failed");
    assert_eq!(first_pretty.text, second_pretty.text);
}

/// A source of exactly 102400 bytes is admitted; one byte more is a
/// client error.
#[test]
fn test_size_boundary() {
    let pipeline = Pipeline::new();

    let mut at_bound = String::from("1+1;//");
    at_bound.push_str(&"x".repeat(MAX_SOURCE_BYTES - at_bound.len()));
    assert_eq!(at_bound.len(), MAX_SOURCE_BYTES);
    assert!(pipeline.script(&at_bound).is_ok());

    let mut over_bound = at_bound;
    over_bound.push('x');
    match pipeline.script(&over_bound) {
        Err(CompileFailure::Client(message)) => {
            assert_eq!(message, "The `source` parameter value is too long!");
        }
        other => panic!("expected client error, got {:?}", other),
    }
}

/// Parse failures carry positions; every error in the request is
/// reported, in detection order.
#[test]
fn test_parse_errors_positional_and_complete() {
    let pipeline = Pipeline::new();
    let batch = pipeline.script_rejected("var = 1;\nvar y = ;");

    assert!(batch.len() >= 2);
    let lines: Vec<u32> = batch.iter().map(|d| d.line).collect();
    assert_eq!(lines[0], 1);
    assert!(lines.iter().zip(lines.iter().skip(1)).all(|(a, b)| a <= b));
}

/// Dialect failures surface the transpiler's own message.
#[test]
fn test_dialect_error_message_is_verbatim() {
    let pipeline = Pipeline::new();
    let result = pipeline.dialect("f = (broken");

    match result {
        Err(CompileFailure::Rejected(batch)) => {
            let diagnostic = batch.iter().next().expect("diagnostic present");
            assert_eq!(diagnostic.message, "unbalanced brackets");
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

/// Concurrent requests share only the immutable base environment; the
/// lazily-initialized transpiler prelude is constructed exactly once
/// under contention and every request still compiles independently.
#[test]
fn test_concurrent_requests_are_isolated() {
    let pipeline = std::sync::Arc::new(Pipeline::new());

    std::thread::scope(|scope| {
        let mut handles = Vec::new();
        for worker in 0..8 {
            let pipeline = pipeline.clone();
            handles.push(scope.spawn(move || {
                let mut outputs = Vec::new();
                for i in 0..16 {
                    let script = pipeline
                        .script(&format!("f({} + {});", worker, i))
                        .expect("script compile failed");
                    let dialect = pipeline
                        .dialect(&format!("v{} = {} is {}", worker, i, i))
                        .expect("dialect compile failed");
                    outputs.push((script.text, dialect.text));
                }
                outputs
            }));
        }

        for handle in handles {
            let outputs = handle.join().expect("worker panicked");
            // Each request's declarations were private to it
            for (_, dialect_text) in &outputs {
                assert!(dialect_text.contains("var v"), "got {}", dialect_text);
            }
        }
    });
}

/// The full diagnostic batch survives a late-stage failure: warnings
/// recorded by the rewriter ride along with the error that rejected
/// the request.
#[test]
fn test_warnings_are_not_suppressed_by_errors() {
    let pipeline = Pipeline::new();
    let batch = pipeline.script_rejected("exported = 1;\ndebugger;");

    let severities: Vec<Severity> = batch.iter().map(|d| d.severity).collect();
    assert!(severities.contains(&Severity::Error));
    assert!(severities.contains(&Severity::Warning));
}
