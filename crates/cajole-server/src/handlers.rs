//! Request handlers.
//!
//! One endpoint: `POST /` with a form-encoded body. Responses are
//! always `text/plain; charset=utf-8`:
//!
//! - 200 — rendered module text
//! - 400 — `ERROR: <message>` (client must fix the request)
//! - 500 — `ERROR: Couldn't cajole the source.` followed by one block
//!   per diagnostic in detection order
//!
//! The pipeline is CPU-bound, so handlers run it on the blocking pool.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Form, Router};
use cajole::{compile, CompileFailure, DiagnosticBatch, RawRequest};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::state::AppState;

/// Form-encoded compile request.
///
/// The kind selector is accepted under both its names (`input_type`
/// preferred, `type` fallback).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompileForm {
    pub source: Option<String>,
    pub input_type: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub pretty: Option<String>,
}

impl From<CompileForm> for RawRequest {
    fn from(form: CompileForm) -> Self {
        RawRequest {
            source: form.source,
            kind: form.input_type.or(form.kind),
            pretty: form.pretty,
        }
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(compile_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn compile_handler(
    State(state): State<AppState>,
    Form(form): Form<CompileForm>,
) -> impl IntoResponse {
    let transpiler = state.transpiler.clone();

    let result = tokio::task::spawn_blocking(move || respond(form, transpiler.as_ref())).await;

    let (status, body) = match result {
        Ok(response) => response,
        Err(err) => {
            // A panic below this point means the rewriter broke its
            // contract with the renderer — a defect, not user input
            error!("pipeline fault: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ERROR: Internal pipeline fault.\n".to_string(),
            )
        }
    };

    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
}

/// Run one request and compose the plain-text response.
pub fn respond(
    form: CompileForm,
    transpiler: &dyn cajole::DialectTranspiler,
) -> (StatusCode, String) {
    match compile(form.into(), transpiler) {
        Ok(output) => (StatusCode::OK, format!("{}\n", output.text)),
        Err(CompileFailure::Client(message)) => {
            (StatusCode::BAD_REQUEST, format!("ERROR: {}\n", message))
        }
        Err(CompileFailure::Rejected(batch)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, rejection_body(&batch))
        }
    }
}

/// Compose the 500 body: the stable prefix, then one block per
/// diagnostic in detection order, blocks separated by blank lines.
fn rejection_body(batch: &DiagnosticBatch) -> String {
    let mut body = String::from("ERROR: Couldn't cajole the source.\n\n");
    for diagnostic in batch.iter() {
        body.push_str(&format!(
            "{}\nLine: {}:{}\n\n",
            diagnostic.message, diagnostic.line, diagnostic.column
        ));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use cajole::ArrowDialect;

    fn form(
        source: Option<&str>,
        input_type: Option<&str>,
        pretty: Option<&str>,
    ) -> CompileForm {
        CompileForm {
            source: source.map(str::to_string),
            input_type: input_type.map(str::to_string),
            kind: None,
            pretty: pretty.map(str::to_string),
        }
    }

    fn run(form: CompileForm) -> (StatusCode, String) {
        respond(form, &ArrowDialect::new())
    }

    #[test]
    fn test_success_is_plain_rendered_text() {
        let (status, body) = run(form(Some("1+1"), Some("js"), None));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "(function(caps__){\"use strict\";1+1;});\n");
    }

    #[test]
    fn test_missing_type_is_400_with_stable_prefix() {
        let (status, body) = run(form(Some(""), None, None));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "ERROR: The `type` parameter was not specified.\n");
    }

    #[test]
    fn test_missing_source_is_400() {
        let (status, body) = run(form(None, Some("js"), None));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "ERROR: The `source` parameter was not specified.\n");
    }

    #[test]
    fn test_banned_construct_is_500_with_diagnostic_blocks() {
        let (status, body) = run(form(Some("with (o) { x; }"), Some("js"), None));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("ERROR: Couldn't cajole the source.\n\n"));
        assert!(body.contains("Line: 1:1\n"));
        assert!(body.contains("with"));
    }

    #[test]
    fn test_multiple_diagnostics_one_block_each() {
        let (_, body) = run(form(Some("with (a) {}\ndebugger;"), Some("js"), None));
        assert_eq!(body.matches("\nLine: ").count(), 2);
    }

    #[test]
    fn test_type_fallback_field() {
        let request = CompileForm {
            source: Some("1".to_string()),
            input_type: None,
            kind: Some("js".to_string()),
            pretty: None,
        };
        let (status, _) = run(request);
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn test_input_type_wins_over_type() {
        let request = CompileForm {
            source: Some("1".to_string()),
            input_type: Some("js".to_string()),
            kind: Some("nonsense".to_string()),
            pretty: None,
        };
        let (status, _) = run(request);
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn test_dialect_roundtrip() {
        let (status, body) = run(form(
            Some("square = (x) -> x * x"),
            Some("coffee"),
            None,
        ));
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("var square=function(x){return x*x;};"));
    }

    #[test]
    fn test_pretty_selected_by_exactly_one() {
        let (_, minimal) = run(form(Some("f(1)"), Some("js"), Some("0")));
        let (_, pretty) = run(form(Some("f(1)"), Some("js"), Some("1")));
        assert!(!minimal.contains('\n') || minimal.ends_with('\n'));
        assert!(pretty.contains("\n  "));
    }
}
