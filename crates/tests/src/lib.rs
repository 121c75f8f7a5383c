//! Integration test harness for the cajole pipeline.
//!
//! Drives the full request path the service exposes:
//! Validate → (Transpile) → Parse → Rewrite → Render.

use cajole::{
    compile, ArrowDialect, CompileFailure, DiagnosticBatch, RawRequest, RenderedOutput,
};

/// One pipeline instance, shared across a test the way the service
/// shares it across requests.
#[derive(Default)]
pub struct Pipeline {
    transpiler: ArrowDialect,
}

impl Pipeline {
    /// Create a pipeline with the shipped dialect transpiler.
    pub fn new() -> Self {
        Self {
            transpiler: ArrowDialect::new(),
        }
    }

    /// Run a raw request.
    pub fn run(&self, raw: RawRequest) -> Result<RenderedOutput, CompileFailure> {
        compile(raw, &self.transpiler)
    }

    /// Compile plain script, minimal rendering.
    pub fn script(&self, source: &str) -> Result<RenderedOutput, CompileFailure> {
        self.run(request(source, Some("js"), None))
    }

    /// Compile plain script, pretty rendering.
    pub fn script_pretty(&self, source: &str) -> Result<RenderedOutput, CompileFailure> {
        self.run(request(source, Some("js"), Some("1")))
    }

    /// Compile dialect source, minimal rendering.
    pub fn dialect(&self, source: &str) -> Result<RenderedOutput, CompileFailure> {
        self.run(request(source, Some("coffee"), None))
    }

    /// Compile plain script expecting a rejection; returns the batch.
    pub fn script_rejected(&self, source: &str) -> DiagnosticBatch {
        match self.script(source) {
            Err(CompileFailure::Rejected(batch)) => batch,
            other => panic!("expected rejection for {:?}, got {:?}", source, other),
        }
    }
}

/// Build a raw request from optional parts.
pub fn request(source: &str, kind: Option<&str>, pretty: Option<&str>) -> RawRequest {
    RawRequest {
        source: Some(source.to_string()),
        kind: kind.map(str::to_string),
        pretty: pretty.map(str::to_string),
    }
}
