// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! AST types for the cajole confinement pipeline.
//!
//! This crate contains the script AST produced by the parser, the
//! confined-module representation produced by the rewriter, and the
//! foundation types (source spans, diagnostics) used by every other
//! pipeline crate.

pub mod ast;
pub mod diag;
pub mod foundation;

// Re-export commonly used types
pub use foundation::{SourceFile, SourceMap, Span};

pub use ast::*;
pub use diag::{Diagnostic, DiagnosticBatch, Severity};
