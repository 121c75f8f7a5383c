// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! # Cajole
//!
//! Source-to-source confinement compiler: takes untrusted script text
//! (or a higher-level dialect) and returns an equivalent program
//! rewritten so it can only touch objects explicitly granted through a
//! capability record — no ambient globals, no sandbox escape.
//!
//! This crate is a facade that re-exports functionality from:
//! - `cajole-ast` - AST, spans, diagnostics
//! - `cajole-lexer` - tokenization
//! - `cajole-parser` - parsing to AST
//! - `cajole-rewrite` - the confinement rewriter
//! - `cajole-render` - minimal / pretty rendering
//! - `cajole-dialect` - dialect transpilation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cajole::{compile, ArrowDialect, RawRequest};
//!
//! let raw = RawRequest {
//!     source: Some("1+1".to_string()),
//!     kind: Some("js".to_string()),
//!     pretty: None,
//! };
//! let output = compile(raw, &ArrowDialect::new())?;
//! ```

// Re-export AST, spans and diagnostics
pub use cajole_ast::{self as ast, *};

// Re-export lexer
pub use cajole_lexer as lexer;
pub use cajole_lexer::Token;

// Re-export parser
pub use cajole_parser as parser;
pub use cajole_parser::{parse_program, ParseError, ParseErrorKind};

// Re-export rewriter
pub use cajole_rewrite::{
    self as rewriter, rewrite, RewriteError, RewriteErrorKind, RewriteOptions, CAPS_PARAM,
    GUARDS_CAPABILITY,
};

// Re-export renderer
pub use cajole_render::{render, RenderMode, RenderedOutput};

// Re-export dialect transpilation
pub use cajole_dialect::{ArrowDialect, BaseEnvironment, DialectError, DialectTranspiler};

// Pipeline orchestration (high-level API)
pub mod compile;

pub use compile::{
    compile, validate, CompileFailure, CompileRequest, RawRequest, SourceKind, MAX_SOURCE_BYTES,
    SOURCE_LABEL,
};

// Version info
/// Compiler version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
