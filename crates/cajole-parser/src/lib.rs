// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Syntax analysis for the confinement pipeline.
//!
//! Hand-written recursive descent parser over the token stream produced
//! by `cajole-lexer`, with a Pratt core for expressions. Produces the
//! position-tagged AST defined in `cajole-ast`.
//!
//! The parser recovers at statement boundaries so a single request can
//! report several syntax errors; structural failures (unexpected token,
//! unexpected end of input) carry byte-accurate spans.

pub mod parser;

pub use parser::{parse_program, ParseError, ParseErrorKind, TokenStream};
