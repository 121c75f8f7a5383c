// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Confinement rewriting.
//!
//! Transforms a parsed program into a [`ConfinedModule`](cajole_ast::ConfinedModule)
//! that is safe to execute in a host supplying only an explicit
//! capability record, never ambient globals.
//!
//! The analysis is fail-closed: any construct the rewriter cannot prove
//! safe is rejected with a positioned diagnostic instead of being passed
//! through. The input AST is never mutated; every pass builds a new tree
//! so a request can be re-rewritten without aliasing hazards.

pub mod rewrite;

pub use rewrite::{
    rewrite, RewriteError, RewriteErrorKind, RewriteOptions, CAPS_PARAM, GUARDS_CAPABILITY,
};
