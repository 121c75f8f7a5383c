// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Higher-level dialect transpilation.
//!
//! The pipeline treats the dialect stage as a black box behind the
//! [`DialectTranspiler`] trait: script text in, script text out, or a
//! [`DialectError`] carrying the offending line. The shipped
//! implementation is [`ArrowDialect`], a line-oriented transpiler for
//! an indentation-based arrow-function dialect.
//!
//! The substitution and reserved-word tables shared by all requests
//! live in [`BaseEnvironment`]: process-wide, initialized lazily
//! exactly once, immutable afterwards. Request-local transpile state
//! (which names have been declared) lives in a
//! [`TranspileScope`](env::TranspileScope) derived per call; scopes
//! never write back into the shared base.

mod arrow;
pub mod env;

pub use arrow::ArrowDialect;
pub use env::BaseEnvironment;

use thiserror::Error;

/// Dialect compilation failure.
///
/// The message is surfaced verbatim to the caller as a diagnostic; the
/// line is 1-based into the dialect source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DialectError {
    /// Human-readable description of the failure
    pub message: String,
    /// 1-based source line the failure was detected on
    pub line: u32,
}

impl DialectError {
    /// Create a new dialect error.
    pub fn new(message: impl Into<String>, line: u32) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

/// A source-to-source dialect compiler.
///
/// Implementations must be safe to share across concurrent requests:
/// `transpile` takes `&self` and any mutable working state must be
/// request-local.
pub trait DialectTranspiler: Send + Sync {
    /// Rewrite dialect source into target-language source.
    fn transpile(&self, source: &str) -> Result<String, DialectError>;
}
