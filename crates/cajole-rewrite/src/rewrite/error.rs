//! Rewrite diagnostics.

use cajole_ast::diag::Severity;
use cajole_ast::foundation::Span;
use std::fmt;

/// A single rewrite diagnostic with source location.
///
/// Severity `Error` rejects the request (no module is constructed);
/// `Warning` and `Info` ride along and are surfaced only if a later
/// stage fails.
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteError {
    /// Category of the finding
    pub kind: RewriteErrorKind,
    /// Severity level
    pub severity: Severity,
    /// Source location of the offending construct
    pub span: Span,
    /// Human-readable message
    pub message: String,
}

/// Category of rewrite finding.
///
/// Categorized by the confinement rule that fired, so tests can assert
/// on the rule rather than on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewriteErrorKind {
    /// `with` — introduces dynamic scope
    DynamicScope,
    /// `debugger` — exposes the execution frame
    FrameAccess,
    /// `eval` / `arguments` — runtime code synthesis or caller-frame
    /// reflection
    ReservedWord,
    /// Identifier ending in `__` — reserved for rewriter-introduced names
    ReservedSuffix,
    /// `this` at module top level
    AmbientThis,
    /// Access to a prototype-chain internal (`constructor`, `prototype`,
    /// `caller`, `callee`) or a `__`-suffixed property
    UnsafeProperty,
    /// Computed property access that cannot be statically checked
    ComputedProperty,
    /// `delete` applied to a scope binding
    DeleteBinding,
    /// Write form that guarded access cannot express soundly
    UnguardableWrite,
    /// Assignment through the capability record (warning)
    CapabilityWrite,
}

impl RewriteErrorKind {
    /// Returns a human-readable name for this finding kind.
    pub fn name(self) -> &'static str {
        match self {
            RewriteErrorKind::DynamicScope => "dynamic scope",
            RewriteErrorKind::FrameAccess => "frame access",
            RewriteErrorKind::ReservedWord => "reserved word",
            RewriteErrorKind::ReservedSuffix => "reserved suffix",
            RewriteErrorKind::AmbientThis => "ambient this",
            RewriteErrorKind::UnsafeProperty => "unsafe property",
            RewriteErrorKind::ComputedProperty => "computed property",
            RewriteErrorKind::DeleteBinding => "delete binding",
            RewriteErrorKind::UnguardableWrite => "unguardable write",
            RewriteErrorKind::CapabilityWrite => "capability write",
        }
    }
}

impl RewriteError {
    /// Create an Error-severity finding.
    pub fn new(kind: RewriteErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            span,
            message,
        }
    }

    /// Create a Warning-severity finding.
    pub fn warning(kind: RewriteErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            span,
            message,
        }
    }
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.kind.name(), self.message)
    }
}

impl std::error::Error for RewriteError {}
