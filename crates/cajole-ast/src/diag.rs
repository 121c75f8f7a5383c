//! Diagnostic accumulation and formatting.
//!
//! Every pipeline stage reports problems as [`Diagnostic`] values collected
//! into a [`DiagnosticBatch`]. The batch preserves detection order and is
//! the only thing the orchestrator turns into a user-facing error body.
//!
//! # Design
//!
//! - `Severity` — info, warning, or error (ordered)
//! - `Diagnostic` — one report: severity + message + 1-based position
//! - `DiagnosticBatch` — insertion-ordered accumulator, no I/O
//!
//! # Examples
//!
//! ```
//! # use cajole_ast::diag::*;
//! let mut batch = DiagnosticBatch::new();
//! batch.record(Severity::Error, "unexpected token".to_string(), 3, 7);
//! assert!(batch.has_error());
//! ```

use std::fmt;

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational note (not a problem)
    Info,
    /// Warning (input is accepted but suspicious)
    Warning,
    /// Error (the request cannot produce a confined module)
    Error,
}

/// A single immutable diagnostic.
///
/// Line and column are 1-based positions into the request source the
/// diagnostic was detected in. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// 1-based source line
    pub line: u32,
    /// 1-based source column
    pub column: u32,
}

/// Insertion-ordered sequence of diagnostics.
///
/// Order is detection order and is never rearranged for presentation.
/// Merging appends, so diagnostics from later stages follow (and never
/// suppress) those from earlier stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticBatch {
    entries: Vec<Diagnostic>,
}

impl Severity {
    /// Returns a human-readable name for this severity.
    pub fn name(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(severity: Severity, message: String, line: u32, column: u32) -> Self {
        Self {
            severity,
            message,
            line,
            column,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at {}:{}",
            self.severity, self.message, self.line, self.column
        )
    }
}

impl DiagnosticBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new diagnostic at the end of the batch.
    pub fn record(&mut self, severity: Severity, message: String, line: u32, column: u32) {
        self.entries
            .push(Diagnostic::new(severity, message, line, column));
    }

    /// Append an already-constructed diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Append all diagnostics from another batch, preserving both orders.
    pub fn merge(&mut self, other: DiagnosticBatch) {
        self.entries.extend(other.entries);
    }

    /// True iff any diagnostic has severity Error or above.
    pub fn has_error(&self) -> bool {
        self.entries.iter().any(|d| d.severity >= Severity::Error)
    }

    /// Iterate over diagnostics in detection order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Number of diagnostics in the batch.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True iff the batch holds no diagnostics.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Format the batch as user-facing text, one block per diagnostic:
    ///
    /// ```text
    /// <message>
    /// Line: <line>:<column>
    /// ```
    ///
    /// Messages produced by stages that embed the source label as a
    /// position prefix (`"<label>:…"`) have that prefix stripped so the
    /// block's own `Line:` field is the single position authority.
    pub fn format(&self, source_label: &str) -> String {
        let prefix = format!("{}:", source_label);
        let mut out = String::new();
        for diagnostic in &self.entries {
            let message = diagnostic.message.replace(&prefix, "");
            out.push_str(&format!(
                "{}\nLine: {}:{}\n",
                message.trim(),
                diagnostic.line,
                diagnostic.column
            ));
        }
        out
    }
}

impl IntoIterator for DiagnosticBatch {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_record_preserves_order() {
        let mut batch = DiagnosticBatch::new();
        batch.record(Severity::Warning, "first".to_string(), 1, 1);
        batch.record(Severity::Error, "second".to_string(), 2, 5);
        batch.record(Severity::Info, "third".to_string(), 3, 9);

        let messages: Vec<_> = batch.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_has_error() {
        let mut batch = DiagnosticBatch::new();
        batch.record(Severity::Info, "note".to_string(), 1, 1);
        batch.record(Severity::Warning, "careful".to_string(), 1, 2);
        assert!(!batch.has_error());

        batch.record(Severity::Error, "broken".to_string(), 1, 3);
        assert!(batch.has_error());
    }

    #[test]
    fn test_merge_appends() {
        let mut first = DiagnosticBatch::new();
        first.record(Severity::Warning, "parse warning".to_string(), 1, 1);

        let mut second = DiagnosticBatch::new();
        second.record(Severity::Error, "rewrite error".to_string(), 2, 1);

        first.merge(second);
        assert_eq!(first.len(), 2);
        let messages: Vec<_> = first.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["parse warning", "rewrite error"]);
    }

    #[test]
    fn test_format_blocks() {
        let mut batch = DiagnosticBatch::new();
        batch.record(Severity::Error, "unexpected token".to_string(), 3, 7);
        batch.record(Severity::Error, "unbalanced brace".to_string(), 5, 1);

        let formatted = batch.format("<request>");
        assert_eq!(
            formatted,
            "unexpected token\nLine: 3:7\nunbalanced brace\nLine: 5:1\n"
        );
    }

    #[test]
    fn test_format_strips_label_prefix() {
        let mut batch = DiagnosticBatch::new();
        batch.record(
            Severity::Error,
            "<request>:3:7 unexpected token".to_string(),
            3,
            7,
        );

        let formatted = batch.format("<request>");
        assert_eq!(formatted, "3:7 unexpected token\nLine: 3:7\n");
    }

    #[test]
    fn test_empty_batch() {
        let batch = DiagnosticBatch::new();
        assert!(batch.is_empty());
        assert!(!batch.has_error());
        assert_eq!(batch.format("<request>"), "");
    }
}
