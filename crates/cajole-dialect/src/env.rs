//! Shared base environment and request-local scopes.
//!
//! The base environment holds the dialect's prelude: the word
//! substitution table and the reserved-word set. It is expensive enough
//! to build only once and is never request-specific, so it lives behind
//! a process-wide `OnceLock`:
//!
//! - the first caller constructs it; concurrent callers block until it
//!   is ready and then reuse the same instance
//! - after initialization it is read-only for the rest of the process
//!   lifetime
//!
//! Per-request mutable state goes in a [`TranspileScope`] layered on
//! top. Scopes are created per transpile call, discarded at the end of
//! it, and cannot write into the shared base — which is what makes
//! concurrent requests (and caller-side timeouts that abandon one)
//! unable to contaminate each other.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Word substitutions applied outside string literals.
const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("is", "==="),
    ("isnt", "!=="),
    ("and", "&&"),
    ("or", "||"),
    ("not", "!"),
    ("yes", "true"),
    ("on", "true"),
    ("no", "false"),
    ("off", "false"),
];

/// Words that cannot be assignment targets or parameters.
const RESERVED: &[&str] = &[
    "is", "isnt", "and", "or", "not", "yes", "on", "no", "off", "var", "let", "const", "function",
    "return", "if", "else", "while", "do", "for", "in", "break", "continue", "new", "delete",
    "typeof", "instanceof", "void", "this", "null", "true", "false", "throw", "try", "catch",
    "finally", "switch", "case", "default", "with", "debugger", "eval", "arguments",
];

/// The dialect's shared prelude.
///
/// Constructed once per process via [`BaseEnvironment::shared`]; all
/// access after construction is read-only.
pub struct BaseEnvironment {
    substitutions: HashMap<&'static str, &'static str>,
    reserved: HashSet<&'static str>,
}

/// Global base environment instance.
///
/// Lazily initialized on first access.
static SHARED: OnceLock<BaseEnvironment> = OnceLock::new();

impl BaseEnvironment {
    fn initialize() -> Self {
        tracing::debug!("initializing shared dialect base environment");
        Self {
            substitutions: SUBSTITUTIONS.iter().copied().collect(),
            reserved: RESERVED.iter().copied().collect(),
        }
    }

    /// Get or initialize the shared base environment.
    ///
    /// Thread-safe: exactly one caller constructs it, everyone else
    /// reuses the same instance.
    pub fn shared() -> &'static BaseEnvironment {
        SHARED.get_or_init(Self::initialize)
    }

    /// Look up a word substitution.
    pub fn substitute(&self, word: &str) -> Option<&'static str> {
        self.substitutions.get(word).copied()
    }

    /// True if the word may not be bound by dialect code.
    pub fn is_reserved(&self, word: &str) -> bool {
        self.reserved.contains(word)
    }
}

/// Request-local transpile state derived from the shared base.
///
/// Tracks which names the current compilation has declared, so the
/// first assignment to a name emits a declaration and later ones a
/// plain write. Discarded at the end of the request; holds only a
/// shared reference to the base, so nothing can leak back into it.
pub struct TranspileScope<'a> {
    base: &'a BaseEnvironment,
    declared: HashSet<String>,
}

impl<'a> TranspileScope<'a> {
    /// Create a scope on top of the shared base.
    pub fn new(base: &'a BaseEnvironment) -> Self {
        Self {
            base,
            declared: HashSet::new(),
        }
    }

    /// The base environment this scope derives from.
    pub fn base(&self) -> &'a BaseEnvironment {
        self.base
    }

    /// Record a declaration; returns true the first time a name is seen.
    pub fn declare(&mut self, name: &str) -> bool {
        self.declared.insert(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_returns_same_instance() {
        let a = BaseEnvironment::shared() as *const BaseEnvironment;
        let b = BaseEnvironment::shared() as *const BaseEnvironment;
        assert_eq!(a, b);
    }

    #[test]
    fn test_substitutions() {
        let base = BaseEnvironment::shared();
        assert_eq!(base.substitute("is"), Some("==="));
        assert_eq!(base.substitute("and"), Some("&&"));
        assert_eq!(base.substitute("square"), None);
    }

    #[test]
    fn test_reserved_words() {
        let base = BaseEnvironment::shared();
        assert!(base.is_reserved("is"));
        assert!(base.is_reserved("function"));
        assert!(!base.is_reserved("square"));
    }

    #[test]
    fn test_scope_declarations_are_request_local() {
        let base = BaseEnvironment::shared();

        let mut first = TranspileScope::new(base);
        assert!(first.declare("x"));
        assert!(!first.declare("x"));

        // A second scope on the same base starts clean
        let mut second = TranspileScope::new(base);
        assert!(second.declare("x"));
    }
}
