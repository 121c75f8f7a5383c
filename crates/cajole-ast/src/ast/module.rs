//! Confined module representation.

use super::stmt::Program;

/// A program rewritten for capability-confined execution.
///
/// The body is the module wrapped in its envelope: a single expression
/// statement holding a function whose one parameter is the capability
/// record. Everything the module can observe or affect flows through
/// that record.
///
/// # Invariant
///
/// A `ConfinedModule` is only constructed by a rewrite pass that
/// produced zero Error-level diagnostics; the renderer may therefore
/// treat it as well-formed without re-validating security properties.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfinedModule {
    /// The enveloped, rewritten program
    pub body: Program,
    /// Capability names the host must supply at instantiation, in
    /// first-use order (deduplicated)
    pub instantiate_signature: Vec<String>,
}

impl ConfinedModule {
    /// Create a confined module from its envelope and signature.
    pub fn new(body: Program, instantiate_signature: Vec<String>) -> Self {
        Self {
            body,
            instantiate_signature,
        }
    }
}
