// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Rendering of confined modules to script text.
//!
//! One structural printer walks the module AST; two sinks decide what
//! whitespace survives:
//!
//! - **Minimal** — shortest valid form; a separator is inserted only
//!   where omitting it would change tokenization
//! - **Pretty** — indented, one statement per line, semantically
//!   identical to Minimal output
//!
//! Rendering is total over well-formed modules and deterministic.
//! Security properties are NOT re-validated here — that responsibility
//! lies entirely with the rewriter, which is the only producer of
//! [`ConfinedModule`](cajole_ast::ConfinedModule) values. An internal
//! inconsistency at this stage is a pipeline defect and panics.

mod printer;
mod sink;

pub use printer::render;
pub use sink::RenderMode;

/// Rendered module text plus the mode that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedOutput {
    /// Final module text
    pub text: String,
    /// Mode used to produce it
    pub mode: RenderMode,
}

impl RenderedOutput {
    /// Render a module in the given mode.
    pub fn new(module: &cajole_ast::ConfinedModule, mode: RenderMode) -> Self {
        Self {
            text: render(module, mode),
            mode,
        }
    }
}
