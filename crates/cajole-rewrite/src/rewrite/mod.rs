//! Confinement rewriting pipeline.
//!
//! # Passes
//!
//! 1. `constructs` — whitelist check over the whole tree (fail-closed)
//! 2. `capability` — free-variable resolution + threading through the
//!    capability record, yielding a new tree and the instantiate
//!    signature
//! 3. `guard` — optional property-access hardening on the threaded tree
//! 4. envelope — wrap the body as `(function (caps__) { "use strict"; … })`
//!
//! Both analysis passes always run to completion so a single request
//! reports every violation. Any Error-severity finding anywhere aborts
//! module construction.

mod capability;
mod constructs;
mod error;
mod guard;
mod scope;

pub use error::{RewriteError, RewriteErrorKind};

use cajole_ast::ast::{ConfinedModule, Expr, ExprKind, FunctionDef, Ident, Program, Stmt};
use cajole_ast::diag::Severity;
use cajole_ast::foundation::Span;

/// Name of the module envelope's single parameter: the capability
/// record. The trailing `__` cannot collide with user code because the
/// construct check rejects `__`-suffixed user identifiers.
pub const CAPS_PARAM: &str = "caps__";

/// Capability name prepended to the instantiate signature when property
/// guarding is enabled; the host must supply an object with `read`,
/// `set`, `call` and `remove` methods under this name.
pub const GUARDS_CAPABILITY: &str = "guards__";

/// Rewriter configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewriteOptions {
    /// Route property access through host-supplied guard functions
    /// (hardening tier). Off by default: computed property access is
    /// then rejected instead of guarded.
    pub guard_properties: bool,
}

/// Rewrite a parsed program into a confined module.
///
/// # Returns
///
/// On success, the module plus any non-fatal findings (warnings). On
/// failure, every finding collected across all passes, in detection
/// order — construct violations first, then capability findings.
///
/// # Guarantees
///
/// - the input program is never mutated
/// - a module is only produced when zero Error-severity findings exist
/// - every free variable of the input appears in the module's
///   instantiate signature, in first-use order
pub fn rewrite(
    program: &Program,
    options: &RewriteOptions,
) -> Result<(ConfinedModule, Vec<RewriteError>), Vec<RewriteError>> {
    let mut findings = constructs::check_program(program, options);
    let (body, free, mut capability_findings) = capability::thread_program(program);
    findings.append(&mut capability_findings);

    if findings.iter().any(|f| f.severity >= Severity::Error) {
        tracing::debug!(
            findings = findings.len(),
            "rewrite rejected program"
        );
        return Err(findings);
    }

    let body = if options.guard_properties {
        guard::guard_stmts(body)
    } else {
        body
    };

    let mut signature: Vec<String> = free.into_iter().collect();
    if options.guard_properties {
        signature.insert(0, GUARDS_CAPABILITY.to_string());
    }

    tracing::debug!(
        capabilities = signature.len(),
        warnings = findings.len(),
        "rewrite produced confined module"
    );

    let module = ConfinedModule::new(envelope(body, program.span), signature);
    Ok((module, findings))
}

/// Wrap a rewritten body in the module envelope:
/// `(function (caps__) { "use strict"; … })`.
fn envelope(body: Vec<Stmt>, span: Span) -> Program {
    let directive = Stmt::expr(Expr::string("use strict", zero_at(span)), zero_at(span));

    let mut fn_body = Vec::with_capacity(body.len() + 1);
    fn_body.push(directive);
    fn_body.extend(body);

    let def = FunctionDef {
        name: None,
        params: vec![Ident {
            name: CAPS_PARAM.to_string(),
            span: zero_at(span),
        }],
        body: fn_body,
        span,
    };

    let func = Expr::new(ExprKind::Function(def), span);
    Program {
        body: vec![Stmt::expr(func, span)],
        span,
    }
}

/// Zero-length span at a source position, for synthesized nodes.
fn zero_at(span: Span) -> Span {
    Span::new(span.file_id, span.start, span.start, span.start_line)
}
