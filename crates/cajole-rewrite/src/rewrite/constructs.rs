//! Construct whitelist check.
//!
//! Walks the whole tree and rejects every construct that defeats static
//! reasoning about scope or object identity. Each rejection is local:
//! the walk continues so one request reports every violation.
//!
//! # Rejected constructs
//!
//! - `with` — introduces dynamic scope
//! - `debugger` — exposes the execution frame
//! - `eval` and `arguments`, in any position — runtime code synthesis
//!   and caller-frame reflection
//! - identifiers ending in `__` — reserved so rewriter-introduced names
//!   (`caps__`, `guards__`) cannot collide with user code
//! - `this` at module top level — the host's ambient object
//! - `delete` on a bare identifier — deletes scope bindings
//! - property names `constructor`, `prototype`, `caller`, `callee`, or
//!   any name ending in `__` — prototype-chain internals
//! - computed property access with a non-literal key, unless guarded
//!   access is enabled
//! - compound writes (`+=`, `++`) to properties when guarded access is
//!   enabled — a guard call cannot express them without double
//!   evaluation

use cajole_ast::ast::{
    Expr, ExprKind, ForInit, FunctionDef, Ident, MemberKey, Program, PropKey, Stmt, StmtKind,
    UnaryOp,
};
use cajole_ast::foundation::Span;

use super::error::{RewriteError, RewriteErrorKind};
use super::RewriteOptions;

/// Property names that reach prototype-chain internals.
const UNSAFE_PROPERTIES: &[&str] = &["constructor", "prototype", "caller", "callee"];

/// Check a whole program, returning every violation found.
pub fn check_program(program: &Program, options: &RewriteOptions) -> Vec<RewriteError> {
    let mut checker = ConstructChecker {
        errors: Vec::new(),
        fn_depth: 0,
        guard: options.guard_properties,
    };
    checker.check_stmts(&program.body);
    checker.errors
}

struct ConstructChecker {
    errors: Vec<RewriteError>,
    /// Function nesting depth; 0 means module top level
    fn_depth: usize,
    guard: bool,
}

impl ConstructChecker {
    fn error(&mut self, kind: RewriteErrorKind, span: Span, message: String) {
        self.errors.push(RewriteError::new(kind, span, message));
    }

    /// Check a name used as a binding (declarator, parameter, function
    /// name, catch parameter) or label.
    fn check_binding_name(&mut self, ident: &Ident) {
        self.check_name(&ident.name, ident.span);
    }

    fn check_name(&mut self, name: &str, span: Span) {
        if name == "eval" {
            self.error(
                RewriteErrorKind::ReservedWord,
                span,
                "`eval` cannot be confined".to_string(),
            );
        } else if name == "arguments" {
            self.error(
                RewriteErrorKind::ReservedWord,
                span,
                "`arguments` exposes the caller frame".to_string(),
            );
        } else if name.ends_with("__") {
            self.error(
                RewriteErrorKind::ReservedSuffix,
                span,
                format!("identifier `{}` uses the reserved `__` suffix", name),
            );
        }
    }

    /// Check a property name (static member key or object literal key).
    fn check_property_name(&mut self, name: &str, span: Span) {
        if name.ends_with("__") {
            self.error(
                RewriteErrorKind::UnsafeProperty,
                span,
                format!("property `{}` uses the reserved `__` suffix", name),
            );
        } else if UNSAFE_PROPERTIES.contains(&name) {
            self.error(
                RewriteErrorKind::UnsafeProperty,
                span,
                format!("property `{}` reaches prototype-chain internals", name),
            );
        }
    }

    fn check_function(&mut self, def: &FunctionDef) {
        if let Some(name) = &def.name {
            self.check_binding_name(name);
        }
        for param in &def.params {
            self.check_binding_name(param);
        }
        self.fn_depth += 1;
        self.check_stmts(&def.body);
        self.fn_depth -= 1;
    }

    fn check_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.check_stmt(stmt);
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::With { object, body } => {
                self.error(
                    RewriteErrorKind::DynamicScope,
                    stmt.span,
                    "the `with` statement defeats static scoping".to_string(),
                );
                // Keep walking: the body may hold further violations
                self.check_expr(object);
                self.check_stmt(body);
            }

            StmtKind::Debugger => {
                self.error(
                    RewriteErrorKind::FrameAccess,
                    stmt.span,
                    "the `debugger` statement exposes the execution frame".to_string(),
                );
            }

            StmtKind::Expr(expr) | StmtKind::Throw(expr) => self.check_expr(expr),

            StmtKind::VarDecl { decls, .. } => {
                for decl in decls {
                    self.check_binding_name(&decl.name);
                    if let Some(init) = &decl.init {
                        self.check_expr(init);
                    }
                }
            }

            StmtKind::Function(def) => self.check_function(def),

            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.check_expr(value);
                }
            }

            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                self.check_expr(test);
                self.check_stmt(consequent);
                if let Some(alternate) = alternate {
                    self.check_stmt(alternate);
                }
            }

            StmtKind::Block(body) => self.check_stmts(body),

            StmtKind::While { test, body } => {
                self.check_expr(test);
                self.check_stmt(body);
            }

            StmtKind::DoWhile { body, test } => {
                self.check_stmt(body);
                self.check_expr(test);
            }

            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                match init {
                    Some(ForInit::VarDecl { decls, .. }) => {
                        for decl in decls {
                            self.check_binding_name(&decl.name);
                            if let Some(init) = &decl.init {
                                self.check_expr(init);
                            }
                        }
                    }
                    Some(ForInit::Expr(expr)) => self.check_expr(expr),
                    None => {}
                }
                if let Some(test) = test {
                    self.check_expr(test);
                }
                if let Some(update) = update {
                    self.check_expr(update);
                }
                self.check_stmt(body);
            }

            StmtKind::ForIn {
                target,
                object,
                body,
                ..
            } => {
                if self.guard && matches!(target.kind, ExprKind::Member { .. }) {
                    self.error(
                        RewriteErrorKind::UnguardableWrite,
                        target.span,
                        "for-in target must be a plain identifier when guarded access is enabled"
                            .to_string(),
                    );
                }
                self.check_expr(target);
                self.check_expr(object);
                self.check_stmt(body);
            }

            StmtKind::Labeled { label, body } => {
                self.check_binding_name(label);
                self.check_stmt(body);
            }

            StmtKind::Switch {
                discriminant,
                cases,
            } => {
                self.check_expr(discriminant);
                for case in cases {
                    if let Some(test) = &case.test {
                        self.check_expr(test);
                    }
                    self.check_stmts(&case.body);
                }
            }

            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                self.check_stmts(block);
                if let Some(handler) = handler {
                    self.check_binding_name(&handler.param);
                    self.check_stmts(&handler.body);
                }
                if let Some(finalizer) = finalizer {
                    self.check_stmts(finalizer);
                }
            }

            StmtKind::Break(_) | StmtKind::Continue(_) | StmtKind::Empty => {}
        }
    }

    fn check_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(name) => self.check_name(name, expr.span),

            ExprKind::This => {
                if self.fn_depth == 0 {
                    self.error(
                        RewriteErrorKind::AmbientThis,
                        expr.span,
                        "`this` at module top level would expose the host object".to_string(),
                    );
                }
            }

            ExprKind::Member { object, key } => {
                self.check_expr(object);
                match key {
                    MemberKey::Static(name) => self.check_property_name(&name.name, name.span),
                    MemberKey::Computed(key_expr) => {
                        if let ExprKind::Str(value) = &key_expr.kind {
                            // Literal keys are as checkable as dot access
                            self.check_property_name(value, key_expr.span);
                        } else if !self.guard {
                            self.error(
                                RewriteErrorKind::ComputedProperty,
                                key_expr.span,
                                "computed property access cannot be statically confined"
                                    .to_string(),
                            );
                            self.check_expr(key_expr);
                        } else {
                            self.check_expr(key_expr);
                        }
                    }
                }
            }

            ExprKind::Unary { op, operand } => {
                if *op == UnaryOp::Delete {
                    if let ExprKind::Ident(_) = operand.kind {
                        self.error(
                            RewriteErrorKind::DeleteBinding,
                            expr.span,
                            "`delete` on a scope binding is not allowed".to_string(),
                        );
                        return;
                    }
                }
                self.check_expr(operand);
            }

            ExprKind::Update { target, .. } => {
                if self.guard && matches!(target.kind, ExprKind::Member { .. }) {
                    self.error(
                        RewriteErrorKind::UnguardableWrite,
                        expr.span,
                        "increment of a property cannot be guarded without double evaluation"
                            .to_string(),
                    );
                }
                self.check_expr(target);
            }

            ExprKind::Assign { op, target, value } => {
                if self.guard
                    && *op != cajole_ast::ast::AssignOp::Assign
                    && matches!(target.kind, ExprKind::Member { .. })
                {
                    self.error(
                        RewriteErrorKind::UnguardableWrite,
                        expr.span,
                        "compound assignment to a property cannot be guarded without double evaluation"
                            .to_string(),
                    );
                }
                self.check_expr(target);
                self.check_expr(value);
            }

            ExprKind::Object(properties) => {
                for prop in properties {
                    match &prop.key {
                        PropKey::Ident(ident) => self.check_property_name(&ident.name, ident.span),
                        PropKey::Str(value) => self.check_property_name(value, prop.span),
                        PropKey::Number(_) => {}
                    }
                    self.check_expr(&prop.value);
                }
            }

            ExprKind::Function(def) => self.check_function(def),

            ExprKind::Array(elements) => {
                for elem in elements {
                    self.check_expr(elem);
                }
            }

            ExprKind::Call { callee, args } | ExprKind::New { callee, args } => {
                self.check_expr(callee);
                for arg in args {
                    self.check_expr(arg);
                }
            }

            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                self.check_expr(left);
                self.check_expr(right);
            }

            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.check_expr(test);
                self.check_expr(consequent);
                self.check_expr(alternate);
            }

            ExprKind::Sequence(exprs) => {
                for e in exprs {
                    self.check_expr(e);
                }
            }

            ExprKind::Number(_) | ExprKind::Str(_) | ExprKind::Bool(_) | ExprKind::Null => {}
        }
    }
}
