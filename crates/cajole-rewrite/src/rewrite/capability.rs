//! Capability threading.
//!
//! Rewrites every free-variable reference into an access through the
//! module's single capability parameter, collecting the referenced
//! names in first-use order. The input tree is never mutated; the pass
//! returns a freshly built body.
//!
//! A read of free `x` becomes `caps__.x`; a write targets the same
//! member, which is how a confined module exports values to its host.
//! Writes are flagged with a Warning so a later failing stage can still
//! report them.

use cajole_ast::ast::{
    CatchClause, Declarator, Expr, ExprKind, ForInit, FunctionDef, Ident, MemberKey, Program,
    Property, Stmt, StmtKind, SwitchCase,
};
use cajole_ast::foundation::Span;
use indexmap::IndexSet;
use std::collections::HashSet;

use super::error::{RewriteError, RewriteErrorKind};
use super::scope::{collect_lexical, ScopeStack};
use super::CAPS_PARAM;

/// Thread a program's free variables through the capability record.
///
/// # Returns
///
/// The rewritten body, the free-variable names in first-use order, and
/// any Warning-severity findings (capability writes).
pub fn thread_program(program: &Program) -> (Vec<Stmt>, IndexSet<String>, Vec<RewriteError>) {
    let mut threader = CapabilityThreader {
        scopes: ScopeStack::new(),
        free: IndexSet::new(),
        findings: Vec::new(),
        warned_writes: HashSet::new(),
    };

    threader.scopes.push_function(&[], None, &program.body);
    let body = program.body.iter().map(|s| threader.stmt(s)).collect();
    threader.scopes.pop();

    (body, threader.free, threader.findings)
}

struct CapabilityThreader {
    scopes: ScopeStack,
    /// Free names in first-use order (the instantiate signature)
    free: IndexSet<String>,
    findings: Vec<RewriteError>,
    /// Names already flagged for capability writes (one warning per name)
    warned_writes: HashSet<String>,
}

/// Build `caps__.name` for a threaded reference.
fn caps_member(name: &str, span: Span) -> Expr {
    Expr::new(
        ExprKind::Member {
            object: Box::new(Expr::ident(CAPS_PARAM, span)),
            key: MemberKey::Static(Ident {
                name: name.to_string(),
                span,
            }),
        },
        span,
    )
}

impl CapabilityThreader {
    /// True iff an identifier expression refers to a free variable.
    fn is_free_ident<'e>(&self, expr: &'e Expr) -> Option<&'e str> {
        match &expr.kind {
            ExprKind::Ident(name) if !self.scopes.is_declared(name) => Some(name),
            _ => None,
        }
    }

    fn warn_write(&mut self, name: &str, span: Span) {
        if self.warned_writes.insert(name.to_string()) {
            self.findings.push(RewriteError::warning(
                RewriteErrorKind::CapabilityWrite,
                span,
                format!(
                    "assignment to free variable `{}` writes through the capability record",
                    name
                ),
            ));
        }
    }

    fn function(&mut self, def: &FunctionDef, is_declaration: bool) -> FunctionDef {
        let params: Vec<String> = def.params.iter().map(|p| p.name.clone()).collect();
        // A named function expression can refer to itself; a declaration's
        // name already lives in the enclosing scope.
        let own_name = if is_declaration {
            None
        } else {
            def.name.as_ref().map(|n| n.name.as_str())
        };

        self.scopes.push_function(&params, own_name, &def.body);
        let body = def.body.iter().map(|s| self.stmt(s)).collect();
        self.scopes.pop();

        FunctionDef {
            name: def.name.clone(),
            params: def.params.clone(),
            body,
            span: def.span,
        }
    }

    fn stmt(&mut self, stmt: &Stmt) -> Stmt {
        let kind = match &stmt.kind {
            StmtKind::Expr(expr) => StmtKind::Expr(self.expr(expr)),

            StmtKind::VarDecl { kind, decls } => StmtKind::VarDecl {
                kind: *kind,
                decls: decls.iter().map(|d| self.declarator(d)).collect(),
            },

            StmtKind::Function(def) => StmtKind::Function(self.function(def, true)),

            StmtKind::Return(value) => StmtKind::Return(value.as_ref().map(|v| self.expr(v))),

            StmtKind::If {
                test,
                consequent,
                alternate,
            } => StmtKind::If {
                test: self.expr(test),
                consequent: Box::new(self.stmt(consequent)),
                alternate: alternate.as_ref().map(|a| Box::new(self.stmt(a))),
            },

            StmtKind::Block(body) => {
                self.scopes.push_block(body);
                let rewritten = body.iter().map(|s| self.stmt(s)).collect();
                self.scopes.pop();
                StmtKind::Block(rewritten)
            }

            StmtKind::While { test, body } => StmtKind::While {
                test: self.expr(test),
                body: Box::new(self.stmt(body)),
            },

            StmtKind::DoWhile { body, test } => StmtKind::DoWhile {
                body: Box::new(self.stmt(body)),
                test: self.expr(test),
            },

            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                // A lexical for-head opens a scope covering the whole loop
                let head_names = lexical_head_names(init.as_ref());
                let scoped = !head_names.is_empty();
                if scoped {
                    self.scopes.push_names(head_names);
                }

                let kind = StmtKind::For {
                    init: init.as_ref().map(|i| self.for_init(i)),
                    test: test.as_ref().map(|t| self.expr(t)),
                    update: update.as_ref().map(|u| self.expr(u)),
                    body: Box::new(self.stmt(body)),
                };

                if scoped {
                    self.scopes.pop();
                }
                kind
            }

            StmtKind::ForIn {
                decl,
                target,
                object,
                body,
            } => {
                let scoped = matches!(decl, Some(k) if !k.is_function_scoped());
                if scoped {
                    if let ExprKind::Ident(name) = &target.kind {
                        self.scopes.push_names([name.clone()]);
                    }
                }

                if decl.is_none() {
                    if let Some(name) = self.is_free_ident(target) {
                        let name = name.to_string();
                        self.warn_write(&name, target.span);
                    }
                }

                let kind = StmtKind::ForIn {
                    decl: *decl,
                    // A declared target stays a bare name; an expression
                    // target threads like any other write
                    target: if decl.is_some() {
                        target.clone()
                    } else {
                        Box::new(self.expr(target))
                    },
                    object: self.expr(object),
                    body: Box::new(self.stmt(body)),
                };

                if scoped {
                    self.scopes.pop();
                }
                kind
            }

            StmtKind::Labeled { label, body } => StmtKind::Labeled {
                label: label.clone(),
                body: Box::new(self.stmt(body)),
            },

            StmtKind::Switch {
                discriminant,
                cases,
            } => {
                let discriminant = self.expr(discriminant);

                // All arms share one block scope
                let mut lexical = HashSet::new();
                for case in cases {
                    collect_lexical(&case.body, &mut lexical);
                }
                self.scopes.push_names(lexical);

                let cases = cases
                    .iter()
                    .map(|case| SwitchCase {
                        test: case.test.as_ref().map(|t| self.expr(t)),
                        body: case.body.iter().map(|s| self.stmt(s)).collect(),
                        span: case.span,
                    })
                    .collect();
                self.scopes.pop();

                StmtKind::Switch {
                    discriminant,
                    cases,
                }
            }

            StmtKind::Throw(value) => StmtKind::Throw(self.expr(value)),

            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                self.scopes.push_block(block);
                let block = block.iter().map(|s| self.stmt(s)).collect();
                self.scopes.pop();

                let handler = handler.as_ref().map(|h| {
                    let mut names = HashSet::new();
                    names.insert(h.param.name.clone());
                    collect_lexical(&h.body, &mut names);
                    self.scopes.push_names(names);
                    let body = h.body.iter().map(|s| self.stmt(s)).collect();
                    self.scopes.pop();
                    CatchClause {
                        param: h.param.clone(),
                        body,
                        span: h.span,
                    }
                });

                let finalizer = finalizer.as_ref().map(|f| {
                    self.scopes.push_block(f);
                    let body = f.iter().map(|s| self.stmt(s)).collect();
                    self.scopes.pop();
                    body
                });

                StmtKind::Try {
                    block,
                    handler,
                    finalizer,
                }
            }

            StmtKind::With { object, body } => StmtKind::With {
                object: self.expr(object),
                body: Box::new(self.stmt(body)),
            },

            StmtKind::Break(label) => StmtKind::Break(label.clone()),
            StmtKind::Continue(label) => StmtKind::Continue(label.clone()),
            StmtKind::Debugger => StmtKind::Debugger,
            StmtKind::Empty => StmtKind::Empty,
        };

        Stmt::new(kind, stmt.span)
    }

    fn declarator(&mut self, decl: &Declarator) -> Declarator {
        Declarator {
            name: decl.name.clone(),
            init: decl.init.as_ref().map(|i| self.expr(i)),
        }
    }

    fn for_init(&mut self, init: &ForInit) -> ForInit {
        match init {
            ForInit::VarDecl { kind, decls } => ForInit::VarDecl {
                kind: *kind,
                decls: decls.iter().map(|d| self.declarator(d)).collect(),
            },
            ForInit::Expr(expr) => ForInit::Expr(self.expr(expr)),
        }
    }

    fn expr(&mut self, expr: &Expr) -> Expr {
        let kind = match &expr.kind {
            ExprKind::Ident(name) => {
                if self.scopes.is_declared(name) {
                    ExprKind::Ident(name.clone())
                } else {
                    self.free.insert(name.clone());
                    return caps_member(name, expr.span);
                }
            }

            ExprKind::Member { object, key } => {
                let key = match key {
                    MemberKey::Static(name) => MemberKey::Static(name.clone()),
                    MemberKey::Computed(key_expr) => {
                        // Normalize literal-string keys to dot form; the
                        // construct check already validated the name
                        if let ExprKind::Str(value) = &key_expr.kind {
                            MemberKey::Static(Ident {
                                name: value.clone(),
                                span: key_expr.span,
                            })
                        } else {
                            MemberKey::Computed(Box::new(self.expr(key_expr)))
                        }
                    }
                };
                ExprKind::Member {
                    object: Box::new(self.expr(object)),
                    key,
                }
            }

            ExprKind::Assign { op, target, value } => {
                if let Some(name) = self.is_free_ident(target) {
                    let name = name.to_string();
                    self.warn_write(&name, target.span);
                }
                ExprKind::Assign {
                    op: *op,
                    target: Box::new(self.expr(target)),
                    value: Box::new(self.expr(value)),
                }
            }

            ExprKind::Update { op, prefix, target } => {
                if let Some(name) = self.is_free_ident(target) {
                    let name = name.to_string();
                    self.warn_write(&name, target.span);
                }
                ExprKind::Update {
                    op: *op,
                    prefix: *prefix,
                    target: Box::new(self.expr(target)),
                }
            }

            ExprKind::Function(def) => ExprKind::Function(self.function(def, false)),

            ExprKind::Array(elements) => {
                ExprKind::Array(elements.iter().map(|e| self.expr(e)).collect())
            }

            ExprKind::Object(properties) => ExprKind::Object(
                properties
                    .iter()
                    .map(|p| Property {
                        key: p.key.clone(),
                        value: self.expr(&p.value),
                        span: p.span,
                    })
                    .collect(),
            ),

            ExprKind::Call { callee, args } => ExprKind::Call {
                callee: Box::new(self.expr(callee)),
                args: args.iter().map(|a| self.expr(a)).collect(),
            },

            ExprKind::New { callee, args } => ExprKind::New {
                callee: Box::new(self.expr(callee)),
                args: args.iter().map(|a| self.expr(a)).collect(),
            },

            ExprKind::Unary { op, operand } => ExprKind::Unary {
                op: *op,
                operand: Box::new(self.expr(operand)),
            },

            ExprKind::Binary { op, left, right } => ExprKind::Binary {
                op: *op,
                left: Box::new(self.expr(left)),
                right: Box::new(self.expr(right)),
            },

            ExprKind::Logical { op, left, right } => ExprKind::Logical {
                op: *op,
                left: Box::new(self.expr(left)),
                right: Box::new(self.expr(right)),
            },

            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => ExprKind::Conditional {
                test: Box::new(self.expr(test)),
                consequent: Box::new(self.expr(consequent)),
                alternate: Box::new(self.expr(alternate)),
            },

            ExprKind::Sequence(exprs) => {
                ExprKind::Sequence(exprs.iter().map(|e| self.expr(e)).collect())
            }

            ExprKind::Number(_)
            | ExprKind::Str(_)
            | ExprKind::Bool(_)
            | ExprKind::Null
            | ExprKind::This => expr.kind.clone(),
        };

        Expr::new(kind, expr.span)
    }
}

/// Names bound by a lexical (`let`/`const`) for-head.
fn lexical_head_names(init: Option<&ForInit>) -> Vec<String> {
    match init {
        Some(ForInit::VarDecl { kind, decls }) if !kind.is_function_scoped() => {
            decls.iter().map(|d| d.name.name.clone()).collect()
        }
        _ => Vec::new(),
    }
}
