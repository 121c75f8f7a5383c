//! Property-access guarding (optional hardening tier).
//!
//! Rewrites member accesses into calls through a host-supplied guard
//! object, so object-capability discipline holds through property
//! lookup as well as identifier lookup:
//!
//! - read: `o.p` → `caps__.guards__.read(o, "p")`
//! - write: `o.p = v` → `caps__.guards__.set(o, "p", v)`
//! - invoke: `o.m(a)` → `caps__.guards__.call(o, "m", [a])` (preserves `this`)
//! - delete: `delete o.p` → `caps__.guards__.remove(o, "p")`
//!
//! Direct reads of the capability record itself (`caps__.x`, introduced
//! by capability threading) stay unguarded: they are rewriter-built and
//! safe by construction. Compound writes and increments of properties
//! were already rejected by the construct check when this tier is on.
//!
//! Runs after capability threading, on the already-threaded tree.

use cajole_ast::ast::{
    CatchClause, Expr, ExprKind, ForInit, FunctionDef, Ident, MemberKey, Property, Stmt, StmtKind,
    SwitchCase, UnaryOp,
};
use cajole_ast::foundation::Span;

use super::{CAPS_PARAM, GUARDS_CAPABILITY};

/// Guard every member access in a statement list.
pub fn guard_stmts(stmts: Vec<Stmt>) -> Vec<Stmt> {
    stmts.into_iter().map(guard_stmt).collect()
}

/// True for the capability record itself; its members are
/// rewriter-introduced and stay direct.
fn is_caps_record(expr: &Expr) -> bool {
    matches!(&expr.kind, ExprKind::Ident(name) if name == CAPS_PARAM)
}

/// Build `caps__.guards__.<method>(args)`.
fn guards_call(method: &str, args: Vec<Expr>, span: Span) -> Expr {
    let guards = Expr::member(
        Expr::ident(CAPS_PARAM, span),
        Ident {
            name: GUARDS_CAPABILITY.to_string(),
            span,
        },
        span,
    );
    let callee = Expr::member(
        guards,
        Ident {
            name: method.to_string(),
            span,
        },
        span,
    );
    Expr::call(callee, args, span)
}

/// Turn a member key into a guard-call key argument.
fn key_arg(key: MemberKey) -> Expr {
    match key {
        MemberKey::Static(name) => Expr::string(name.name, name.span),
        MemberKey::Computed(expr) => guard_expr(*expr),
    }
}

fn guard_stmt(stmt: Stmt) -> Stmt {
    let span = stmt.span;
    let kind = match stmt.kind {
        StmtKind::Expr(expr) => StmtKind::Expr(guard_expr(expr)),

        StmtKind::VarDecl { kind, decls } => StmtKind::VarDecl {
            kind,
            decls: decls
                .into_iter()
                .map(|mut d| {
                    d.init = d.init.map(guard_expr);
                    d
                })
                .collect(),
        },

        StmtKind::Function(def) => StmtKind::Function(guard_function(def)),

        StmtKind::Return(value) => StmtKind::Return(value.map(guard_expr)),

        StmtKind::If {
            test,
            consequent,
            alternate,
        } => StmtKind::If {
            test: guard_expr(test),
            consequent: Box::new(guard_stmt(*consequent)),
            alternate: alternate.map(|a| Box::new(guard_stmt(*a))),
        },

        StmtKind::Block(body) => StmtKind::Block(guard_stmts(body)),

        StmtKind::While { test, body } => StmtKind::While {
            test: guard_expr(test),
            body: Box::new(guard_stmt(*body)),
        },

        StmtKind::DoWhile { body, test } => StmtKind::DoWhile {
            body: Box::new(guard_stmt(*body)),
            test: guard_expr(test),
        },

        StmtKind::For {
            init,
            test,
            update,
            body,
        } => StmtKind::For {
            init: init.map(|i| match i {
                ForInit::VarDecl { kind, decls } => ForInit::VarDecl {
                    kind,
                    decls: decls
                        .into_iter()
                        .map(|mut d| {
                            d.init = d.init.map(guard_expr);
                            d
                        })
                        .collect(),
                },
                ForInit::Expr(expr) => ForInit::Expr(guard_expr(expr)),
            }),
            test: test.map(guard_expr),
            update: update.map(guard_expr),
            body: Box::new(guard_stmt(*body)),
        },

        StmtKind::ForIn {
            decl,
            target,
            object,
            body,
        } => StmtKind::ForIn {
            decl,
            target,
            object: guard_expr(object),
            body: Box::new(guard_stmt(*body)),
        },

        StmtKind::Labeled { label, body } => StmtKind::Labeled {
            label,
            body: Box::new(guard_stmt(*body)),
        },

        StmtKind::Switch {
            discriminant,
            cases,
        } => StmtKind::Switch {
            discriminant: guard_expr(discriminant),
            cases: cases
                .into_iter()
                .map(|c| SwitchCase {
                    test: c.test.map(guard_expr),
                    body: guard_stmts(c.body),
                    span: c.span,
                })
                .collect(),
        },

        StmtKind::Throw(value) => StmtKind::Throw(guard_expr(value)),

        StmtKind::Try {
            block,
            handler,
            finalizer,
        } => StmtKind::Try {
            block: guard_stmts(block),
            handler: handler.map(|h| CatchClause {
                param: h.param,
                body: guard_stmts(h.body),
                span: h.span,
            }),
            finalizer: finalizer.map(guard_stmts),
        },

        StmtKind::With { object, body } => StmtKind::With {
            object: guard_expr(object),
            body: Box::new(guard_stmt(*body)),
        },

        other @ (StmtKind::Break(_)
        | StmtKind::Continue(_)
        | StmtKind::Debugger
        | StmtKind::Empty) => other,
    };

    Stmt::new(kind, span)
}

fn guard_function(def: FunctionDef) -> FunctionDef {
    FunctionDef {
        name: def.name,
        params: def.params,
        body: guard_stmts(def.body),
        span: def.span,
    }
}

fn guard_expr(expr: Expr) -> Expr {
    let span = expr.span;
    match expr.kind {
        // Method invocation: preserve `this` through the guard
        ExprKind::Call { callee, args } => {
            let args: Vec<Expr> = args.into_iter().map(guard_expr).collect();
            match callee.kind {
                ExprKind::Member { object, key } if !is_caps_record(&object) => {
                    let object = guard_expr(*object);
                    let key = key_arg(key);
                    let args_array = Expr::new(ExprKind::Array(args), span);
                    guards_call("call", vec![object, key, args_array], span)
                }
                other => Expr::new(
                    ExprKind::Call {
                        callee: Box::new(guard_expr(Expr::new(other, callee.span))),
                        args,
                    },
                    span,
                ),
            }
        }

        // Property write
        ExprKind::Assign { op, target, value } => {
            let value = guard_expr(*value);
            match target.kind {
                ExprKind::Member { object, key } if !is_caps_record(&object) => {
                    // Only plain `=` reaches here; the construct check
                    // rejected compound property writes under guarding
                    let object = guard_expr(*object);
                    let key = key_arg(key);
                    guards_call("set", vec![object, key, value], span)
                }
                other => Expr::new(
                    ExprKind::Assign {
                        op,
                        target: Box::new(guard_expr(Expr::new(other, target.span))),
                        value: Box::new(value),
                    },
                    span,
                ),
            }
        }

        // Property delete
        ExprKind::Unary {
            op: UnaryOp::Delete,
            operand,
        } => match operand.kind {
            ExprKind::Member { object, key } if !is_caps_record(&object) => {
                let object = guard_expr(*object);
                let key = key_arg(key);
                guards_call("remove", vec![object, key], span)
            }
            other => Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Delete,
                    operand: Box::new(guard_expr(Expr::new(other, operand.span))),
                },
                span,
            ),
        },

        // Property read
        ExprKind::Member { object, key } => {
            if is_caps_record(&object) {
                // Rewriter-introduced capability read; keep direct
                Expr::new(
                    ExprKind::Member {
                        object,
                        key,
                    },
                    span,
                )
            } else {
                let object = guard_expr(*object);
                let key = key_arg(key);
                guards_call("read", vec![object, key], span)
            }
        }

        ExprKind::Array(elements) => Expr::new(
            ExprKind::Array(elements.into_iter().map(guard_expr).collect()),
            span,
        ),

        ExprKind::Object(properties) => Expr::new(
            ExprKind::Object(
                properties
                    .into_iter()
                    .map(|p| Property {
                        key: p.key,
                        value: guard_expr(p.value),
                        span: p.span,
                    })
                    .collect(),
            ),
            span,
        ),

        ExprKind::Function(def) => Expr::new(ExprKind::Function(guard_function(def)), span),

        ExprKind::New { callee, args } => Expr::new(
            ExprKind::New {
                callee: Box::new(guard_expr(*callee)),
                args: args.into_iter().map(guard_expr).collect(),
            },
            span,
        ),

        ExprKind::Unary { op, operand } => Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(guard_expr(*operand)),
            },
            span,
        ),

        ExprKind::Update { op, prefix, target } => Expr::new(
            ExprKind::Update {
                op,
                prefix,
                target: Box::new(guard_expr(*target)),
            },
            span,
        ),

        ExprKind::Binary { op, left, right } => Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(guard_expr(*left)),
                right: Box::new(guard_expr(*right)),
            },
            span,
        ),

        ExprKind::Logical { op, left, right } => Expr::new(
            ExprKind::Logical {
                op,
                left: Box::new(guard_expr(*left)),
                right: Box::new(guard_expr(*right)),
            },
            span,
        ),

        ExprKind::Conditional {
            test,
            consequent,
            alternate,
        } => Expr::new(
            ExprKind::Conditional {
                test: Box::new(guard_expr(*test)),
                consequent: Box::new(guard_expr(*consequent)),
                alternate: Box::new(guard_expr(*alternate)),
            },
            span,
        ),

        ExprKind::Sequence(exprs) => Expr::new(
            ExprKind::Sequence(exprs.into_iter().map(guard_expr).collect()),
            span,
        ),

        leaf @ (ExprKind::Ident(_)
        | ExprKind::Number(_)
        | ExprKind::Str(_)
        | ExprKind::Bool(_)
        | ExprKind::Null
        | ExprKind::This) => Expr::new(leaf, span),
    }
}
