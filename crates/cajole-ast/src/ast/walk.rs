//! Expression tree walking utilities.
//!
//! Shared traversal logic so analysis passes and tests don't duplicate
//! recursive descent over the statement/expression shape.
//!
//! # Design
//!
//! - **Minimal API** - two functions, not a visitor trait hierarchy
//! - **Pre-order** - visitor called before recursing into children
//! - **Deep** - traversal descends into nested function bodies
//!
//! Passes that need scope context (the rewriter) hand-roll their
//! recursion; these walkers serve the context-free cases: collecting
//! identifiers, counting node kinds, asserting post-rewrite shapes.
//!
//! # Examples
//!
//! ```rust,ignore
//! // Collect every identifier reference in a program
//! let mut names = Vec::new();
//! walk_stmts(&program.body, &mut |expr| {
//!     if let ExprKind::Ident(name) = &expr.kind {
//!         names.push(name.clone());
//!     }
//! });
//! ```

use super::expr::{Expr, ExprKind, MemberKey};
use super::stmt::{ForInit, Stmt, StmtKind};

/// Recursively walk an expression in pre-order, calling visitor for
/// each expression node, including those inside nested function bodies.
pub fn walk_expr<V>(expr: &Expr, visitor: &mut V)
where
    V: FnMut(&Expr),
{
    visitor(expr);

    match &expr.kind {
        ExprKind::Array(elements) => {
            for elem in elements {
                walk_expr(elem, visitor);
            }
        }

        ExprKind::Object(properties) => {
            for prop in properties {
                walk_expr(&prop.value, visitor);
            }
        }

        ExprKind::Function(def) => walk_stmts(&def.body, visitor),

        ExprKind::Member { object, key } => {
            walk_expr(object, visitor);
            if let MemberKey::Computed(key_expr) = key {
                walk_expr(key_expr, visitor);
            }
        }

        ExprKind::Call { callee, args } | ExprKind::New { callee, args } => {
            walk_expr(callee, visitor);
            for arg in args {
                walk_expr(arg, visitor);
            }
        }

        ExprKind::Unary { operand, .. } => walk_expr(operand, visitor),
        ExprKind::Update { target, .. } => walk_expr(target, visitor),

        ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
            walk_expr(left, visitor);
            walk_expr(right, visitor);
        }

        ExprKind::Conditional {
            test,
            consequent,
            alternate,
        } => {
            walk_expr(test, visitor);
            walk_expr(consequent, visitor);
            walk_expr(alternate, visitor);
        }

        ExprKind::Assign { target, value, .. } => {
            walk_expr(target, visitor);
            walk_expr(value, visitor);
        }

        ExprKind::Sequence(exprs) => {
            for e in exprs {
                walk_expr(e, visitor);
            }
        }

        // Leaf nodes
        ExprKind::Ident(_)
        | ExprKind::Number(_)
        | ExprKind::Str(_)
        | ExprKind::Bool(_)
        | ExprKind::Null
        | ExprKind::This => {}
    }
}

/// Walk every expression reachable from a statement list, in source
/// order, descending into nested blocks and function bodies.
pub fn walk_stmts<V>(stmts: &[Stmt], visitor: &mut V)
where
    V: FnMut(&Expr),
{
    for stmt in stmts {
        walk_stmt(stmt, visitor);
    }
}

fn walk_stmt<V>(stmt: &Stmt, visitor: &mut V)
where
    V: FnMut(&Expr),
{
    match &stmt.kind {
        StmtKind::Expr(expr) => walk_expr(expr, visitor),

        StmtKind::VarDecl { decls, .. } => {
            for decl in decls {
                if let Some(init) = &decl.init {
                    walk_expr(init, visitor);
                }
            }
        }

        StmtKind::Function(def) => walk_stmts(&def.body, visitor),

        StmtKind::Return(value) => {
            if let Some(value) = value {
                walk_expr(value, visitor);
            }
        }

        StmtKind::If {
            test,
            consequent,
            alternate,
        } => {
            walk_expr(test, visitor);
            walk_stmt(consequent, visitor);
            if let Some(alternate) = alternate {
                walk_stmt(alternate, visitor);
            }
        }

        StmtKind::Block(body) => walk_stmts(body, visitor),

        StmtKind::While { test, body } => {
            walk_expr(test, visitor);
            walk_stmt(body, visitor);
        }

        StmtKind::DoWhile { body, test } => {
            walk_stmt(body, visitor);
            walk_expr(test, visitor);
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
                        if let Some(init) = &decl.init {
                            walk_expr(init, visitor);
                        }
                    }
                }
                Some(ForInit::Expr(expr)) => walk_expr(expr, visitor),
                None => {}
            }
            if let Some(test) = test {
                walk_expr(test, visitor);
            }
            if let Some(update) = update {
                walk_expr(update, visitor);
            }
            walk_stmt(body, visitor);
        }

        StmtKind::ForIn {
            target,
            object,
            body,
            ..
        } => {
            walk_expr(target, visitor);
            walk_expr(object, visitor);
            walk_stmt(body, visitor);
        }

        StmtKind::Labeled { body, .. } => walk_stmt(body, visitor),

        StmtKind::Switch {
            discriminant,
            cases,
        } => {
            walk_expr(discriminant, visitor);
            for case in cases {
                if let Some(test) = &case.test {
                    walk_expr(test, visitor);
                }
                walk_stmts(&case.body, visitor);
            }
        }

        StmtKind::Throw(expr) => walk_expr(expr, visitor),

        StmtKind::Try {
            block,
            handler,
            finalizer,
        } => {
            walk_stmts(block, visitor);
            if let Some(handler) = handler {
                walk_stmts(&handler.body, visitor);
            }
            if let Some(finalizer) = finalizer {
                walk_stmts(finalizer, visitor);
            }
        }

        StmtKind::With { object, body } => {
            walk_expr(object, visitor);
            walk_stmt(body, visitor);
        }

        StmtKind::Break(_) | StmtKind::Continue(_) | StmtKind::Debugger | StmtKind::Empty => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprKind, FunctionDef, Stmt, StmtKind};
    use crate::foundation::Span;

    fn sp() -> Span {
        Span::zero(0)
    }

    #[test]
    fn test_walk_collects_idents_inside_function_bodies() {
        // function f(x) { return y; }
        let body = vec![Stmt::new(
            StmtKind::Return(Some(Expr::ident("y", sp()))),
            sp(),
        )];
        let def = FunctionDef {
            name: None,
            params: vec![],
            body,
            span: sp(),
        };
        let expr = Expr::new(ExprKind::Function(def), sp());

        let mut names = Vec::new();
        walk_expr(&expr, &mut |e| {
            if let ExprKind::Ident(name) = &e.kind {
                names.push(name.clone());
            }
        });
        assert_eq!(names, vec!["y"]);
    }

    #[test]
    fn test_walk_preorder() {
        // a + b
        let expr = Expr::new(
            ExprKind::Binary {
                op: crate::ast::BinaryOp::Add,
                left: Box::new(Expr::ident("a", sp())),
                right: Box::new(Expr::ident("b", sp())),
            },
            sp(),
        );

        let mut kinds = Vec::new();
        walk_expr(&expr, &mut |e| {
            kinds.push(match &e.kind {
                ExprKind::Binary { .. } => "binary",
                ExprKind::Ident(_) => "ident",
                _ => "other",
            });
        });
        assert_eq!(kinds, vec!["binary", "ident", "ident"]);
    }
}
