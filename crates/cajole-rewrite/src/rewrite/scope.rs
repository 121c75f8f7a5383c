//! Lexical scope tracking with hoisting.
//!
//! Free-variable resolution needs the source language's declaration
//! semantics, not a naive walk:
//!
//! - `var` declarators and function declarations hoist to the enclosing
//!   function (or program) scope, through any depth of nested blocks
//! - `let` / `const` bind in the enclosing block only
//! - parameters, a function expression's own name, and catch parameters
//!   bind in the scope they open
//!
//! The stack is seeded on scope entry (pre-scan), so a reference that
//! lexically precedes its hoisted declaration still resolves.

use cajole_ast::ast::{DeclKind, ForInit, FunctionDef, Stmt, StmtKind};
use std::collections::HashSet;

/// One lexical scope frame.
#[derive(Debug, Default)]
struct Scope {
    names: HashSet<String>,
}

/// Stack of lexical scopes, innermost last.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a function (or program) scope.
    ///
    /// Seeds the frame with parameters, the function's own name (for
    /// named function expressions, which can refer to themselves), and
    /// every hoisted declaration in the body: `var` names, function
    /// declaration names, and top-level `let`/`const` of the body.
    pub fn push_function(&mut self, params: &[String], own_name: Option<&str>, body: &[Stmt]) {
        let mut scope = Scope::default();
        for param in params {
            scope.names.insert(param.clone());
        }
        if let Some(name) = own_name {
            scope.names.insert(name.to_string());
        }
        collect_hoisted(body, &mut scope.names);
        collect_lexical(body, &mut scope.names);
        self.scopes.push(scope);
    }

    /// Enter a block scope seeded with the block's immediate
    /// `let`/`const` declarations.
    pub fn push_block(&mut self, body: &[Stmt]) {
        let mut scope = Scope::default();
        collect_lexical(body, &mut scope.names);
        self.scopes.push(scope);
    }

    /// Enter a block scope with explicit names (for-heads, catch).
    pub fn push_names<I>(&mut self, names: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut scope = Scope::default();
        scope.names.extend(names);
        self.scopes.push(scope);
    }

    /// Leave the innermost scope.
    ///
    /// # Panics
    /// Panics if the stack is empty (unbalanced push/pop is a rewriter
    /// defect).
    pub fn pop(&mut self) {
        assert!(
            self.scopes.pop().is_some(),
            "BUG: scope stack underflow in rewriter"
        );
    }

    /// True iff `name` resolves to a declaration in any enclosing scope.
    pub fn is_declared(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|s| s.names.contains(name))
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

/// Collect function-scoped (hoisted) names: `var` declarators and
/// function declarations, descending through nested blocks and control
/// flow but never into nested function bodies.
pub fn collect_hoisted(stmts: &[Stmt], out: &mut HashSet<String>) {
    for stmt in stmts {
        collect_hoisted_stmt(stmt, out);
    }
}

fn collect_hoisted_stmt(stmt: &Stmt, out: &mut HashSet<String>) {
    match &stmt.kind {
        StmtKind::VarDecl { kind, decls } if kind.is_function_scoped() => {
            for decl in decls {
                out.insert(decl.name.name.clone());
            }
        }
        StmtKind::VarDecl { .. } => {}

        StmtKind::Function(FunctionDef { name, .. }) => {
            if let Some(name) = name {
                out.insert(name.name.clone());
            }
        }

        StmtKind::Block(body) => collect_hoisted(body, out),

        StmtKind::If {
            consequent,
            alternate,
            ..
        } => {
            collect_hoisted_stmt(consequent, out);
            if let Some(alternate) = alternate {
                collect_hoisted_stmt(alternate, out);
            }
        }

        StmtKind::While { body, .. }
        | StmtKind::DoWhile { body, .. }
        | StmtKind::Labeled { body, .. }
        | StmtKind::With { body, .. } => collect_hoisted_stmt(body, out),

        StmtKind::For { init, body, .. } => {
            if let Some(ForInit::VarDecl { kind, decls }) = init {
                if kind.is_function_scoped() {
                    for decl in decls {
                        out.insert(decl.name.name.clone());
                    }
                }
            }
            collect_hoisted_stmt(body, out);
        }

        StmtKind::ForIn {
            decl, target, body, ..
        } => {
            if decl.map(DeclKind::is_function_scoped).unwrap_or(false) {
                if let cajole_ast::ast::ExprKind::Ident(name) = &target.kind {
                    out.insert(name.clone());
                }
            }
            collect_hoisted_stmt(body, out);
        }

        StmtKind::Switch { cases, .. } => {
            for case in cases {
                collect_hoisted(&case.body, out);
            }
        }

        StmtKind::Try {
            block,
            handler,
            finalizer,
        } => {
            collect_hoisted(block, out);
            if let Some(handler) = handler {
                collect_hoisted(&handler.body, out);
            }
            if let Some(finalizer) = finalizer {
                collect_hoisted(finalizer, out);
            }
        }

        StmtKind::Expr(_)
        | StmtKind::Return(_)
        | StmtKind::Break(_)
        | StmtKind::Continue(_)
        | StmtKind::Throw(_)
        | StmtKind::Debugger
        | StmtKind::Empty => {}
    }
}

/// Collect block-scoped names (`let`/`const`) from the immediate
/// statement list only — nested blocks open their own frames.
pub fn collect_lexical(stmts: &[Stmt], out: &mut HashSet<String>) {
    for stmt in stmts {
        if let StmtKind::VarDecl { kind, decls } = &stmt.kind {
            if !kind.is_function_scoped() {
                for decl in decls {
                    out.insert(decl.name.name.clone());
                }
            }
        }
    }
}
