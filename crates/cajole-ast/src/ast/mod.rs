//! Script AST produced by the parser and rewritten by the confinement pass.
//!
//! The tree is untyped and position-tagged: every node carries a
//! [`Span`](crate::foundation::Span) inherited from its originating
//! tokens. A tree is owned by exactly one pipeline invocation; the
//! rewriter builds a new tree rather than mutating its input.

pub mod expr;
pub mod module;
pub mod stmt;
pub mod walk;

pub use expr::{
    AssignOp, BinaryOp, Expr, ExprKind, Ident, LogicalOp, MemberKey, PropKey, Property, UnaryOp,
    UpdateOp,
};
pub use module::ConfinedModule;
pub use stmt::{
    CatchClause, DeclKind, Declarator, ForInit, FunctionDef, Program, Stmt, StmtKind, SwitchCase,
};
pub use walk::{walk_expr, walk_stmts};
