//! Structural printer.
//!
//! Walks the module AST emitting a token stream into a
//! [`TokenSink`](crate::sink::TokenSink); the sink decides what
//! whitespace survives. Parenthesization is re-derived from the shared
//! precedence ladder — how the source happened to be parenthesized is
//! not represented in the tree and plays no role here.

use cajole_ast::ast::expr::precedence;
use cajole_ast::ast::{
    ConfinedModule, Declarator, Expr, ExprKind, ForInit, FunctionDef, MemberKey, Program, PropKey,
    Stmt, StmtKind,
};

use crate::sink::{MinimalSink, PrettySink, RenderMode, TokenSink};

/// Render a confined module to text.
///
/// Deterministic: the same module and mode always produce identical
/// text. Never fails on a well-formed module; internal inconsistencies
/// panic (a pipeline defect, not user input).
pub fn render(module: &ConfinedModule, mode: RenderMode) -> String {
    match mode {
        RenderMode::Minimal => {
            let mut sink = MinimalSink::new();
            Printer { sink: &mut sink }.program(&module.body);
            sink.into_string()
        }
        RenderMode::Pretty => {
            let mut sink = PrettySink::new();
            Printer { sink: &mut sink }.program(&module.body);
            sink.into_string()
        }
    }
}

/// Precedence of an expression on the shared ladder.
fn precedence_of(expr: &Expr) -> u8 {
    match &expr.kind {
        ExprKind::Sequence(_) => precedence::SEQUENCE,
        ExprKind::Assign { .. } => precedence::ASSIGN,
        ExprKind::Conditional { .. } => precedence::CONDITIONAL,
        ExprKind::Logical { op, .. } => op.precedence(),
        ExprKind::Binary { op, .. } => op.precedence(),
        ExprKind::Unary { .. } => precedence::UNARY,
        ExprKind::Update { prefix: true, .. } => precedence::UNARY,
        ExprKind::Update { prefix: false, .. } => precedence::POSTFIX,
        ExprKind::Call { .. } => precedence::CALL,
        ExprKind::New { .. } | ExprKind::Member { .. } => precedence::MEMBER,
        _ => precedence::PRIMARY,
    }
}

/// True when an expression statement's first token would be `function`
/// or `{`, which must be parenthesized to stay an expression.
fn starts_with_hazard(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Function(_) | ExprKind::Object(_) => true,
        ExprKind::Binary { left, .. } | ExprKind::Logical { left, .. } => starts_with_hazard(left),
        ExprKind::Assign { target, .. } => starts_with_hazard(target),
        ExprKind::Conditional { test, .. } => starts_with_hazard(test),
        ExprKind::Sequence(exprs) => exprs.first().is_some_and(starts_with_hazard),
        ExprKind::Member { object, .. } => starts_with_hazard(object),
        ExprKind::Call { callee, .. } => starts_with_hazard(callee),
        ExprKind::Update {
            prefix: false,
            target,
            ..
        } => starts_with_hazard(target),
        _ => false,
    }
}

/// Format a numeric literal.
fn number_token(n: f64) -> String {
    // Integral values inside the exact-i64 range print without a
    // fraction; everything else uses the shortest round-trip form
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Format a string literal (double-quoted, escaped).
fn string_token(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

struct Printer<'s, S: TokenSink> {
    sink: &'s mut S,
}

impl<S: TokenSink> Printer<'_, S> {
    fn t(&mut self, text: &str) {
        self.sink.token(text);
    }

    fn sp(&mut self) {
        self.sink.space();
    }

    fn nl(&mut self) {
        self.sink.newline();
    }

    fn program(&mut self, program: &Program) {
        for stmt in &program.body {
            self.stmt(stmt);
        }
    }

    /// Render a statement followed by its line break.
    fn stmt(&mut self, stmt: &Stmt) {
        self.stmt_inner(stmt);
        self.nl();
    }

    /// Render the body of a control-flow statement: blocks inline after
    /// a space, anything else indented on its own line.
    fn nested_stmt(&mut self, stmt: &Stmt) {
        if matches!(stmt.kind, StmtKind::Block(_)) {
            self.sp();
            self.stmt_inner(stmt);
        } else {
            self.nl();
            self.sink.indent();
            self.stmt_inner(stmt);
            self.sink.dedent();
            self.nl();
        }
    }

    /// Render `{ … }`.
    fn block(&mut self, body: &[Stmt]) {
        self.t("{");
        self.nl();
        self.sink.indent();
        for stmt in body {
            self.stmt(stmt);
        }
        self.sink.dedent();
        self.t("}");
    }

    fn function(&mut self, def: &FunctionDef) {
        self.t("function");
        self.sp();
        if let Some(name) = &def.name {
            self.t(&name.name);
        }
        self.t("(");
        for (i, param) in def.params.iter().enumerate() {
            if i > 0 {
                self.t(",");
                self.sp();
            }
            self.t(&param.name);
        }
        self.t(")");
        self.sp();
        self.block(&def.body);
    }

    fn declarators(&mut self, decls: &[Declarator]) {
        for (i, decl) in decls.iter().enumerate() {
            if i > 0 {
                self.t(",");
                self.sp();
            }
            self.t(&decl.name.name);
            if let Some(init) = &decl.init {
                self.sp();
                self.t("=");
                self.sp();
                self.expr(init, precedence::ASSIGN);
            }
        }
    }

    fn stmt_inner(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                let parens = starts_with_hazard(expr);
                if parens {
                    self.t("(");
                }
                self.expr(expr, precedence::SEQUENCE);
                if parens {
                    self.t(")");
                }
                self.t(";");
            }

            StmtKind::VarDecl { kind, decls } => {
                self.t(kind.keyword());
                self.sp();
                self.declarators(decls);
                self.t(";");
            }

            StmtKind::Function(def) => self.function(def),

            StmtKind::Return(value) => {
                self.t("return");
                if let Some(value) = value {
                    self.sp();
                    self.expr(value, precedence::SEQUENCE);
                }
                self.t(";");
            }

            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                self.t("if");
                self.sp();
                self.t("(");
                self.expr(test, precedence::SEQUENCE);
                self.t(")");
                self.nested_stmt(consequent);
                if let Some(alternate) = alternate {
                    if matches!(consequent.kind, StmtKind::Block(_)) {
                        self.sp();
                    }
                    self.t("else");
                    if matches!(alternate.kind, StmtKind::If { .. }) {
                        // `else if` chains stay on one line
                        self.sp();
                        self.stmt_inner(alternate);
                    } else {
                        self.nested_stmt(alternate);
                    }
                }
            }

            StmtKind::Block(body) => self.block(body),

            StmtKind::While { test, body } => {
                self.t("while");
                self.sp();
                self.t("(");
                self.expr(test, precedence::SEQUENCE);
                self.t(")");
                self.nested_stmt(body);
            }

            StmtKind::DoWhile { body, test } => {
                self.t("do");
                self.nested_stmt(body);
                self.sp();
                self.t("while");
                self.sp();
                self.t("(");
                self.expr(test, precedence::SEQUENCE);
                self.t(")");
                self.t(";");
            }

            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                self.t("for");
                self.sp();
                self.t("(");
                match init {
                    Some(ForInit::VarDecl { kind, decls }) => {
                        self.t(kind.keyword());
                        self.sp();
                        self.declarators(decls);
                    }
                    Some(ForInit::Expr(expr)) => self.expr(expr, precedence::SEQUENCE),
                    None => {}
                }
                self.t(";");
                if let Some(test) = test {
                    self.sp();
                    self.expr(test, precedence::SEQUENCE);
                }
                self.t(";");
                if let Some(update) = update {
                    self.sp();
                    self.expr(update, precedence::SEQUENCE);
                }
                self.t(")");
                self.nested_stmt(body);
            }

            StmtKind::ForIn {
                decl,
                target,
                object,
                body,
            } => {
                self.t("for");
                self.sp();
                self.t("(");
                if let Some(kind) = decl {
                    self.t(kind.keyword());
                    self.sp();
                }
                self.expr(target, precedence::POSTFIX);
                self.sp();
                self.t("in");
                self.sp();
                self.expr(object, precedence::ASSIGN);
                self.t(")");
                self.nested_stmt(body);
            }

            StmtKind::Break(label) => {
                self.t("break");
                if let Some(label) = label {
                    self.sp();
                    self.t(&label.name);
                }
                self.t(";");
            }

            StmtKind::Continue(label) => {
                self.t("continue");
                if let Some(label) = label {
                    self.sp();
                    self.t(&label.name);
                }
                self.t(";");
            }

            StmtKind::Labeled { label, body } => {
                self.t(&label.name);
                self.t(":");
                self.sp();
                self.stmt_inner(body);
            }

            StmtKind::Switch {
                discriminant,
                cases,
            } => {
                self.t("switch");
                self.sp();
                self.t("(");
                self.expr(discriminant, precedence::SEQUENCE);
                self.t(")");
                self.sp();
                self.t("{");
                self.nl();
                self.sink.indent();
                for case in cases {
                    match &case.test {
                        Some(test) => {
                            self.t("case");
                            self.sp();
                            self.expr(test, precedence::SEQUENCE);
                        }
                        None => self.t("default"),
                    }
                    self.t(":");
                    self.nl();
                    self.sink.indent();
                    for stmt in &case.body {
                        self.stmt(stmt);
                    }
                    self.sink.dedent();
                }
                self.sink.dedent();
                self.t("}");
            }

            StmtKind::Throw(value) => {
                self.t("throw");
                self.sp();
                self.expr(value, precedence::SEQUENCE);
                self.t(";");
            }

            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                self.t("try");
                self.sp();
                self.block(block);
                if let Some(handler) = handler {
                    self.sp();
                    self.t("catch");
                    self.sp();
                    self.t("(");
                    self.t(&handler.param.name);
                    self.t(")");
                    self.sp();
                    self.block(&handler.body);
                }
                if let Some(finalizer) = finalizer {
                    self.sp();
                    self.t("finally");
                    self.sp();
                    self.block(finalizer);
                }
            }

            StmtKind::With { object, body } => {
                self.t("with");
                self.sp();
                self.t("(");
                self.expr(object, precedence::SEQUENCE);
                self.t(")");
                self.nested_stmt(body);
            }

            StmtKind::Debugger => {
                self.t("debugger");
                self.t(";");
            }

            StmtKind::Empty => self.t(";"),
        }
    }

    /// Render an expression, parenthesizing when its precedence is
    /// looser than the context requires.
    fn expr(&mut self, expr: &Expr, min_prec: u8) {
        let parens = precedence_of(expr) < min_prec;
        if parens {
            self.t("(");
        }
        self.expr_inner(expr);
        if parens {
            self.t(")");
        }
    }

    fn expr_inner(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(name) => self.t(name),
            ExprKind::Number(n) => self.t(&number_token(*n)),
            ExprKind::Str(s) => self.t(&string_token(s)),
            ExprKind::Bool(true) => self.t("true"),
            ExprKind::Bool(false) => self.t("false"),
            ExprKind::Null => self.t("null"),
            ExprKind::This => self.t("this"),

            ExprKind::Array(elements) => {
                self.t("[");
                for (i, elem) in elements.iter().enumerate() {
                    if i > 0 {
                        self.t(",");
                        self.sp();
                    }
                    self.expr(elem, precedence::ASSIGN);
                }
                self.t("]");
            }

            ExprKind::Object(properties) => {
                self.t("{");
                for (i, prop) in properties.iter().enumerate() {
                    if i > 0 {
                        self.t(",");
                        self.sp();
                    }
                    match &prop.key {
                        PropKey::Ident(name) => self.t(&name.name),
                        PropKey::Str(s) => self.t(&string_token(s)),
                        PropKey::Number(n) => self.t(&number_token(*n)),
                    }
                    self.t(":");
                    self.sp();
                    self.expr(&prop.value, precedence::ASSIGN);
                }
                self.t("}");
            }

            ExprKind::Function(def) => self.function(def),

            ExprKind::Member { object, key } => {
                // A bare number before `.` would merge into the literal
                if matches!(object.kind, ExprKind::Number(_)) {
                    self.t("(");
                    self.expr_inner(object);
                    self.t(")");
                } else {
                    self.expr(object, precedence::CALL);
                }
                match key {
                    MemberKey::Static(name) => {
                        self.t(".");
                        self.t(&name.name);
                    }
                    MemberKey::Computed(key_expr) => {
                        self.t("[");
                        self.expr(key_expr, precedence::SEQUENCE);
                        self.t("]");
                    }
                }
            }

            ExprKind::Call { callee, args } => {
                self.expr(callee, precedence::CALL);
                self.t("(");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.t(",");
                        self.sp();
                    }
                    self.expr(arg, precedence::ASSIGN);
                }
                self.t(")");
            }

            ExprKind::New { callee, args } => {
                self.t("new");
                self.sp();
                self.expr(callee, precedence::MEMBER);
                self.t("(");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.t(",");
                        self.sp();
                    }
                    self.expr(arg, precedence::ASSIGN);
                }
                self.t(")");
            }

            ExprKind::Unary { op, operand } => {
                self.t(op.symbol());
                if op.is_word() {
                    self.sp();
                }
                self.expr(operand, precedence::UNARY);
            }

            ExprKind::Update { op, prefix, target } => {
                if *prefix {
                    self.t(op.symbol());
                    self.expr(target, precedence::UNARY);
                } else {
                    self.expr(target, precedence::POSTFIX);
                    self.t(op.symbol());
                }
            }

            ExprKind::Binary { op, left, right } => {
                let prec = op.precedence();
                self.expr(left, prec);
                self.sp();
                self.t(op.symbol());
                self.sp();
                self.expr(right, prec + 1);
            }

            ExprKind::Logical { op, left, right } => {
                let prec = op.precedence();
                self.expr(left, prec);
                self.sp();
                self.t(op.symbol());
                self.sp();
                self.expr(right, prec + 1);
            }

            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.expr(test, precedence::CONDITIONAL + 1);
                self.sp();
                self.t("?");
                self.sp();
                self.expr(consequent, precedence::ASSIGN);
                self.sp();
                self.t(":");
                self.sp();
                self.expr(alternate, precedence::ASSIGN);
            }

            ExprKind::Assign { op, target, value } => {
                self.expr(target, precedence::POSTFIX);
                self.sp();
                self.t(op.symbol());
                self.sp();
                self.expr(value, precedence::ASSIGN);
            }

            ExprKind::Sequence(exprs) => {
                for (i, e) in exprs.iter().enumerate() {
                    if i > 0 {
                        self.t(",");
                        self.sp();
                    }
                    self.expr(e, precedence::ASSIGN);
                }
            }
        }
    }
}
