//! Recursive descent parser.
//!
//! ## Module Organization
//!
//! - `stream` - token stream with lookahead and span tracking
//! - `error` - parse error types
//! - `expr` - Pratt parser for expressions (full operator ladder)
//! - `stmt` - statement and function parsing
//!
//! ## Precedence Levels (loosest to tightest)
//!
//! comma sequence < assignment < conditional `?:` < `||` < `&&` < `|` <
//! `^` < `&` < equality < relational (incl. `in`, `instanceof`) < shift <
//! additive < multiplicative < unary < postfix < call/member.
//!
//! Statements are `;`-terminated; a missing semicolon is tolerated only
//! at end of input or before a closing `}` (no general automatic
//! semicolon insertion).

mod error;
mod expr;
mod stmt;
mod stream;

pub use error::{ParseError, ParseErrorKind};
pub use stream::TokenStream;

use cajole_ast::ast::Program;
use cajole_ast::foundation::Span;
use cajole_lexer::Token;
use std::ops::Range;

/// Parse a whole program from lexed tokens.
///
/// The parser recovers at statement boundaries, so all syntax errors in
/// the source are reported together. An empty token stream is a valid,
/// empty program.
///
/// # Parameters
/// - `tokens`: tokens paired with their byte spans, as produced by the lexer
/// - `file_id`: source identifier for spans
///
/// # Errors
/// Returns every [`ParseError`] found, in source order.
pub fn parse_program(
    tokens: &[(Token, Range<usize>)],
    file_id: u16,
) -> Result<Program, Vec<ParseError>> {
    let mut stream = TokenStream::new(tokens, file_id);
    let mut body = Vec::new();
    let mut errors = Vec::new();

    while !stream.at_end() {
        let before = stream.current_pos();
        match stmt::parse_stmt(&mut stream) {
            Ok(statement) => body.push(statement),
            Err(err) => {
                errors.push(err);
                stream.synchronize();
                // Recovery must always make progress; skip the stuck
                // token if synchronize stopped where the error began.
                if stream.current_pos() == before {
                    stream.advance();
                }
            }
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let span = match tokens.last() {
        Some((_, last)) => Span::new(file_id, 0, last.end as u32, 1),
        None => Span::zero(file_id),
    };

    Ok(Program { body, span })
}

/// Convert a token naming a property to its string form.
///
/// After `.` (and as an object literal key) the grammar admits any
/// identifier name, including reserved words (`a.delete`, `{in: 1}`).
fn token_property_name(token: &Token) -> Option<String> {
    match token {
        Token::Ident(s) => Some(s.to_string()),
        Token::Var
        | Token::Let
        | Token::Const
        | Token::Function
        | Token::Return
        | Token::If
        | Token::Else
        | Token::While
        | Token::Do
        | Token::For
        | Token::In
        | Token::Break
        | Token::Continue
        | Token::New
        | Token::Delete
        | Token::Typeof
        | Token::Instanceof
        | Token::Void
        | Token::This
        | Token::Null
        | Token::True
        | Token::False
        | Token::Throw
        | Token::Try
        | Token::Catch
        | Token::Finally
        | Token::Switch
        | Token::Case
        | Token::Default
        | Token::With
        | Token::Debugger => Some(token.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cajole_ast::ast::{ExprKind, StmtKind};
    use logos::Logos;

    fn lex(source: &str) -> Vec<(Token, Range<usize>)> {
        let mut lexer = Token::lexer(source);
        let mut tokens = Vec::new();
        while let Some(result) = lexer.next() {
            tokens.push((result.expect("lex error in test source"), lexer.span()));
        }
        tokens
    }

    fn parse(source: &str) -> Program {
        parse_program(&lex(source), 0).expect("parse error in test source")
    }

    fn parse_err(source: &str) -> Vec<ParseError> {
        parse_program(&lex(source), 0).expect_err("expected parse failure")
    }

    #[test]
    fn test_empty_program() {
        let program = parse("");
        assert!(program.body.is_empty());
    }

    #[test]
    fn test_expression_statement_without_trailing_semi() {
        let program = parse("1+1");
        assert_eq!(program.body.len(), 1);
        assert!(matches!(program.body[0].kind, StmtKind::Expr(_)));
    }

    #[test]
    fn test_var_declaration() {
        let program = parse("var x = 1, y;");
        match &program.body[0].kind {
            StmtKind::VarDecl { decls, .. } => {
                assert_eq!(decls.len(), 2);
                assert_eq!(decls[0].name.name, "x");
                assert!(decls[0].init.is_some());
                assert!(decls[1].init.is_none());
            }
            other => panic!("expected var decl, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let program = parse("1 + 2 * 3;");
        let StmtKind::Expr(expr) = &program.body[0].kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Binary { op, right, .. } = &expr.kind else {
            panic!("expected binary expression");
        };
        assert_eq!(*op, cajole_ast::ast::BinaryOp::Add);
        assert!(matches!(right.kind, ExprKind::Binary { .. }));
    }

    #[test]
    fn test_assignment_right_associative() {
        let program = parse("a = b = 1;");
        let StmtKind::Expr(expr) = &program.body[0].kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Assign { value, .. } = &expr.kind else {
            panic!("expected assignment");
        };
        assert!(matches!(value.kind, ExprKind::Assign { .. }));
    }

    #[test]
    fn test_function_declaration_and_call() {
        let program = parse("function add(a, b) { return a + b; } add(1, 2);");
        assert_eq!(program.body.len(), 2);
        assert!(matches!(program.body[0].kind, StmtKind::Function(_)));
        let StmtKind::Expr(expr) = &program.body[1].kind else {
            panic!("expected call statement");
        };
        assert!(matches!(expr.kind, ExprKind::Call { .. }));
    }

    #[test]
    fn test_member_chain() {
        let program = parse("a.b[c].d();");
        let StmtKind::Expr(expr) = &program.body[0].kind else {
            panic!("expected expression statement");
        };
        assert!(matches!(expr.kind, ExprKind::Call { .. }));
    }

    #[test]
    fn test_new_expression() {
        let program = parse("new Thing(1); new Other;");
        for stmt in &program.body {
            let StmtKind::Expr(expr) = &stmt.kind else {
                panic!("expected expression statement");
            };
            assert!(matches!(expr.kind, ExprKind::New { .. }));
        }
    }

    #[test]
    fn test_for_in_vs_classic_for() {
        let program = parse("for (var k in obj) {} for (var i = 0; i < 3; i++) {}");
        assert!(matches!(program.body[0].kind, StmtKind::ForIn { .. }));
        assert!(matches!(program.body[1].kind, StmtKind::For { .. }));
    }

    #[test]
    fn test_with_statement_parses() {
        // Rejection is the rewriter's job; the parser keeps the position
        let program = parse("with (o) { x; }");
        assert!(matches!(program.body[0].kind, StmtKind::With { .. }));
    }

    #[test]
    fn test_labeled_break() {
        let program = parse("outer: while (true) { break outer; }");
        assert!(matches!(program.body[0].kind, StmtKind::Labeled { .. }));
    }

    #[test]
    fn test_try_catch_finally() {
        let program = parse("try { f(); } catch (e) { g(e); } finally { h(); }");
        let StmtKind::Try {
            handler, finalizer, ..
        } = &program.body[0].kind
        else {
            panic!("expected try statement");
        };
        assert!(handler.is_some());
        assert!(finalizer.is_some());
    }

    #[test]
    fn test_object_and_array_literals() {
        let program = parse("var o = { a: 1, 'b': 2, 3: x, in: 4 }; var a = [1, 2, 3];");
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn test_conditional_and_sequence() {
        let program = parse("a ? b : c, d;");
        let StmtKind::Expr(expr) = &program.body[0].kind else {
            panic!("expected expression statement");
        };
        assert!(matches!(expr.kind, ExprKind::Sequence(_)));
    }

    #[test]
    fn test_unexpected_eof() {
        let errors = parse_err("var x = ");
        assert!(errors
            .iter()
            .any(|e| e.kind == ParseErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_multiple_errors_reported() {
        let errors = parse_err("var = 1; var y = ;");
        assert!(errors.len() >= 2);
    }

    #[test]
    fn test_invalid_assignment_target() {
        let errors = parse_err("1 = 2;");
        assert!(errors
            .iter()
            .any(|e| e.kind == ParseErrorKind::InvalidSyntax));
    }

    #[test]
    fn test_reserved_word_property() {
        let program = parse("a.delete;");
        let StmtKind::Expr(expr) = &program.body[0].kind else {
            panic!("expected expression statement");
        };
        assert!(matches!(expr.kind, ExprKind::Member { .. }));
    }

    #[test]
    fn test_error_positions_are_byte_accurate() {
        let errors = parse_err("x = ;");
        // Error points at the `;` (byte 4)
        assert_eq!(errors[0].span.start, 4);
    }
}
