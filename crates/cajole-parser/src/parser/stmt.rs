//! Statement and function parsing.

use cajole_ast::ast::{
    CatchClause, DeclKind, Declarator, Expr, ExprKind, ForInit, FunctionDef, Ident, Stmt, StmtKind,
    SwitchCase,
};
use cajole_lexer::Token;

use super::expr::{parse_assign, parse_expr, parse_expr_no_in};
use super::{ParseError, TokenStream};

/// Parse one statement.
pub(super) fn parse_stmt(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    match stream.peek() {
        Some(Token::LBrace) => parse_block_stmt(stream),
        Some(Token::Var) | Some(Token::Let) | Some(Token::Const) => parse_var_decl(stream),
        Some(Token::Function) => parse_function_decl(stream),
        Some(Token::Return) => parse_return(stream),
        Some(Token::If) => parse_if(stream),
        Some(Token::While) => parse_while(stream),
        Some(Token::Do) => parse_do_while(stream),
        Some(Token::For) => parse_for(stream),
        Some(Token::Break) | Some(Token::Continue) => parse_break_continue(stream),
        Some(Token::Switch) => parse_switch(stream),
        Some(Token::Throw) => parse_throw(stream),
        Some(Token::Try) => parse_try(stream),
        Some(Token::With) => parse_with(stream),
        Some(Token::Debugger) => {
            let start = stream.current_pos();
            stream.advance();
            consume_semi(stream)?;
            Ok(Stmt::new(StmtKind::Debugger, stream.span_from(start)))
        }
        Some(Token::Semi) => {
            let start = stream.current_pos();
            stream.advance();
            Ok(Stmt::new(StmtKind::Empty, stream.span_from(start)))
        }
        Some(Token::Ident(_)) if matches!(stream.peek_nth(1), Some(Token::Colon)) => {
            parse_labeled(stream)
        }
        Some(_) => parse_expr_stmt(stream),
        None => Err(ParseError::unexpected_token(
            None,
            "while parsing statement",
            stream.current_span(),
        )),
    }
}

/// Parse a function definition: `function name?(params) { body }`.
///
/// Shared by declarations (which require the name) and expressions
/// (which don't); the caller enforces the name requirement.
pub(super) fn parse_function_def(stream: &mut TokenStream) -> Result<FunctionDef, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Function)?;

    let name = if matches!(stream.peek(), Some(Token::Ident(_))) {
        Some(expect_ident(stream)?)
    } else {
        None
    };

    stream.expect(Token::LParen)?;
    let mut params = Vec::new();
    if !stream.check(&Token::RParen) {
        loop {
            params.push(expect_ident(stream)?);
            if !stream.eat(&Token::Comma) {
                break;
            }
        }
    }
    stream.expect(Token::RParen)?;

    let body = parse_braced_stmts(stream)?;

    Ok(FunctionDef {
        name,
        params,
        body,
        span: stream.span_from(start),
    })
}

fn parse_function_decl(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let start = stream.current_pos();
    let def = parse_function_def(stream)?;
    if def.name.is_none() {
        return Err(ParseError::invalid_syntax(
            "function declaration requires a name",
            def.span,
        ));
    }
    Ok(Stmt::new(StmtKind::Function(def), stream.span_from(start)))
}

fn parse_block_stmt(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let start = stream.current_pos();
    let body = parse_braced_stmts(stream)?;
    Ok(Stmt::new(StmtKind::Block(body), stream.span_from(start)))
}

/// Parse `{ stmt* }` and return the inner statements.
fn parse_braced_stmts(stream: &mut TokenStream) -> Result<Vec<Stmt>, ParseError> {
    stream.expect(Token::LBrace)?;
    let mut body = Vec::new();
    while !stream.check(&Token::RBrace) {
        if stream.at_end() {
            return Err(ParseError::unexpected_token(
                None,
                "while parsing block (missing `}`)",
                stream.current_span(),
            ));
        }
        body.push(parse_stmt(stream)?);
    }
    stream.expect(Token::RBrace)?;
    Ok(body)
}

fn parse_var_decl(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let start = stream.current_pos();
    let kind = parse_decl_kind(stream)?;
    let decls = parse_decl_list(stream, kind, true, false)?;
    consume_semi(stream)?;
    Ok(Stmt::new(
        StmtKind::VarDecl { kind, decls },
        stream.span_from(start),
    ))
}

fn parse_decl_kind(stream: &mut TokenStream) -> Result<DeclKind, ParseError> {
    match stream.advance().cloned() {
        Some(Token::Var) => Ok(DeclKind::Var),
        Some(Token::Let) => Ok(DeclKind::Let),
        Some(Token::Const) => Ok(DeclKind::Const),
        other => Err(ParseError::unexpected_token(
            other.as_ref(),
            "in declaration",
            stream.current_span(),
        )),
    }
}

/// Parse a comma-separated declarator list.
///
/// `for_head` relaxes the const-initializer requirement, since a
/// for-in head binds its name on each iteration.
fn parse_decl_list(
    stream: &mut TokenStream,
    kind: DeclKind,
    in_allowed: bool,
    for_head: bool,
) -> Result<Vec<Declarator>, ParseError> {
    let mut decls = Vec::new();
    loop {
        let name = expect_ident(stream)?;
        let init = if stream.eat(&Token::Eq) {
            Some(parse_assign(stream, in_allowed)?)
        } else {
            if kind == DeclKind::Const && !for_head {
                return Err(ParseError::invalid_syntax(
                    format!("const declaration of `{}` requires an initializer", name.name),
                    name.span,
                ));
            }
            None
        };
        decls.push(Declarator { name, init });
        if !stream.eat(&Token::Comma) {
            break;
        }
    }
    Ok(decls)
}

fn parse_return(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Return)?;

    let value = if stream.at_end() || stream.check(&Token::Semi) || stream.check(&Token::RBrace) {
        None
    } else {
        Some(parse_expr(stream)?)
    };
    consume_semi(stream)?;

    Ok(Stmt::new(StmtKind::Return(value), stream.span_from(start)))
}

fn parse_if(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::If)?;
    stream.expect(Token::LParen)?;
    let test = parse_expr(stream)?;
    stream.expect(Token::RParen)?;
    let consequent = Box::new(parse_stmt(stream)?);
    let alternate = if stream.eat(&Token::Else) {
        Some(Box::new(parse_stmt(stream)?))
    } else {
        None
    };

    Ok(Stmt::new(
        StmtKind::If {
            test,
            consequent,
            alternate,
        },
        stream.span_from(start),
    ))
}

fn parse_while(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::While)?;
    stream.expect(Token::LParen)?;
    let test = parse_expr(stream)?;
    stream.expect(Token::RParen)?;
    let body = Box::new(parse_stmt(stream)?);

    Ok(Stmt::new(
        StmtKind::While { test, body },
        stream.span_from(start),
    ))
}

fn parse_do_while(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Do)?;
    let body = Box::new(parse_stmt(stream)?);
    stream.expect(Token::While)?;
    stream.expect(Token::LParen)?;
    let test = parse_expr(stream)?;
    stream.expect(Token::RParen)?;
    consume_semi(stream)?;

    Ok(Stmt::new(
        StmtKind::DoWhile { body, test },
        stream.span_from(start),
    ))
}

/// Parse either `for` form. The heads are disambiguated by parsing the
/// first clause with `in` disabled, then checking what follows.
fn parse_for(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::For)?;
    stream.expect(Token::LParen)?;

    // Declaration-form head
    if matches!(
        stream.peek(),
        Some(Token::Var) | Some(Token::Let) | Some(Token::Const)
    ) {
        let kind = parse_decl_kind(stream)?;
        let decls = parse_decl_list(stream, kind, false, true)?;

        if stream.eat(&Token::In) {
            if decls.len() != 1 || decls[0].init.is_some() {
                return Err(ParseError::invalid_syntax(
                    "for-in declaration must bind exactly one name without an initializer",
                    stream.current_span(),
                ));
            }
            let target = Expr::ident(decls[0].name.name.clone(), decls[0].name.span);
            return parse_for_in_tail(stream, start, Some(kind), target);
        }

        stream.expect(Token::Semi)?;
        return parse_classic_for_tail(stream, start, Some(ForInit::VarDecl { kind, decls }));
    }

    // Empty head
    if stream.eat(&Token::Semi) {
        return parse_classic_for_tail(stream, start, None);
    }

    // Expression head
    let head = parse_expr_no_in(stream)?;
    if stream.eat(&Token::In) {
        if !matches!(head.kind, ExprKind::Ident(_) | ExprKind::Member { .. }) {
            return Err(ParseError::invalid_syntax(
                "invalid for-in target",
                head.span,
            ));
        }
        return parse_for_in_tail(stream, start, None, head);
    }

    stream.expect(Token::Semi)?;
    parse_classic_for_tail(stream, start, Some(ForInit::Expr(head)))
}

fn parse_classic_for_tail(
    stream: &mut TokenStream,
    start: usize,
    init: Option<ForInit>,
) -> Result<Stmt, ParseError> {
    let test = if stream.check(&Token::Semi) {
        None
    } else {
        Some(parse_expr(stream)?)
    };
    stream.expect(Token::Semi)?;

    let update = if stream.check(&Token::RParen) {
        None
    } else {
        Some(parse_expr(stream)?)
    };
    stream.expect(Token::RParen)?;

    let body = Box::new(parse_stmt(stream)?);
    Ok(Stmt::new(
        StmtKind::For {
            init,
            test,
            update,
            body,
        },
        stream.span_from(start),
    ))
}

fn parse_for_in_tail(
    stream: &mut TokenStream,
    start: usize,
    decl: Option<DeclKind>,
    target: Expr,
) -> Result<Stmt, ParseError> {
    let object = parse_expr(stream)?;
    stream.expect(Token::RParen)?;
    let body = Box::new(parse_stmt(stream)?);

    Ok(Stmt::new(
        StmtKind::ForIn {
            decl,
            target: Box::new(target),
            object,
            body,
        },
        stream.span_from(start),
    ))
}

fn parse_break_continue(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let start = stream.current_pos();
    let is_break = matches!(stream.advance(), Some(Token::Break));

    let label = if matches!(stream.peek(), Some(Token::Ident(_))) {
        Some(expect_ident(stream)?)
    } else {
        None
    };
    consume_semi(stream)?;

    let kind = if is_break {
        StmtKind::Break(label)
    } else {
        StmtKind::Continue(label)
    };
    Ok(Stmt::new(kind, stream.span_from(start)))
}

fn parse_labeled(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let start = stream.current_pos();
    let label = expect_ident(stream)?;
    stream.expect(Token::Colon)?;
    let body = Box::new(parse_stmt(stream)?);

    Ok(Stmt::new(
        StmtKind::Labeled { label, body },
        stream.span_from(start),
    ))
}

fn parse_switch(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Switch)?;
    stream.expect(Token::LParen)?;
    let discriminant = parse_expr(stream)?;
    stream.expect(Token::RParen)?;
    stream.expect(Token::LBrace)?;

    let mut cases = Vec::new();
    let mut seen_default = false;
    while !stream.check(&Token::RBrace) {
        let case_start = stream.current_pos();
        let test = match stream.peek() {
            Some(Token::Case) => {
                stream.advance();
                let test = parse_expr(stream)?;
                Some(test)
            }
            Some(Token::Default) => {
                if seen_default {
                    return Err(ParseError::invalid_syntax(
                        "switch may have only one `default` arm",
                        stream.current_span(),
                    ));
                }
                seen_default = true;
                stream.advance();
                None
            }
            other => {
                return Err(ParseError::unexpected_token(
                    other,
                    "in switch body (expected `case` or `default`)",
                    stream.current_span(),
                ));
            }
        };
        stream.expect(Token::Colon)?;

        let mut body = Vec::new();
        while !matches!(
            stream.peek(),
            Some(Token::Case) | Some(Token::Default) | Some(Token::RBrace) | None
        ) {
            body.push(parse_stmt(stream)?);
        }

        cases.push(SwitchCase {
            test,
            body,
            span: stream.span_from(case_start),
        });
    }
    stream.expect(Token::RBrace)?;

    Ok(Stmt::new(
        StmtKind::Switch {
            discriminant,
            cases,
        },
        stream.span_from(start),
    ))
}

fn parse_throw(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Throw)?;
    let value = parse_expr(stream)?;
    consume_semi(stream)?;

    Ok(Stmt::new(StmtKind::Throw(value), stream.span_from(start)))
}

fn parse_try(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Try)?;
    let block = parse_braced_stmts(stream)?;

    let handler = if stream.eat(&Token::Catch) {
        let clause_start = stream.current_pos();
        stream.expect(Token::LParen)?;
        let param = expect_ident(stream)?;
        stream.expect(Token::RParen)?;
        let body = parse_braced_stmts(stream)?;
        Some(CatchClause {
            param,
            body,
            span: stream.span_from(clause_start),
        })
    } else {
        None
    };

    let finalizer = if stream.eat(&Token::Finally) {
        Some(parse_braced_stmts(stream)?)
    } else {
        None
    };

    if handler.is_none() && finalizer.is_none() {
        return Err(ParseError::invalid_syntax(
            "try statement requires `catch` or `finally`",
            stream.span_from(start),
        ));
    }

    Ok(Stmt::new(
        StmtKind::Try {
            block,
            handler,
            finalizer,
        },
        stream.span_from(start),
    ))
}

fn parse_with(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::With)?;
    stream.expect(Token::LParen)?;
    let object = parse_expr(stream)?;
    stream.expect(Token::RParen)?;
    let body = Box::new(parse_stmt(stream)?);

    Ok(Stmt::new(
        StmtKind::With { object, body },
        stream.span_from(start),
    ))
}

fn parse_expr_stmt(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let start = stream.current_pos();
    let expr = parse_expr(stream)?;
    consume_semi(stream)?;
    Ok(Stmt::expr(expr, stream.span_from(start)))
}

/// Expect an identifier token (reserved words not accepted).
fn expect_ident(stream: &mut TokenStream) -> Result<Ident, ParseError> {
    let span = stream.current_span();
    match stream.peek().cloned() {
        Some(Token::Ident(name)) => {
            stream.advance();
            Ok(Ident {
                name: name.to_string(),
                span,
            })
        }
        other => Err(ParseError::unexpected_token(
            other.as_ref(),
            "(expected identifier)",
            span,
        )),
    }
}

/// Consume a statement terminator.
///
/// A `;` is consumed; end of input or a closing `}` also terminate a
/// statement (the only automatic-semicolon forms the subset accepts).
fn consume_semi(stream: &mut TokenStream) -> Result<(), ParseError> {
    if stream.eat(&Token::Semi) || stream.at_end() || stream.check(&Token::RBrace) {
        return Ok(());
    }
    Err(ParseError::expected_token(
        &Token::Semi,
        stream.peek(),
        stream.current_span(),
    ))
}
