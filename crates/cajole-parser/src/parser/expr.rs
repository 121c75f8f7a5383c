//! Expression parser: Pratt core with the full operator ladder.
//!
//! Binding powers come from the shared precedence ladder in
//! `cajole_ast::ast::expr::precedence`, so the renderer's
//! parenthesization and the parser's grouping cannot drift apart.
//!
//! The `in_allowed` flag threads the one context-sensitivity in the
//! grammar: inside the first clause of a `for` statement the `in`
//! operator must not be consumed (it separates the loop target from the
//! iterated object instead).

use cajole_ast::ast::expr::precedence;
use cajole_ast::ast::{
    AssignOp, BinaryOp, Expr, ExprKind, Ident, LogicalOp, MemberKey, PropKey, Property, UnaryOp,
    UpdateOp,
};
use cajole_lexer::Token;

use super::stmt::parse_function_def;
use super::{token_property_name, ParseError, TokenStream};

/// Binary operator role: plain or short-circuiting.
#[derive(Debug, Clone, Copy)]
enum BinOp {
    Plain(BinaryOp),
    Logical(LogicalOp),
}

/// Get binary operator metadata (precedence and operator enum).
///
/// Returns (precedence, op) where higher precedence = tighter binding.
/// All binary operators in the ladder are left-associative.
fn binary_op_info(token: &Token, in_allowed: bool) -> Option<(u8, BinOp)> {
    let info = match token {
        Token::OrOr => (precedence::LOGICAL_OR, BinOp::Logical(LogicalOp::Or)),
        Token::AndAnd => (precedence::LOGICAL_AND, BinOp::Logical(LogicalOp::And)),
        Token::Pipe => (precedence::BIT_OR, BinOp::Plain(BinaryOp::BitOr)),
        Token::Caret => (precedence::BIT_XOR, BinOp::Plain(BinaryOp::BitXor)),
        Token::Amp => (precedence::BIT_AND, BinOp::Plain(BinaryOp::BitAnd)),
        Token::EqEq => (precedence::EQUALITY, BinOp::Plain(BinaryOp::Eq)),
        Token::BangEq => (precedence::EQUALITY, BinOp::Plain(BinaryOp::NotEq)),
        Token::EqEqEq => (precedence::EQUALITY, BinOp::Plain(BinaryOp::StrictEq)),
        Token::BangEqEq => (precedence::EQUALITY, BinOp::Plain(BinaryOp::StrictNotEq)),
        Token::Lt => (precedence::RELATIONAL, BinOp::Plain(BinaryOp::Lt)),
        Token::LtEq => (precedence::RELATIONAL, BinOp::Plain(BinaryOp::LtEq)),
        Token::Gt => (precedence::RELATIONAL, BinOp::Plain(BinaryOp::Gt)),
        Token::GtEq => (precedence::RELATIONAL, BinOp::Plain(BinaryOp::GtEq)),
        Token::Instanceof => (precedence::RELATIONAL, BinOp::Plain(BinaryOp::Instanceof)),
        Token::In if in_allowed => (precedence::RELATIONAL, BinOp::Plain(BinaryOp::In)),
        Token::Shl => (precedence::SHIFT, BinOp::Plain(BinaryOp::Shl)),
        Token::Shr => (precedence::SHIFT, BinOp::Plain(BinaryOp::Shr)),
        Token::UShr => (precedence::SHIFT, BinOp::Plain(BinaryOp::UShr)),
        Token::Plus => (precedence::ADDITIVE, BinOp::Plain(BinaryOp::Add)),
        Token::Minus => (precedence::ADDITIVE, BinOp::Plain(BinaryOp::Sub)),
        Token::Star => (precedence::MULTIPLICATIVE, BinOp::Plain(BinaryOp::Mul)),
        Token::Slash => (precedence::MULTIPLICATIVE, BinOp::Plain(BinaryOp::Div)),
        Token::Percent => (precedence::MULTIPLICATIVE, BinOp::Plain(BinaryOp::Mod)),
        _ => return None,
    };
    Some(info)
}

/// Map an assignment token to its operator.
fn assign_op_info(token: &Token) -> Option<AssignOp> {
    match token {
        Token::Eq => Some(AssignOp::Assign),
        Token::PlusEq => Some(AssignOp::AddAssign),
        Token::MinusEq => Some(AssignOp::SubAssign),
        Token::StarEq => Some(AssignOp::MulAssign),
        Token::SlashEq => Some(AssignOp::DivAssign),
        Token::PercentEq => Some(AssignOp::ModAssign),
        _ => None,
    }
}

/// True for expressions the grammar accepts on the left of `=` and as
/// `++`/`--` targets.
fn is_assign_target(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::Ident(_) | ExprKind::Member { .. })
}

/// Parse a full expression (comma sequence allowed).
pub(super) fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    parse_sequence(stream, true)
}

/// Parse a full expression with the `in` operator disabled (for-init).
pub(super) fn parse_expr_no_in(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    parse_sequence(stream, false)
}

fn parse_sequence(stream: &mut TokenStream, in_allowed: bool) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let first = parse_assign(stream, in_allowed)?;
    if !stream.check(&Token::Comma) {
        return Ok(first);
    }

    let mut exprs = vec![first];
    while stream.eat(&Token::Comma) {
        exprs.push(parse_assign(stream, in_allowed)?);
    }
    Ok(Expr::new(ExprKind::Sequence(exprs), stream.span_from(start)))
}

/// Parse at assignment level (no comma sequence). This is the entry for
/// argument lists, array elements, and object property values.
pub(super) fn parse_assign(stream: &mut TokenStream, in_allowed: bool) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let left = parse_conditional(stream, in_allowed)?;

    let Some(op) = stream.peek().and_then(assign_op_info) else {
        return Ok(left);
    };

    if !is_assign_target(&left) {
        return Err(ParseError::invalid_syntax(
            "invalid assignment target",
            left.span,
        ));
    }

    stream.advance();
    let value = parse_assign(stream, in_allowed)?; // right-associative
    Ok(Expr::new(
        ExprKind::Assign {
            op,
            target: Box::new(left),
            value: Box::new(value),
        },
        stream.span_from(start),
    ))
}

fn parse_conditional(stream: &mut TokenStream, in_allowed: bool) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let test = parse_binary(stream, 0, in_allowed)?;

    if !stream.eat(&Token::Question) {
        return Ok(test);
    }

    // `in` is unrestricted between `?` and `:`
    let consequent = parse_assign(stream, true)?;
    stream.expect(Token::Colon)?;
    let alternate = parse_assign(stream, in_allowed)?;

    Ok(Expr::new(
        ExprKind::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        },
        stream.span_from(start),
    ))
}

/// Pratt parser - handles binary operators with precedence climbing.
fn parse_binary(
    stream: &mut TokenStream,
    min_prec: u8,
    in_allowed: bool,
) -> Result<Expr, ParseError> {
    let mut left = parse_unary(stream)?;

    while let Some(token) = stream.peek() {
        let Some((prec, op)) = binary_op_info(token, in_allowed) else {
            break;
        };
        if prec < min_prec {
            break;
        }

        stream.advance();
        let right = parse_binary(stream, prec + 1, in_allowed)?;
        let span = left.span.merge(&right.span);

        left = match op {
            BinOp::Plain(op) => Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            ),
            BinOp::Logical(op) => Expr::new(
                ExprKind::Logical {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            ),
        };
    }

    Ok(left)
}

/// Parse prefix operators.
fn parse_unary(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let op = match stream.peek() {
        Some(Token::Bang) => Some(UnaryOp::Not),
        Some(Token::Tilde) => Some(UnaryOp::BitNot),
        Some(Token::Plus) => Some(UnaryOp::Pos),
        Some(Token::Minus) => Some(UnaryOp::Neg),
        Some(Token::Typeof) => Some(UnaryOp::Typeof),
        Some(Token::Void) => Some(UnaryOp::Void),
        Some(Token::Delete) => Some(UnaryOp::Delete),
        _ => None,
    };

    if let Some(op) = op {
        stream.advance();
        let operand = parse_unary(stream)?; // recursive for nested prefix
        return Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            stream.span_from(start),
        ));
    }

    if matches!(stream.peek(), Some(Token::PlusPlus) | Some(Token::MinusMinus)) {
        let op = match stream.advance() {
            Some(Token::PlusPlus) => UpdateOp::Incr,
            _ => UpdateOp::Decr,
        };
        let target = parse_unary(stream)?;
        if !is_assign_target(&target) {
            return Err(ParseError::invalid_syntax(
                format!("invalid `{}` target", op.symbol()),
                target.span,
            ));
        }
        return Ok(Expr::new(
            ExprKind::Update {
                op,
                prefix: true,
                target: Box::new(target),
            },
            stream.span_from(start),
        ));
    }

    parse_postfix(stream)
}

/// Parse postfix `++`/`--` on top of call/member expressions.
fn parse_postfix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let expr = parse_left_hand_side(stream)?;

    if matches!(stream.peek(), Some(Token::PlusPlus) | Some(Token::MinusMinus)) {
        let op = match stream.advance() {
            Some(Token::PlusPlus) => UpdateOp::Incr,
            _ => UpdateOp::Decr,
        };
        if !is_assign_target(&expr) {
            return Err(ParseError::invalid_syntax(
                format!("invalid `{}` target", op.symbol()),
                expr.span,
            ));
        }
        return Ok(Expr::new(
            ExprKind::Update {
                op,
                prefix: false,
                target: Box::new(expr),
            },
            stream.span_from(start),
        ));
    }

    Ok(expr)
}

/// Parse call/member chains: `a.b`, `a[k]`, `f(args)`, `new C(args)`.
fn parse_left_hand_side(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let mut expr = if stream.check(&Token::New) {
        parse_new(stream)?
    } else {
        parse_primary(stream)?
    };

    loop {
        match stream.peek() {
            Some(Token::Dot) => {
                stream.advance();
                let name = parse_property_name(stream)?;
                expr = Expr::new(
                    ExprKind::Member {
                        object: Box::new(expr),
                        key: MemberKey::Static(name),
                    },
                    stream.span_from(start),
                );
            }
            Some(Token::LBracket) => {
                stream.advance();
                let key = parse_expr(stream)?;
                stream.expect(Token::RBracket)?;
                expr = Expr::new(
                    ExprKind::Member {
                        object: Box::new(expr),
                        key: MemberKey::Computed(Box::new(key)),
                    },
                    stream.span_from(start),
                );
            }
            Some(Token::LParen) => {
                let args = parse_args(stream)?;
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    stream.span_from(start),
                );
            }
            _ => break,
        }
    }

    Ok(expr)
}

/// Parse a `new` expression. The callee may only be a member chain
/// (calls bind to the `new` result, not the callee).
fn parse_new(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::New)?;

    let mut callee = if stream.check(&Token::New) {
        parse_new(stream)?
    } else {
        parse_primary(stream)?
    };

    loop {
        match stream.peek() {
            Some(Token::Dot) => {
                stream.advance();
                let name = parse_property_name(stream)?;
                callee = Expr::new(
                    ExprKind::Member {
                        object: Box::new(callee),
                        key: MemberKey::Static(name),
                    },
                    stream.span_from(start),
                );
            }
            Some(Token::LBracket) => {
                stream.advance();
                let key = parse_expr(stream)?;
                stream.expect(Token::RBracket)?;
                callee = Expr::new(
                    ExprKind::Member {
                        object: Box::new(callee),
                        key: MemberKey::Computed(Box::new(key)),
                    },
                    stream.span_from(start),
                );
            }
            _ => break,
        }
    }

    let args = if stream.check(&Token::LParen) {
        parse_args(stream)?
    } else {
        Vec::new()
    };

    Ok(Expr::new(
        ExprKind::New {
            callee: Box::new(callee),
            args,
        },
        stream.span_from(start),
    ))
}

/// Parse a parenthesized argument list.
fn parse_args(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    stream.expect(Token::LParen)?;
    let mut args = Vec::new();

    if !stream.check(&Token::RParen) {
        loop {
            args.push(parse_assign(stream, true)?);
            if !stream.eat(&Token::Comma) {
                break;
            }
        }
    }

    stream.expect(Token::RParen)?;
    Ok(args)
}

/// Parse the name after `.` (any identifier name, including reserved words).
fn parse_property_name(stream: &mut TokenStream) -> Result<Ident, ParseError> {
    let span = stream.current_span();
    let Some(name) = stream.peek().and_then(token_property_name) else {
        return Err(ParseError::unexpected_token(
            stream.peek(),
            "after `.`",
            span,
        ));
    };
    stream.advance();
    Ok(Ident { name, span })
}

/// Parse an atomic expression: literal, identifier, array/object
/// literal, function expression, or parenthesized expression.
fn parse_primary(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let span = stream.current_span();
    let token = stream.peek().cloned();

    match token {
        Some(Token::Ident(name)) => {
            stream.advance();
            Ok(Expr::ident(name.as_ref(), span))
        }
        Some(Token::Number(value)) => {
            stream.advance();
            Ok(Expr::number(value, span))
        }
        Some(Token::Str(value)) => {
            stream.advance();
            Ok(Expr::string(value.as_ref(), span))
        }
        Some(Token::True) => {
            stream.advance();
            Ok(Expr::new(ExprKind::Bool(true), span))
        }
        Some(Token::False) => {
            stream.advance();
            Ok(Expr::new(ExprKind::Bool(false), span))
        }
        Some(Token::Null) => {
            stream.advance();
            Ok(Expr::new(ExprKind::Null, span))
        }
        Some(Token::This) => {
            stream.advance();
            Ok(Expr::new(ExprKind::This, span))
        }
        Some(Token::LParen) => {
            stream.advance();
            let expr = parse_expr(stream)?;
            stream.expect(Token::RParen)?;
            // Grouping is not preserved; the renderer re-derives parens
            // from precedence.
            Ok(expr)
        }
        Some(Token::LBracket) => parse_array_literal(stream),
        Some(Token::LBrace) => parse_object_literal(stream),
        Some(Token::Function) => {
            let start = stream.current_pos();
            let def = parse_function_def(stream)?;
            Ok(Expr::new(ExprKind::Function(def), stream.span_from(start)))
        }
        other => Err(ParseError::unexpected_token(
            other.as_ref(),
            "in expression",
            span,
        )),
    }
}

fn parse_array_literal(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::LBracket)?;

    let mut elements = Vec::new();
    while !stream.check(&Token::RBracket) {
        elements.push(parse_assign(stream, true)?);
        if !stream.eat(&Token::Comma) {
            break;
        }
    }
    stream.expect(Token::RBracket)?;

    Ok(Expr::new(
        ExprKind::Array(elements),
        stream.span_from(start),
    ))
}

fn parse_object_literal(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::LBrace)?;

    let mut properties = Vec::new();
    while !stream.check(&Token::RBrace) {
        let prop_start = stream.current_pos();
        let key_span = stream.current_span();

        let key = match stream.peek().cloned() {
            Some(Token::Str(value)) => {
                stream.advance();
                PropKey::Str(value.to_string())
            }
            Some(Token::Number(value)) => {
                stream.advance();
                PropKey::Number(value)
            }
            Some(ref token) => match token_property_name(token) {
                Some(name) => {
                    stream.advance();
                    PropKey::Ident(Ident {
                        name,
                        span: key_span,
                    })
                }
                None => {
                    return Err(ParseError::unexpected_token(
                        Some(token),
                        "as object literal key",
                        key_span,
                    ));
                }
            },
            None => {
                return Err(ParseError::unexpected_token(
                    None,
                    "as object literal key",
                    key_span,
                ));
            }
        };

        stream.expect(Token::Colon)?;
        let value = parse_assign(stream, true)?;

        properties.push(Property {
            key,
            value,
            span: stream.span_from(prop_start),
        });

        if !stream.eat(&Token::Comma) {
            break;
        }
    }
    stream.expect(Token::RBrace)?;

    Ok(Expr::new(
        ExprKind::Object(properties),
        stream.span_from(start),
    ))
}
