//! Token stream wrapper for the hand-written parser.

use cajole_ast::foundation::Span;
use cajole_lexer::Token;
use std::ops::Range;

/// Token stream with lookahead and position tracking.
///
/// Provides methods for consuming tokens, lookahead, and span tracking
/// for the hand-written recursive descent parser.
///
/// Each token is paired with its byte span from the source, enabling
/// accurate error message locations.
pub struct TokenStream<'src> {
    tokens: &'src [(Token, Range<usize>)],
    pos: usize,
    file_id: u16,
}

impl<'src> TokenStream<'src> {
    /// Create a new token stream from tokens with their byte spans.
    pub fn new(tokens: &'src [(Token, Range<usize>)], file_id: u16) -> Self {
        Self {
            tokens,
            pos: 0,
            file_id,
        }
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(tok, _)| tok)
    }

    /// Peek at the nth token ahead without consuming.
    pub fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|(tok, _)| tok)
    }

    /// Advance to the next token and return the current one.
    pub fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos).map(|(tok, _)| tok);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if the current token matches the expected token.
    ///
    /// Compares by discriminant, so data-carrying variants match on
    /// kind regardless of payload.
    pub fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Consume the current token if it matches, returning whether it did.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect a specific token and advance if it matches.
    ///
    /// Returns an error if the token doesn't match.
    pub fn expect(&mut self, expected: Token) -> Result<Span, super::ParseError> {
        if self.check(&expected) {
            let start = self.pos;
            self.advance();
            Ok(self.span_from(start))
        } else {
            Err(super::ParseError::expected_token(
                &expected,
                self.peek(),
                self.current_span(),
            ))
        }
    }

    /// Check if we've reached the end of the token stream.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Get the current position in the token stream.
    pub fn current_pos(&self) -> usize {
        self.pos
    }

    /// Create a span from a starting position to the current position.
    ///
    /// Uses actual byte offsets from the source for accurate error
    /// locations.
    ///
    /// # Panics
    ///
    /// Panics if `start` position is out of bounds for the token stream.
    pub fn span_from(&self, start: usize) -> Span {
        assert!(
            start < self.tokens.len(),
            "span_from: start position {} out of bounds (stream length: {})",
            start,
            self.tokens.len()
        );

        let start_byte = self
            .tokens
            .get(start)
            .map(|(_, span)| span.start)
            .expect("BUG: start position validated but token not found");

        let end_byte = if self.pos > 0 && self.pos <= self.tokens.len() {
            // Use the end of the previous token (last consumed token)
            self.tokens
                .get(self.pos - 1)
                .map(|(_, span)| span.end)
                .expect("BUG: pos-1 in valid range but token not found")
        } else {
            // At start, use start position
            start_byte
        };

        Span::new(self.file_id, start_byte as u32, end_byte as u32, 0)
    }

    /// Get a span for the current token.
    ///
    /// At EOF the span collapses to the end of the last token, so
    /// "unexpected end of input" still points somewhere useful. An
    /// empty token stream yields a zero span (an empty program).
    pub fn current_span(&self) -> Span {
        if let Some((_, span)) = self.tokens.get(self.pos) {
            Span::new(self.file_id, span.start as u32, span.end as u32, 0)
        } else if let Some((_, span)) = self.tokens.last() {
            Span::new(self.file_id, span.end as u32, span.end as u32, 0)
        } else {
            Span::zero(self.file_id)
        }
    }

    /// Synchronize to the next statement boundary for error recovery.
    ///
    /// Skips past the current statement: consumes up to and including
    /// the next `;`, or stops before a token that can begin a new
    /// statement or close a block.
    pub fn synchronize(&mut self) {
        while !self.at_end() {
            match self.peek() {
                Some(Token::Semi) => {
                    self.advance();
                    break;
                }
                Some(Token::RBrace)
                | Some(Token::Var)
                | Some(Token::Let)
                | Some(Token::Const)
                | Some(Token::Function)
                | Some(Token::If)
                | Some(Token::While)
                | Some(Token::Do)
                | Some(Token::For)
                | Some(Token::Return)
                | Some(Token::Switch)
                | Some(Token::Throw)
                | Some(Token::Try)
                | Some(Token::With)
                | Some(Token::Debugger) => break,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Get the file_id for this token stream.
    pub fn file_id(&self) -> u16 {
        self.file_id
    }
}
