// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Lexical analysis for the script subset accepted by the confinement
//! pipeline.
//!
//! Tokenization uses logos. Lexing is per-request and stateless: one
//! source string in, one token stream out.
//!
//! # Design
//!
//! - `Token` — all token types (keywords, operators, literals, identifiers)
//! - Comments are stripped during lexing (not tokens)
//! - Token strings defined once in `TOKEN_STRINGS` table (single source of truth for Display)
//! - Regex literals and template strings are outside the subset; their
//!   introducer characters lex as operators and are rejected by the parser
//!
//! # Examples
//!
//! ```
//! # use cajole_lexer::Token;
//! # use logos::Logos;
//! let source = "var x = 1 + 2;";
//! let tokens: Vec<Result<Token, ()>> = Token::lexer(source).collect();
//! assert_eq!(tokens.len(), 7);
//! ```

use logos::Logos;
use std::rc::Rc;

/// Script token.
///
/// Token strings for keywords, operators, and delimiters are defined
/// once in the `TOKEN_STRINGS` table and indexed by discriminant for
/// Display.
///
/// # Layout
///
/// Uses `#[repr(u16)]` to guarantee discriminant values are stable and
/// can be safely used to index into `TOKEN_STRINGS`. Data-carrying
/// variants must stay at the end of the enum so every simple variant's
/// discriminant is a valid table index.
#[derive(Logos, Debug, Clone, PartialEq)]
#[repr(u16)]
#[logos(skip r"[ \t\r\n]+")] // Skip whitespace
#[logos(skip r"//[^\n]*")] // Skip line comments
#[logos(skip r"/\*([^*]|\*[^/])*\*/")] // Skip block comments
pub enum Token {
    // === Keywords ===
    /// Keyword `var`
    #[token("var")]
    Var,
    /// Keyword `let`
    #[token("let")]
    Let,
    /// Keyword `const`
    #[token("const")]
    Const,
    /// Keyword `function`
    #[token("function")]
    Function,
    /// Keyword `return`
    #[token("return")]
    Return,
    /// Keyword `if`
    #[token("if")]
    If,
    /// Keyword `else`
    #[token("else")]
    Else,
    /// Keyword `while`
    #[token("while")]
    While,
    /// Keyword `do`
    #[token("do")]
    Do,
    /// Keyword `for`
    #[token("for")]
    For,
    /// Keyword `in`
    #[token("in")]
    In,
    /// Keyword `break`
    #[token("break")]
    Break,
    /// Keyword `continue`
    #[token("continue")]
    Continue,
    /// Keyword `new`
    #[token("new")]
    New,
    /// Keyword `delete`
    #[token("delete")]
    Delete,
    /// Keyword `typeof`
    #[token("typeof")]
    Typeof,
    /// Keyword `instanceof`
    #[token("instanceof")]
    Instanceof,
    /// Keyword `void`
    #[token("void")]
    Void,
    /// Keyword `this`
    #[token("this")]
    This,
    /// Keyword `null`
    #[token("null")]
    Null,
    /// Keyword `true`
    #[token("true")]
    True,
    /// Keyword `false`
    #[token("false")]
    False,
    /// Keyword `throw`
    #[token("throw")]
    Throw,
    /// Keyword `try`
    #[token("try")]
    Try,
    /// Keyword `catch`
    #[token("catch")]
    Catch,
    /// Keyword `finally`
    #[token("finally")]
    Finally,
    /// Keyword `switch`
    #[token("switch")]
    Switch,
    /// Keyword `case`
    #[token("case")]
    Case,
    /// Keyword `default`
    #[token("default")]
    Default,
    /// Keyword `with` — lexed so the rewriter can reject it with position
    #[token("with")]
    With,
    /// Keyword `debugger`
    #[token("debugger")]
    Debugger,

    // === Punctuation ===
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `;`
    #[token(";")]
    Semi,
    /// `,`
    #[token(",")]
    Comma,
    /// `.`
    #[token(".")]
    Dot,
    /// `:`
    #[token(":")]
    Colon,
    /// `?`
    #[token("?")]
    Question,

    // === Assignment ===
    /// `=`
    #[token("=")]
    Eq,
    /// `+=`
    #[token("+=")]
    PlusEq,
    /// `-=`
    #[token("-=")]
    MinusEq,
    /// `*=`
    #[token("*=")]
    StarEq,
    /// `/=`
    #[token("/=")]
    SlashEq,
    /// `%=`
    #[token("%=")]
    PercentEq,

    // === Comparison ===
    /// `===`
    #[token("===")]
    EqEqEq,
    /// `!==`
    #[token("!==")]
    BangEqEq,
    /// `==`
    #[token("==")]
    EqEq,
    /// `!=`
    #[token("!=")]
    BangEq,
    /// `<=`
    #[token("<=")]
    LtEq,
    /// `>=`
    #[token(">=")]
    GtEq,
    /// `<`
    #[token("<")]
    Lt,
    /// `>`
    #[token(">")]
    Gt,

    // === Logical ===
    /// `&&`
    #[token("&&")]
    AndAnd,
    /// `||`
    #[token("||")]
    OrOr,
    /// `!`
    #[token("!")]
    Bang,
    /// `~`
    #[token("~")]
    Tilde,

    // === Shifts ===
    /// `<<`
    #[token("<<")]
    Shl,
    /// `>>>`
    #[token(">>>")]
    UShr,
    /// `>>`
    #[token(">>")]
    Shr,

    // === Bitwise ===
    /// `&`
    #[token("&")]
    Amp,
    /// `|`
    #[token("|")]
    Pipe,
    /// `^`
    #[token("^")]
    Caret,

    // === Arithmetic ===
    /// `++`
    #[token("++")]
    PlusPlus,
    /// `--`
    #[token("--")]
    MinusMinus,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `%`
    #[token("%")]
    Percent,

    // === Literals and identifiers (data variants stay last) ===
    /// Numeric literal: decimal, fractional, exponent, or hex forms.
    ///
    /// Hex parse failures cannot occur for the regex below (64-bit
    /// overflow aside, which maps to a lex error).
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"0[xX][0-9a-fA-F]+", |lex| {
        u64::from_str_radix(&lex.slice()[2..], 16).ok().map(|n| n as f64)
    })]
    Number(f64),

    /// String literal, single- or double-quoted.
    ///
    /// The stored value is the decoded content; the renderer re-escapes.
    /// Uses `Rc<str>` for cheap cloning through the parser.
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len() - 1]).map(|s| Rc::from(s.as_str()))
    })]
    #[regex(r#"'([^'\\\n]|\\.)*'"#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len() - 1]).map(|s| Rc::from(s.as_str()))
    })]
    Str(Rc<str>),

    /// Identifier (including `$` and `_`, per the script grammar).
    ///
    /// Uses `Rc<str>` for cheap cloning through the parser.
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| Rc::from(lex.slice()))]
    Ident(Rc<str>),
}

/// Decode a string literal's content.
///
/// Unknown single-character escapes decode to the character itself
/// (script semantics: `"\q"` is `"q"`); malformed `\x`/`\u` sequences
/// are lex errors.
fn unescape_string(s: &str) -> Option<String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next()? {
            'n' => result.push('\n'),
            'r' => result.push('\r'),
            't' => result.push('\t'),
            'b' => result.push('\u{0008}'),
            'f' => result.push('\u{000C}'),
            'v' => result.push('\u{000B}'),
            '0' => result.push('\0'),
            'x' => {
                let hi = chars.next()?;
                let lo = chars.next()?;
                let code = u32::from_str_radix(&format!("{}{}", hi, lo), 16).ok()?;
                result.push(char::from_u32(code)?);
            }
            'u' => {
                let digits: String = (0..4).map(|_| chars.next()).collect::<Option<_>>()?;
                let code = u32::from_str_radix(&digits, 16).ok()?;
                result.push(char::from_u32(code)?);
            }
            other => result.push(other),
        }
    }
    Some(result)
}

/// Token string lookup table.
///
/// Maps discriminant indices to their string representation.
/// This is the single source of truth for token display strings,
/// indexed by the enum discriminant order.
///
/// NOTE: The `#[token("...")]` attributes above must match these strings.
/// This duplication is unavoidable due to logos requiring literal strings,
/// but this table at least consolidates Display logic to avoid a large match.
const TOKEN_STRINGS: &[&str] = &[
    "var",
    "let",
    "const",
    "function",
    "return",
    "if",
    "else",
    "while",
    "do",
    "for",
    "in",
    "break",
    "continue",
    "new",
    "delete",
    "typeof",
    "instanceof",
    "void",
    "this",
    "null",
    "true",
    "false",
    "throw",
    "try",
    "catch",
    "finally",
    "switch",
    "case",
    "default",
    "with",
    "debugger", // keywords
    "{",
    "}",
    "(",
    ")",
    "[",
    "]",
    ";",
    ",",
    ".",
    ":",
    "?", // punctuation
    "=",
    "+=",
    "-=",
    "*=",
    "/=",
    "%=", // assignment
    "===",
    "!==",
    "==",
    "!=",
    "<=",
    ">=",
    "<",
    ">", // comparison
    "&&",
    "||",
    "!",
    "~", // logical
    "<<",
    ">>>",
    ">>", // shifts
    "&",
    "|",
    "^", // bitwise
    "++",
    "--",
    "+",
    "-",
    "*",
    "/",
    "%", // arithmetic
];

impl Token {
    /// Get the index into TOKEN_STRINGS for simple tokens.
    ///
    /// # Safety
    ///
    /// Safe due to `#[repr(u16)]` on Token enum ensuring stable discriminants.
    fn token_string_index(&self) -> usize {
        // Safe: Token has #[repr(u16)] so discriminant values are stable
        let discriminant = unsafe { *(self as *const Token as *const u16) };
        discriminant as usize
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Literals with data (not in TOKEN_STRINGS table)
            Token::Number(n) => write!(f, "{}", n),
            Token::Str(s) => write!(f, "\"{}\"", s),
            Token::Ident(id) => write!(f, "{}", id),

            // Simple tokens (keywords, operators, delimiters)
            _ => {
                let idx = self.token_string_index();
                let s = TOKEN_STRINGS
                    .get(idx)
                    .expect("BUG: token discriminant out of bounds for TOKEN_STRINGS");
                write!(f, "{}", s)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test helper: lex source and panic on any error.
    fn lex(source: &str) -> Vec<Token> {
        Token::lexer(source)
            .collect::<Result<Vec<_>, _>>()
            .expect("lexing failed - invalid token encountered")
    }

    /// Test helper: create an identifier token.
    fn ident(s: &str) -> Token {
        Token::Ident(Rc::from(s))
    }

    /// Test helper: create a string literal token.
    fn string(s: &str) -> Token {
        Token::Str(Rc::from(s))
    }

    #[test]
    fn test_keywords() {
        let tokens = lex("var function return with");
        assert_eq!(
            tokens,
            vec![Token::Var, Token::Function, Token::Return, Token::With]
        );
    }

    #[test]
    fn test_identifiers() {
        let tokens = lex("foo _bar $baz x1");
        assert_eq!(
            tokens,
            vec![ident("foo"), ident("_bar"), ident("$baz"), ident("x1")]
        );
    }

    #[test]
    fn test_keyword_prefix_identifiers() {
        // Identifiers that merely start with a keyword must stay whole
        let tokens = lex("variable newish format");
        assert_eq!(
            tokens,
            vec![ident("variable"), ident("newish"), ident("format")]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = lex("0 42 3.5 1e3 2.5e-2 .5 0xff");
        assert_eq!(
            tokens,
            vec![
                Token::Number(0.0),
                Token::Number(42.0),
                Token::Number(3.5),
                Token::Number(1000.0),
                Token::Number(0.025),
                Token::Number(0.5),
                Token::Number(255.0),
            ]
        );
    }

    #[test]
    fn test_strings() {
        let tokens = lex(r#""hello" 'world' "a\nb" "q\"q""#);
        assert_eq!(
            tokens,
            vec![
                string("hello"),
                string("world"),
                string("a\nb"),
                string("q\"q"),
            ]
        );
    }

    #[test]
    fn test_string_unicode_escape() {
        let tokens = lex(r#""A\x42""#);
        assert_eq!(tokens, vec![string("AB")]);
    }

    #[test]
    fn test_unknown_escape_is_identity() {
        let tokens = lex(r#""\q""#);
        assert_eq!(tokens, vec![string("q")]);
    }

    #[test]
    fn test_operators_longest_match() {
        let tokens = lex("=== == = !== != ! >>> >> > ++ + +=");
        assert_eq!(
            tokens,
            vec![
                Token::EqEqEq,
                Token::EqEq,
                Token::Eq,
                Token::BangEqEq,
                Token::BangEq,
                Token::Bang,
                Token::UShr,
                Token::Shr,
                Token::Gt,
                Token::PlusPlus,
                Token::Plus,
                Token::PlusEq,
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        let tokens = lex("a // line comment\n/* block\ncomment */ b");
        assert_eq!(tokens, vec![ident("a"), ident("b")]);
    }

    #[test]
    fn test_expression_statement() {
        let tokens = lex("1+1");
        assert_eq!(
            tokens,
            vec![Token::Number(1.0), Token::Plus, Token::Number(1.0)]
        );
    }

    #[test]
    fn test_member_and_call() {
        let tokens = lex("a.b(c[0])");
        assert_eq!(
            tokens,
            vec![
                ident("a"),
                Token::Dot,
                ident("b"),
                Token::LParen,
                ident("c"),
                Token::LBracket,
                Token::Number(0.0),
                Token::RBracket,
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let results: Vec<_> = Token::lexer("\"abc").collect();
        assert!(results.iter().any(|r| r.is_err()));
    }

    #[test]
    fn test_token_display_matches_source() {
        assert_eq!(Token::Function.to_string(), "function");
        assert_eq!(Token::EqEqEq.to_string(), "===");
        assert_eq!(Token::UShr.to_string(), ">>>");
        assert_eq!(Token::Percent.to_string(), "%");
        assert_eq!(ident("abc").to_string(), "abc");
    }

    /// Verify that TOKEN_STRINGS matches token definitions.
    #[test]
    fn test_token_strings_table_alignment() {
        let samples = [
            (Token::Var, "var"),
            (Token::Debugger, "debugger"),
            (Token::LBrace, "{"),
            (Token::Question, "?"),
            (Token::Eq, "="),
            (Token::PercentEq, "%="),
            (Token::EqEqEq, "==="),
            (Token::Gt, ">"),
            (Token::AndAnd, "&&"),
            (Token::Tilde, "~"),
            (Token::Shl, "<<"),
            (Token::Shr, ">>"),
            (Token::Amp, "&"),
            (Token::Caret, "^"),
            (Token::PlusPlus, "++"),
            (Token::Percent, "%"),
        ];
        for (token, expected) in samples {
            assert_eq!(token.to_string(), expected);
        }
    }
}
