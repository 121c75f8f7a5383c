//! Line-oriented transpiler for the arrow-function dialect.
//!
//! The dialect is indentation-based:
//!
//! ```text
//! square = (x) -> x * x
//!
//! cube = (x) ->
//!   y = square(x)
//!   y * x
//! ```
//!
//! becomes
//!
//! ```text
//! var square = function (x) { return x * x; };
//! var cube = function (x) { var y = square(x); return y * x; };
//! ```
//!
//! The first assignment to a name declares it; an indented body gets an
//! implicit `return` of its final expression; the word operators
//! (`is`, `isnt`, `and`, `or`, `not`, boolean aliases) and `@` map onto
//! their script equivalents, never inside string literals.

use crate::env::{BaseEnvironment, TranspileScope};
use crate::{DialectError, DialectTranspiler};

/// The shipped dialect transpiler.
///
/// Stateless: all per-request state lives in a
/// [`TranspileScope`](crate::env::TranspileScope) created inside
/// `transpile`, so one instance serves concurrent requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrowDialect;

impl ArrowDialect {
    /// Create a transpiler.
    pub fn new() -> Self {
        Self
    }
}

/// One non-blank source line.
struct Line {
    indent: usize,
    text: String,
    number: u32,
}

impl DialectTranspiler for ArrowDialect {
    fn transpile(&self, source: &str) -> Result<String, DialectError> {
        let base = BaseEnvironment::shared();
        let mut scope = TranspileScope::new(base);

        let lines = logical_lines(source)?;
        let mut pos = 0;
        let stmts = transpile_block(&lines, &mut pos, 0, &mut scope)?;
        if pos < lines.len() {
            return Err(DialectError::new(
                "unexpected indentation",
                lines[pos].number,
            ));
        }

        tracing::debug!(lines = lines.len(), "transpiled dialect source");
        Ok(stmts.join("\n"))
    }
}

/// Split the source into indented logical lines, stripping comments
/// and blanks.
fn logical_lines(source: &str) -> Result<Vec<Line>, DialectError> {
    let mut lines = Vec::new();
    for (idx, raw) in source.lines().enumerate() {
        let number = (idx + 1) as u32;

        let mut indent = 0;
        for c in raw.chars() {
            match c {
                ' ' => indent += 1,
                '\t' => {
                    return Err(DialectError::new(
                        "tabs are not allowed in indentation",
                        number,
                    ));
                }
                _ => break,
            }
        }

        let text = strip_comment(&raw[indent..]).trim_end().to_string();
        if text.is_empty() {
            continue;
        }

        lines.push(Line {
            indent,
            text,
            number,
        });
    }
    Ok(lines)
}

/// Remove a `#` comment, respecting string literals.
fn strip_comment(text: &str) -> &str {
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        match in_string {
            Some(quote) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == quote {
                    in_string = None;
                }
            }
            None => match c {
                '"' | '\'' => in_string = Some(c),
                '#' => return &text[..i],
                _ => {}
            },
        }
    }
    text
}

/// Transpile consecutive lines at exactly `indent`.
fn transpile_block(
    lines: &[Line],
    pos: &mut usize,
    indent: usize,
    scope: &mut TranspileScope<'_>,
) -> Result<Vec<String>, DialectError> {
    let mut stmts = Vec::new();
    while *pos < lines.len() {
        let line = &lines[*pos];
        if line.indent < indent {
            break;
        }
        if line.indent > indent {
            return Err(DialectError::new("unexpected indentation", line.number));
        }
        *pos += 1;
        stmts.push(transpile_line(lines, pos, line, scope)?);
    }
    Ok(stmts)
}

/// Transpile one statement line (plus any indented arrow body it owns).
fn transpile_line(
    lines: &[Line],
    pos: &mut usize,
    line: &Line,
    scope: &mut TranspileScope<'_>,
) -> Result<String, DialectError> {
    if let Some((name, rhs)) = split_assignment(&line.text) {
        if scope.base().is_reserved(name) {
            return Err(DialectError::new(
                format!("`{}` cannot be assigned", name),
                line.number,
            ));
        }
        let value = transpile_rhs(lines, pos, line, rhs.trim(), scope)?;
        return Ok(if scope.declare(name) {
            format!("var {} = {};", name, value)
        } else {
            format!("{} = {};", name, value)
        });
    }

    let expr = translate_expr(&line.text, scope.base(), line.number)?;
    Ok(format!("{};", expr))
}

/// Transpile an assignment's right-hand side: arrow function or plain
/// expression.
fn transpile_rhs(
    lines: &[Line],
    pos: &mut usize,
    line: &Line,
    rhs: &str,
    scope: &mut TranspileScope<'_>,
) -> Result<String, DialectError> {
    let Some((params_src, body_src)) = parse_arrow_header(rhs) else {
        return translate_expr(rhs, scope.base(), line.number);
    };

    let params = parse_params(params_src, scope.base(), line.number)?;

    let body = if body_src.trim().is_empty() {
        let mut body = indented_body(lines, pos, line.indent, scope)?;
        implicit_return(&mut body);
        body
    } else {
        let expr = translate_expr(body_src.trim(), scope.base(), line.number)?;
        vec![format!("return {};", expr)]
    };

    Ok(if body.is_empty() {
        format!("function ({}) {{}}", params.join(", "))
    } else {
        format!("function ({}) {{ {} }}", params.join(", "), body.join(" "))
    })
}

/// Consume the indented block following an arrow header, if any.
fn indented_body(
    lines: &[Line],
    pos: &mut usize,
    parent_indent: usize,
    scope: &mut TranspileScope<'_>,
) -> Result<Vec<String>, DialectError> {
    if *pos >= lines.len() || lines[*pos].indent <= parent_indent {
        return Ok(Vec::new());
    }
    let block_indent = lines[*pos].indent;
    transpile_block(lines, pos, block_indent, scope)
}

/// Make a body's final expression its return value.
fn implicit_return(body: &mut [String]) {
    if let Some(last) = body.last_mut() {
        if !last.starts_with("var ") && !last.starts_with("return") {
            *last = format!("return {}", last);
        }
    }
}

/// Split `name = rhs` at the first top-level plain `=`.
///
/// Returns None when the line is not a simple-identifier assignment
/// (compound operators, comparisons, and member targets all fall
/// through to expression translation).
fn split_assignment(text: &str) -> Option<(&str, &str)> {
    let chars: Vec<char> = text.chars().collect();
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    let mut depth = 0i32;

    let mut byte = 0;
    for (i, &c) in chars.iter().enumerate() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            byte += c.len_utf8();
            continue;
        }
        match c {
            '"' | '\'' => in_string = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            '=' if depth == 0 => {
                let prev = if i > 0 { chars[i - 1] } else { ' ' };
                let next = chars.get(i + 1).copied().unwrap_or(' ');
                if next != '=' && !"=!<>+-*/%&|^".contains(prev) {
                    let left = text[..byte].trim();
                    if is_ident(left) {
                        return Some((left, &text[byte + 1..]));
                    }
                    return None;
                }
            }
            _ => {}
        }
        byte += c.len_utf8();
    }
    None
}

/// Parse an arrow header: `-> body` or `(params) -> body`.
fn parse_arrow_header(rhs: &str) -> Option<(&str, &str)> {
    let t = rhs.trim_start();
    if let Some(rest) = t.strip_prefix("->") {
        return Some(("", rest));
    }
    if !t.starts_with('(') {
        return None;
    }

    let mut depth = 0i32;
    for (i, c) in t.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let inner = &t[1..i];
                    let after = t[i + 1..].trim_start();
                    return after.strip_prefix("->").map(|rest| (inner, rest));
                }
            }
            _ => {}
        }
    }
    None
}

/// Validate and split an arrow parameter list.
fn parse_params(
    src: &str,
    base: &BaseEnvironment,
    line: u32,
) -> Result<Vec<String>, DialectError> {
    let src = src.trim();
    if src.is_empty() {
        return Ok(Vec::new());
    }
    let mut params = Vec::new();
    for param in src.split(',') {
        let param = param.trim();
        if !is_ident(param) || base.is_reserved(param) {
            return Err(DialectError::new(
                format!("malformed parameter list: `{}`", param),
                line,
            ));
        }
        params.push(param.to_string());
    }
    Ok(params)
}

/// True for a simple identifier.
fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Translate one dialect expression to script text: word substitutions
/// from the base environment, `@` to `this.`, strings untouched,
/// bracket balance checked.
fn translate_expr(
    text: &str,
    base: &BaseEnvironment,
    line: u32,
) -> Result<String, DialectError> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut depth = 0i32;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '"' || c == '\'' {
            out.push(c);
            i += 1;
            let mut closed = false;
            while i < chars.len() {
                let s = chars[i];
                out.push(s);
                i += 1;
                if s == '\\' {
                    if i < chars.len() {
                        out.push(chars[i]);
                        i += 1;
                    }
                } else if s == c {
                    closed = true;
                    break;
                }
            }
            if !closed {
                return Err(DialectError::new("unterminated string literal", line));
            }
            continue;
        }

        if c == '-' && chars.get(i + 1) == Some(&'>') {
            return Err(DialectError::new("unexpected `->` in expression", line));
        }

        if c == '@' {
            out.push_str("this.");
            i += 1;
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < chars.len()
                && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '$')
            {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            match base.substitute(&word) {
                Some(replacement) => out.push_str(replacement),
                None => out.push_str(&word),
            }
            continue;
        }

        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(DialectError::new("unbalanced brackets", line));
                }
            }
            _ => {}
        }
        out.push(c);
        i += 1;
    }

    if depth != 0 {
        return Err(DialectError::new("unbalanced brackets", line));
    }
    Ok(out)
}
