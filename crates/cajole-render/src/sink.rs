//! Token sinks: the two whitespace policies.

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    /// Shortest valid text; separators only where tokenization requires
    #[default]
    Minimal,
    /// Indented, human-readable text
    Pretty,
}

/// Receives the printer's token stream and decides what whitespace
/// survives. `token` carries real syntax; everything else is cosmetic
/// and may be dropped.
pub trait TokenSink {
    /// Emit one token.
    fn token(&mut self, text: &str);
    /// Cosmetic space between tokens.
    fn space(&mut self);
    /// Cosmetic line break.
    fn newline(&mut self);
    /// Increase indentation for following lines.
    fn indent(&mut self);
    /// Decrease indentation for following lines.
    fn dedent(&mut self);
}

/// Minimal sink: drops all cosmetic whitespace, inserting a single
/// space only where adjacent tokens would otherwise merge into one.
#[derive(Debug, Default)]
pub struct MinimalSink {
    out: String,
}

impl MinimalSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

/// True for characters that can continue an identifier or number
/// token; two of these across a token boundary need a separator.
fn is_token_glue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// True when placing `next` directly after `prev` would re-tokenize:
/// identifier-like runs, `+ +` / `- -` (would form `++`/`--`), and
/// `/ /` (would open a comment).
fn needs_separator(prev: char, next: char) -> bool {
    (is_token_glue(prev) && is_token_glue(next))
        || (prev == '+' && next == '+')
        || (prev == '-' && next == '-')
        || (prev == '/' && next == '/')
}

impl TokenSink for MinimalSink {
    fn token(&mut self, text: &str) {
        assert!(!text.is_empty(), "BUG: renderer emitted an empty token");
        if let (Some(prev), Some(next)) = (self.out.chars().last(), text.chars().next()) {
            if needs_separator(prev, next) {
                self.out.push(' ');
            }
        }
        self.out.push_str(text);
    }

    fn space(&mut self) {}
    fn newline(&mut self) {}
    fn indent(&mut self) {}
    fn dedent(&mut self) {}
}

/// Pretty sink: two-space indentation, honors every cosmetic hint.
#[derive(Debug, Default)]
pub struct PrettySink {
    out: String,
    depth: usize,
    at_line_start: bool,
}

impl PrettySink {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            depth: 0,
            at_line_start: true,
        }
    }

    pub fn into_string(self) -> String {
        // A statement-final newline would otherwise trail the output
        let mut out = self.out;
        while out.ends_with('\n') {
            out.pop();
        }
        out
    }
}

impl TokenSink for PrettySink {
    fn token(&mut self, text: &str) {
        assert!(!text.is_empty(), "BUG: renderer emitted an empty token");
        if self.at_line_start {
            for _ in 0..self.depth {
                self.out.push_str("  ");
            }
            self.at_line_start = false;
        }
        self.out.push_str(text);
    }

    fn space(&mut self) {
        if !self.at_line_start {
            self.out.push(' ');
        }
    }

    fn newline(&mut self) {
        if !self.at_line_start {
            self.out.push('\n');
            self.at_line_start = true;
        }
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        assert!(self.depth > 0, "BUG: renderer dedent below zero");
        self.depth -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_inserts_separator_between_words() {
        let mut sink = MinimalSink::new();
        sink.token("return");
        sink.token("x");
        assert_eq!(sink.into_string(), "return x");
    }

    #[test]
    fn test_minimal_drops_cosmetic_whitespace() {
        let mut sink = MinimalSink::new();
        sink.token("a");
        sink.space();
        sink.token("+");
        sink.newline();
        sink.token("b");
        assert_eq!(sink.into_string(), "a+b");
    }

    #[test]
    fn test_minimal_separates_plus_plus() {
        let mut sink = MinimalSink::new();
        sink.token("a");
        sink.token("++");
        sink.token("+");
        sink.token("b");
        assert_eq!(sink.into_string(), "a++ +b");
    }

    #[test]
    fn test_pretty_indents() {
        let mut sink = PrettySink::new();
        sink.token("{");
        sink.newline();
        sink.indent();
        sink.token("x");
        sink.token(";");
        sink.newline();
        sink.dedent();
        sink.token("}");
        assert_eq!(sink.into_string(), "{\n  x;\n}");
    }

    #[test]
    fn test_pretty_trims_trailing_newline() {
        let mut sink = PrettySink::new();
        sink.token("x");
        sink.token(";");
        sink.newline();
        assert_eq!(sink.into_string(), "x;");
    }
}
