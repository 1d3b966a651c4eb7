//! Tokenizer for the embedded script language
//!
//! Single pass over the input bytes with first-byte dispatch. Every token
//! records where it started so the parser can report lines and decide where
//! a statement may end without a semicolon.

use super::SyntaxError;

/// Position in the program text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    /// Line (1-based)
    pub line: u32,
    /// Column in bytes (1-based)
    pub column: u32,
    /// Byte offset
    pub offset: usize,
}

/// Token payload
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier or keyword
    Ident(String),
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String literal, escapes resolved
    Str(String),
    /// Operator or punctuation
    Punct(&'static str),
    /// End of input
    Eof,
}

/// A token with its start location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Payload
    pub kind: TokenKind,
    /// Where the token starts
    pub location: Location,
}

impl Token {
    /// Whether this is the given punctuation
    #[inline]
    pub fn is_punct(&self, p: &str) -> bool {
        matches!(self.kind, TokenKind::Punct(q) if q == p)
    }

    /// Whether this is the given identifier or keyword
    #[inline]
    pub fn is_ident(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Ident(s) if s == name)
    }

    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Ident(s) => format!("'{}'", s),
            TokenKind::Int(n) => format!("number {}", n),
            TokenKind::Float(n) => format!("number {}", n),
            TokenKind::Str(_) => "string".to_string(),
            TokenKind::Punct(p) => format!("'{}'", p),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

// Longest first so that prefixes never shadow longer operators
const PUNCTUATION: &[&str] = &[
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "+=", "-=", "++", "--", "=", "<", ">", "+",
    "-", "*", "/", "%", "!", "(", ")", "[", "]", "{", "}", ",", ";", ".", ":", "?",
];

/// Streaming tokenizer state
struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn location(&self) -> Location {
        Location {
            line: self.line,
            column: self.column,
            offset: self.pos,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    /// Advance over `n` bytes, keeping line and column current
    fn bump(&mut self, n: usize) {
        for &b in &self.bytes[self.pos..self.pos + n] {
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else if b & 0xC0 != 0x80 {
                // Count chars, not UTF-8 continuation bytes
                self.column += 1;
            }
        }
        self.pos += n;
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.line, message)
    }

    fn skip_trivia(&mut self) -> Result<(), SyntaxError> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(b' ' | b'\t' | b'\r' | b'\n'), _) => self.bump(1),
                (Some(b'/'), Some(b'/')) => {
                    let rest = &self.bytes[self.pos..];
                    let len = memchr::memchr(b'\n', rest).unwrap_or(rest.len());
                    self.bump(len);
                }
                (Some(b'/'), Some(b'*')) => {
                    let start = self.line;
                    let rest = &self.input[self.pos + 2..];
                    match rest.find("*/") {
                        Some(end) => self.bump(end + 4),
                        None => {
                            return Err(SyntaxError::new(start, "Unterminated comment"));
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_trivia()?;
        let location = self.location();

        let kind = match self.peek() {
            None => TokenKind::Eof,
            Some(b'0'..=b'9') => self.number()?,
            Some(b'.') if matches!(self.peek_at(1), Some(b'0'..=b'9')) => self.number()?,
            Some(b'"' | b'\'') => self.string()?,
            Some(b) if b == b'_' || b == b'$' || b.is_ascii_alphabetic() => self.ident(),
            Some(b) if b >= 0x80 && self.input[self.pos..].starts_with(char::is_alphabetic) => {
                self.ident()
            }
            Some(_) => self.punct()?,
        };

        Ok(Token { kind, location })
    }

    fn ident(&mut self) -> TokenKind {
        let start = self.pos;
        let end = self.input[start..]
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '$'))
            .map(|(i, _)| start + i)
            .unwrap_or(self.input.len());
        self.bump(end - start);
        TokenKind::Ident(self.input[start..end].to_string())
    }

    fn number(&mut self) -> Result<TokenKind, SyntaxError> {
        let start = self.pos;
        let mut is_float = false;

        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' => self.bump(1),
                b'.' if !is_float && matches!(self.peek_at(1), Some(b'0'..=b'9')) => {
                    is_float = true;
                    self.bump(1);
                }
                b'e' | b'E' => {
                    let sign = matches!(self.peek_at(1), Some(b'+' | b'-')) as usize;
                    if !matches!(self.peek_at(1 + sign), Some(b'0'..=b'9')) {
                        break;
                    }
                    is_float = true;
                    self.bump(1 + sign);
                }
                _ => break,
            }
        }

        if matches!(self.peek(), Some(b) if b == b'_' || b.is_ascii_alphabetic()) {
            return Err(self.error("Invalid number literal"));
        }

        let text = &self.input[start..self.pos];
        if !is_float {
            if let Ok(n) = text.parse::<i64>() {
                return Ok(TokenKind::Int(n));
            }
        }
        text.parse::<f64>()
            .map(TokenKind::Float)
            .map_err(|_| self.error(format!("Invalid number literal '{}'", text)))
    }

    fn string(&mut self) -> Result<TokenKind, SyntaxError> {
        let quote = self.bytes[self.pos];
        let start_line = self.line;
        self.bump(1);
        let mut out = String::new();

        loop {
            let rest = &self.input[self.pos..];
            let Some(c) = rest.chars().next() else {
                return Err(SyntaxError::new(start_line, "Unterminated string literal"));
            };
            match c {
                '\n' => return Err(SyntaxError::new(start_line, "Unterminated string literal")),
                c if c as u32 == quote as u32 => {
                    self.bump(1);
                    return Ok(TokenKind::Str(out));
                }
                '\\' => {
                    let Some(escaped) = rest[1..].chars().next() else {
                        return Err(SyntaxError::new(start_line, "Unterminated string literal"));
                    };
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '0' => out.push('\0'),
                        // Line continuation
                        '\n' => {}
                        other => out.push(other),
                    }
                    self.bump(1 + escaped.len_utf8());
                }
                other => {
                    out.push(other);
                    self.bump(other.len_utf8());
                }
            }
        }
    }

    fn punct(&mut self) -> Result<TokenKind, SyntaxError> {
        let rest = &self.bytes[self.pos..];
        match PUNCTUATION.iter().find(|p| rest.starts_with(p.as_bytes())) {
            Some(&p) => {
                self.bump(p.len());
                Ok(TokenKind::Punct(p))
            }
            None => {
                let c = self.input[self.pos..].chars().next().unwrap_or('?');
                Err(self.error(format!("Unexpected character '{}'", c)))
            }
        }
    }
}

/// Tokenize program text; the last token is always [`TokenKind::Eof`]
pub fn tokenize(input: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds("__out += x.y[0];"),
            vec![
                TokenKind::Ident("__out".into()),
                TokenKind::Punct("+="),
                TokenKind::Ident("x".into()),
                TokenKind::Punct("."),
                TokenKind::Ident("y".into()),
                TokenKind::Punct("["),
                TokenKind::Int(0),
                TokenKind::Punct("]"),
                TokenKind::Punct(";"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_longest_operator_wins() {
        assert_eq!(
            kinds("a === b !== c <= d"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Punct("==="),
                TokenKind::Ident("b".into()),
                TokenKind::Punct("!=="),
                TokenKind::Ident("c".into()),
                TokenKind::Punct("<="),
                TokenKind::Ident("d".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1 2.5 .5 1e3 99999999999999999999"),
            vec![
                TokenKind::Int(1),
                TokenKind::Float(2.5),
                TokenKind::Float(0.5),
                TokenKind::Float(1000.0),
                TokenKind::Float(1e20),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_member_access_on_int_is_not_a_float() {
        assert_eq!(
            kinds("1.x"),
            vec![
                TokenKind::Int(1),
                TokenKind::Punct("."),
                TokenKind::Ident("x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\n\"b\"\\" 'it\'s'"#),
            vec![
                TokenKind::Str("a\n\"b\"\\".into()),
                TokenKind::Str("it's".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("a // line\n/* block\n */ b"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Ident("b".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_locations() {
        let tokens = tokenize("a\n  b").unwrap();
        assert_eq!(tokens[0].location.line, 1);
        assert_eq!(tokens[1].location.line, 2);
        assert_eq!(tokens[1].location.column, 3);
        assert_eq!(tokens[1].location.offset, 4);
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("x\n\"abc\ndef\"").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("Unterminated string"));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("a # b").unwrap_err();
        assert!(err.message.contains('#'));
    }

    #[test]
    fn test_unicode_identifier() {
        assert_eq!(
            kinds("größe"),
            vec![TokenKind::Ident("größe".into()), TokenKind::Eof]
        );
    }
}
