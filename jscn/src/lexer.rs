//! Hand-written lexer over JSCN source text.
//!
//! Tokens carry a byte-offset [`Span`] rather than line/column, matching
//! what `Error` reports; there is no `Source` wrapper (unlike the teacher
//! this is adapted from) since the library never renders diagnostics
//! itself — only the CLI does, from the offset a caller already has.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::{Error, Result};

/// A half-open byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// An identifier, which may turn out to be a reserved keyword; the
    /// parser decides based on the spelling at each grammar position.
    Ident(String),
    Int(i64),
    /// A back-quoted or bare-string JSON literal, already parsed.
    Json(serde_json::Value),
    /// Verbatim interior of a `r"..."` regex string.
    Regex(String),
    /// Verbatim interior of a `f"..."` format string.
    Format(String),
    Symbol(char),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// The source text this token was lexed from, for keyword comparisons
    /// and error messages. Empty for token kinds that own a value already.
    pub fn text<'a>(&'a self, src: &'a str) -> &'a str {
        &src[self.span.start..self.span.end]
    }
}

// `_` is never reached here: it matches the identifier start class below
// and is recognized as the wildcard/unbounded marker by the parser based
// on its spelling, the same way keywords are.
const SYMBOLS: &str = "{}[](),:<>?*+/|&=";

pub struct Lexer<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek_pos(&mut self) -> usize {
        self.chars.peek().map_or(self.src.len(), |&(i, _)| i)
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        self.chars.next()
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    /// Parses one JSON value starting at byte offset `start` (which must
    /// point at the value's first character) using `serde_json`'s
    /// streaming deserializer so we never hand-roll JSON grammar.
    /// Returns the value and the end offset (exclusive).
    fn parse_json_value(&self, start: usize) -> Result<(serde_json::Value, usize)> {
        let rest = &self.src[start..];
        let mut stream =
            serde_json::Deserializer::from_str(rest).into_iter::<serde_json::Value>();
        match stream.next() {
            Some(Ok(value)) => Ok((value, start + stream.byte_offset())),
            _ => Err(Error::lex(start, "invalid JSON literal")),
        }
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_trivia();

        let start = self.peek_pos();
        let Some((_, c)) = self.chars.peek().copied() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                span: Span { start, end: start },
            });
        };

        if c == '`' {
            self.bump();
            let json_start = self.peek_pos();
            let (value, json_end) = self.parse_json_value(json_start)?;
            // advance past the consumed JSON text
            while self.peek_pos() < json_end {
                self.bump();
            }
            match self.bump() {
                Some((_, '`')) => {}
                _ => return Err(Error::lex(json_end, "unterminated JSON literal, expected `")),
            }
            let end = self.peek_pos();
            return Ok(Token {
                kind: TokenKind::Json(value),
                span: Span { start, end },
            });
        }

        if c == '"' {
            let (value, end) = self.parse_json_value(start)?;
            while self.peek_pos() < end {
                self.bump();
            }
            return Ok(Token {
                kind: TokenKind::Json(value),
                span: Span { start, end },
            });
        }

        if c.is_ascii_digit() {
            return self.lex_number(start);
        }

        if c.is_alphabetic() || c == '_' {
            return self.lex_ident_or_prefixed_string(start);
        }

        if SYMBOLS.contains(c) {
            self.bump();
            let end = self.peek_pos();
            return Ok(Token {
                kind: TokenKind::Symbol(c),
                span: Span { start, end },
            });
        }

        Err(Error::lex(start, format!("unexpected character '{c}'")))
    }

    fn lex_number(&mut self, start: usize) -> Result<Token> {
        // 0x-prefixed hex, otherwise decimal.
        self.bump(); // first digit
        let is_hex =
            self.peek_char() == Some('x') && self.src.as_bytes().get(start) == Some(&b'0');
        if is_hex {
            self.bump(); // 'x'
            let digits_start = self.peek_pos();
            while matches!(self.peek_char(), Some(c) if c.is_ascii_hexdigit()) {
                self.bump();
            }
            let end = self.peek_pos();
            if digits_start == end {
                return Err(Error::lex(start, "expected hex digits after 0x"));
            }
            let value = i64::from_str_radix(&self.src[digits_start..end], 16)
                .map_err(|_| Error::lex(start, "hex literal out of range"))?;
            return Ok(Token {
                kind: TokenKind::Int(value),
                span: Span { start, end },
            });
        }

        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        let end = self.peek_pos();
        let value = self.src[start..end]
            .parse::<i64>()
            .map_err(|_| Error::lex(start, "integer literal out of range"))?;
        Ok(Token {
            kind: TokenKind::Int(value),
            span: Span { start, end },
        })
    }

    fn lex_ident_or_prefixed_string(&mut self, start: usize) -> Result<Token> {
        while matches!(self.peek_char(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        let end = self.peek_pos();
        let text = &self.src[start..end];

        if (text == "r" || text == "f") && self.peek_char() == Some('"') {
            self.bump(); // opening quote
            let content_start = self.peek_pos();
            loop {
                match self.bump() {
                    Some((_, '"')) => break,
                    Some(_) => {}
                    None => {
                        return Err(Error::lex(
                            content_start,
                            "unterminated string, expected closing \"",
                        ))
                    }
                }
            }
            let content_end = self.peek_pos().saturating_sub(1);
            let content = self.src[content_start..content_end].to_string();
            let full_end = self.peek_pos();
            let kind = if text == "r" {
                TokenKind::Regex(content)
            } else {
                TokenKind::Format(content)
            };
            return Ok(Token {
                kind,
                span: Span {
                    start,
                    end: full_end,
                },
            });
        }

        Ok(Token {
            kind: TokenKind::Ident(text.to_string()),
            span: Span { start, end },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<TokenKind> {
        let mut lex = Lexer::new(src);
        let mut out = vec![];
        loop {
            let tok = lex.next_token().unwrap();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn lexes_keywords_as_idents() {
        assert_eq!(
            tokens("boolean"),
            vec![TokenKind::Ident("boolean".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn lexes_hex_and_decimal_ints() {
        assert_eq!(
            tokens("0xff 255"),
            vec![TokenKind::Int(255), TokenKind::Int(255), TokenKind::Eof]
        );
    }

    #[test]
    fn lexes_regex_and_format_strings() {
        assert_eq!(
            tokens(r#"r"[a-z]+" f"date""#),
            vec![
                TokenKind::Regex("[a-z]+".to_string()),
                TokenKind::Format("date".to_string()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lexes_backquoted_json_literal() {
        assert_eq!(
            tokens("`{\"a\": 1}`"),
            vec![
                TokenKind::Json(serde_json::json!({"a": 1})),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lexes_bare_quoted_string() {
        assert_eq!(
            tokens("\"hi\""),
            vec![
                TokenKind::Json(serde_json::Value::String("hi".to_string())),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn skips_comments_and_whitespace() {
        assert_eq!(
            tokens("  # a comment\n  boolean"),
            vec![TokenKind::Ident("boolean".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn lexes_underscore_as_ident() {
        assert_eq!(
            tokens("_"),
            vec![TokenKind::Ident("_".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn reports_offset_on_unterminated_regex() {
        let mut lex = Lexer::new(r#"r"abc"#);
        let err = lex.next_token().unwrap_err();
        assert!(matches!(err, Error::Lex { .. }));
    }
}
