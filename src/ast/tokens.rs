use std::fmt;

use crate::value::format_float;

/// Category of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// End of input; always the last token of a stream.
    Eof,
    /// Identifier such as `foo`, `true` or a function name.
    Name,
    /// Integer or float literal
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 3.14
    /// 1_000
    /// .5e3
    /// ```
    Number,
    /// Quoted string with escapes resolved.
    String,
    /// Symbol or word operator
    ///
    /// # Examples
    /// ```text
    /// +
    /// ===
    /// not in
    /// starts with
    /// ```
    Operator,
    /// Brackets and `.` `,` `?` `:` `?.` `??`
    Punctuation,
}

impl TokenKind {
    /// Name used for the kind in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Eof => "end of expression",
            TokenKind::Name => "name",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Operator => "operator",
            TokenKind::Punctuation => "punctuation",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    /// Only the end-of-input token carries no value.
    None,
    Text(String),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::None => Ok(()),
            TokenValue::Text(s) => f.write_str(s),
            TokenValue::Integer(n) => write!(f, "{n}"),
            TokenValue::Float(n) => f.write_str(&format_float(*n)),
        }
    }
}

/// A lexical token.
///
/// `cursor` is 1-based: the byte offset where the token starts, plus one.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: TokenValue,
    pub cursor: usize,
}

impl Token {
    pub fn new(kind: TokenKind, value: TokenValue, cursor: usize) -> Self {
        Token { kind, value, cursor }
    }

    pub fn text(kind: TokenKind, text: impl Into<String>, cursor: usize) -> Self {
        Token::new(kind, TokenValue::Text(text.into()), cursor)
    }

    pub fn eof(cursor: usize) -> Self {
        Token::new(TokenKind::Eof, TokenValue::None, cursor)
    }

    /// Checks the kind and, when given, the textual value.
    pub fn test(&self, kind: TokenKind, value: Option<&str>) -> bool {
        self.kind == kind && value.is_none_or(|v| self.as_text() == Some(v))
    }

    pub fn is_punctuation(&self, value: &str) -> bool {
        self.test(TokenKind::Punctuation, Some(value))
    }

    pub fn is_operator(&self, value: &str) -> bool {
        self.test(TokenKind::Operator, Some(value))
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            TokenValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\" at {}", self.kind, self.value, self.cursor)
    }
}
