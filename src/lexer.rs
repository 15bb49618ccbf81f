use tracing::debug;

use crate::{
    ast::{Token, TokenKind, TokenValue},
    error::SyntaxError,
    stream::TokenStream,
};

/// Word operators, tried in this order before symbol operators.
const WORD_OPERATORS: [&str; 10] = [
    "starts with",
    "ends with",
    "contains",
    "matches",
    "not in",
    "not",
    "and",
    "or",
    "in",
    "xor",
];

/// Multi-character symbol operators, longest first.
const SYMBOL_OPERATORS: [&str; 12] = [
    "===", "!==", "||", "&&", "==", "!=", ">=", "<=", "**", "..", "<<", ">>",
];

const SINGLE_OPERATORS: [&str; 12] = ["!", "%", "&", "*", "+", "-", "/", "<", ">", "^", "|", "~"];

/// Turns an expression string into a [`TokenStream`].
///
/// Scanning works on bytes: every token boundary falls on an ASCII byte, and
/// non-ASCII bytes only ever appear inside names and strings.
pub struct Lexer {
    input: String,
    position: usize,
    tokens: Vec<Token>,
    brackets: Vec<(u8, usize)>,
}

impl Lexer {
    pub fn new(expression: &str) -> Self {
        let input = expression.replace(['\r', '\n', '\t', '\x0b', '\x0c'], " ");
        Lexer {
            input,
            position: 0,
            tokens: Vec::new(),
            brackets: Vec::new(),
        }
    }

    fn current_byte(&self) -> Option<u8> {
        self.input.as_bytes().get(self.position).copied()
    }

    fn push(&mut self, kind: TokenKind, value: TokenValue, start: usize) {
        self.tokens.push(Token::new(kind, value, start + 1));
    }

    fn error(&self, message: String, offset: usize) -> SyntaxError {
        SyntaxError::new(message, offset, &self.input)
    }

    pub fn tokenize(mut self) -> Result<TokenStream, SyntaxError> {
        while let Some(byte) = self.current_byte() {
            let start = self.position;

            if byte == b' ' {
                self.position += 1;
                continue;
            }

            if let Some(end) = self.scan_number() {
                self.read_number(end)?;
                continue;
            }

            match byte {
                b'(' | b'[' | b'{' => {
                    self.brackets.push((byte, start));
                    self.position += 1;
                    self.push(TokenKind::Punctuation, punctuation(byte), start);
                    continue;
                }
                b')' | b']' | b'}' => {
                    let Some((opener, opener_offset)) = self.brackets.pop() else {
                        return Err(self.error(format!("Unexpected \"{}\".", byte as char), start));
                    };
                    if closer_for(opener) != byte {
                        return Err(self.error(
                            format!("Unclosed \"{}\".", closer_for(opener) as char),
                            opener_offset,
                        ));
                    }
                    self.position += 1;
                    self.push(TokenKind::Punctuation, punctuation(byte), start);
                    continue;
                }
                b'"' | b'\'' => {
                    if let Some(end) = self.scan_string(byte) {
                        let raw = &self.input[start + 1..end];
                        let value = unescape(raw);
                        self.position = end + 1;
                        self.push(TokenKind::String, TokenValue::Text(value), start);
                        continue;
                    }
                }
                _ => {}
            }

            if self.input[start..].starts_with("/*")
                && let Some(close) = self.input[start + 2..].find("*/")
            {
                self.position = start + 2 + close + 2;
                continue;
            }

            if let Some(operator) = self.scan_operator() {
                self.position += operator.len();
                self.push(TokenKind::Operator, TokenValue::Text(operator.to_string()), start);
                continue;
            }

            if let Some(symbol) = ["?.", "??"]
                .into_iter()
                .find(|s| self.input[start..].starts_with(s))
            {
                self.position += 2;
                self.push(TokenKind::Punctuation, TokenValue::Text(symbol.to_string()), start);
                continue;
            }

            if matches!(byte, b'.' | b',' | b'?' | b':') {
                self.position += 1;
                self.push(TokenKind::Punctuation, punctuation(byte), start);
                continue;
            }

            if is_name_start(byte) {
                while self.current_byte().is_some_and(is_name_continue) {
                    self.position += 1;
                }
                let name = self.input[start..self.position].to_string();
                self.push(TokenKind::Name, TokenValue::Text(name), start);
                continue;
            }

            let unexpected = self.input[start..].chars().next().unwrap_or(byte as char);
            return Err(self.error(format!("Unexpected character \"{unexpected}\"."), start));
        }

        if let Some((opener, offset)) = self.brackets.last() {
            return Err(self.error(
                format!("Unclosed \"{}\".", closer_for(*opener) as char),
                *offset,
            ));
        }

        self.tokens.push(Token::eof(self.input.len() + 1));
        debug!(count = self.tokens.len(), "tokenized expression");
        Ok(TokenStream::new(self.tokens, self.input))
    }

    /// End offset of a number literal starting at the current position.
    fn scan_number(&self) -> Option<usize> {
        let bytes = self.input.as_bytes();
        let start = self.position;
        let mut end = if bytes[start] == b'.' {
            scan_digits(bytes, start + 1)?
        } else {
            let mut end = scan_digits(bytes, start)?;
            // `1..2` is a range, not the float `1.`
            if bytes.get(end) == Some(&b'.') && bytes.get(end + 1) != Some(&b'.') {
                end += 1;
                if let Some(fraction_end) = scan_digits(bytes, end) {
                    end = fraction_end;
                }
            }
            end
        };

        if matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exponent = end + 1;
            if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
                exponent += 1;
            }
            if let Some(exponent_end) = scan_digits(bytes, exponent) {
                end = exponent_end;
            }
        }
        Some(end)
    }

    fn read_number(&mut self, end: usize) -> Result<(), SyntaxError> {
        let start = self.position;
        let literal = self.input[start..end].replace('_', "");
        let value = match literal.parse::<i64>() {
            Ok(n) if literal.bytes().all(|b| b.is_ascii_digit()) => TokenValue::Integer(n),
            _ => match literal.parse::<f64>() {
                Ok(n) => TokenValue::Float(n),
                Err(_) => {
                    return Err(self.error(format!("Invalid number \"{literal}\"."), start));
                }
            },
        };
        self.position = end;
        self.push(TokenKind::Number, value, start);
        Ok(())
    }

    /// Offset of the closing quote of a string starting at the current position.
    fn scan_string(&self, quote: u8) -> Option<usize> {
        let bytes = self.input.as_bytes();
        let mut i = self.position + 1;
        while let Some(&byte) = bytes.get(i) {
            match byte {
                b'\\' => i += 2,
                b if b == quote => return Some(i),
                _ => i += 1,
            }
        }
        None
    }

    fn scan_operator(&self) -> Option<&'static str> {
        let rest = &self.input[self.position..];
        let preceded = self.position == 0
            || matches!(self.input.as_bytes()[self.position - 1], b' ' | b'(');

        if preceded {
            for word in WORD_OPERATORS {
                if rest.starts_with(word)
                    && matches!(rest.as_bytes().get(word.len()), Some(b' ' | b'('))
                {
                    return Some(word);
                }
            }
        }

        SYMBOL_OPERATORS
            .into_iter()
            .chain(SINGLE_OPERATORS)
            .find(|s| rest.starts_with(s))
    }
}

/// Tokenizes `expression`.
///
/// # Example
///
/// ```
/// use expression_language::{TokenKind, tokenize};
///
/// let stream = tokenize("a + 1").unwrap();
/// let kinds: Vec<TokenKind> = stream.tokens().iter().map(|t| t.kind).collect();
/// assert_eq!(
///     kinds,
///     [TokenKind::Name, TokenKind::Operator, TokenKind::Number, TokenKind::Eof]
/// );
/// ```
pub fn tokenize(expression: &str) -> Result<TokenStream, SyntaxError> {
    Lexer::new(expression).tokenize()
}

fn punctuation(byte: u8) -> TokenValue {
    TokenValue::Text((byte as char).to_string())
}

fn closer_for(opener: u8) -> u8 {
    match opener {
        b'(' => b')',
        b'[' => b']',
        _ => b'}',
    }
}

fn is_name_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte >= 0x7f
}

fn is_name_continue(byte: u8) -> bool {
    is_name_start(byte) || byte.is_ascii_digit()
}

/// `[0-9]+(_[0-9]+)*` starting at `start`; returns the end offset.
fn scan_digits(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    if i == start {
        return None;
    }
    while bytes.get(i) == Some(&b'_') && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
        i += 1;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
    }
    Some(i)
}

/// Resolves C-style backslash escapes.
fn unescape(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('a') => result.push('\x07'),
            Some('b') => result.push('\x08'),
            Some('v') => result.push('\x0b'),
            Some('f') => result.push('\x0c'),
            Some('e') => result.push('\x1b'),
            Some('x') => {
                let mut code = 0u32;
                let mut digits = 0;
                while digits < 2 {
                    match chars.peek().and_then(|c| c.to_digit(16)) {
                        Some(d) => {
                            code = code * 16 + d;
                            digits += 1;
                            chars.next();
                        }
                        None => break,
                    }
                }
                if digits == 0 {
                    result.push('x');
                } else {
                    result.push(char::from(code as u8));
                }
            }
            Some(first @ '0'..='7') => {
                let mut code = first.to_digit(8).unwrap_or_default();
                let mut digits = 1;
                while digits < 3 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            digits += 1;
                            chars.next();
                        }
                        None => break,
                    }
                }
                result.push(char::from(code as u8));
            }
            Some(other) => result.push(other),
            None => {}
        }
    }
    result
}
