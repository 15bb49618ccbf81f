use crate::{
    ast::{Token, TokenKind},
    error::SyntaxError,
};

/// Cursor over the tokens of one expression.
///
/// The stream always ends with an end-of-expression token and never moves
/// past it, so [`TokenStream::current`] is always valid.
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
    position: usize,
    expression: String,
}

impl TokenStream {
    pub fn new(mut tokens: Vec<Token>, expression: impl Into<String>) -> Self {
        let expression = expression.into();
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::eof(expression.len() + 1));
        }
        TokenStream {
            tokens,
            position: 0,
            expression,
        }
    }

    pub fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    /// Moves to the next token.
    ///
    /// Fails with `Unexpected end of expression.` when already on the last token.
    pub fn next(&mut self) -> Result<(), SyntaxError> {
        if self.position + 1 >= self.tokens.len() {
            return Err(SyntaxError::new(
                "Unexpected end of expression.",
                self.current().cursor,
                &self.expression,
            ));
        }
        self.position += 1;
        Ok(())
    }

    /// Asserts the current token and advances past it.
    ///
    /// # Example
    ///
    /// ```text
    /// An array element must be followed by a comma. Unexpected token "number" of value "2"
    /// ("punctuation" expected with value ",") around position 4 for expression `[1 2]`.
    /// ```
    pub fn expect(
        &mut self,
        kind: TokenKind,
        value: Option<&str>,
        message: Option<&str>,
    ) -> Result<(), SyntaxError> {
        let token = self.current();
        if !token.test(kind, value) {
            let prefix = message.map(|m| format!("{m}. ")).unwrap_or_default();
            let expected_value = value
                .map(|v| format!(" with value \"{v}\""))
                .unwrap_or_default();
            return Err(SyntaxError::new(
                format!(
                    "{prefix}Unexpected token \"{}\" of value \"{}\" (\"{kind}\" expected{expected_value}).",
                    token.kind, token.value
                ),
                token.cursor,
                &self.expression,
            ));
        }
        self.next()
    }

    pub fn is_eof(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}
