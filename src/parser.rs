use crate::{
    ast::{ArrayElement, Associativity, BinaryOperator, Node, Token, TokenKind, TokenValue, UnaryOperator},
    error::SyntaxError,
    functions::FunctionRegistry,
    stream::TokenStream,
    value::Value,
};

/// A variable name an expression is allowed to reference.
///
/// An aliased name is written as `variable` in expressions and compiled as
/// `alias`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    variable: String,
    alias: Option<String>,
}

impl Name {
    pub fn new(variable: impl Into<String>) -> Self {
        Name {
            variable: variable.into(),
            alias: None,
        }
    }

    /// `Name::aliased("B", "b")`: expressions use `b`, compiled code uses `$B`.
    pub fn aliased(alias: impl Into<String>, variable: impl Into<String>) -> Self {
        Name {
            variable: variable.into(),
            alias: Some(alias.into()),
        }
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Identifier used in compiled output.
    pub fn compiled_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.variable)
    }
}

impl From<&str> for Name {
    fn from(variable: &str) -> Self {
        Name::new(variable)
    }
}

impl From<String> for Name {
    fn from(variable: String) -> Self {
        Name::new(variable)
    }
}

impl From<&String> for Name {
    fn from(variable: &String) -> Self {
        Name::new(variable.as_str())
    }
}

impl From<(&str, &str)> for Name {
    fn from((alias, variable): (&str, &str)) -> Self {
        Name::aliased(alias, variable)
    }
}

/// Empty name list, for expressions without variables.
pub const NO_NAMES: [Name; 0] = [];

/// Relaxations applied while parsing or linting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseFlags {
    /// Accept any variable name.
    pub ignore_unknown_variables: bool,
    /// Accept calls to functions that are not registered.
    pub ignore_unknown_functions: bool,
}

/// Precedence-climbing parser turning a [`TokenStream`] into a [`Node`] tree.
///
/// The parser itself is stateless; every call works on its own stream.
pub struct Parser<'f> {
    functions: &'f FunctionRegistry,
}

impl<'f> Parser<'f> {
    pub fn new(functions: &'f FunctionRegistry) -> Self {
        Parser { functions }
    }

    /// Parses a complete expression, allowing only `names` as variables.
    pub fn parse(&self, stream: TokenStream, names: &[Name]) -> Result<Node, SyntaxError> {
        self.parse_with(stream, names, ParseFlags::default())
    }

    pub fn parse_with(
        &self,
        stream: TokenStream,
        names: &[Name],
        flags: ParseFlags,
    ) -> Result<Node, SyntaxError> {
        let mut state = ParseState {
            stream,
            names,
            flags,
            functions: self.functions,
        };
        let node = state.parse_expression(0)?;

        if !state.stream.is_eof() {
            let token = state.stream.current();
            return Err(SyntaxError::new(
                format!(
                    "Unexpected token \"{}\" of value \"{}\".",
                    token.kind, token.value
                ),
                token.cursor,
                state.stream.expression(),
            ));
        }
        Ok(node)
    }

    /// Validates an expression without keeping the tree.
    ///
    /// With `names` set to `None` any variable is accepted.
    pub fn lint(
        &self,
        stream: TokenStream,
        names: Option<&[Name]>,
        mut flags: ParseFlags,
    ) -> Result<(), SyntaxError> {
        let names = match names {
            Some(names) => names,
            None => {
                flags.ignore_unknown_variables = true;
                &[]
            }
        };
        self.parse_with(stream, names, flags).map(|_| ())
    }
}

struct ParseState<'a> {
    stream: TokenStream,
    names: &'a [Name],
    flags: ParseFlags,
    functions: &'a FunctionRegistry,
}

impl ParseState<'_> {
    fn current(&self) -> &Token {
        self.stream.current()
    }

    fn error(&self, message: impl AsRef<str>, cursor: usize) -> SyntaxError {
        SyntaxError::new(message, cursor, self.stream.expression())
    }

    fn unexpected(&self, token: &Token) -> SyntaxError {
        self.error(
            format!(
                "Unexpected token \"{}\" of value \"{}\".",
                token.kind, token.value
            ),
            token.cursor,
        )
    }

    fn binary_operator(&self) -> Option<BinaryOperator> {
        let token = self.current();
        if token.kind != TokenKind::Operator {
            return None;
        }
        token.as_text().and_then(BinaryOperator::from_symbol)
    }

    fn parse_expression(&mut self, precedence: u16) -> Result<Node, SyntaxError> {
        let mut expr = self.parse_primary()?;

        while let Some(operator) = self.binary_operator() {
            if operator.precedence() < precedence {
                break;
            }
            self.stream.next()?;
            let next_precedence = match operator.associativity() {
                Associativity::Left => operator.precedence() + 1,
                Associativity::Right => operator.precedence(),
            };
            let right = self.parse_expression(next_precedence)?;
            expr = Node::binary(operator, expr, right);
        }

        if precedence == 0 {
            return self.parse_conditional(expr);
        }
        Ok(expr)
    }

    /// Unary operators and parenthesised sub-expressions, then plain primaries.
    fn parse_primary(&mut self) -> Result<Node, SyntaxError> {
        let token = self.current().clone();

        if token.kind == TokenKind::Operator
            && let Some(operator) = token.as_text().and_then(UnaryOperator::from_symbol)
        {
            self.stream.next()?;
            let operand = self.parse_expression(operator.precedence())?;
            return self.parse_postfix(Node::unary(operator, operand));
        }

        if token.is_punctuation("(") {
            self.stream.next()?;
            let expr = self.parse_expression(0)?;
            self.stream.expect(
                TokenKind::Punctuation,
                Some(")"),
                Some("An opened parenthesis is not properly closed"),
            )?;
            return self.parse_postfix(expr);
        }

        self.parse_primary_expression()
    }

    fn parse_conditional(&mut self, mut expr: Node) -> Result<Node, SyntaxError> {
        while self.current().is_punctuation("??") {
            self.stream.next()?;
            let right = self.parse_expression(0)?;
            expr = Node::null_coalesce(expr, right);
        }

        while self.current().is_punctuation("?") {
            self.stream.next()?;
            let (if_true, if_false) = if self.current().is_punctuation(":") {
                // a ?: b
                self.stream.next()?;
                (expr.clone(), self.parse_expression(0)?)
            } else {
                let if_true = self.parse_expression(0)?;
                let if_false = if self.current().is_punctuation(":") {
                    self.stream.next()?;
                    self.parse_expression(0)?
                } else {
                    Node::Constant(Value::Null)
                };
                (if_true, if_false)
            };
            expr = Node::conditional(expr, if_true, if_false);
        }
        Ok(expr)
    }

    fn parse_primary_expression(&mut self) -> Result<Node, SyntaxError> {
        let token = self.current().clone();

        let node = match (&token.kind, &token.value) {
            (TokenKind::Name, TokenValue::Text(name)) => {
                self.stream.next()?;
                match name.as_str() {
                    "true" | "TRUE" => return Ok(Node::constant(true)),
                    "false" | "FALSE" => return Ok(Node::constant(false)),
                    "null" | "NULL" => return Ok(Node::Constant(Value::Null)),
                    _ if self.current().is_punctuation("(") => self.parse_function_call(name, &token)?,
                    _ => self.parse_variable(name, &token)?,
                }
            }
            (TokenKind::Number, TokenValue::Integer(n)) => {
                self.stream.next()?;
                return Ok(Node::constant(*n));
            }
            (TokenKind::Number, TokenValue::Float(n)) => {
                self.stream.next()?;
                return Ok(Node::constant(*n));
            }
            (TokenKind::String, TokenValue::Text(s)) => {
                self.stream.next()?;
                return Ok(Node::constant(s.as_str()));
            }
            _ if token.is_punctuation("[") => self.parse_array()?,
            _ if token.is_punctuation("{") => self.parse_hash()?,
            _ => return Err(self.unexpected(&token)),
        };

        self.parse_postfix(node)
    }

    fn parse_function_call(&mut self, name: &str, token: &Token) -> Result<Node, SyntaxError> {
        if !self.functions.contains(name) && !self.flags.ignore_unknown_functions {
            return Err(SyntaxError::with_suggestion(
                format!("The function \"{name}\" does not exist."),
                token.cursor,
                self.stream.expression(),
                name,
                self.functions.names(),
            ));
        }
        let arguments = self.parse_arguments()?;
        Ok(Node::function(name, arguments))
    }

    fn parse_variable(&mut self, name: &str, token: &Token) -> Result<Node, SyntaxError> {
        if self.flags.ignore_unknown_variables {
            return Ok(Node::name(name));
        }
        if let Some(permitted) = self.names.iter().find(|n| n.variable() == name) {
            return Ok(Node::name(permitted.compiled_name()));
        }
        if self.current().is_punctuation("??") {
            return Ok(Node::NullCoalescedName(name.to_string()));
        }
        Err(SyntaxError::with_suggestion(
            format!("Variable \"{name}\" is not valid."),
            token.cursor,
            self.stream.expression(),
            name,
            self.names.iter().map(Name::variable),
        ))
    }

    fn parse_array(&mut self) -> Result<Node, SyntaxError> {
        self.stream.expect(
            TokenKind::Punctuation,
            Some("["),
            Some("An array element was expected"),
        )?;

        let mut elements = Vec::new();
        while !self.current().is_punctuation("]") {
            if !elements.is_empty() {
                self.stream.expect(
                    TokenKind::Punctuation,
                    Some(","),
                    Some("An array element must be followed by a comma"),
                )?;
                // trailing comma
                if self.current().is_punctuation("]") {
                    break;
                }
            }
            elements.push(ArrayElement {
                key: None,
                value: self.parse_expression(0)?,
            });
        }
        self.stream.expect(
            TokenKind::Punctuation,
            Some("]"),
            Some("An opened array is not properly closed"),
        )?;

        Ok(Node::Array(elements))
    }

    fn parse_hash(&mut self) -> Result<Node, SyntaxError> {
        self.stream.expect(
            TokenKind::Punctuation,
            Some("{"),
            Some("A hash element was expected"),
        )?;

        let mut elements = Vec::new();
        while !self.current().is_punctuation("}") {
            if !elements.is_empty() {
                self.stream.expect(
                    TokenKind::Punctuation,
                    Some(","),
                    Some("A hash value must be followed by a comma"),
                )?;
                // trailing comma
                if self.current().is_punctuation("}") {
                    break;
                }
            }

            let key = self.parse_hash_key()?;
            self.stream.expect(
                TokenKind::Punctuation,
                Some(":"),
                Some("A hash key must be followed by a colon (:)"),
            )?;
            let value = self.parse_expression(0)?;
            elements.push(ArrayElement {
                key: Some(key),
                value,
            });
        }
        self.stream.expect(
            TokenKind::Punctuation,
            Some("}"),
            Some("An opened hash is not properly closed"),
        )?;

        Ok(Node::Array(elements))
    }

    /// `"key"`, `42`, `key` or `(expression)`.
    fn parse_hash_key(&mut self) -> Result<Node, SyntaxError> {
        let token = self.current().clone();
        let key = match (&token.kind, &token.value) {
            (TokenKind::String | TokenKind::Name, TokenValue::Text(s)) => Node::constant(s.as_str()),
            (TokenKind::Number, TokenValue::Integer(n)) => Node::constant(*n),
            (TokenKind::Number, TokenValue::Float(n)) => Node::constant(*n),
            _ if token.is_punctuation("(") => return self.parse_expression(0),
            _ => {
                return Err(self.error(
                    format!(
                        "A hash key must be a quoted string, a number, a name, or an expression enclosed in parentheses (unexpected token \"{}\" of value \"{}\").",
                        token.kind, token.value
                    ),
                    token.cursor,
                ));
            }
        };
        self.stream.next()?;
        Ok(key)
    }

    /// `.name`, `?.name`, `.name(args)` and `[key]` suffixes.
    fn parse_postfix(&mut self, mut node: Node) -> Result<Node, SyntaxError> {
        loop {
            let token = self.current().clone();
            if token.kind != TokenKind::Punctuation {
                break;
            }

            if token.is_punctuation(".") || token.is_punctuation("?.") {
                let null_safe = token.is_punctuation("?.");
                self.stream.next()?;
                let name_token = self.current().clone();
                self.stream.next()?;

                let Some(name) = member_name(&name_token) else {
                    return Err(self.error("Expected name.", name_token.cursor));
                };

                node = if self.current().is_punctuation("(") {
                    let arguments = self.parse_arguments()?;
                    Node::method_call(node, name, arguments, null_safe)
                } else {
                    Node::property(node, name, null_safe)
                };
            } else if token.is_punctuation("[") {
                self.stream.next()?;
                let key = self.parse_expression(0)?;
                self.stream.expect(TokenKind::Punctuation, Some("]"), None)?;
                node = Node::index(node, key);
            } else {
                break;
            }
        }
        Ok(node)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Node>, SyntaxError> {
        self.stream.expect(
            TokenKind::Punctuation,
            Some("("),
            Some("A list of arguments must begin with an opening parenthesis"),
        )?;

        let mut arguments = Vec::new();
        while !self.current().is_punctuation(")") {
            if !arguments.is_empty() {
                self.stream.expect(
                    TokenKind::Punctuation,
                    Some(","),
                    Some("Arguments must be separated by a comma"),
                )?;
            }
            arguments.push(self.parse_expression(0)?);
        }
        self.stream.expect(
            TokenKind::Punctuation,
            Some(")"),
            Some("A list of arguments must be closed by a parenthesis"),
        )?;

        Ok(arguments)
    }
}

/// Name after `.`/`?.`: a NAME, or an operator whose text starts like an
/// identifier (`not`, `in`, `starts with`, ...). The operator text is used whole.
fn member_name(token: &Token) -> Option<String> {
    let text = token.as_text()?;
    let starts_like_identifier = text
        .bytes()
        .next()
        .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_' || b >= 0x7f);
    match token.kind {
        TokenKind::Name => Some(text.to_string()),
        TokenKind::Operator if starts_like_identifier => Some(text.to_string()),
        _ => None,
    }
}
