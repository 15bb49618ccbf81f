use std::{borrow::Cow, fmt, sync::Arc};

use tracing::debug;

use crate::{
    ast::Node,
    cache::{MemoryCache, ParseCache, cache_key},
    compiler::Compiler,
    error::SyntaxError,
    evaluator::{EvalError, Evaluator},
    functions::{Constants, ExpressionFunction, FunctionProvider, FunctionRegistry, builtins},
    lexer::tokenize,
    parser::{Name, ParseFlags, Parser},
    value::{EnumCase, Value, Values},
};

/// Errors returned by [`ExpressionLanguage::evaluate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Expression source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression {
    text: String,
}

impl Expression {
    pub fn new(text: impl Into<String>) -> Self {
        Expression { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// An expression together with its tree.
///
/// Handed out as `Arc<ParsedExpression>`; the parse cache returns the same
/// instance for the same text and names.
#[derive(Debug, Clone)]
pub struct ParsedExpression {
    expression: Expression,
    nodes: Node,
}

impl ParsedExpression {
    pub fn new(expression: Expression, nodes: Node) -> Self {
        ParsedExpression { expression, nodes }
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn nodes(&self) -> &Node {
        &self.nodes
    }
}

impl fmt::Display for ParsedExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.expression.fmt(f)
    }
}

/// Input accepted by the facade: raw text or an already parsed expression.
#[derive(Debug, Clone)]
pub enum Source<'a> {
    Text(Cow<'a, str>),
    Parsed(Arc<ParsedExpression>),
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(text: &'a str) -> Self {
        Source::Text(Cow::Borrowed(text))
    }
}

impl<'a> From<&'a String> for Source<'a> {
    fn from(text: &'a String) -> Self {
        Source::Text(Cow::Borrowed(text))
    }
}

impl From<String> for Source<'_> {
    fn from(text: String) -> Self {
        Source::Text(Cow::Owned(text))
    }
}

impl<'a> From<&'a Expression> for Source<'a> {
    fn from(expression: &'a Expression) -> Self {
        Source::Text(Cow::Borrowed(expression.as_str()))
    }
}

impl From<Expression> for Source<'_> {
    fn from(expression: Expression) -> Self {
        Source::Text(Cow::Owned(expression.text))
    }
}

impl From<Arc<ParsedExpression>> for Source<'_> {
    fn from(parsed: Arc<ParsedExpression>) -> Self {
        Source::Parsed(parsed)
    }
}

impl From<&Arc<ParsedExpression>> for Source<'_> {
    fn from(parsed: &Arc<ParsedExpression>) -> Self {
        Source::Parsed(Arc::clone(parsed))
    }
}

/// Collects functions, constants and the cache store, then builds an
/// immutable [`ExpressionLanguage`].
///
/// # Example
///
/// ```
/// use expression_language::{ExpressionLanguage, Value, Values};
///
/// let language = ExpressionLanguage::builder()
///     .register(
///         "double",
///         |args| format!("({} * 2)", args[0]),
///         |_, args| Ok(Value::from(args[0].as_int().unwrap_or_default() * 2)),
///     )
///     .constant("LIMIT", 10)
///     .build();
///
/// assert_eq!(language.compile("double(2)", ["a"]).unwrap(), "(2 * 2)");
/// assert_eq!(
///     language.evaluate("double(constant(\"LIMIT\"))", &Values::new()).unwrap(),
///     Value::from(20)
/// );
/// ```
#[derive(Default)]
pub struct Builder {
    functions: Vec<ExpressionFunction>,
    constants: Constants,
    cache: Option<Arc<dyn ParseCache>>,
}

impl Builder {
    /// Registers a function from its compiler and evaluator.
    pub fn register<C, E>(self, name: impl Into<String>, compiler: C, evaluator: E) -> Self
    where
        C: Fn(&[String]) -> String + Send + Sync + 'static,
        E: Fn(&Values, Vec<Value>) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.add_function(ExpressionFunction::new(name, compiler, evaluator))
    }

    pub fn add_function(mut self, function: ExpressionFunction) -> Self {
        self.functions.push(function);
        self
    }

    pub fn register_provider(mut self, provider: &dyn FunctionProvider) -> Self {
        self.functions.extend(provider.functions());
        self
    }

    /// Host constant readable through `constant("NAME")`.
    pub fn constant(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constants.insert(name.into(), value.into());
        self
    }

    /// Registers an enum case as the constant `Enum::Case`, for `enum("Enum::Case")`.
    pub fn enum_case(self, case: EnumCase) -> Self {
        let name = case.qualified_name();
        self.constant(name, case)
    }

    /// Replaces the default in-memory parse cache.
    pub fn cache(mut self, cache: Arc<dyn ParseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> ExpressionLanguage {
        let mut registry = FunctionRegistry::new();
        registry.extend(builtins(Arc::new(self.constants)));
        registry.extend(self.functions);

        ExpressionLanguage {
            functions: registry,
            cache: self.cache.unwrap_or_else(|| Arc::new(MemoryCache::new())),
        }
    }
}

/// Parses, evaluates, compiles and lints expressions.
///
/// # Example
///
/// ```
/// use expression_language::{ExpressionLanguage, Value, Values};
///
/// let language = ExpressionLanguage::new();
/// let values = Values::from([("a".to_string(), Value::from(2))]);
///
/// assert_eq!(language.evaluate("a * 3 + 1", &values).unwrap(), Value::from(7));
/// assert_eq!(language.compile("a * 3 + 1", ["a"]).unwrap(), "(($a * 3) + 1)");
/// ```
pub struct ExpressionLanguage {
    functions: FunctionRegistry,
    cache: Arc<dyn ParseCache>,
}

impl Default for ExpressionLanguage {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExpressionLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionLanguage")
            .field("functions", &self.functions.names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ExpressionLanguage {
    /// Engine with the built-in functions and an in-memory cache.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Parses `source`, allowing `names` as variables.
    ///
    /// Already parsed input is returned unchanged; text goes through the cache.
    pub fn parse<'a, I, N>(&self, source: impl Into<Source<'a>>, names: I) -> Result<Arc<ParsedExpression>, SyntaxError>
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        let names: Vec<Name> = names.into_iter().map(Into::into).collect();
        self.parse_names(source.into(), &names)
    }

    /// Compiles `source` to PHP, allowing `names` as variables.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn compile<'a, I, N>(&self, source: impl Into<Source<'a>>, names: I) -> Result<String, SyntaxError>
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        let parsed = self.parse(source, names)?;
        Compiler::new(&self.functions).compile(parsed.nodes())
    }

    /// Evaluates `source`; the keys of `values` are the permitted variables.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn evaluate<'a>(&self, source: impl Into<Source<'a>>, values: &Values) -> Result<Value, Error> {
        let names: Vec<Name> = values.keys().map(Name::from).collect();
        let parsed = self.parse_names(source.into(), &names)?;
        Ok(Evaluator::new(&self.functions, values).evaluate(parsed.nodes())?)
    }

    /// Checks `source` against `names` without building a cached tree.
    pub fn lint<'a, I, N>(&self, source: impl Into<Source<'a>>, names: I) -> Result<(), SyntaxError>
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        let names: Vec<Name> = names.into_iter().map(Into::into).collect();
        self.lint_with(source, Some(names.as_slice()), ParseFlags::default())
    }

    /// Checks syntax and function names only; any variable is accepted.
    pub fn lint_syntax<'a>(&self, source: impl Into<Source<'a>>) -> Result<(), SyntaxError> {
        self.lint_with(source, None, ParseFlags::default())
    }

    pub fn lint_with<'a>(
        &self,
        source: impl Into<Source<'a>>,
        names: Option<&[Name]>,
        flags: ParseFlags,
    ) -> Result<(), SyntaxError> {
        let text = match source.into() {
            Source::Parsed(_) => return Ok(()),
            Source::Text(text) => text,
        };
        let stream = tokenize(&text)?;
        Parser::new(&self.functions).lint(stream, names, flags)
    }

    #[tracing::instrument(level = "debug", skip(self, names), fields(names = names.len()))]
    fn parse_names(&self, source: Source<'_>, names: &[Name]) -> Result<Arc<ParsedExpression>, SyntaxError> {
        let text = match source {
            Source::Parsed(parsed) => return Ok(parsed),
            Source::Text(text) => text,
        };

        let key = cache_key(&text, names);
        if let Some(parsed) = self.cache.get(&key) {
            debug!(%key, "parse cache hit");
            return Ok(parsed);
        }
        debug!(%key, "parse cache miss");

        let stream = tokenize(&text)?;
        let nodes = Parser::new(&self.functions).parse(stream, names)?;
        let parsed = Arc::new(ParsedExpression::new(Expression::new(text.into_owned()), nodes));
        self.cache.insert(key, Arc::clone(&parsed));
        Ok(parsed)
    }
}
