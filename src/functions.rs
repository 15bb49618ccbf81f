//! Functions callable from expressions.
//!
//! Every function carries two implementations that must agree: a compiler that
//! turns already-compiled argument sources into a source fragment, and an
//! evaluator that computes the result from runtime values.

use std::{cmp::Ordering, collections::BTreeMap, fmt, sync::Arc};

use crate::{
    evaluator::EvalError,
    value::{Value, Values, type_name},
};

type CompilerFn = dyn Fn(&[String]) -> String + Send + Sync;
type EvaluatorFn = dyn Fn(&Values, Vec<Value>) -> Result<Value, EvalError> + Send + Sync;

/// Host constants visible to the `constant()` and `enum()` built-ins.
pub type Constants = BTreeMap<String, Value>;

/// A function available to expressions.
#[derive(Clone)]
pub struct ExpressionFunction {
    name: String,
    compiler: Arc<CompilerFn>,
    evaluator: Arc<EvaluatorFn>,
}

impl ExpressionFunction {
    pub fn new<C, E>(name: impl Into<String>, compiler: C, evaluator: E) -> Self
    where
        C: Fn(&[String]) -> String + Send + Sync + 'static,
        E: Fn(&Values, Vec<Value>) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        ExpressionFunction {
            name: name.into(),
            compiler: Arc::new(compiler),
            evaluator: Arc::new(evaluator),
        }
    }

    /// A function that compiles to a call of the host function of the same name.
    ///
    /// # Example
    ///
    /// ```
    /// use expression_language::{ExpressionFunction, Value};
    ///
    /// let upper = ExpressionFunction::native("strtoupper", |_, args| {
    ///     Ok(Value::from(args[0].as_str().unwrap_or_default().to_uppercase()))
    /// });
    /// assert_eq!(upper.compile(&["\"foo\"".to_string()]), "\\strtoupper(\"foo\")");
    /// ```
    pub fn native<E>(function: &str, evaluator: E) -> Self
    where
        E: Fn(&Values, Vec<Value>) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Self::native_as(function, function, evaluator)
    }

    /// Like [`ExpressionFunction::native`], exposing the host function under another
    /// name. Namespaced host functions (`App\format`) need this.
    pub fn native_as<E>(name: &str, function: &str, evaluator: E) -> Self
    where
        E: Fn(&Values, Vec<Value>) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        ExpressionFunction::new(name, native_compiler(function), evaluator)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn compile(&self, arguments: &[String]) -> String {
        (self.compiler)(arguments)
    }

    pub fn evaluate(&self, values: &Values, arguments: Vec<Value>) -> Result<Value, EvalError> {
        (self.evaluator)(values, arguments)
    }
}

impl fmt::Debug for ExpressionFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn native_compiler(function: &str) -> impl Fn(&[String]) -> String + Send + Sync + 'static {
    let function = function.trim_start_matches('\\').to_string();
    move |arguments| format!("\\{}({})", function, arguments.join(", "))
}

/// A bundle of functions registered together.
pub trait FunctionProvider {
    fn functions(&self) -> Vec<ExpressionFunction>;
}

impl FunctionProvider for Vec<ExpressionFunction> {
    fn functions(&self) -> Vec<ExpressionFunction> {
        self.clone()
    }
}

/// Registered functions by name. Later registrations replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, ExpressionFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, function: ExpressionFunction) {
        self.functions.insert(function.name.clone(), function);
    }

    pub fn get(&self, name: &str) -> Option<&ExpressionFunction> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Extend<ExpressionFunction> for FunctionRegistry {
    fn extend<T: IntoIterator<Item = ExpressionFunction>>(&mut self, iter: T) {
        for function in iter {
            self.add(function);
        }
    }
}

// ============================================================================
// Built-in functions
// ============================================================================

/// `constant`, `enum`, `min` and `max`.
pub(crate) fn builtins(constants: Arc<Constants>) -> Vec<ExpressionFunction> {
    vec![
        constant_function(Arc::clone(&constants)),
        enum_function(constants),
        ExpressionFunction::native("min", |_, args| extremum("min", args, Ordering::Less)),
        ExpressionFunction::native("max", |_, args| extremum("max", args, Ordering::Greater)),
    ]
}

fn constant_function(constants: Arc<Constants>) -> ExpressionFunction {
    ExpressionFunction::new("constant", native_compiler("constant"), move |_, args| {
        let name = string_argument("constant", &args)?;
        constants
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UndefinedConstant(name.to_string()))
    })
}

fn enum_function(constants: Arc<Constants>) -> ExpressionFunction {
    ExpressionFunction::new(
        "enum",
        |args| {
            let name = args.first().map(String::as_str).unwrap_or("null");
            format!(
                "(\\is_object($constant = \\constant({name})) && $constant instanceof \\UnitEnum) ? $constant : throw new \\TypeError(\\sprintf('The string \"%s\" is not the name of a valid enum case.', {name}))"
            )
        },
        move |_, args| {
            let name = string_argument("enum", &args)?;
            match constants.get(name) {
                Some(case @ Value::Enum(_)) => Ok(case.clone()),
                Some(_) => Err(EvalError::TypeError(format!(
                    "The string \"{name}\" is not the name of a valid enum case."
                ))),
                None => Err(EvalError::UndefinedConstant(name.to_string())),
            }
        },
    )
}

fn string_argument<'a>(function: &str, args: &'a [Value]) -> Result<&'a str, EvalError> {
    match args.first() {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(EvalError::TypeError(format!(
            "{function}(): Argument #1 ($name) must be of type string, {} given",
            type_name(other)
        ))),
        None => Err(EvalError::TypeError(format!(
            "{function}() expects exactly 1 argument, 0 given"
        ))),
    }
}

/// Smallest (`Less`) or largest (`Greater`) argument; a single array argument
/// is searched instead. Ties keep the first candidate.
fn extremum(function: &str, args: Vec<Value>, wanted: Ordering) -> Result<Value, EvalError> {
    let candidates: Vec<Value> = match <[Value; 1]>::try_from(args) {
        Ok([Value::Array(array)]) => array.into_iter().map(|(_, v)| v).collect(),
        Ok([other]) => {
            return Err(EvalError::TypeError(format!(
                "{function}(): Argument #1 ($value) must be of type array, {} given",
                type_name(&other)
            )));
        }
        Err(args) => args,
    };

    let mut candidates = candidates.into_iter();
    let Some(mut best) = candidates.next() else {
        return Err(EvalError::TypeError(format!(
            "{function}(): Argument #1 ($value) must contain at least one element"
        )));
    };
    for candidate in candidates {
        if candidate.compare(&best) == Some(wanted) {
            best = candidate;
        }
    }
    Ok(best)
}
