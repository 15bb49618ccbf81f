use regex::Regex;

use crate::{
    ast::{AccessKind, BinaryOperator, Node, UnaryOperator},
    functions::FunctionRegistry,
    value::{Array, Key, Number, Value, Values, type_name},
};

/// Errors that can occur while evaluating an expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// Operation applied to values of the wrong type
    #[error("{0}")]
    TypeError(String),

    /// Invalid property, method or item access
    #[error("{0}")]
    Access(String),

    /// Arithmetic failure other than division by zero
    #[error("{0}")]
    Arithmetic(String),

    /// `/` or `%` with a zero right operand; `operation` is `Division` or `Modulo`
    #[error("{operation} by zero.")]
    DivisionByZero { operation: &'static str },

    #[error("Regexp \"{pattern}\" passed to \"matches\" is not valid: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Variable \"{0}\" is not defined.")]
    UndefinedVariable(String),

    #[error("The function \"{0}\" does not exist.")]
    UndefinedFunction(String),

    #[error("Undefined constant \"{0}\".")]
    UndefinedConstant(String),

    /// Failure reported by a host function or method
    #[error("{0}")]
    Custom(String),
}

impl EvalError {
    pub fn custom(message: impl Into<String>) -> Self {
        EvalError::Custom(message.into())
    }
}

/// Walks a [`Node`] tree and computes its value.
///
/// The evaluator only borrows the function registry and the bindings, so one
/// parsed tree can be evaluated concurrently against different bindings.
pub struct Evaluator<'a> {
    functions: &'a FunctionRegistry,
    values: &'a Values,
}

impl<'a> Evaluator<'a> {
    pub fn new(functions: &'a FunctionRegistry, values: &'a Values) -> Self {
        Evaluator { functions, values }
    }

    pub fn evaluate(&self, node: &Node) -> Result<Value, EvalError> {
        match node {
            Node::Constant(value) => Ok(value.clone()),
            Node::Name(name) => self
                .values
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::UndefinedVariable(name.clone())),
            Node::NullCoalescedName(_) => Ok(Value::Null),
            Node::Unary { operator, operand } => {
                let value = self.evaluate(operand)?;
                apply_unary(*operator, value)
            }
            Node::Binary {
                operator,
                left,
                right,
            } => {
                let lhs = self.evaluate(left)?;
                match operator {
                    BinaryOperator::Or => {
                        return Ok(Value::Bool(lhs.is_truthy() || self.evaluate(right)?.is_truthy()));
                    }
                    BinaryOperator::And => {
                        return Ok(Value::Bool(lhs.is_truthy() && self.evaluate(right)?.is_truthy()));
                    }
                    _ => {}
                }
                let rhs = self.evaluate(right)?;
                apply_binary(*operator, lhs, rhs)
            }
            Node::Conditional {
                condition,
                if_true,
                if_false,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(if_true)
                } else {
                    self.evaluate(if_false)
                }
            }
            Node::NullCoalesce { left, right } => match self.evaluate_lenient(left)? {
                Some(value) if !value.is_null() => Ok(value),
                _ => self.evaluate(right),
            },
            Node::Array(elements) => {
                let mut array = Array::new();
                for element in elements {
                    match &element.key {
                        Some(key) => {
                            let key = Key::from_value(&self.evaluate(key)?)?;
                            array.insert(key, self.evaluate(&element.value)?);
                        }
                        None => array.push(self.evaluate(&element.value)?),
                    }
                }
                Ok(Value::Array(array))
            }
            Node::Function { name, arguments } => {
                let function = self
                    .functions
                    .get(name)
                    .ok_or_else(|| EvalError::UndefinedFunction(name.clone()))?;
                let arguments = self.evaluate_all(arguments)?;
                function.evaluate(self.values, arguments)
            }
            Node::GetAttr { .. } => Ok(self.evaluate_access(node, false)?.unwrap_or(Value::Null)),
        }
    }

    fn evaluate_all(&self, nodes: &[Node]) -> Result<Vec<Value>, EvalError> {
        nodes.iter().map(|node| self.evaluate(node)).collect()
    }

    /// Evaluates the left side of `??`: missing names, null targets, missing
    /// properties and missing keys yield `None` instead of failing.
    fn evaluate_lenient(&self, node: &Node) -> Result<Option<Value>, EvalError> {
        match node {
            Node::Name(name) => Ok(self.values.get(name).cloned()),
            Node::GetAttr { .. } => self.evaluate_access(node, true),
            _ => self.evaluate(node).map(Some),
        }
    }

    /// Evaluates a [`Node::GetAttr`]; `None` means a null-safe access short-circuited.
    fn evaluate_access(&self, node: &Node, coalescing: bool) -> Result<Option<Value>, EvalError> {
        let Node::GetAttr {
            target,
            attribute,
            arguments,
            access,
            null_safe,
        } = node
        else {
            return self.evaluate(node).map(Some);
        };

        let object = match target.as_ref() {
            Node::GetAttr { .. } => self.evaluate_access(target, coalescing)?,
            _ if coalescing => self.evaluate_lenient(target)?,
            _ => Some(self.evaluate(target)?),
        };
        let Some(object) = object else {
            return Ok(None);
        };
        if object.is_null() && (*null_safe || coalescing) {
            return Ok(None);
        }

        let member = node.member_name().unwrap_or_default();
        match access {
            AccessKind::Property => match &object {
                Value::Object(instance) => match instance.property(member) {
                    Some(value) => Ok(Some(value)),
                    None if coalescing => Ok(None),
                    None => Err(EvalError::Access(format!(
                        "Undefined property \"{member}\" of object \"{}\".",
                        instance.class_name()
                    ))),
                },
                Value::Enum(case) => match (member, case.backing_value()) {
                    ("name", _) => Ok(Some(Value::from(case.name()))),
                    ("value", Some(value)) => Ok(Some(value.clone())),
                    _ if coalescing => Ok(None),
                    _ => Err(EvalError::Access(format!(
                        "Undefined property \"{member}\" of object \"{}\".",
                        case.enum_name()
                    ))),
                },
                _ => Err(EvalError::Access(format!(
                    "Unable to get property \"{member}\" of non-object \"{target}\"."
                ))),
            },
            AccessKind::MethodCall => {
                let Value::Object(instance) = &object else {
                    return Err(EvalError::Access(format!(
                        "Unable to call method \"{member}\" of non-object \"{target}\"."
                    )));
                };
                let arguments = self.evaluate_all(arguments)?;
                match instance.call_method(member, arguments) {
                    Some(result) => result.map(Some),
                    None => Err(EvalError::Access(format!(
                        "Unable to call method \"{member}\" of object \"{}\".",
                        instance.class_name()
                    ))),
                }
            }
            AccessKind::ArrayIndex => {
                let Value::Array(array) = &object else {
                    return Err(EvalError::Access(format!(
                        "Unable to get an item of non-array \"{target}\"."
                    )));
                };
                let key = Key::from_value(&self.evaluate(attribute)?)?;
                match array.get(&key) {
                    Some(value) => Ok(Some(value.clone())),
                    None if coalescing => Ok(None),
                    None => Err(EvalError::Access(format!("Undefined array key {key}."))),
                }
            }
        }
    }
}

/// Evaluates `node` against `values`.
///
/// # Example
///
/// ```
/// use expression_language::{FunctionRegistry, Node, BinaryOperator, Value, Values, evaluate};
///
/// let node = Node::binary(BinaryOperator::Add, Node::constant(1), Node::name("a"));
/// let values = Values::from([("a".to_string(), Value::from(2))]);
/// assert_eq!(evaluate(&node, &FunctionRegistry::new(), &values), Ok(Value::from(3)));
/// ```
pub fn evaluate(node: &Node, functions: &FunctionRegistry, values: &Values) -> Result<Value, EvalError> {
    Evaluator::new(functions, values).evaluate(node)
}

// ============================================================================
// Operators
// ============================================================================

fn apply_unary(operator: UnaryOperator, value: Value) -> Result<Value, EvalError> {
    match operator {
        UnaryOperator::Not => Ok(Value::Bool(!value.is_truthy())),
        UnaryOperator::Negate => match value.to_number() {
            Some(Number::Integer(n)) => Ok(n
                .checked_neg()
                .map_or(Value::Float(-(n as f64)), Value::Integer)),
            Some(Number::Float(n)) => Ok(Value::Float(-n)),
            None => Err(EvalError::TypeError(format!(
                "Unsupported operand types: {} * int",
                type_name(&value)
            ))),
        },
        UnaryOperator::Plus => match value.to_number() {
            Some(number) => Ok(number.into_value()),
            None => Err(EvalError::TypeError(format!(
                "Unsupported operand types: {} * int",
                type_name(&value)
            ))),
        },
    }
}

fn apply_binary(operator: BinaryOperator, left: Value, right: Value) -> Result<Value, EvalError> {
    use BinaryOperator::*;

    match operator {
        Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
        And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
        Xor => Ok(Value::Bool(left.is_truthy() ^ right.is_truthy())),

        BitOr | BitXor | BitAnd | ShiftLeft | ShiftRight => {
            let (a, b) = integer_operands(operator, &left, &right)?;
            match operator {
                BitOr => Ok(Value::Integer(a | b)),
                BitXor => Ok(Value::Integer(a ^ b)),
                BitAnd => Ok(Value::Integer(a & b)),
                _ => shift(operator, a, b),
            }
        }

        Equal => Ok(Value::Bool(left.loose_eq(&right))),
        NotEqual => Ok(Value::Bool(!left.loose_eq(&right))),
        Identical => Ok(Value::Bool(left == right)),
        NotIdentical => Ok(Value::Bool(left != right)),

        Less | Greater | LessEqual | GreaterEqual => {
            let ordering = match left.compare(&right) {
                Some(ordering) => ordering,
                None if left.is_number() && right.is_number() => return Ok(Value::Bool(false)),
                None => {
                    return Err(EvalError::TypeError(format!(
                        "Cannot compare {} with {}",
                        type_name(&left),
                        type_name(&right)
                    )));
                }
            };
            Ok(Value::Bool(match operator {
                Less => ordering.is_lt(),
                Greater => ordering.is_gt(),
                LessEqual => ordering.is_le(),
                _ => ordering.is_ge(),
            }))
        }

        In | NotIn => {
            let Value::Array(haystack) = &right else {
                return Err(EvalError::TypeError(format!(
                    "in_array(): Argument #2 ($haystack) must be of type array, {} given",
                    type_name(&right)
                )));
            };
            let found = haystack.values().any(|candidate| *candidate == left);
            Ok(Value::Bool(if operator == In { found } else { !found }))
        }

        Matches => {
            let Value::String(pattern) = &right else {
                return Err(EvalError::TypeError(format!(
                    "The regex passed to \"matches\" must be a string, {} given",
                    type_name(&right)
                )));
            };
            let subject = string_operand(operator, &left)?;
            Ok(Value::Bool(compile_pattern(pattern)?.is_match(&subject)))
        }

        Contains | StartsWith | EndsWith => {
            let haystack = string_operand(operator, &left)?;
            let needle = string_operand(operator, &right)?;
            Ok(Value::Bool(match operator {
                Contains => haystack.contains(&needle),
                StartsWith => haystack.starts_with(&needle),
                _ => haystack.ends_with(&needle),
            }))
        }

        Range => range(&left, &right),

        Add => match (left, right) {
            (Value::Array(mut union), Value::Array(other)) => {
                for (key, value) in other {
                    if !union.contains_key(&key) {
                        union.insert(key, value);
                    }
                }
                Ok(Value::Array(union))
            }
            (left, right) => {
                let (a, b) = numeric_operands(operator, &left, &right)?;
                Ok(arithmetic(a, b, i64::checked_add, |x, y| x + y))
            }
        },
        Subtract => {
            let (a, b) = numeric_operands(operator, &left, &right)?;
            Ok(arithmetic(a, b, i64::checked_sub, |x, y| x - y))
        }
        Multiply => {
            let (a, b) = numeric_operands(operator, &left, &right)?;
            Ok(arithmetic(a, b, i64::checked_mul, |x, y| x * y))
        }
        Divide => {
            let (a, b) = numeric_operands(operator, &left, &right)?;
            if b.is_zero() {
                return Err(EvalError::DivisionByZero { operation: "Division" });
            }
            match (a, b) {
                (Number::Integer(x), Number::Integer(y)) if x.checked_rem(y) == Some(0) => Ok(x
                    .checked_div(y)
                    .map_or(Value::Float(x as f64 / y as f64), Value::Integer)),
                _ => Ok(Value::Float(a.as_f64() / b.as_f64())),
            }
        }
        Modulo => {
            let (a, b) = integer_operands(operator, &left, &right)?;
            if b == 0 {
                return Err(EvalError::DivisionByZero { operation: "Modulo" });
            }
            Ok(Value::Integer(a.checked_rem(b).unwrap_or(0)))
        }
        Power => {
            let (a, b) = numeric_operands(operator, &left, &right)?;
            match (a, b) {
                (Number::Integer(x), Number::Integer(y)) if y >= 0 => Ok(u32::try_from(y)
                    .ok()
                    .and_then(|y| x.checked_pow(y))
                    .map_or(Value::Float((x as f64).powf(y as f64)), Value::Integer)),
                _ => Ok(Value::Float(a.as_f64().powf(b.as_f64()))),
            }
        }
        Concat => {
            let mut result = string_operand(operator, &left)?;
            result.push_str(&string_operand(operator, &right)?);
            Ok(Value::String(result))
        }
    }
}

fn unsupported(operator: BinaryOperator, left: &Value, right: &Value) -> EvalError {
    EvalError::TypeError(format!(
        "Unsupported operand types: {} {} {}",
        type_name(left),
        operator.symbol(),
        type_name(right)
    ))
}

fn numeric_operands(operator: BinaryOperator, left: &Value, right: &Value) -> Result<(Number, Number), EvalError> {
    match (left.to_number(), right.to_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(unsupported(operator, left, right)),
    }
}

/// Integer view of both operands; floats are truncated.
fn integer_operands(operator: BinaryOperator, left: &Value, right: &Value) -> Result<(i64, i64), EvalError> {
    let integer = |value: &Value| match value.to_number() {
        Some(Number::Integer(n)) => Some(n),
        Some(Number::Float(n)) if n.is_finite() => Some(n.trunc() as i64),
        _ => None,
    };
    match (integer(left), integer(right)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(unsupported(operator, left, right)),
    }
}

fn string_operand(operator: BinaryOperator, value: &Value) -> Result<String, EvalError> {
    value.coerce_string().ok_or_else(|| {
        EvalError::TypeError(format!(
            "Operator \"{}\" expects a string, {} given",
            operator.symbol(),
            type_name(value)
        ))
    })
}

/// Integer arithmetic with promotion to float on overflow.
fn arithmetic(
    a: Number,
    b: Number,
    integer: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Value {
    match (a, b) {
        (Number::Integer(x), Number::Integer(y)) => integer(x, y)
            .map_or_else(|| Value::Float(float(x as f64, y as f64)), Value::Integer),
        _ => Value::Float(float(a.as_f64(), b.as_f64())),
    }
}

fn shift(operator: BinaryOperator, value: i64, by: i64) -> Result<Value, EvalError> {
    if by < 0 {
        return Err(EvalError::Arithmetic("Bit shift by negative number".to_string()));
    }
    let result = match (operator, by) {
        (BinaryOperator::ShiftLeft, 64..) => 0,
        (BinaryOperator::ShiftLeft, _) => value.wrapping_shl(by as u32),
        (_, 64..) => {
            if value < 0 {
                -1
            } else {
                0
            }
        }
        _ => value >> by,
    };
    Ok(Value::Integer(result))
}

/// Largest number of items a range may produce.
pub const MAX_RANGE_ITEMS: u64 = 1 << 24;

fn range_too_large() -> EvalError {
    EvalError::Arithmetic("The supplied range exceeds the maximum array size".to_string())
}

/// Inclusive range, descending when `left > right`.
///
/// Integers step by 1; single-character strings produce a character range.
fn range(left: &Value, right: &Value) -> Result<Value, EvalError> {
    if let (Value::String(a), Value::String(b)) = (left, right)
        && let ([x], [y]) = (a.as_bytes(), b.as_bytes())
        && !x.is_ascii_digit()
        && !y.is_ascii_digit()
    {
        let items: Vec<Value> = if x <= y {
            (*x..=*y).map(|c| Value::from((c as char).to_string())).collect()
        } else {
            (*y..=*x).rev().map(|c| Value::from((c as char).to_string())).collect()
        };
        return Ok(Value::from(items));
    }

    let (a, b) = numeric_operands(BinaryOperator::Range, left, right)?;
    match (a, b) {
        (Number::Integer(start), Number::Integer(end)) => {
            // i128 holds the distance between any two i64 values
            let count = (i128::from(end) - i128::from(start)).unsigned_abs() + 1;
            if count > u128::from(MAX_RANGE_ITEMS) {
                return Err(range_too_large());
            }
            let items: Vec<Value> = if start <= end {
                (start..=end).map(Value::Integer).collect()
            } else {
                (end..=start).rev().map(Value::Integer).collect()
            };
            Ok(Value::from(items))
        }
        _ => {
            let (start, end) = (a.as_f64(), b.as_f64());
            if !start.is_finite() || !end.is_finite() {
                return Err(EvalError::Arithmetic(
                    "range(): Argument #1 ($start) must be a finite number".to_string(),
                ));
            }
            let distance = (end - start).abs().floor();
            if !distance.is_finite() || distance >= MAX_RANGE_ITEMS as f64 {
                return Err(range_too_large());
            }
            let steps = distance as u64;
            let direction = if start <= end { 1.0 } else { -1.0 };
            Ok(Value::from(
                (0..=steps)
                    .map(|i| Value::Float(start + direction * i as f64))
                    .collect::<Vec<_>>(),
            ))
        }
    }
}

// ============================================================================
// Patterns
// ============================================================================

/// A pattern split at its delimiters.
struct Delimited<'p> {
    body: &'p str,
    closing: char,
    modifiers: &'p str,
}

fn invalid_pattern(pattern: &str, reason: &str) -> EvalError {
    EvalError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    }
}

/// Splits `/body/modifiers` and checks the delimiter and the modifiers.
///
/// Bracket delimiters close with their counterpart.
fn split_pattern(pattern: &str) -> Result<Delimited<'_>, EvalError> {
    let trimmed = pattern.trim_start();
    let mut chars = trimmed.chars();
    let Some(delimiter) = chars.next() else {
        return Err(invalid_pattern(pattern, "empty pattern"));
    };
    if delimiter.is_alphanumeric() || delimiter == '\\' {
        return Err(invalid_pattern(pattern, "delimiter must not be alphanumeric or backslash"));
    }
    let closing = match delimiter {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        '<' => '>',
        other => other,
    };

    let rest = chars.as_str();
    let Some(end) = rest.rfind(closing) else {
        return Err(invalid_pattern(pattern, &format!("no ending delimiter '{closing}' found")));
    };
    let modifiers = &rest[end + closing.len_utf8()..];
    if let Some(other) = modifiers
        .chars()
        .find(|m| !matches!(m, 'i' | 'm' | 's' | 'x' | 'U' | 'u' | 'D' | 'A' | 'S' | 'X' | 'J' | 'n' | '\n' | ' '))
    {
        return Err(invalid_pattern(pattern, &format!("unknown modifier '{other}'")));
    }

    Ok(Delimited {
        body: &rest[..end],
        closing,
        modifiers,
    })
}

/// Checks the delimiters and modifiers of a pattern, leaving the body to the
/// regex engine that eventually runs it.
pub(crate) fn check_pattern(pattern: &str) -> Result<(), EvalError> {
    split_pattern(pattern).map(|_| ())
}

/// Compiles a delimited pattern such as `/^a.c$/i` into a [`Regex`].
///
/// Modifiers `i m s x U` become inline flags and `A` anchors at the start;
/// `u D S X` have no effect. The body uses the `regex` crate's syntax, so
/// look-around and backreferences are reported as invalid.
pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, EvalError> {
    let delimited = split_pattern(pattern)?;

    let mut body = unescape_delimiter(delimited.body, delimited.closing);
    let mut flags = String::new();
    for modifier in delimited.modifiers.chars() {
        match modifier {
            'i' | 'm' | 's' | 'x' | 'U' => flags.push(modifier),
            'A' => body = format!("\\A(?:{body})"),
            'J' | 'n' => {
                return Err(invalid_pattern(pattern, &format!("modifier '{modifier}' is not supported")));
            }
            _ => {}
        }
    }
    if !flags.is_empty() {
        body = format!("(?{flags}){body}");
    }

    Regex::new(&body).map_err(|e| invalid_pattern(pattern, &e.to_string()))
}

/// Drops the backslash in front of an escaped delimiter that has no meaning
/// as a regex escape.
fn unescape_delimiter(body: &str, delimiter: char) -> String {
    if regex_syntax_meta(delimiter) {
        return body.to_string();
    }
    let mut result = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(next) if next == delimiter => result.push(next),
                Some(next) => {
                    result.push('\\');
                    result.push(next);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(ch);
        }
    }
    result
}

fn regex_syntax_meta(c: char) -> bool {
    matches!(
        c,
        '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$' | '#' | '&' | '-' | '~'
    )
}
