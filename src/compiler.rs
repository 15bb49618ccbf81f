use crate::{
    ast::{AccessKind, BinaryOperator, Node, UnaryOperator},
    error::SyntaxError,
    evaluator::check_pattern,
    functions::FunctionRegistry,
    value::{Key, Value},
};

/// Turns a [`Node`] tree into an equivalent PHP expression.
///
/// Every node compiles to a self-contained string built from its children's
/// strings; nothing is shared between sub-compilations.
///
/// # Example
///
/// ```
/// use expression_language::{BinaryOperator, Compiler, FunctionRegistry, Node};
///
/// let registry = FunctionRegistry::new();
/// let node = Node::binary(BinaryOperator::Concat, Node::name("a"), Node::constant("!"));
/// assert_eq!(Compiler::new(&registry).compile(&node).unwrap(), "($a . \"!\")");
/// ```
pub struct Compiler<'a> {
    functions: &'a FunctionRegistry,
}

impl<'a> Compiler<'a> {
    pub fn new(functions: &'a FunctionRegistry) -> Self {
        Compiler { functions }
    }

    pub fn compile(&self, node: &Node) -> Result<String, SyntaxError> {
        match node {
            Node::Constant(value) => constant(value),
            Node::Name(name) | Node::NullCoalescedName(name) => Ok(format!("${name}")),
            Node::Unary { operator, operand } => {
                let symbol = match operator {
                    UnaryOperator::Not => "!",
                    UnaryOperator::Negate => "-",
                    UnaryOperator::Plus => "+",
                };
                Ok(format!("({symbol}{})", self.compile(operand)?))
            }
            Node::Binary {
                operator,
                left,
                right,
            } => self.compile_binary(*operator, left, right),
            Node::Conditional {
                condition,
                if_true,
                if_false,
            } => Ok(format!(
                "(({}) ? ({}) : ({}))",
                self.compile(condition)?,
                self.compile(if_true)?,
                self.compile(if_false)?
            )),
            Node::NullCoalesce { left, right } => Ok(format!(
                "(({}) ?? ({}))",
                self.compile(left)?,
                self.compile(right)?
            )),
            Node::Array(elements) => {
                let implicit = elements.iter().all(|e| e.key.is_none());
                let mut entries = Vec::with_capacity(elements.len());
                for (index, element) in elements.iter().enumerate() {
                    let value = self.compile(&element.value)?;
                    entries.push(match &element.key {
                        Some(key) => format!("{} => {value}", self.compile(key)?),
                        None if implicit => format!("{index} => {value}"),
                        None => value,
                    });
                }
                Ok(format!("[{}]", entries.join(", ")))
            }
            Node::Function { name, arguments } => {
                let Some(function) = self.functions.get(name) else {
                    return Err(SyntaxError::new(
                        format!("The function \"{name}\" does not exist."),
                        0,
                        "",
                    ));
                };
                let arguments = self.compile_all(arguments)?;
                Ok(function.compile(&arguments))
            }
            Node::GetAttr {
                target,
                attribute,
                arguments,
                access,
                null_safe,
            } => {
                let target = self.compile(target)?;
                let arrow = if *null_safe { "?->" } else { "->" };
                let member = node.member_name().unwrap_or_default();
                match access {
                    AccessKind::Property => Ok(format!("{target}{arrow}{member}")),
                    AccessKind::MethodCall => Ok(format!(
                        "{target}{arrow}{member}({})",
                        self.compile_all(arguments)?.join(", ")
                    )),
                    AccessKind::ArrayIndex => Ok(format!("{target}[{}]", self.compile(attribute)?)),
                }
            }
        }
    }

    fn compile_all(&self, nodes: &[Node]) -> Result<Vec<String>, SyntaxError> {
        nodes.iter().map(|node| self.compile(node)).collect()
    }

    fn compile_binary(&self, operator: BinaryOperator, left: &Node, right: &Node) -> Result<String, SyntaxError> {
        use BinaryOperator::*;

        if operator == Matches {
            return self.compile_matches(left, right);
        }

        let (l, r) = (self.compile(left)?, self.compile(right)?);
        let compiled = match operator {
            Power => format!("\\pow({l}, {r})"),
            Range => format!("\\range({l}, {r})"),
            In => format!("\\in_array({l}, {r}, true)"),
            NotIn => format!("!\\in_array({l}, {r}, true)"),
            Contains => format!("\\str_contains({l}, {r})"),
            StartsWith => format!("\\str_starts_with({l}, {r})"),
            EndsWith => format!("\\str_ends_with({l}, {r})"),
            _ => {
                let symbol = match operator {
                    Or => "||",
                    And => "&&",
                    Concat => ".",
                    other => other.symbol(),
                };
                format!("({l} {symbol} {r})")
            }
        };
        Ok(compiled)
    }

    /// `matches` becomes an immediately invoked closure around `preg_match`.
    ///
    /// Constant patterns get their delimiters and modifiers checked now. A
    /// binary right operand must be a `~` concatenation; any other node is
    /// left for `preg_match` to judge at runtime.
    fn compile_matches(&self, left: &Node, right: &Node) -> Result<String, SyntaxError> {
        match right {
            Node::Constant(Value::String(pattern)) => {
                check_pattern(pattern).map_err(|e| SyntaxError::new(e.to_string(), 0, ""))?;
            }
            Node::Binary { operator, .. } if *operator != BinaryOperator::Concat => {
                return Err(SyntaxError::new(
                    "The regex passed to \"matches\" must be a string.",
                    0,
                    "",
                ));
            }
            _ => {}
        }

        Ok(format!(
            "(static function ($regexp, $str) {{ set_error_handler(static fn ($t, $m) => throw new \\InvalidArgumentException(\\sprintf('Regexp \"%s\" passed to \"matches\" is not valid', $regexp).\\substr($m, 12))); try {{ return 1 === \\preg_match($regexp, (string) $str); }} finally {{ \\restore_error_handler(); }} }})({}, {})",
            self.compile(right)?,
            self.compile(left)?
        ))
    }
}

/// PHP literal for a constant value.
fn constant(value: &Value) -> Result<String, SyntaxError> {
    let literal = match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Integer(i64::MIN) => "(-9223372036854775807 - 1)".to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Float(n) => float_literal(*n),
        Value::String(s) => string_literal(s),
        Value::Array(array) => {
            let mut entries = Vec::with_capacity(array.len());
            for (key, item) in array.iter() {
                let key = match key {
                    Key::Integer(n) => n.to_string(),
                    Key::String(s) => string_literal(s),
                };
                entries.push(format!("{key} => {}", constant(item)?));
            }
            format!("[{}]", entries.join(", "))
        }
        Value::Enum(case) => format!("\\constant({})", string_literal(&case.qualified_name())),
        Value::Object(object) => {
            return Err(SyntaxError::new(
                format!(
                    "Cannot compile an instance of \"{}\" as a constant.",
                    object.class_name()
                ),
                0,
                "",
            ));
        }
    };
    Ok(literal)
}

/// Double-quoted PHP string with `\0`, tab, `"`, `$` and `\` escaped.
pub fn string_literal(s: &str) -> String {
    let mut literal = String::with_capacity(s.len() + 2);
    literal.push('"');
    for c in s.chars() {
        match c {
            '\0' => literal.push_str("\\000"),
            '\t' => literal.push_str("\\t"),
            '"' => literal.push_str("\\\""),
            '$' => literal.push_str("\\$"),
            '\\' => literal.push_str("\\\\"),
            c => literal.push(c),
        }
    }
    literal.push('"');
    literal
}

/// Locale-independent float literal that stays a float when read back.
fn float_literal(n: f64) -> String {
    if n.is_nan() {
        "NAN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "INF".to_string() } else { "-INF".to_string() }
    } else if n.fract() == 0.0 {
        format!("{n:.1}")
    } else {
        n.to_string()
    }
}
