use std::fmt;

use super::operators::{BinaryOperator, UnaryOperator};
use crate::value::{Key, Value, format_float};

/// How a [`Node::GetAttr`] reaches into its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// `target.name`
    Property,
    /// `target.name(arguments)`
    MethodCall,
    /// `target[key]`
    ArrayIndex,
}

/// One entry of an array or hash literal.
///
/// List literals leave `key` empty; the evaluator assigns the next free index.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayElement {
    pub key: Option<Node>,
    pub value: Node,
}

/// Expression tree.
///
/// Trees own their children and are never mutated after parsing. The evaluator
/// and the compiler each walk the tree with their own exhaustive `match`.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal value
    ///
    /// # Examples
    /// ```text
    /// 42
    /// "hello"
    /// true
    /// null
    /// ```
    Constant(Value),

    /// Bound variable; holds the identifier used in compiled output
    Name(String),

    /// Unknown variable directly on the left of `??`
    ///
    /// # Examples
    /// ```text
    /// missing ?? "default"
    /// ```
    NullCoalescedName(String),

    Unary {
        operator: UnaryOperator,
        operand: Box<Node>,
    },

    Binary {
        operator: BinaryOperator,
        left: Box<Node>,
        right: Box<Node>,
    },

    /// `condition ? if_true : if_false`, also produced by `a ?: b` and `a ? b`
    Conditional {
        condition: Box<Node>,
        if_true: Box<Node>,
        if_false: Box<Node>,
    },

    /// `left ?? right`
    NullCoalesce {
        left: Box<Node>,
        right: Box<Node>,
    },

    /// List (`[1, 2]`) or hash (`{a: 1}`) literal
    Array(Vec<ArrayElement>),

    /// Call of a registered function
    ///
    /// # Examples
    /// ```text
    /// constant("PHP_VERSION")
    /// max(a, b)
    /// ```
    Function { name: String, arguments: Vec<Node> },

    /// Property read, method call or array index
    ///
    /// For property and method access `attribute` is a string constant holding
    /// the member name; for index access it is the key expression. `arguments`
    /// is only used by method calls.
    ///
    /// # Examples
    /// ```text
    /// user.name
    /// user?.address.city
    /// user.isAdmin()
    /// items[0]
    /// ```
    GetAttr {
        target: Box<Node>,
        attribute: Box<Node>,
        arguments: Vec<Node>,
        access: AccessKind,
        null_safe: bool,
    },
}

impl Node {
    pub fn constant(value: impl Into<Value>) -> Self {
        Node::Constant(value.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        Node::Name(name.into())
    }

    pub fn unary(operator: UnaryOperator, operand: Node) -> Self {
        Node::Unary {
            operator,
            operand: Box::new(operand),
        }
    }

    pub fn binary(operator: BinaryOperator, left: Node, right: Node) -> Self {
        Node::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn conditional(condition: Node, if_true: Node, if_false: Node) -> Self {
        Node::Conditional {
            condition: Box::new(condition),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }

    pub fn null_coalesce(left: Node, right: Node) -> Self {
        Node::NullCoalesce {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn function(name: impl Into<String>, arguments: Vec<Node>) -> Self {
        Node::Function {
            name: name.into(),
            arguments,
        }
    }

    pub fn property(target: Node, name: impl Into<String>, null_safe: bool) -> Self {
        Node::GetAttr {
            target: Box::new(target),
            attribute: Box::new(Node::Constant(Value::String(name.into()))),
            arguments: Vec::new(),
            access: AccessKind::Property,
            null_safe,
        }
    }

    pub fn method_call(target: Node, name: impl Into<String>, arguments: Vec<Node>, null_safe: bool) -> Self {
        Node::GetAttr {
            target: Box::new(target),
            attribute: Box::new(Node::Constant(Value::String(name.into()))),
            arguments,
            access: AccessKind::MethodCall,
            null_safe,
        }
    }

    pub fn index(target: Node, key: Node) -> Self {
        Node::GetAttr {
            target: Box::new(target),
            attribute: Box::new(key),
            arguments: Vec::new(),
            access: AccessKind::ArrayIndex,
            null_safe: false,
        }
    }

    /// Member name of a property or method access.
    pub fn member_name(&self) -> Option<&str> {
        match self {
            Node::GetAttr {
                attribute,
                access: AccessKind::Property | AccessKind::MethodCall,
                ..
            } => match attribute.as_ref() {
                Node::Constant(Value::String(name)) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }
}

fn dump_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '\0' => f.write_str("\\000")?,
            '\t' => f.write_str("\\t")?,
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

fn dump_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => f.write_str("null"),
        Value::Bool(b) => write!(f, "{b}"),
        Value::Integer(n) => write!(f, "{n}"),
        Value::Float(n) => f.write_str(&format_float(*n)),
        Value::String(s) => dump_string(f, s),
        Value::Array(array) if array.is_list() => {
            f.write_str("[")?;
            for (i, item) in array.values().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                dump_value(f, item)?;
            }
            f.write_str("]")
        }
        Value::Array(array) => {
            f.write_str("{")?;
            for (i, (key, item)) in array.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                match key {
                    Key::Integer(n) => write!(f, "{n}")?,
                    Key::String(s) => dump_string(f, s)?,
                }
                f.write_str(": ")?;
                dump_value(f, item)?;
            }
            f.write_str("}")
        }
        Value::Object(object) => f.write_str(object.class_name()),
        Value::Enum(case) => f.write_str(&case.qualified_name()),
    }
}

fn dump_list(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{node}")?;
    }
    Ok(())
}

/// Renders the node back as expression source.
///
/// Used in error messages to point at the offending sub-expression.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Constant(value) => dump_value(f, value),
            Node::Name(name) | Node::NullCoalescedName(name) => f.write_str(name),
            Node::Unary { operator, operand } => match operator {
                UnaryOperator::Not => write!(f, "(not {operand})"),
                _ => write!(f, "({}{operand})", operator.symbol()),
            },
            Node::Binary { operator, left, right } => {
                write!(f, "({left} {} {right})", operator.symbol())
            }
            Node::Conditional { condition, if_true, if_false } => {
                write!(f, "({condition} ? {if_true} : {if_false})")
            }
            Node::NullCoalesce { left, right } => write!(f, "({left}) ?? ({right})"),
            Node::Array(elements) => {
                if elements.iter().all(|e| e.key.is_none()) {
                    f.write_str("[")?;
                    for (i, element) in elements.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", element.value)?;
                    }
                    f.write_str("]")
                } else {
                    f.write_str("{")?;
                    for (i, element) in elements.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        match &element.key {
                            Some(key) => write!(f, "{key}: {}", element.value)?,
                            None => write!(f, "{}", element.value)?,
                        }
                    }
                    f.write_str("}")
                }
            }
            Node::Function { name, arguments } => {
                write!(f, "{name}(")?;
                dump_list(f, arguments)?;
                f.write_str(")")
            }
            Node::GetAttr {
                target,
                attribute,
                arguments,
                access,
                ..
            } => {
                let member = self.member_name().unwrap_or_default();
                match access {
                    AccessKind::Property => write!(f, "{target}.{member}"),
                    AccessKind::MethodCall => {
                        write!(f, "{target}.{member}(")?;
                        dump_list(f, arguments)?;
                        f.write_str(")")
                    }
                    AccessKind::ArrayIndex => write!(f, "{target}[{attribute}]"),
                }
            }
        }
    }
}
