use std::{cmp::Ordering, collections::BTreeMap, collections::HashMap, fmt, sync::Arc};

use crate::evaluator::EvalError;

/// Variable bindings handed to the evaluator, keyed by variable name.
pub type Values = HashMap<String, Value>;

/// A runtime value produced or consumed by expressions.
///
/// The model follows the host language the compiler targets: scalars,
/// ordered arrays whose keys are integers or strings, host objects and
/// enumeration cases.
///
/// # Examples
///
/// ```
/// use expression_language::{Array, Value};
///
/// let list: Array = vec![Value::from(1), Value::from("two")].into_iter().collect();
/// assert_eq!(list.len(), 2);
/// assert!(Value::from(list).is_truthy());
/// assert!(!Value::from("0").is_truthy());
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Ordered key/value container, used for both lists and maps.
    Array(Array),
    /// Host object exposing properties and methods.
    Object(Arc<dyn Object>),
    /// Case of a host enumeration.
    Enum(EnumCase),
}

/// Numeric view of a value, used by arithmetic and comparisons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub(crate) fn as_f64(self) -> f64 {
        match self {
            Number::Integer(n) => n as f64,
            Number::Float(n) => n,
        }
    }

    pub(crate) fn is_zero(self) -> bool {
        match self {
            Number::Integer(n) => n == 0,
            Number::Float(n) => n == 0.0,
        }
    }

    pub(crate) fn into_value(self) -> Value {
        match self {
            Number::Integer(n) => Value::Integer(n),
            Number::Float(n) => Value::Float(n),
        }
    }

    fn partial_cmp(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

/// Parses a numeric string: optional surrounding whitespace, an optional sign,
/// digits with an optional fraction and exponent.
pub(crate) fn parse_numeric(s: &str) -> Option<Number> {
    let trimmed = s.trim_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c'));
    let bytes = trimmed.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    let int_digits = i - int_start;
    let mut is_float = false;
    let mut frac_digits = 0;
    if bytes.get(i) == Some(&b'.') {
        is_float = true;
        i += 1;
        let frac_start = i;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        frac_digits = i - frac_start;
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_start = j;
        while bytes.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        if j > exp_start {
            is_float = true;
            i = j;
        }
    }
    if i != bytes.len() {
        return None;
    }
    if !is_float && let Ok(n) = trimmed.parse::<i64>() {
        return Some(Number::Integer(n));
    }
    trimmed.parse::<f64>().ok().map(Number::Float)
}

/// Significant digits kept when a float is turned into a string.
const FLOAT_PRECISION: i32 = 14;

/// Formats a float the way string conversion renders it: 14 significant
/// digits, trailing zeros dropped, exponent form (`1.0E+25`) when the decimal
/// point falls more than 14 places left or 4 places right of the first digit.
pub(crate) fn format_float(n: f64) -> String {
    if n.is_nan() {
        return "NAN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "INF".to_string() } else { "-INF".to_string() };
    }
    if n == 0.0 {
        return if n.is_sign_negative() { "-0".to_string() } else { "0".to_string() };
    }

    let scientific = format!("{:.*e}", (FLOAT_PRECISION - 1) as usize, n.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return n.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return n.to_string();
    };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let digits = digits.trim_end_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };

    let sign = if n < 0.0 { "-" } else { "" };
    let point = exponent + 1;
    if point < -3 || point > FLOAT_PRECISION {
        let (first, rest) = digits.split_at(1);
        let rest = if rest.is_empty() { "0" } else { rest };
        let exponent_sign = if exponent < 0 { '-' } else { '+' };
        format!("{sign}{first}.{rest}E{exponent_sign}{}", exponent.abs())
    } else if point <= 0 {
        format!("{sign}0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
    } else if digits.len() <= point as usize {
        format!("{sign}{digits}{}", "0".repeat(point as usize - digits.len()))
    } else {
        let (whole, fraction) = digits.split_at(point as usize);
        format!("{sign}{whole}.{fraction}")
    }
}

impl Value {
    /// Wraps a host object.
    pub fn object(object: impl Object + 'static) -> Self {
        Value::Object(Arc::new(object))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness used by conditions and logical operators.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::String(s) => !s.is_empty() && s != "0",
            Value::Array(array) => !array.is_empty(),
            Value::Object(_) | Value::Enum(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub(crate) fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Numeric view: null and booleans count as 0/1, numeric strings are parsed.
    pub(crate) fn to_number(&self) -> Option<Number> {
        match self {
            Value::Null => Some(Number::Integer(0)),
            Value::Bool(b) => Some(Number::Integer(i64::from(*b))),
            Value::Integer(n) => Some(Number::Integer(*n)),
            Value::Float(n) => Some(Number::Float(*n)),
            Value::String(s) => parse_numeric(s),
            _ => None,
        }
    }

    /// String conversion used by concatenation and string operators.
    pub fn coerce_string(&self) -> Option<String> {
        match self {
            Value::Null => Some(String::new()),
            Value::Bool(true) => Some("1".to_string()),
            Value::Bool(false) => Some(String::new()),
            Value::Integer(n) => Some(n.to_string()),
            Value::Float(n) => Some(format_float(*n)),
            Value::String(s) => Some(s.clone()),
            Value::Object(object) => object.to_text(),
            Value::Array(_) | Value::Enum(_) => None,
        }
    }

    /// Loose (`==`) equality: compares across types after conversion.
    pub fn loose_eq(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), b) | (b, Bool(a)) => *a == b.is_truthy(),
            (Null, String(s)) | (String(s), Null) => s.is_empty(),
            (Null, x) | (x, Null) => !x.is_truthy(),
            (String(a), String(b)) => match (parse_numeric(a), parse_numeric(b)) {
                (Some(x), Some(y)) => x.partial_cmp(y) == Some(Ordering::Equal),
                _ => a == b,
            },
            (String(s), n @ (Integer(_) | Float(_))) | (n @ (Integer(_) | Float(_)), String(s)) => {
                match (parse_numeric(s), n.to_number()) {
                    (Some(x), Some(y)) => x.partial_cmp(y) == Some(Ordering::Equal),
                    _ => n.coerce_string().as_deref() == Some(s.as_str()),
                }
            }
            (a @ (Integer(_) | Float(_)), b @ (Integer(_) | Float(_))) => {
                match (a.to_number(), b.to_number()) {
                    (Some(x), Some(y)) => x.partial_cmp(y) == Some(Ordering::Equal),
                    _ => false,
                }
            }
            (Array(a), Array(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(key, value)| b.get(key).is_some_and(|other| value.loose_eq(other)))
            }
            (Object(a), Object(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            (Enum(a), Enum(b)) => a == b,
            _ => false,
        }
    }

    /// Ordering used by `<`, `>`, `<=`, `>=`, `min` and `max`.
    ///
    /// Returns `None` for pairs that have no meaningful order.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (String(a), String(b)) => match (parse_numeric(a), parse_numeric(b)) {
                (Some(x), Some(y)) => x.partial_cmp(y),
                _ => Some(a.cmp(b)),
            },
            (Bool(_), _) | (_, Bool(_)) => Some(self.is_truthy().cmp(&other.is_truthy())),
            (Null, String(b)) => Some("".cmp(b.as_str())),
            (String(a), Null) => Some(a.as_str().cmp("")),
            (Null, _) | (_, Null) => Some(self.is_truthy().cmp(&other.is_truthy())),
            (Array(a), Array(b)) => {
                if a.len() != b.len() {
                    return Some(a.len().cmp(&b.len()));
                }
                for (key, value) in a.iter() {
                    match value.compare(b.get(key)?)? {
                        Ordering::Equal => continue,
                        ordering => return Some(ordering),
                    }
                }
                Some(Ordering::Equal)
            }
            (String(s), n @ (Integer(_) | Float(_))) => match parse_numeric(s) {
                Some(x) => x.partial_cmp(n.to_number()?),
                None => Some(s.as_str().cmp(n.coerce_string()?.as_str())),
            },
            (n @ (Integer(_) | Float(_)), String(s)) => match parse_numeric(s) {
                Some(y) => n.to_number()?.partial_cmp(y),
                None => Some(n.coerce_string()?.as_str().cmp(s.as_str())),
            },
            (a @ (Integer(_) | Float(_)), b @ (Integer(_) | Float(_))) => {
                a.to_number()?.partial_cmp(b.to_number()?)
            }
            _ => None,
        }
    }
}

/// Human-readable type name of a value, as used in error messages.
pub fn type_name(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Integer(_) => "int".to_string(),
        Value::Float(_) => "float".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(_) => "array".to_string(),
        Value::Object(object) => object.class_name().to_string(),
        Value::Enum(case) => case.enum_name().to_string(),
    }
}

/// Strict structural equality; this is the `===` relation.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            (Value::Enum(a), Value::Enum(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        Value::Array(array)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(values.into_iter().collect())
    }
}

impl From<EnumCase> for Value {
    fn from(case: EnumCase) -> Self {
        Value::Enum(case)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Key of an [`Array`] entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Integer(i64),
    String(String),
}

impl Key {
    /// Builds a key from a string; canonical decimal integers become integer keys.
    pub fn from_string(s: impl Into<String>) -> Key {
        let s = s.into();
        let bytes = s.as_bytes();
        let digits = bytes.strip_prefix(b"-").unwrap_or(bytes);
        let canonical = !digits.is_empty()
            && digits.iter().all(u8::is_ascii_digit)
            && (digits == b"0" || digits[0] != b'0')
            && s != "-0";
        if canonical && let Ok(n) = s.parse::<i64>() {
            return Key::Integer(n);
        }
        Key::String(s)
    }

    /// Converts a value used as an array offset into a key.
    pub fn from_value(value: &Value) -> Result<Key, EvalError> {
        match value {
            Value::Null => Ok(Key::String(String::new())),
            Value::Bool(b) => Ok(Key::Integer(i64::from(*b))),
            Value::Integer(n) => Ok(Key::Integer(*n)),
            Value::Float(n) if n.is_finite() => Ok(Key::Integer(n.trunc() as i64)),
            Value::String(s) => Ok(Key::from_string(s.as_str())),
            other => Err(EvalError::TypeError(format!(
                "Cannot access offset of type {} on array",
                type_name(other)
            ))),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Key::Integer(n) => Value::Integer(*n),
            Key::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Integer(n) => write!(f, "{n}"),
            Key::String(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Integer(n)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::from_string(s)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::from_string(s)
    }
}

/// Ordered key/value container.
///
/// Insertion order is preserved. Values pushed without a key receive the next
/// free integer key: one past the largest integer key seen so far, or 0.
///
/// `positions` maps every key to its slot in `entries`.
#[derive(Debug, Clone, Default)]
pub struct Array {
    entries: Vec<(Key, Value)>,
    positions: HashMap<Key, usize>,
    next_index: i64,
}

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Array {
            entries: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
            next_index: 0,
        }
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.positions.get(key).map(|&slot| &self.entries[slot].1)
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.positions.contains_key(key)
    }

    /// Inserts or replaces the value at `key`; replacing keeps the original position.
    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if let Key::Integer(n) = key
            && n >= self.next_index
        {
            self.next_index = n.saturating_add(1);
        }
        match self.positions.get(&key) {
            Some(&slot) => self.entries[slot].1 = value,
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// Appends a value under the next free integer key.
    pub fn push(&mut self, value: impl Into<Value>) {
        let key = self.next_index;
        self.insert(key, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// True when the keys are exactly `0..len` in order.
    pub fn is_list(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(i, (k, _))| *k == Key::Integer(i as i64))
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut array = Array::with_capacity(iter.size_hint().0);
        for value in iter {
            array.push(value);
        }
        array
    }
}

impl FromIterator<(Key, Value)> for Array {
    fn from_iter<T: IntoIterator<Item = (Key, Value)>>(iter: T) -> Self {
        let mut array = Array::new();
        for (key, value) in iter {
            array.insert(key, value);
        }
        array
    }
}

impl IntoIterator for Array {
    type Item = (Key, Value);
    type IntoIter = std::vec::IntoIter<(Key, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A host object reachable from expressions through `.property` and `.method()`.
pub trait Object: fmt::Debug + Send + Sync {
    fn class_name(&self) -> &str;

    /// Reads a property; `None` when the object has no such property.
    fn property(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Calls a method; `None` when the object has no such method.
    fn call_method(&self, _name: &str, _arguments: Vec<Value>) -> Option<Result<Value, EvalError>> {
        None
    }

    /// String conversion, for objects that have one.
    fn to_text(&self) -> Option<String> {
        None
    }

    /// Public properties, used when exporting the object (e.g. to JSON).
    fn properties(&self) -> Vec<(String, Value)> {
        Vec::new()
    }
}

type Method = Arc<dyn Fn(Vec<Value>) -> Result<Value, EvalError> + Send + Sync>;

/// A plain object made of named properties and closure-backed methods.
///
/// # Examples
///
/// ```
/// use expression_language::{Record, Value};
///
/// let user = Record::new("User")
///     .with_property("name", "Ada")
///     .with_method("greeting", |_| Ok(Value::from("hello")));
/// let value = user.into_value();
/// assert!(value.is_truthy());
/// ```
#[derive(Clone)]
pub struct Record {
    class: String,
    properties: Vec<(String, Value)>,
    methods: BTreeMap<String, Method>,
}

impl Record {
    pub fn new(class: impl Into<String>) -> Self {
        Record {
            class: class.into(),
            properties: Vec::new(),
            methods: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.properties.push((name, value)),
        }
        self
    }

    pub fn with_method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(method));
        self
    }

    pub fn into_value(self) -> Value {
        Value::object(self)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("class", &self.class)
            .field("properties", &self.properties)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Object for Record {
    fn class_name(&self) -> &str {
        &self.class
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    fn call_method(&self, name: &str, arguments: Vec<Value>) -> Option<Result<Value, EvalError>> {
        self.methods.get(name).map(|method| method(arguments))
    }

    fn properties(&self) -> Vec<(String, Value)> {
        self.properties.clone()
    }
}

/// A case of a host enumeration, optionally backed by a scalar.
///
/// Expressions read `.name` and, for backed cases, `.value`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumCase {
    enum_name: String,
    case: String,
    backing: Option<Box<Value>>,
}

impl EnumCase {
    pub fn new(enum_name: impl Into<String>, case: impl Into<String>) -> Self {
        EnumCase {
            enum_name: enum_name.into(),
            case: case.into(),
            backing: None,
        }
    }

    pub fn backed(enum_name: impl Into<String>, case: impl Into<String>, value: impl Into<Value>) -> Self {
        EnumCase {
            backing: Some(Box::new(value.into())),
            ..EnumCase::new(enum_name, case)
        }
    }

    pub fn enum_name(&self) -> &str {
        &self.enum_name
    }

    pub fn name(&self) -> &str {
        &self.case
    }

    pub fn backing_value(&self) -> Option<&Value> {
        self.backing.as_deref()
    }

    /// `Enum::Case`, the name under which the case is registered as a constant.
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.enum_name, self.case)
    }
}
