use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::{language::ParsedExpression, parser::Name};

/// Store for parsed expressions, shared by every caller of one engine.
pub trait ParseCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Arc<ParsedExpression>>;
    fn insert(&self, key: String, parsed: Arc<ParsedExpression>);
}

/// Unbounded in-memory [`ParseCache`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Arc<ParsedExpression>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map_or_else(|e| e.into_inner().len(), |m| m.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        match self.entries.write() {
            Ok(mut entries) => entries.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl ParseCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Arc<ParsedExpression>> {
        // entries are inserted whole, so a poisoned map is still consistent
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn insert(&self, key: String, parsed: Arc<ParsedExpression>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, parsed);
    }
}

/// Cache key for an expression parsed with `names`.
///
/// The expression text, `//`, then the names sorted by variable name (each as
/// `variable` or `alias:variable`, joined by `|`), percent-encoded.
///
/// # Example
///
/// ```
/// use expression_language::{Name, cache_key};
///
/// assert_eq!(cache_key("1 + 1", &[]), "1%20%2B%201%2F%2F");
/// assert_eq!(
///     cache_key("a + b", &[Name::new("a"), Name::aliased("B", "b")]),
///     "a%20%2B%20b%2F%2Fa%7CB%3Ab"
/// );
/// ```
pub fn cache_key(expression: &str, names: &[Name]) -> String {
    let mut sorted: Vec<&Name> = names.iter().collect();
    sorted.sort_by(|a, b| a.variable().cmp(b.variable()));

    let joined = sorted
        .iter()
        .map(|name| match name.alias() {
            Some(alias) => format!("{alias}:{}", name.variable()),
            None => name.variable().to_string(),
        })
        .collect::<Vec<_>>()
        .join("|");

    percent_encode(&format!("{expression}//{joined}"))
}

/// RFC 3986 encoding: everything except `A-Z a-z 0-9 - _ . ~` becomes `%XX`.
fn percent_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}
