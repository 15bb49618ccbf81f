//! JSON <-> Value conversion utilities

use crate::value::{Array, Key, Record, Value, Values};

/// Convert serde_json::Value to Value
///
/// JSON objects become arrays with string keys (canonical integer strings
/// become integer keys), so they are read with `value["key"]`.
pub fn json_to_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => number(&n),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(obj) => Value::Array(
            obj.into_iter()
                .map(|(k, v)| (Key::from_string(k), json_to_value(v)))
                .collect(),
        ),
    }
}

/// Convert serde_json::Value to Value, turning JSON objects into [`Record`]s
///
/// Objects are then read with `value.key`.
pub fn json_to_object_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Array(arr) => {
            Value::Array(arr.into_iter().map(json_to_object_value).collect())
        }
        serde_json::Value::Object(obj) => obj
            .into_iter()
            .fold(Record::new("stdClass"), |record, (k, v)| {
                record.with_property(k, json_to_object_value(v))
            })
            .into_value(),
        other => json_to_value(other),
    }
}

fn number(n: &serde_json::Number) -> Value {
    match n.as_i64() {
        Some(i) => Value::Integer(i),
        None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
    }
}

/// Bindings from a JSON object: each top-level key becomes a variable.
///
/// Returns `None` when `v` is not an object.
pub fn json_to_values(v: serde_json::Value, objects: bool) -> Option<Values> {
    let serde_json::Value::Object(obj) = v else {
        return None;
    };
    let convert = if objects { json_to_object_value } else { json_to_value };
    Some(obj.into_iter().map(|(k, v)| (k, convert(v))).collect())
}

/// Convert Value to serde_json::Value
///
/// Lists become JSON arrays, other arrays JSON objects. Objects export their
/// public properties, enum cases their backing value or `Enum::Case` name.
pub fn value_to_json(v: Value) -> serde_json::Value {
    match v {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(b),
        Value::Integer(i) => serde_json::Value::Number(i.into()),
        Value::Float(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s),
        Value::Array(arr) => array_to_json(arr),
        Value::Object(obj) => serde_json::Value::Object(
            obj.properties()
                .into_iter()
                .map(|(k, v)| (k, value_to_json(v)))
                .collect(),
        ),
        Value::Enum(case) => match case.backing_value() {
            Some(value) => value_to_json(value.clone()),
            None => serde_json::Value::String(case.qualified_name()),
        },
    }
}

fn array_to_json(arr: Array) -> serde_json::Value {
    if arr.is_list() {
        return serde_json::Value::Array(arr.into_iter().map(|(_, v)| value_to_json(v)).collect());
    }
    serde_json::Value::Object(
        arr.into_iter()
            .map(|(k, v)| {
                let key = match k {
                    Key::Integer(n) => n.to_string(),
                    Key::String(s) => s,
                };
                (key, value_to_json(v))
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_objects_become_keyed_arrays() {
        let value = json_to_value(json!({"a": 1, "2": [true, null]}));
        let array = value.as_array().unwrap();
        assert_eq!(array.get(&Key::from("a")), Some(&Value::Integer(1)));
        assert!(array.contains_key(&Key::Integer(2)));
    }

    #[test]
    fn test_round_trip_keeps_shape() {
        let input = json!({"name": "x", "tags": ["a", "b"], "score": 1.5});
        assert_eq!(value_to_json(json_to_value(input.clone())), input);
        assert_eq!(value_to_json(json_to_object_value(input.clone())), input);
    }

    #[test]
    fn test_bindings_require_an_object() {
        assert!(json_to_values(json!([1, 2]), false).is_none());
        let values = json_to_values(json!({"a": 1}), false).unwrap();
        assert_eq!(values.get("a"), Some(&Value::Integer(1)));
    }
}
