// tests/integration_tests.rs

use expression_language::{
    Array, EnumCase, Error, EvalError, ExpressionLanguage, Key, Record, Value, Values,
};

fn values(bindings: Vec<(&str, Value)>) -> Values {
    bindings
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

fn eval(expression: &str, bindings: Vec<(&str, Value)>) -> Result<Value, Error> {
    ExpressionLanguage::new().evaluate(expression, &values(bindings))
}

fn eval_ok(expression: &str) -> Value {
    eval(expression, vec![]).unwrap()
}

fn eval_err(expression: &str, bindings: Vec<(&str, Value)>) -> String {
    eval(expression, bindings).unwrap_err().to_string()
}

fn list(items: Vec<Value>) -> Value {
    Value::from(items)
}

fn user() -> Value {
    Record::new("User")
        .with_property("name", "Ada")
        .with_property("manager", Value::Null)
        .with_method("greet", |args| {
            let who = args.first().and_then(Value::as_str).unwrap_or("nobody");
            Ok(Value::from(format!("Hello {who}")))
        })
        .with_method("fail", |_| Err(EvalError::custom("boom")))
        .into_value()
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_arithmetic() {
    let test_cases = vec![
        ("2 + 3 * 4", Value::from(14)),
        ("(2 + 3) * 4", Value::from(20)),
        ("2 ** 3 ** 2", Value::from(512)),
        ("8 - 3 - 2", Value::from(3)),
        ("10 / 5", Value::from(2)),
        ("10 / 4", Value::from(2.5)),
        ("7 % 3", Value::from(1)),
        ("-7 % 3", Value::from(-1)),
        ("1.5 + 1", Value::from(2.5)),
        ("'3' + 4", Value::from(7)),
        ("-(2 + 3)", Value::from(-5)),
        ("+'4'", Value::from(4)),
        ("2 ** -1", Value::from(0.5)),
        ("1_000 * 2", Value::from(2000)),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_ok(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_integer_overflow_becomes_float() {
    assert_eq!(
        eval_ok("9223372036854775807 + 1"),
        Value::Float(9223372036854775808.0)
    );
}

#[test]
fn test_division_by_zero() {
    assert_eq!(
        eval("1 / 0", vec![]),
        Err(Error::Eval(EvalError::DivisionByZero {
            operation: "Division"
        }))
    );
    assert_eq!(eval_err("1 / 0", vec![]), "Division by zero.");
    assert_eq!(eval_err("5 % 0", vec![]), "Modulo by zero.");
}

#[test]
fn test_unsupported_operands() {
    assert_eq!(
        eval_err("'abc' * 2", vec![]),
        "Unsupported operand types: string * int"
    );
    assert!(matches!(
        eval("[1] - 1", vec![]),
        Err(Error::Eval(EvalError::TypeError(_)))
    ));
}

#[test]
fn test_bitwise() {
    let test_cases = vec![
        ("5 & 3", 1),
        ("5 | 3", 7),
        ("5 ^ 3", 6),
        ("1 << 3", 8),
        ("16 >> 2", 4),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_ok(input), Value::from(expected), "Failed for input: {}", input);
    }
}

// ============================================================================
// Logic and comparison
// ============================================================================

#[test]
fn test_comparisons() {
    let test_cases = vec![
        ("1 == '1'", true),
        ("1 === '1'", false),
        ("1 !== 1.0", true),
        ("1 == 1.0", true),
        ("null == false", true),
        ("'abc' == 0", false),
        ("'abc' < 'abd'", true),
        ("1 < 2.5", true),
        ("3 >= 3", true),
        ("'10' > '9'", true),
        ("[1, 2] == [1, 2]", true),
        ("{a: 1} != {a: 2}", true),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_ok(input), Value::from(expected), "Failed for input: {}", input);
    }
}

#[test]
fn test_logical_operators() {
    let test_cases = vec![
        ("true and false", false),
        ("true && 1", true),
        ("false or 'x'", true),
        ("0 || ''", false),
        ("true xor true", false),
        ("not true", false),
        ("!0", true),
        ("not []", true),
        ("'0' or false", false),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_ok(input), Value::from(expected), "Failed for input: {}", input);
    }
}

#[test]
fn test_short_circuit() {
    let object = Record::new("Service").into_value();
    assert_eq!(
        eval("false and object.foo()", vec![("object", object.clone())]),
        Ok(Value::from(false))
    );
    assert_eq!(
        eval("true or object.foo()", vec![("object", object)]),
        Ok(Value::from(true))
    );
    assert_eq!(eval_ok("true or 1 / 0"), Value::from(true));
}

#[test]
fn test_conditionals() {
    let test_cases = vec![
        ("true ? 1 : (1 / 0)", Value::from(1)),
        ("false ? (1 / 0) : 2", Value::from(2)),
        ("0 ?: 5", Value::from(5)),
        ("3 ?: 5", Value::from(3)),
        ("false ? 1", Value::Null),
        ("1 > 2 ? 'a' : 2 > 1 ? 'b' : 'c'", Value::from("b")),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_ok(input), expected, "Failed for input: {}", input);
    }
}

// ============================================================================
// Strings and arrays
// ============================================================================

#[test]
fn test_string_operators() {
    let test_cases = vec![
        ("'foo' ~ 'bar'", Value::from("foobar")),
        ("'n' ~ 1 ~ true", Value::from("n11")),
        ("(0.1 + 0.2) ~ ''", Value::from("0.3")),
        ("1.5 ~ ''", Value::from("1.5")),
        ("1e25 ~ ''", Value::from("1.0E+25")),
        ("(9223372036854775807 + 1) ~ ''", Value::from("9.2233720368548E+18")),
        ("'abc' contains 'b'", Value::from(true)),
        ("'abc' starts with 'ab'", Value::from(true)),
        ("'abc' ends with 'b'", Value::from(false)),
        ("'abc' matches '/^A/i'", Value::from(true)),
        ("'abc' matches '{^b}'", Value::from(false)),
        ("'2024-01' matches '/^\\\\d{4}-\\\\d{2}$/'", Value::from(true)),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_ok(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_invalid_pattern() {
    assert!(matches!(
        eval("'a' matches 'abc'", vec![]),
        Err(Error::Eval(EvalError::InvalidPattern { .. }))
    ));
    assert!(matches!(
        eval("'a' matches 1", vec![]),
        Err(Error::Eval(EvalError::TypeError(_)))
    ));
}

#[test]
fn test_membership() {
    let test_cases = vec![
        ("1 in [1, 2]", true),
        ("'1' in [1, 2]", false),
        ("3 not in [1, 2]", true),
        ("'b' in {x: 'a', y: 'b'}", true),
        ("2 in 1..3", true),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_ok(input), Value::from(expected), "Failed for input: {}", input);
    }

    assert!(matches!(
        eval("1 in 'abc'", vec![]),
        Err(Error::Eval(EvalError::TypeError(_)))
    ));
}

#[test]
fn test_ranges() {
    let test_cases = vec![
        ("1..3", list(vec![1.into(), 2.into(), 3.into()])),
        ("3..1", list(vec![3.into(), 2.into(), 1.into()])),
        ("2..2", list(vec![2.into()])),
        ("'a'..'c'", list(vec!["a".into(), "b".into(), "c".into()])),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_ok(input), expected, "Failed for input: {}", input);
    }

    let too_large = vec![
        "0..4611686018427387904",
        "-4611686018427387904..4611686018427387904",
        "4611686018427387904..0",
        "0..1e300",
        "0.5..1e18",
    ];
    for input in too_large {
        assert_eq!(
            eval_err(input, vec![]),
            "The supplied range exceeds the maximum array size",
            "Failed for input: {}",
            input
        );
    }

    let result = eval_ok("1..100000");
    let array = result.as_array().unwrap();
    assert_eq!(array.len(), 100_000);
    assert_eq!(array.get(&Key::Integer(99_999)), Some(&Value::Integer(100_000)));
}

#[test]
fn test_array_literals_keep_key_order() {
    let result = eval_ok("[10, 20, 30]");
    let array = result.as_array().unwrap();
    let keys: Vec<&Key> = array.keys().collect();
    assert_eq!(keys, vec![&Key::Integer(0), &Key::Integer(1), &Key::Integer(2)]);
    assert!(array.is_list());

    let result = eval_ok("{b: 1, a: 2, 5: 3}");
    let keys: Vec<Key> = result.as_array().unwrap().keys().cloned().collect();
    assert_eq!(
        keys,
        vec![Key::from("b"), Key::from("a"), Key::Integer(5)]
    );
}

#[test]
fn test_numeric_string_keys_collapse() {
    let result = eval_ok("{1: 'a', '1': 'b'}");
    let array = result.as_array().unwrap();
    assert_eq!(array.len(), 1);
    assert_eq!(array.get(&Key::Integer(1)), Some(&Value::from("b")));
}

#[test]
fn test_array_union() {
    assert_eq!(eval_ok("[1] + [2, 3]"), list(vec![1.into(), 3.into()]));

    let mut expected = Array::new();
    expected.insert("a", 1);
    expected.insert("b", 3);
    assert_eq!(eval_ok("{a: 1} + {a: 2, b: 3}"), Value::Array(expected));
}

#[test]
fn test_comments() {
    assert_eq!(eval_ok("1 /* foo */ + 2"), Value::from(3));
    assert_eq!(eval_ok("/* leading */ 'x'"), Value::from("x"));
    assert!(matches!(eval("1 /* 2", vec![]), Err(Error::Syntax(_))));
}

// ============================================================================
// Member access
// ============================================================================

#[test]
fn test_object_access() {
    let test_cases = vec![
        ("user.name", Value::from("Ada")),
        ("user.greet('Bob')", Value::from("Hello Bob")),
        ("user.greet()", Value::from("Hello nobody")),
        ("user.name ~ '!'", Value::from("Ada!")),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            eval(input, vec![("user", user())]),
            Ok(expected),
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_object_access_errors() {
    let test_cases = vec![
        ("user.missing", "Undefined property \"missing\" of object \"User\"."),
        ("user.nope()", "Unable to call method \"nope\" of object \"User\"."),
        ("user.fail()", "boom"),
        ("user.manager.name", "Unable to get property \"name\" of non-object \"user.manager\"."),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            eval_err(input, vec![("user", user())]),
            expected,
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_array_access() {
    let items = list(vec!["a".into(), "b".into()]);
    let mut hash = Array::new();
    hash.insert("key", "value");
    let bindings = || vec![("items", items.clone()), ("hash", Value::Array(hash.clone()))];

    assert_eq!(eval("items[1]", bindings()), Ok(Value::from("b")));
    assert_eq!(eval("items['1']", bindings()), Ok(Value::from("b")));
    assert_eq!(eval("hash['key']", bindings()), Ok(Value::from("value")));
    assert_eq!(eval_err("items[5]", bindings()), "Undefined array key 5.");
    assert_eq!(eval_err("hash['nope']", bindings()), "Undefined array key \"nope\".");
    assert_eq!(
        eval_err("hash.key", bindings()),
        "Unable to get property \"key\" of non-object \"hash\"."
    );
    assert_eq!(
        eval_err("items.first()", bindings()),
        "Unable to call method \"first\" of non-object \"items\"."
    );
}

#[test]
fn test_null_safe_access() {
    let bindings = || vec![("foo", Value::Null), ("user", user())];

    let test_cases = vec![
        ("foo?.bar", Value::Null),
        ("foo?.bar.baz", Value::Null),
        ("foo?.bar()", Value::Null),
        ("foo?.bar['x'].baz()", Value::Null),
        ("user?.name", Value::from("Ada")),
        ("user.manager?.name", Value::Null),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval(input, bindings()), Ok(expected), "Failed for input: {}", input);
    }

    assert_eq!(
        eval_err("foo.bar", bindings()),
        "Unable to get property \"bar\" of non-object \"foo\"."
    );
}

#[test]
fn test_null_coalescing() {
    let bindings = || {
        vec![
            ("user", user()),
            ("empty", Value::Array(Array::new())),
            ("flag", Value::from(false)),
            ("nothing", Value::Null),
        ]
    };

    let test_cases = vec![
        ("user.missing ?? 'default'", Value::from("default")),
        ("user.name ?? 'default'", Value::from("Ada")),
        ("user.manager.name ?? 'nobody'", Value::from("nobody")),
        ("empty['x'] ?? 'd'", Value::from("d")),
        ("empty['x']['y'] ?? 'd'", Value::from("d")),
        ("unknown ?? 'd'", Value::from("d")),
        ("nothing ?? 'd'", Value::from("d")),
        ("flag ?? 'd'", Value::from(false)),
        ("nothing ?? unknown ?? 3", Value::from(3)),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval(input, bindings()), Ok(expected), "Failed for input: {}", input);
    }
}

// ============================================================================
// Variables and functions
// ============================================================================

#[test]
fn test_unknown_variable_is_a_syntax_error() {
    assert!(matches!(eval("foo + 1", vec![]), Err(Error::Syntax(_))));
    assert_eq!(
        eval_err("fooo", vec![("foo", Value::from(1))]),
        "Variable \"fooo\" is not valid around position 1 for expression `fooo`. Did you mean \"foo\"?"
    );
}

#[test]
fn test_builtin_functions() {
    let language = ExpressionLanguage::builder()
        .constant("LIMIT", 10)
        .enum_case(EnumCase::backed("Suit", "Hearts", "H"))
        .enum_case(EnumCase::new("Status", "Active"))
        .build();
    let eval = |expression: &str| language.evaluate(expression, &Values::new());

    let test_cases = vec![
        ("max(1, 5, 3)", Value::from(5)),
        ("min(4, 2, 8)", Value::from(2)),
        ("max([4, 9])", Value::from(9)),
        ("min('b', 'a')", Value::from("a")),
        ("constant('LIMIT') * 2", Value::from(20)),
        ("enum('Suit::Hearts').value", Value::from("H")),
        ("enum('Suit::Hearts').name", Value::from("Hearts")),
        ("enum('Status::Active').name", Value::from("Active")),
        ("enum('Suit::Hearts') == enum('Suit::Hearts')", Value::from(true)),
        ("enum('Suit::Hearts') in [enum('Suit::Hearts')]", Value::from(true)),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval(input), Ok(expected), "Failed for input: {}", input);
    }

    assert_eq!(
        eval("constant('NOPE')").unwrap_err().to_string(),
        "Undefined constant \"NOPE\"."
    );
    assert_eq!(
        eval("enum('LIMIT')").unwrap_err().to_string(),
        "The string \"LIMIT\" is not the name of a valid enum case."
    );
    assert_eq!(
        eval("enum('Status::Active').value").unwrap_err().to_string(),
        "Undefined property \"value\" of object \"Status\"."
    );
}

#[test]
fn test_custom_function_receives_values() {
    let language = ExpressionLanguage::builder()
        .register(
            "count_values",
            |_| "\\count(\\get_defined_vars())".to_string(),
            |values, _| Ok(Value::from(values.len() as i64)),
        )
        .build();

    let bindings = values(vec![("a", Value::from(1)), ("b", Value::from(2))]);
    assert_eq!(language.evaluate("count_values()", &bindings), Ok(Value::from(2)));
}

// ============================================================================
// Sharing
// ============================================================================

#[test]
fn test_concurrent_evaluation_of_one_parsed_expression() {
    let language = ExpressionLanguage::new();
    let parsed = language.parse("a * 2 + 1", ["a"]).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4i64)
            .map(|n| {
                let language = &language;
                let parsed = &parsed;
                scope.spawn(move || {
                    let bindings = values(vec![("a", Value::from(n))]);
                    language.evaluate(parsed, &bindings)
                })
            })
            .collect();

        for (n, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), Ok(Value::from(n as i64 * 2 + 1)));
        }
    });
}
