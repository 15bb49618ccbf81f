// tests/cli_tests.rs

#![cfg(feature = "cli")]

use expression_language::{
    ExpressionLanguage,
    cli::{CliError, CompileOptions, EvaluateOptions, execute_compile, execute_evaluate, execute_lint},
};
use serde_json::json;

fn evaluate(expression: &str, input: Option<&str>, objects: bool) -> Result<serde_json::Value, CliError> {
    let options = EvaluateOptions {
        expression: expression.to_string(),
        input: input.map(str::to_string),
        objects,
    };
    execute_evaluate(&ExpressionLanguage::new(), &options)
}

fn compile_options(expression: &str, names: &[&str]) -> CompileOptions {
    CompileOptions {
        expression: expression.to_string(),
        names: names.iter().map(|n| n.to_string()).collect(),
    }
}

// ============================================================================
// evaluate
// ============================================================================

#[test]
fn test_evaluate_with_json_bindings() {
    let test_cases = vec![
        ("price * 2", r#"{"price": 21}"#, json!(42)),
        ("user['name'] ~ '!'", r#"{"user": {"name": "Ada"}}"#, json!("Ada!")),
        ("tags[1]", r#"{"tags": ["a", "b"]}"#, json!("b")),
        ("1..3", r#"{}"#, json!([1, 2, 3])),
        ("{x: 1, y: [true]}", r#"{}"#, json!({"x": 1, "y": [true]})),
        ("missing ?? 'fallback'", r#"{}"#, json!("fallback")),
        ("10 / 4", r#"{}"#, json!(2.5)),
    ];

    for (expression, input, expected) in test_cases {
        assert_eq!(
            evaluate(expression, Some(input), false).unwrap(),
            expected,
            "Failed for expression: {}",
            expression
        );
    }
}

#[test]
fn test_evaluate_objects_mode() {
    let input = r#"{"user": {"name": "Ada", "address": {"city": "London"}}}"#;
    assert_eq!(
        evaluate("user.address.city", Some(input), true).unwrap(),
        json!("London")
    );
    assert_eq!(
        evaluate("user", Some(input), true).unwrap(),
        json!({"name": "Ada", "address": {"city": "London"}})
    );
    assert!(matches!(
        evaluate("user.name", Some(input), false),
        Err(CliError::Eval(_))
    ));
}

#[test]
fn test_evaluate_without_input() {
    assert_eq!(evaluate("1 + 1", None, false).unwrap(), json!(2));
    assert_eq!(evaluate("'a' ~ 'b'", Some("  "), false).unwrap(), json!("ab"));
}

#[test]
fn test_evaluate_errors() {
    assert!(matches!(
        evaluate("1", Some("[1, 2]"), false),
        Err(CliError::NotAnObject)
    ));
    assert!(matches!(
        evaluate("1", Some("{not json"), false),
        Err(CliError::Json(_))
    ));
    assert!(matches!(evaluate("a +", None, false), Err(CliError::Syntax(_))));

    let err = evaluate("1 / 0", None, false).unwrap_err();
    assert_eq!(err.to_string(), "Evaluation error: Division by zero.");
}

// ============================================================================
// compile and lint
// ============================================================================

#[test]
fn test_compile() {
    let language = ExpressionLanguage::new();
    let test_cases = vec![
        ("a + 1", vec!["a"], "($a + 1)"),
        ("a + b", vec!["a", "B=b"], "($a + $B)"),
        ("1 in [1]", vec![], "\\in_array(1, [0 => 1], true)"),
    ];

    for (expression, names, expected) in test_cases {
        assert_eq!(
            execute_compile(&language, &compile_options(expression, &names)).unwrap(),
            expected,
            "Failed for expression: {}",
            expression
        );
    }

    let err = execute_compile(&language, &compile_options("a + 1", &[])).unwrap_err();
    assert!(err.to_string().starts_with("Syntax error: Variable \"a\" is not valid"));
}

#[test]
fn test_lint() {
    let language = ExpressionLanguage::new();

    assert!(execute_lint(&language, &compile_options("anything + 1", &[])).is_ok());
    assert!(execute_lint(&language, &compile_options("a.b", &["a"])).is_ok());
    assert!(execute_lint(&language, &compile_options("a + c", &["a"])).is_err());
    assert!(execute_lint(&language, &compile_options("(1", &[])).is_err());
}
