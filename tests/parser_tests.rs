// tests/parser_tests.rs

use expression_language::{
    AccessKind, BinaryOperator, ExpressionLanguage, NO_NAMES, Name, Node, ParseFlags, Parser,
    SyntaxError, UnaryOperator, tokenize,
};

fn parse_names(expression: &str, names: &[Name]) -> Result<Node, SyntaxError> {
    let language = ExpressionLanguage::new();
    let stream = tokenize(expression)?;
    Parser::new(language.functions()).parse(stream, names)
}

fn parse(expression: &str, names: &[&str]) -> Node {
    let names: Vec<Name> = names.iter().copied().map(Name::from).collect();
    parse_names(expression, &names).unwrap()
}

fn parse_error(expression: &str, names: &[&str]) -> String {
    let names: Vec<Name> = names.iter().copied().map(Name::from).collect();
    parse_names(expression, &names).unwrap_err().to_string()
}

fn lint(expression: &str, names: Option<&[Name]>, flags: ParseFlags) -> Result<(), SyntaxError> {
    let language = ExpressionLanguage::new();
    Parser::new(language.functions()).lint(tokenize(expression)?, names, flags)
}

// ============================================================================
// Precedence and associativity
// ============================================================================

#[test]
fn test_precedence() {
    let test_cases = vec![
        ("1 + 2 * 3", "(1 + (2 * 3))"),
        ("(1 + 2) * 3", "((1 + 2) * 3)"),
        ("8 - 3 - 2", "((8 - 3) - 2)"),
        ("2 ** 3 ** 2", "(2 ** (3 ** 2))"),
        ("a and b or c", "((a and b) or c)"),
        ("a || b && c", "(a or (b and c))"),
        ("not a and b", "((not a) and b)"),
        ("!a", "(not a)"),
        ("-a ** 2", "((-a) ** 2)"),
        ("a ~ b + c", "((a ~ b) + c)"),
        ("a in b..c", "(a in (b .. c))"),
        ("a == b or a > c", "((a == b) or (a > c))"),
        ("a | b ^ c & a", "(a | (b ^ (c & a)))"),
        ("a << 1 + 2", "(a << (1 + 2))"),
        ("a xor b and c", "(a xor (b and c))"),
        ("a % b * c", "((a % b) * c)"),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            parse(input, &["a", "b", "c"]).to_string(),
            expected,
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_binary_tree_shape() {
    let node = parse("1 + 2 * 3", &[]);
    match node {
        Node::Binary {
            operator: BinaryOperator::Add,
            left,
            right,
        } => {
            assert_eq!(*left, Node::constant(1));
            assert!(matches!(
                *right,
                Node::Binary {
                    operator: BinaryOperator::Multiply,
                    ..
                }
            ));
        }
        other => panic!("Expected addition, got {other:?}"),
    }
}

#[test]
fn test_unary_operators() {
    assert_eq!(
        parse("-1", &[]),
        Node::unary(UnaryOperator::Negate, Node::constant(1))
    );
    assert_eq!(
        parse("+a", &["a"]),
        Node::unary(UnaryOperator::Plus, Node::name("a"))
    );
    assert_eq!(parse("-a.b", &["a"]).to_string(), "(-a.b)");
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_literals() {
    let test_cases = vec![
        ("true", Node::constant(true)),
        ("FALSE", Node::constant(false)),
        ("null", Node::constant(expression_language::Value::Null)),
        ("42", Node::constant(42)),
        ("1.5", Node::constant(1.5)),
        ("'foo'", Node::constant("foo")),
    ];

    for (input, expected) in test_cases {
        assert_eq!(parse(input, &[]), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_arrays_and_hashes() {
    let test_cases = vec![
        ("[]", "[]"),
        ("[1, 'two', a]", "[1, \"two\", a]"),
        ("[1, 2,]", "[1, 2]"),
        ("{}", "[]"),
        ("{a: 1, 'b': 2, 3: a}", "{\"a\": 1, \"b\": 2, 3: a}"),
        ("{(a): 1,}", "{a: 1}"),
        ("[[1], {x: [2]}]", "[[1], {\"x\": [2]}]"),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            parse(input, &["a"]).to_string(),
            expected,
            "Failed for input: {}",
            input
        );
    }
}

// ============================================================================
// Member access
// ============================================================================

#[test]
fn test_member_access() {
    let test_cases = vec![
        ("foo.bar", "foo.bar"),
        ("foo.bar.baz", "foo.bar.baz"),
        ("foo.bar(1, 2)", "foo.bar(1, 2)"),
        ("foo[0]", "foo[0]"),
        ("foo['bar']['baz']", "foo[\"bar\"][\"baz\"]"),
        ("foo?.bar", "foo.bar"),
        ("foo.bar?.baz()", "foo.bar.baz()"),
        ("foo.bar['baz']", "foo.bar[\"baz\"]"),
        ("(foo).bar", "foo.bar"),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            parse(input, &["foo"]).to_string(),
            expected,
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_null_safe_flag() {
    match parse("foo?.bar", &["foo"]) {
        Node::GetAttr {
            access, null_safe, ..
        } => {
            assert_eq!(access, AccessKind::Property);
            assert!(null_safe);
        }
        other => panic!("Expected attribute access, got {other:?}"),
    }

    match parse("foo.bar()", &["foo"]) {
        Node::GetAttr {
            access, null_safe, ..
        } => {
            assert_eq!(access, AccessKind::MethodCall);
            assert!(!null_safe);
        }
        other => panic!("Expected method call, got {other:?}"),
    }
}

#[test]
fn test_operator_words_as_member_names() {
    assert_eq!(
        parse("foo.not in [bar]", &["foo", "bar"]).to_string(),
        "(foo.not in [bar])"
    );
    assert_eq!(parse("foo.and", &["foo"]).to_string(), "foo.and");
    assert_eq!(parse("foo.matches()", &["foo"]).to_string(), "foo.matches()");

    let test_cases = vec![
        ("foo. starts with (1)", "foo.starts with(1)"),
        ("foo. not in (bar)", "foo.not in(bar)"),
        ("foo?. ends with ()", "foo.ends with()"),
    ];
    for (input, expected) in test_cases {
        assert_eq!(parse(input, &["foo", "bar"]).to_string(), expected, "Failed for input: {}", input);
    }
}

// ============================================================================
// Conditionals and null coalescing
// ============================================================================

#[test]
fn test_conditionals() {
    let test_cases = vec![
        ("a ? b : c", "(a ? b : c)"),
        ("a ?: b", "(a ? a : b)"),
        ("a ? b", "(a ? b : null)"),
        ("a ? b : c ? 1 : 2", "(a ? b : (c ? 1 : 2))"),
        ("a > 1 ? b + 1 : c", "((a > 1) ? (b + 1) : c)"),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            parse(input, &["a", "b", "c"]).to_string(),
            expected,
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_null_coalescing() {
    assert_eq!(parse("a ?? b", &["a", "b"]).to_string(), "(a) ?? (b)");
    assert_eq!(
        parse("a.b ?? 'default'", &["a"]).to_string(),
        "(a.b) ?? (\"default\")"
    );
    assert_eq!(parse("a ?? b ?? 1", &["a", "b"]).to_string(), "(a) ?? ((b) ?? (1))");
}

#[test]
fn test_unknown_variable_before_null_coalesce() {
    let node = parse("foo ?? 'default'", &[]);
    match node {
        Node::NullCoalesce { left, .. } => {
            assert_eq!(*left, Node::NullCoalescedName("foo".to_string()));
        }
        other => panic!("Expected null coalescing, got {other:?}"),
    }

    // only a bare name may be unknown
    assert!(parse_names("foo.bar ?? 1", &NO_NAMES).is_err());
}

// ============================================================================
// Names and functions
// ============================================================================

#[test]
fn test_aliased_names() {
    let names = vec![Name::new("a"), Name::aliased("B", "b")];
    let node = parse_names("a + b", &names).unwrap();
    assert_eq!(node.to_string(), "(a + B)");

    let names = vec![Name::from(("B", "b"))];
    assert!(parse_names("B", &names).is_err());
}

#[test]
fn test_function_calls() {
    assert_eq!(
        parse("constant('PHP_VERSION')", &[]).to_string(),
        "constant(\"PHP_VERSION\")"
    );
    assert_eq!(parse("max(a, 2, 3)", &["a"]).to_string(), "max(a, 2, 3)");
    assert_eq!(parse("min([1, 2])", &[]).to_string(), "min([1, 2])");
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_syntax_errors() {
    let test_cases = vec![
        (
            "node.",
            vec!["node"],
            "Unexpected end of expression around position 6 for expression `node.`.",
        ),
        (
            "foo",
            vec![],
            "Variable \"foo\" is not valid around position 1 for expression `foo`.",
        ),
        (
            "fo",
            vec!["foo"],
            "Variable \"fo\" is not valid around position 1 for expression `fo`. Did you mean \"foo\"?",
        ),
        (
            "constnt(1)",
            vec![],
            "The function \"constnt\" does not exist around position 1 for expression `constnt(1)`. Did you mean \"constant\"?",
        ),
        (
            "unknown()",
            vec![],
            "The function \"unknown\" does not exist around position 1 for expression `unknown()`.",
        ),
        (
            "[1 2]",
            vec![],
            "An array element must be followed by a comma. Unexpected token \"number\" of value \"2\" (\"punctuation\" expected with value \",\") around position 4 for expression `[1 2]`.",
        ),
        (
            "{a 1}",
            vec![],
            "A hash key must be followed by a colon (:). Unexpected token \"number\" of value \"1\" (\"punctuation\" expected with value \":\") around position 4 for expression `{a 1}`.",
        ),
        (
            "{[1]: 2}",
            vec![],
            "A hash key must be a quoted string, a number, a name, or an expression enclosed in parentheses (unexpected token \"punctuation\" of value \"[\") around position 2 for expression `{[1]: 2}`.",
        ),
        (
            "a b",
            vec!["a", "b"],
            "Unexpected token \"name\" of value \"b\" around position 3 for expression `a b`.",
        ),
        (
            "a.+",
            vec!["a"],
            "Expected name around position 3 for expression `a.+`.",
        ),
        (
            "1 +",
            vec![],
            "Unexpected token \"end of expression\" of value \"\" around position 4 for expression `1 +`.",
        ),
        (
            "max(1 2)",
            vec![],
            "Arguments must be separated by a comma. Unexpected token \"number\" of value \"2\" (\"punctuation\" expected with value \",\") around position 7 for expression `max(1 2)`.",
        ),
    ];

    for (input, names, expected) in test_cases {
        assert_eq!(parse_error(input, &names), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_error_cursor() {
    let names = vec![Name::new("a")];
    let err = parse_names("a + b", &names).unwrap_err();
    assert_eq!(err.cursor(), 5);
    assert_eq!(err.expression(), "a + b");
}

// ============================================================================
// Lint
// ============================================================================

#[test]
fn test_lint_without_names_accepts_any_variable() {
    assert!(lint("foo.bar + baz", None, ParseFlags::default()).is_ok());
    assert!(lint("foo +", None, ParseFlags::default()).is_err());
}

#[test]
fn test_lint_with_names() {
    let names = vec![Name::new("foo")];
    assert!(lint("foo.bar", Some(names.as_slice()), ParseFlags::default()).is_ok());
    assert!(lint("bar", Some(names.as_slice()), ParseFlags::default()).is_err());
    assert!(lint("bar", Some(&NO_NAMES[..]), ParseFlags::default()).is_err());
}

#[test]
fn test_lint_flags() {
    let flags = ParseFlags {
        ignore_unknown_functions: true,
        ..ParseFlags::default()
    };
    assert!(lint("custom(1)", Some(&NO_NAMES[..]), flags).is_ok());
    assert!(lint("custom(1)", Some(&NO_NAMES[..]), ParseFlags::default()).is_err());

    let flags = ParseFlags {
        ignore_unknown_variables: true,
        ..ParseFlags::default()
    };
    assert!(lint("anything", Some(&NO_NAMES[..]), flags).is_ok());
}
