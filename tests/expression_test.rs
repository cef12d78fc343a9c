//! Tests for the `$eval` expression sublanguage

use rstest::rstest;
use serde_json::{json, Map, Value};

use runconf::domain::expr::{evaluate, parse, EvalError, Scope};

fn eval(source: &str) -> Result<Value, EvalError> {
    evaluate(source, &Scope::new())
}

fn layer(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a mapping, got {}", other),
    }
}

#[rstest]
#[case("2 + 2", json!(4))]
#[case("2 + 3 * 4", json!(14))]
#[case("(2 + 3) * 4", json!(20))]
#[case("2 ** 3 ** 2", json!(512))]
#[case("-2 ** 2", json!(-4))]
#[case("7 // 2", json!(3))]
#[case("-7 // 2", json!(-4))]
#[case("7 % 3", json!(1))]
#[case("1 / 4", json!(0.25))]
#[case("1.5 * 2", json!(3.0))]
#[case("10 - 2 - 3", json!(5))]
fn given_arithmetic_when_evaluating_then_follows_python_precedence(
    #[case] source: &str,
    #[case] expected: Value,
) {
    assert_eq!(eval(source).unwrap(), expected, "{}", source);
}

#[rstest]
#[case("'a' + \"b\"", json!("ab"))]
#[case("'ab' * 3", json!("ababab"))]
#[case("[1] + [2, 3]", json!([1, 2, 3]))]
#[case("[0] * 3", json!([0, 0, 0]))]
#[case("'a-b-c'.split('-')", json!(["a", "b", "c"]))]
#[case("'a-b-c'.split('-', 1)", json!(["a", "b-c"]))]
#[case("'-'.join(['x', 'y'])", json!("x-y"))]
#[case("'  pad '.strip()", json!("pad"))]
#[case("'xxhixx'.strip('x')", json!("hi"))]
#[case("'Mixed'.upper() + 'Mixed'.lower()", json!("MIXEDmixed"))]
#[case("'ml.m5.large'.replace('.', '-')", json!("ml-m5-large"))]
#[case("'electricity'.startswith('elec')", json!(true))]
#[case("'abc'[-1]", json!("c"))]
#[case("'\\u00e9t\\u00e9'", json!("été"))]
fn given_string_and_list_expression_when_evaluating_then_returns_value(
    #[case] source: &str,
    #[case] expected: Value,
) {
    assert_eq!(eval(source).unwrap(), expected, "{}", source);
}

#[rstest]
#[case("1 < 2 and 2 <= 2", json!(true))]
#[case("not 1 == 1.0", json!(false))]
#[case("'b' in 'abc'", json!(true))]
#[case("3 in [1, 2]", json!(false))]
#[case("'k' in {'k': 1}", json!(true))]
#[case("0 or 'fallback'", json!("fallback"))]
#[case("None or False", json!(false))]
#[case("[1, 2] < [1, 3]", json!(true))]
fn given_comparison_when_evaluating_then_returns_truth(
    #[case] source: &str,
    #[case] expected: Value,
) {
    assert_eq!(eval(source).unwrap(), expected, "{}", source);
}

#[rstest]
#[case("len('abc') + len([1, 2]) + len({'a': 1})", json!(6))]
#[case("str(1.0) + str(2) + str(None)", json!("1.02None"))]
#[case("int('42') + int(3.9)", json!(45))]
#[case("float('0.5')", json!(0.5))]
#[case("bool('')", json!(false))]
#[case("abs(-3)", json!(3))]
#[case("min(3, 1, 2)", json!(1))]
#[case("max([3, 1, 2])", json!(3))]
#[case("pow(2, 10)", json!(1024))]
#[case("round(2.5)", json!(2))]
#[case("round(3.14159, 2)", json!(3.14))]
#[case("sum([1, 2, 3])", json!(6))]
fn given_allowed_function_when_calling_then_returns_value(
    #[case] source: &str,
    #[case] expected: Value,
) {
    assert_eq!(eval(source).unwrap(), expected, "{}", source);
}

#[rstest]
#[case("{'a': 1}.get('b', 0)", json!(0))]
#[case("{'a': 1, 'b': 2}.keys()", json!(["a", "b"]))]
#[case("{'a': 1}.items()", json!([["a", 1]]))]
#[case("[5, 6, 7].index(6)", json!(1))]
#[case("[1, 1, 2].count(1)", json!(2))]
#[case("{'a': {'b': [10, 20]}}.a.b[-1]", json!(20))]
#[case("{'a': 1}['a']", json!(1))]
fn given_container_access_when_evaluating_then_returns_value(
    #[case] source: &str,
    #[case] expected: Value,
) {
    assert_eq!(eval(source).unwrap(), expected, "{}", source);
}

#[test]
fn given_scope_layers_when_evaluating_then_first_layer_shadows() {
    // Arrange
    let inner = layer(json!({"x": 1}));
    let outer = layer(json!({"x": 100, "y": 2}));
    let scope = Scope::new().with_layer(&inner).with_layer(&outer);

    // Act
    let result = evaluate("x + y", &scope).unwrap();

    // Assert
    assert_eq!(result, json!(3));
}

#[test]
fn given_uid_when_evaluating_twice_then_each_evaluation_gets_a_fresh_id() {
    // Act
    let same = eval("uid == uid").unwrap();
    let first = eval("uid").unwrap();
    let second = eval("uid").unwrap();

    // Assert
    assert_eq!(same, json!(true));
    assert_ne!(first, second);
    assert_eq!(first.as_str().map(str::len), Some(12));
}

#[test]
fn given_unbound_name_when_evaluating_then_reports_it() {
    // Act
    let err = eval("missing + 1").unwrap_err();

    // Assert
    assert!(err.is_unbound("missing"));
    assert!(!err.is_unbound("other"));
}

#[rstest]
#[case("__import__('os')")]
#[case("open('/etc/passwd')")]
#[case("'x'.format()")]
#[case("(1).bit_length()")]
fn given_host_feature_when_evaluating_then_is_rejected(#[case] source: &str) {
    assert!(eval(source).is_err(), "{} should be rejected", source);
}

#[rstest]
#[case("1 / 0")]
#[case("1 // 0")]
#[case("[1][5]")]
#[case("'a' - 1")]
#[case("{'a': 1}.b")]
#[case("9223372036854775807 * 2")]
#[case("'ab' * 9223372036854775807")]
#[case("9223372036854775807 * 'ab'")]
#[case("[1, 2] * 9223372036854775807")]
fn given_invalid_operation_when_evaluating_then_fails(#[case] source: &str) {
    assert!(eval(source).is_err(), "{} should fail", source);
}

#[rstest]
#[case("1 +")]
#[case("(1")]
#[case("'unterminated")]
#[case("")]
fn given_malformed_source_when_parsing_then_syntax_error(#[case] source: &str) {
    assert!(matches!(parse(source), Err(EvalError::Syntax(_))), "{}", source);
}

#[test]
fn given_json_rendered_literals_when_evaluating_then_parses_them() {
    // Substituted references are rendered as JSON text
    let source = r#"{"name": "a\"b", "list": [1, 2.5, true, null]}["list"][1]"#;

    assert_eq!(eval(source).unwrap(), json!(2.5));
}
