//! Tests for the expansion pipeline: directive order, enumeration and references

use rstest::rstest;
use serde_json::{json, Value};

use runconf::domain::{expand, ErrorKind, Pipeline};
use runconf::util::testing;

#[rstest]
#[case(json!({}))]
#[case(json!({"a": 1, "b": [1, 2, {"c": "x"}], "d": {"e": null}}))]
#[case(json!([1, "two", 3.5]))]
#[case(json!("scalar"))]
fn given_document_without_directives_when_expanding_then_returns_it_unchanged(
    #[case] document: Value,
) {
    testing::init_test_setup();

    // Act
    let result = expand(document.clone()).unwrap();

    // Assert
    assert_eq!(result, vec![document]);
}

#[test]
fn given_each_with_scalars_when_expanding_then_one_document_per_item() {
    // Arrange
    let document = json!({"lr": {"$each": [1, 2, 3]}});

    // Act
    let result = expand(document).unwrap();

    // Assert
    assert_eq!(
        result,
        vec![json!({"lr": 1}), json!({"lr": 2}), json!({"lr": 3})]
    );
}

#[test]
fn given_each_with_none_and_mapping_when_expanding_then_merges_node_keys() {
    // Arrange
    let document = json!({"node": {"c": "x", "$each": ["$None", {"a": 1}]}});

    // Act
    let result = expand(document).unwrap();

    // Assert
    assert_eq!(
        result,
        vec![
            json!({"node": {"c": "x"}}),
            json!({"node": {"a": 1, "c": "x"}}),
        ]
    );
}

#[test]
fn given_two_sibling_each_when_expanding_then_first_key_is_outer_loop() {
    // Arrange
    let document = json!({
        "x": {"$each": [1, 2]},
        "y": {"$each": ["a", "b"]}
    });

    // Act
    let result = expand(document).unwrap();

    // Assert
    assert_eq!(
        result,
        vec![
            json!({"x": 1, "y": "a"}),
            json!({"x": 1, "y": "b"}),
            json!({"x": 2, "y": "a"}),
            json!({"x": 2, "y": "b"}),
        ]
    );
}

#[test]
fn given_each_inside_sequence_when_expanding_then_positions_stay_fixed() {
    // Arrange
    let document = json!({"layers": [{"$each": [8, 16]}, 4]});

    // Act
    let result = expand(document).unwrap();

    // Assert
    assert_eq!(
        result,
        vec![json!({"layers": [8, 4]}), json!({"layers": [16, 4]})]
    );
}

#[test]
fn given_from_with_empty_override_when_expanding_then_copies_base() {
    // Arrange
    let document = json!({
        "base": {"data": 1},
        "derived": {"$from": "base"}
    });

    // Act
    let result = expand(document).unwrap();

    // Assert
    assert_eq!(result[0]["derived"], json!({"data": 1}));
}

#[test]
fn given_from_with_nested_override_when_expanding_then_override_wins_recursively() {
    // Arrange
    let document = json!({
        "base": {"image": "img", "hyperparameters": {"lr": 0.1, "epochs": 10}},
        "derived": {"$from": "base", "hyperparameters": {"lr": 0.01}}
    });

    // Act
    let result = expand(document).unwrap();

    // Assert
    assert_eq!(
        result[0]["derived"],
        json!({"image": "img", "hyperparameters": {"lr": 0.01, "epochs": 10}})
    );
}

#[test]
fn given_chained_refs_when_expanding_then_resolves_transitively() {
    // Arrange
    let document = json!({"a": {"$ref": "b"}, "b": {"$ref": "c"}, "c": 10});

    // Act
    let result = expand(document).unwrap();

    // Assert
    assert_eq!(result, vec![json!({"a": 10, "b": 10, "c": 10})]);
}

#[test]
fn given_ref_to_enumerated_value_when_expanding_then_sees_each_branch() {
    // Arrange
    let document = json!({
        "size": {"$each": [1, 2]},
        "copy": {"$ref": "size"}
    });

    // Act
    let result = expand(document).unwrap();

    // Assert
    assert_eq!(
        result,
        vec![json!({"size": 1, "copy": 1}), json!({"size": 2, "copy": 2})]
    );
}

#[test]
fn given_simple_eval_when_expanding_then_evaluates() {
    // Arrange
    let document = json!({"n": {"$eval": "2 + 2"}});

    // Act
    let result = expand(document).unwrap();

    // Assert
    assert_eq!(result, vec![json!({"n": 4})]);
}

#[test]
fn given_eval_with_context_reference_when_expanding_then_substitutes_value() {
    // Arrange
    let document = json!({
        "base": {"epochs": 10, "name": "electricity-hourly"},
        "double": {"$eval": "$.base.epochs * 2"},
        "prefix": {"$eval": "$.base.name.split('-')[0]"}
    });

    // Act
    let result = expand(document).unwrap();

    // Assert
    assert_eq!(result[0]["double"], json!(20));
    assert_eq!(result[0]["prefix"], json!("electricity"));
}

#[test]
fn given_eval_over_trial_when_expanding_then_defers_as_marker() {
    // Arrange
    let document = json!({"name": {"$eval": "$trial.algorithm.image + '-job'"}});

    // Act
    let result = expand(document).unwrap();

    // Assert
    assert_eq!(
        result[0]["name"],
        json!({"$eval": "__trial__.algorithm.image + '-job'"})
    );
}

#[test]
fn given_each_inside_eval_context_when_expanding_then_each_document_keeps_its_value() {
    // Arrange
    let document = json!({
        "base": {"n": 3},
        "derived": {"$from": "base", "m": {"$eval": "$.base.n + 1"}},
        "variant": {"$each": [{"k": 1}, {"k": 2}]}
    });

    // Act
    let result = expand(document).unwrap();

    // Assert
    assert_eq!(result.len(), 2);
    for document in &result {
        assert_eq!(document["derived"], json!({"n": 3, "m": 4}));
    }
    assert_eq!(result[1]["variant"], json!({"k": 2}));
}

#[rstest]
#[case(json!({"a": {"$ref": "b", "x": 1}, "b": 1}), ErrorKind::Structure)]
#[case(json!({"a": {"$each": 3}}), ErrorKind::Structure)]
#[case(json!({"a": {"x": 1, "$each": [1, 2]}}), ErrorKind::Structure)]
#[case(json!({"a": {"$each": []}}), ErrorKind::Structure)]
#[case(json!({"a": {"$ref": "missing"}}), ErrorKind::Path)]
#[case(json!({"a": {"$from": "b.c"}, "b": {"d": 1}}), ErrorKind::Path)]
#[case(json!({"a": {"$eval": "1 +"}}), ErrorKind::Evaluation)]
#[case(json!({"a": {"$eval": "undefined_name"}}), ErrorKind::Evaluation)]
fn given_malformed_document_when_expanding_then_fails_with_kind(
    #[case] document: Value,
    #[case] kind: ErrorKind,
) {
    // Act
    let err = expand(document).unwrap_err();

    // Assert
    assert_eq!(err.kind(), kind, "unexpected error: {}", err);
}

#[test]
fn given_mutual_refs_when_expanding_then_cycle_is_detected() {
    // Arrange
    let document = json!({"a": {"$ref": "b"}, "b": {"$ref": "a"}});

    // Act
    let err = expand(document).unwrap_err();

    // Assert
    assert_eq!(err.kind(), ErrorKind::Structure);
    assert!(err.to_string().contains("cycle"), "{}", err);
}

#[test]
fn given_eval_returning_eval_when_depth_is_zero_then_fails() {
    // Arrange
    let document = json!({"a": {"$eval": "{'$eval': '1 + 1'}"}});

    // Act
    let shallow = Pipeline::new().with_max_eval_depth(0).expand(document.clone());
    let default = Pipeline::new().expand(document);

    // Assert
    assert_eq!(shallow.unwrap_err().kind(), ErrorKind::Evaluation);
    assert_eq!(default.unwrap(), vec![json!({"a": 2})]);
}

#[test]
fn given_many_branches_when_expanding_then_keeps_document_order() {
    // Arrange
    let values: Vec<i64> = (0..64).collect();
    let document = json!({"i": {"$each": values.clone()}, "copy": {"$ref": "i"}});

    // Act
    let result = expand(document).unwrap();

    // Assert
    let copies: Vec<i64> = result.iter().filter_map(|d| d["copy"].as_i64()).collect();
    assert_eq!(copies, values);
}
