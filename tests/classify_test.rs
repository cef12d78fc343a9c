//! Tests for classification and aggregation of expanded documents

use rstest::rstest;
use serde_json::{json, Value};

use runconf::domain::{transform_config, Entry, ErrorKind, ExpandedConfig, Typed};

#[rstest]
#[case(json!({"algorithm": {"image": "i", "instance": "m"}, "dataset": {"path": {}}}), "Experiment")]
#[case(json!({"image": "i", "instance": "m"}), "Algorithm")]
#[case(json!({"path": {"train": "s3://t"}}), "Dataset")]
#[case(json!([{"image": "i", "instance": "m"}]), "Algorithms")]
#[case(json!([{"path": {}}, {"path": {}, "meta": {}}]), "Datasets")]
#[case(json!([{"algorithm": {"image": "i", "instance": "m"}, "dataset": {"path": {}}}]), "Experiments")]
#[case(json!({"image": "i"}), "Unclassified")]
#[case(json!([{"image": "i", "instance": "m"}, {"path": {}}]), "Unclassified")]
#[case(json!([]), "Unclassified")]
#[case(json!(42), "Unclassified")]
fn given_value_when_classifying_then_first_matching_type_wins(
    #[case] value: Value,
    #[case] expected: &str,
) {
    // Act
    let typed = Typed::classify(value.clone());

    // Assert
    assert_eq!(typed.type_name(), expected);
    assert_eq!(typed.into_value(), value);
}

#[test]
fn given_node_matching_algorithm_and_dataset_when_classifying_then_algorithm_wins() {
    // Arrange
    let value = json!({"image": "i", "instance": "m", "path": {"train": "s3://t"}});

    // Act
    let typed = Typed::classify(value);

    // Assert
    assert!(matches!(typed, Typed::Algorithm(_)));
}

#[test]
fn given_single_document_when_aggregating_then_values_are_unwrapped() {
    // Act
    let config = ExpandedConfig::aggregate(vec![json!({"a": {"image": "i", "instance": "m"}})]).unwrap();

    // Assert
    assert_eq!(config.len(), 1);
    assert!(matches!(config.get("a"), Some(Entry::Single(Typed::Algorithm(_)))));
}

#[test]
fn given_enumerated_document_when_transforming_then_key_holds_versions_in_order() {
    // Arrange
    let document = json!({
        "algo": {"image": "img", "instance": {"$each": ["small", "large"]}},
        "data": {"path": {"train": "s3://t"}}
    });

    // Act
    let config = transform_config(document).unwrap();

    // Assert
    let Some(Entry::Versions(versions)) = config.get("algo") else {
        panic!("expected versions, got {:?}", config.get("algo"));
    };
    let instances: Vec<Value> = versions
        .iter()
        .map(|typed| typed.clone().into_value()["instance"].clone())
        .collect();
    assert_eq!(instances, vec![json!("small"), json!("large")]);
    assert_eq!(config.get("data").map(Entry::len), Some(2));
}

#[test]
fn given_algorithm_versions_and_dataset_when_multiplying_then_left_versions_are_outer() {
    // Arrange
    let document = json!({
        "algo": {"image": {"$each": ["a", "b"]}, "instance": "m"},
        "data": {"path": {"train": "s3://t"}}
    });
    let config = transform_config(document).unwrap();

    // Act
    let experiments = config.multiply("algo", "data").unwrap();

    // Assert
    let images: Vec<&str> = experiments.iter().map(|e| e.algorithm().image()).collect();
    assert_eq!(images, vec!["a", "a", "b", "b"]);
}

#[test]
fn given_dataset_first_when_multiplying_then_dataset_is_outer_loop() {
    // Arrange
    let config = transform_config(json!({
        "algos": [{"image": "a", "instance": "m"}, {"image": "b", "instance": "m"}],
        "data": [{"path": {"x": "1"}}, {"path": {"x": "2"}}]
    }))
    .unwrap();

    // Act
    let experiments = config.multiply("data", "algos").unwrap();

    // Assert
    let pairs: Vec<(String, Value)> = experiments
        .iter()
        .map(|e| (e.algorithm().image().to_string(), e.dataset().path()["x"].clone()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("a".to_string(), json!("1")),
            ("b".to_string(), json!("1")),
            ("a".to_string(), json!("2")),
            ("b".to_string(), json!("2")),
        ]
    );
}

#[rstest]
#[case("algo", "algo")]
#[case("data", "data")]
#[case("algo", "other")]
fn given_illegal_combination_when_multiplying_then_invariant_error(
    #[case] left: &str,
    #[case] right: &str,
) {
    // Arrange
    let config = transform_config(json!({
        "algo": {"image": "a", "instance": "m"},
        "data": {"path": {}},
        "other": 3
    }))
    .unwrap();

    // Act
    let err = config.multiply(left, right).unwrap_err();

    // Assert
    assert_eq!(err.kind(), ErrorKind::Invariant);
}

#[test]
fn given_missing_key_when_multiplying_then_path_error() {
    let config = transform_config(json!({"algo": {"image": "a", "instance": "m"}})).unwrap();

    let err = config.multiply("algo", "nope").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Path);
    assert!(err.to_string().contains("nope"));
}

#[test]
fn given_typed_values_when_adding_dynamically_then_checks_families() {
    // Arrange
    let a = Typed::classify(json!({"image": "a", "instance": "m"}));
    let b = Typed::classify(json!([{"image": "b", "instance": "m"}]));
    let d = Typed::classify(json!({"path": {}}));

    // Act
    let sum = a.clone().add(b).unwrap();
    let mixed = a.add(d);

    // Assert
    assert_eq!(sum.type_name(), "Algorithms");
    assert_eq!(mixed.unwrap_err().kind(), ErrorKind::Invariant);
}

#[test]
fn given_non_mapping_document_when_aggregating_then_structure_error() {
    let err = ExpandedConfig::aggregate(vec![json!([1, 2])]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structure);
}

#[test]
fn given_config_when_serializing_then_keys_are_sorted_and_versions_are_lists() {
    // Arrange
    let config = transform_config(json!({"z": 1, "a": {"$each": [1, 2]}})).unwrap();

    // Act
    let value = serde_json::to_value(&config).unwrap();

    // Assert
    assert_eq!(value, json!({"a": [1, 2], "z": [1, 1]}));
    let keys: Vec<&String> = config.keys().collect();
    assert_eq!(keys, vec!["a", "z"]);
}
