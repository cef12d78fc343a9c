//! Domain entities: typed configuration nodes
//!
//! Each type wraps mapping data and checks a structural invariant when built.
//! The singular types have a plural counterpart holding a non-empty, ordered
//! list of them. Combining them is defined in [`crate::domain::algebra`].

use std::fmt;
use std::ops::Deref;

use lazy_static::lazy_static;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::domain::error::{ExpandError, ExpandResult};
use crate::domain::path::kind_name;

pub type Mapping = Map<String, Value>;

lazy_static! {
    static ref EMPTY: Mapping = Mapping::new();
}

fn is_string(node: &Mapping, key: &str) -> bool {
    node.get(key).is_some_and(Value::is_string)
}

fn is_mapping(node: &Mapping, key: &str) -> bool {
    node.get(key).is_some_and(Value::is_object)
}

fn is_optional_mapping(node: &Mapping, key: &str) -> bool {
    node.get(key).map_or(true, Value::is_object)
}

fn mapping_at<'a>(node: &'a Mapping, key: &str) -> &'a Mapping {
    node.get(key).and_then(Value::as_object).unwrap_or(&EMPTY)
}

/// Shared surface of the mapping-backed node types.
macro_rules! mapping_node {
    ($name:ident, $label:literal) => {
        impl $name {
            /// Wrap `node`, or hand it back unchanged if the invariant fails.
            pub fn from_mapping(node: Mapping) -> Result<Self, Mapping> {
                if Self::verify(&node) {
                    Ok(Self(node))
                } else {
                    Err(node)
                }
            }

            pub fn new(node: Mapping) -> ExpandResult<Self> {
                Self::from_mapping(node).map_err(|node| {
                    ExpandError::invariant(
                        $label,
                        format!("{} does not hold for {}", Self::RULE, Value::Object(node)),
                    )
                })
            }

            pub fn as_plain_mapping(&self) -> Mapping {
                self.0.clone()
            }

            pub fn into_mapping(self) -> Mapping {
                self.0
            }
        }

        impl Deref for $name {
            type Target = Mapping;

            fn deref(&self) -> &Mapping {
                &self.0
            }
        }

        impl TryFrom<Value> for $name {
            type Error = ExpandError;

            fn try_from(value: Value) -> ExpandResult<Self> {
                match value {
                    Value::Object(node) => Self::new(node),
                    other => Err(ExpandError::invariant(
                        $label,
                        format!("expected a mapping, found {}", kind_name(&other)),
                    )),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), Value::Object(self.0.clone()))
            }
        }
    };
}

/// A training algorithm: a container image, the instance type to run it on and
/// optional hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Algorithm(Mapping);

impl Algorithm {
    const RULE: &'static str = "string 'image', string 'instance', optional mapping 'hyperparameters'";

    pub fn verify(node: &Mapping) -> bool {
        is_string(node, "image")
            && is_string(node, "instance")
            && is_optional_mapping(node, "hyperparameters")
    }

    pub fn image(&self) -> &str {
        self.0.get("image").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn instance(&self) -> &str {
        self.0.get("instance").and_then(Value::as_str).unwrap_or_default()
    }

    /// Hyperparameters, empty when the node has none.
    pub fn hyperparameters(&self) -> &Mapping {
        mapping_at(&self.0, "hyperparameters")
    }
}

mapping_node!(Algorithm, "algorithm");

/// A dataset: where its channels live and optional metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Dataset(Mapping);

impl Dataset {
    const RULE: &'static str = "mapping 'path', optional mapping 'meta'";

    pub fn verify(node: &Mapping) -> bool {
        is_mapping(node, "path") && is_optional_mapping(node, "meta")
    }

    pub fn path(&self) -> &Mapping {
        mapping_at(&self.0, "path")
    }

    pub fn meta(&self) -> &Mapping {
        mapping_at(&self.0, "meta")
    }
}

mapping_node!(Dataset, "dataset");

/// One algorithm paired with one dataset.
///
/// Keys besides `algorithm` and `dataset` are kept as they are.
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    algorithm: Algorithm,
    dataset: Dataset,
    extra: Mapping,
}

impl Experiment {
    pub fn verify(node: &Mapping) -> bool {
        node.get("algorithm")
            .and_then(Value::as_object)
            .is_some_and(Algorithm::verify)
            && node
                .get("dataset")
                .and_then(Value::as_object)
                .is_some_and(Dataset::verify)
    }

    pub fn from_parts(algorithm: Algorithm, dataset: Dataset) -> Self {
        Self {
            algorithm,
            dataset,
            extra: Mapping::new(),
        }
    }

    /// Wrap `node`, or hand it back if it is not an experiment.
    pub fn from_mapping(mut node: Mapping) -> Result<Self, Mapping> {
        if !Self::verify(&node) {
            return Err(node);
        }
        let algorithm = node.shift_remove("algorithm");
        let dataset = node.shift_remove("dataset");
        match (algorithm, dataset) {
            (Some(Value::Object(algorithm)), Some(Value::Object(dataset))) => Ok(Self {
                algorithm: Algorithm(algorithm),
                dataset: Dataset(dataset),
                extra: node,
            }),
            _ => Err(node),
        }
    }

    pub fn new(node: Mapping) -> ExpandResult<Self> {
        Self::from_mapping(node).map_err(|node| {
            ExpandError::invariant(
                "experiment",
                format!(
                    "requires a valid algorithm under 'algorithm' and a valid dataset under 'dataset', got {}",
                    Value::Object(node)
                ),
            )
        })
    }

    /// Pair two nodes, working out which one is the algorithm.
    ///
    /// `first` is tried as the algorithm before the roles are swapped.
    pub fn from_nodes(first: &Mapping, second: &Mapping) -> ExpandResult<Self> {
        let pair = |algorithm: &Mapping, dataset: &Mapping| {
            (Algorithm::verify(algorithm) && Dataset::verify(dataset)).then(|| {
                Self::from_parts(Algorithm(algorithm.clone()), Dataset(dataset.clone()))
            })
        };
        pair(first, second)
            .or_else(|| pair(second, first))
            .ok_or_else(|| {
                ExpandError::invariant(
                    "experiment",
                    format!(
                        "requires one algorithm and one dataset, got {} and {}",
                        Value::Object(first.clone()),
                        Value::Object(second.clone())
                    ),
                )
            })
    }

    pub fn algorithm(&self) -> &Algorithm {
        &self.algorithm
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn extra(&self) -> &Mapping {
        &self.extra
    }

    pub fn as_plain_mapping(&self) -> Mapping {
        let mut node = Mapping::with_capacity(self.extra.len() + 2);
        node.insert("algorithm".to_string(), Value::Object(self.algorithm.as_plain_mapping()));
        node.insert("dataset".to_string(), Value::Object(self.dataset.as_plain_mapping()));
        for (key, value) in &self.extra {
            node.insert(key.clone(), value.clone());
        }
        node
    }
}

impl TryFrom<Value> for Experiment {
    type Error = ExpandError;

    fn try_from(value: Value) -> ExpandResult<Self> {
        match value {
            Value::Object(node) => Self::new(node),
            other => Err(ExpandError::invariant(
                "experiment",
                format!("expected a mapping, found {}", kind_name(&other)),
            )),
        }
    }
}

impl Serialize for Experiment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_plain_mapping().serialize(serializer)
    }
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Experiment({})", Value::Object(self.as_plain_mapping()))
    }
}

/// Non-empty, ordered collection of one node type.
macro_rules! plural_node {
    ($name:ident, $item:ident, $label:literal) => {
        #[doc = concat!("Non-empty, ordered list of [`", stringify!($item), "`] nodes.")]
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(transparent)]
        pub struct $name(Vec<$item>);

        impl $name {
            pub fn new(items: Vec<$item>) -> ExpandResult<Self> {
                if items.is_empty() {
                    return Err(ExpandError::invariant($label, "must not be empty"));
                }
                Ok(Self(items))
            }

            /// Every element must satisfy the singular invariant.
            pub fn verify(items: &[Value]) -> bool {
                !items.is_empty()
                    && items
                        .iter()
                        .all(|item| item.as_object().is_some_and($item::verify))
            }

            /// Wrap `items`, or hand them back if any element is invalid.
            pub fn from_sequence(items: Vec<Value>) -> Result<Self, Vec<Value>> {
                if !Self::verify(&items) {
                    return Err(items);
                }
                let mut wrapped = Vec::with_capacity(items.len());
                for item in &items {
                    match item {
                        Value::Object(node) => match $item::from_mapping(node.clone()) {
                            Ok(node) => wrapped.push(node),
                            Err(_) => return Err(items),
                        },
                        _ => return Err(items),
                    }
                }
                Ok(Self(wrapped))
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            /// Always `false`; present for API symmetry with `len`.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn iter(&self) -> std::slice::Iter<'_, $item> {
                self.0.iter()
            }

            pub fn into_vec(self) -> Vec<$item> {
                self.0
            }

            pub fn as_plain_sequence(&self) -> Vec<Value> {
                self.0
                    .iter()
                    .map(|item| Value::Object(item.as_plain_mapping()))
                    .collect()
            }

            /// Built from parts already known to be non-empty.
            pub(crate) fn from_parts(items: Vec<$item>) -> Self {
                debug_assert!(!items.is_empty());
                Self(items)
            }
        }

        impl TryFrom<Value> for $name {
            type Error = ExpandError;

            fn try_from(value: Value) -> ExpandResult<Self> {
                match value {
                    Value::Array(items) => Self::from_sequence(items).map_err(|items| {
                        ExpandError::invariant(
                            $label,
                            format!(
                                "every element must be a valid {}, got {}",
                                stringify!($item),
                                Value::Array(items)
                            ),
                        )
                    }),
                    other => Err(ExpandError::invariant(
                        $label,
                        format!("expected a sequence, found {}", kind_name(&other)),
                    )),
                }
            }
        }

        impl IntoIterator for $name {
            type Item = $item;
            type IntoIter = std::vec::IntoIter<$item>;

            fn into_iter(self) -> Self::IntoIter {
                self.0.into_iter()
            }
        }

        impl<'a> IntoIterator for &'a $name {
            type Item = &'a $item;
            type IntoIter = std::slice::Iter<'a, $item>;

            fn into_iter(self) -> Self::IntoIter {
                self.0.iter()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let items: Vec<String> = self.0.iter().map(ToString::to_string).collect();
                write!(f, "{}([{}])", stringify!($name), items.join(", "))
            }
        }
    };
}

plural_node!(Algorithms, Algorithm, "algorithms");
plural_node!(Datasets, Dataset, "datasets");
plural_node!(Experiments, Experiment, "experiments");
