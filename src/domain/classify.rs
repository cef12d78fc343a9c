//! Classification of expanded documents into typed nodes
//!
//! Every top-level value of an expanded document is tested against the typed
//! nodes in a fixed priority: mappings as [`Experiment`], [`Algorithm`],
//! [`Dataset`]; sequences as [`Experiments`], [`Algorithms`], [`Datasets`]. The
//! first match wins; anything else stays [`Typed::Unclassified`].

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::entities::{
    Algorithm, Algorithms, Dataset, Datasets, Experiment, Experiments,
};
use crate::domain::error::{ExpandError, ExpandResult};
use crate::domain::path::kind_name;
use crate::domain::versions::Versions;

/// A top-level configuration value after classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Typed {
    Experiment(Experiment),
    Algorithm(Algorithm),
    Dataset(Dataset),
    Experiments(Experiments),
    Algorithms(Algorithms),
    Datasets(Datasets),
    Unclassified(Value),
}

impl Typed {
    pub fn classify(value: Value) -> Typed {
        match value {
            Value::Object(node) => {
                let node = match Experiment::from_mapping(node) {
                    Ok(experiment) => return Typed::Experiment(experiment),
                    Err(node) => node,
                };
                let node = match Algorithm::from_mapping(node) {
                    Ok(algorithm) => return Typed::Algorithm(algorithm),
                    Err(node) => node,
                };
                match Dataset::from_mapping(node) {
                    Ok(dataset) => Typed::Dataset(dataset),
                    Err(node) => Typed::Unclassified(Value::Object(node)),
                }
            }
            Value::Array(items) => {
                let items = match Experiments::from_sequence(items) {
                    Ok(experiments) => return Typed::Experiments(experiments),
                    Err(items) => items,
                };
                let items = match Algorithms::from_sequence(items) {
                    Ok(algorithms) => return Typed::Algorithms(algorithms),
                    Err(items) => items,
                };
                match Datasets::from_sequence(items) {
                    Ok(datasets) => Typed::Datasets(datasets),
                    Err(items) => Typed::Unclassified(Value::Array(items)),
                }
            }
            scalar => Typed::Unclassified(scalar),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Typed::Experiment(_) => "Experiment",
            Typed::Algorithm(_) => "Algorithm",
            Typed::Dataset(_) => "Dataset",
            Typed::Experiments(_) => "Experiments",
            Typed::Algorithms(_) => "Algorithms",
            Typed::Datasets(_) => "Datasets",
            Typed::Unclassified(_) => "Unclassified",
        }
    }

    /// The plain tree this value was built from.
    pub fn into_value(self) -> Value {
        match self {
            Typed::Experiment(e) => Value::Object(e.as_plain_mapping()),
            Typed::Algorithm(a) => Value::Object(a.into_mapping()),
            Typed::Dataset(d) => Value::Object(d.into_mapping()),
            Typed::Experiments(e) => Value::Array(e.as_plain_sequence()),
            Typed::Algorithms(a) => Value::Array(a.as_plain_sequence()),
            Typed::Datasets(d) => Value::Array(d.as_plain_sequence()),
            Typed::Unclassified(value) => value,
        }
    }

    /// Concatenate two values of the same family.
    pub fn add(self, other: Typed) -> ExpandResult<Typed> {
        Ok(match (self, other) {
            (Typed::Algorithm(a), Typed::Algorithm(b)) => Typed::Algorithms(a + b),
            (Typed::Algorithm(a), Typed::Algorithms(b)) => Typed::Algorithms(a + b),
            (Typed::Algorithms(a), Typed::Algorithm(b)) => Typed::Algorithms(a + b),
            (Typed::Algorithms(a), Typed::Algorithms(b)) => Typed::Algorithms(a + b),
            (Typed::Dataset(a), Typed::Dataset(b)) => Typed::Datasets(a + b),
            (Typed::Dataset(a), Typed::Datasets(b)) => Typed::Datasets(a + b),
            (Typed::Datasets(a), Typed::Dataset(b)) => Typed::Datasets(a + b),
            (Typed::Datasets(a), Typed::Datasets(b)) => Typed::Datasets(a + b),
            (Typed::Experiment(a), Typed::Experiment(b)) => Typed::Experiments(a + b),
            (Typed::Experiment(a), Typed::Experiments(b)) => Typed::Experiments(a + b),
            (Typed::Experiments(a), Typed::Experiment(b)) => Typed::Experiments(a + b),
            (Typed::Experiments(a), Typed::Experiments(b)) => Typed::Experiments(a + b),
            (left, right) => return Err(illegal("+", &left, &right)),
        })
    }

    /// Pair the algorithm family with the dataset family.
    pub fn mul(self, other: Typed) -> ExpandResult<Experiments> {
        Ok(match (self, other) {
            (Typed::Algorithm(a), Typed::Dataset(d)) => a * d,
            (Typed::Algorithm(a), Typed::Datasets(d)) => a * d,
            (Typed::Algorithms(a), Typed::Dataset(d)) => a * d,
            (Typed::Algorithms(a), Typed::Datasets(d)) => a * d,
            (Typed::Dataset(d), Typed::Algorithm(a)) => d * a,
            (Typed::Dataset(d), Typed::Algorithms(a)) => d * a,
            (Typed::Datasets(d), Typed::Algorithm(a)) => d * a,
            (Typed::Datasets(d), Typed::Algorithms(a)) => d * a,
            (left, right) => return Err(illegal("*", &left, &right)),
        })
    }
}

fn illegal(op: &str, left: &Typed, right: &Typed) -> ExpandError {
    ExpandError::invariant(
        "combination",
        format!("cannot compute {} {} {}", left.type_name(), op, right.type_name()),
    )
}

impl fmt::Display for Typed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Typed::Experiment(e) => fmt::Display::fmt(e, f),
            Typed::Algorithm(a) => fmt::Display::fmt(a, f),
            Typed::Dataset(d) => fmt::Display::fmt(d, f),
            Typed::Experiments(e) => fmt::Display::fmt(e, f),
            Typed::Algorithms(a) => fmt::Display::fmt(a, f),
            Typed::Datasets(d) => fmt::Display::fmt(d, f),
            Typed::Unclassified(value) => fmt::Display::fmt(value, f),
        }
    }
}

impl Versions<Typed> {
    /// Multiply every left version with every right version, left outermost,
    /// and concatenate the results.
    pub fn multiply(&self, right: &Versions<Typed>) -> ExpandResult<Experiments> {
        let mut experiments = Vec::new();
        for outer in self {
            for inner in right {
                experiments.extend(outer.clone().mul(inner.clone())?);
            }
        }
        Experiments::new(experiments)
    }
}

/// Value of one top-level key across all expanded documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entry {
    /// The key has the same single value in the only document.
    Single(Typed),
    /// One value per document, in document order.
    Versions(Versions<Typed>),
}

impl Entry {
    pub fn into_versions(self) -> Versions<Typed> {
        match self {
            Entry::Single(typed) => Versions::single(typed),
            Entry::Versions(versions) => versions,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Entry::Single(_) => 1,
            Entry::Versions(versions) => versions.len(),
        }
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Single(typed) => fmt::Display::fmt(typed, f),
            Entry::Versions(versions) => fmt::Display::fmt(versions, f),
        }
    }
}

/// Classified configuration: each top-level key with its typed value(s).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExpandedConfig {
    entries: BTreeMap<String, Entry>,
}

impl ExpandedConfig {
    /// Classify each document's top-level values and merge them per key.
    pub fn aggregate(documents: Vec<Value>) -> ExpandResult<Self> {
        let mut collected: BTreeMap<String, Vec<Typed>> = BTreeMap::new();
        for document in documents {
            let node = match document {
                Value::Object(node) => node,
                other => {
                    return Err(ExpandError::structure(
                        "document",
                        format!(
                            "an expanded document must be a mapping, found {}",
                            kind_name(&other)
                        ),
                        other,
                    ))
                }
            };
            for (key, value) in node {
                collected.entry(key).or_default().push(Typed::classify(value));
            }
        }

        let entries = collected
            .into_iter()
            .filter_map(|(key, mut values)| {
                let entry = if values.len() == 1 {
                    Entry::Single(values.pop()?)
                } else {
                    Entry::Versions(Versions::new(values)?)
                };
                Some((key, entry))
            })
            .collect::<BTreeMap<_, _>>();
        debug!(keys = entries.len(), "aggregated configuration");
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Multiply the values under `left` and `right` into experiments.
    ///
    /// Single values count as one version.
    pub fn multiply(&self, left: &str, right: &str) -> ExpandResult<Experiments> {
        let left = self.require(left)?.clone().into_versions();
        let right = self.require(right)?.clone().into_versions();
        left.multiply(&right)
    }

    fn require(&self, key: &str) -> ExpandResult<&Entry> {
        self.entries.get(key).ok_or_else(|| ExpandError::Path {
            path: key.to_string(),
            segment: key.to_string(),
            reason: format!(
                "no top-level key '{}' (available: {})",
                key,
                self.entries.keys().cloned().collect::<Vec<_>>().join(", ")
            ),
        })
    }
}
