//! Multi-valued tree positions
//!
//! A [`Versions`] says "this position may independently take any of these values".
//! Combining several of them yields their cartesian product in standard
//! product-of-lists order: the first container is the outermost loop.

use std::fmt;

use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;

/// Ordered, non-empty list of candidate values for one position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Versions<T = Value> {
    items: Vec<T>,
}

impl<T> Versions<T> {
    /// Wrap `items`; returns `None` when the list is empty.
    pub fn new(items: Vec<T>) -> Option<Self> {
        if items.is_empty() {
            None
        } else {
            Some(Self { items })
        }
    }

    /// A container with exactly one candidate.
    pub fn single(item: T) -> Self {
        Self { items: vec![item] }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    /// Concatenate nested containers one level deep, preserving order.
    pub fn flatten(nested: Versions<Versions<T>>) -> Versions<T> {
        Versions {
            items: nested.items.into_iter().flat_map(|v| v.items).collect(),
        }
    }
}

impl<T: Clone> Versions<T> {
    /// Cartesian product of `lists`, one combination per output entry.
    ///
    /// The first list varies slowest. Returns `None` when `lists` is empty.
    pub fn cartesian(lists: Vec<Versions<T>>) -> Option<Versions<Vec<T>>> {
        if lists.is_empty() {
            return None;
        }
        let items: Vec<Vec<T>> = lists
            .into_iter()
            .map(|v| v.items)
            .multi_cartesian_product()
            .collect();
        Versions::new(items)
    }
}

impl<T> IntoIterator for Versions<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Versions<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: fmt::Display> fmt::Display for Versions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.len() == 1 {
            return write!(f, "{}", self.items[0]);
        }
        write!(f, "Versions([{}])", self.items.iter().join(", "))
    }
}
