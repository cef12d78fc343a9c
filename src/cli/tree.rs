//! Tree rendering of classified configurations

use serde_json::Value;
use termtree::Tree;

use crate::domain::{Entry, ExpandedConfig, Typed};

pub trait ToTree {
    fn to_tree(&self, root: &str) -> Tree<String>;
}

impl ToTree for ExpandedConfig {
    fn to_tree(&self, root: &str) -> Tree<String> {
        let leaves = self.iter().map(|(key, entry)| entry_tree(key, entry));
        Tree::new(root.to_string()).with_leaves(leaves)
    }
}

fn entry_tree(key: &str, entry: &Entry) -> Tree<String> {
    match entry {
        Entry::Single(typed) => typed_tree(format!("{}: {}", key, typed.type_name()), typed),
        Entry::Versions(versions) => {
            let leaves = versions
                .iter()
                .enumerate()
                .map(|(i, typed)| typed_tree(format!("[{}] {}", i, typed.type_name()), typed));
            Tree::new(format!("{}: {} versions", key, versions.len())).with_leaves(leaves)
        }
    }
}

fn typed_tree(label: String, typed: &Typed) -> Tree<String> {
    let value = typed.clone().into_value();
    match &value {
        Value::Object(_) | Value::Array(_) => Tree::new(label).with_leaves(value_leaves(&value)),
        scalar => Tree::new(format!("{} = {}", label, scalar)),
    }
}

fn value_leaves(value: &Value) -> Vec<Tree<String>> {
    let labelled: Vec<(String, &Value)> = match value {
        Value::Object(node) => node.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("[{}]", i), v))
            .collect(),
        _ => return Vec::new(),
    };
    labelled
        .into_iter()
        .map(|(label, child)| match child {
            Value::Object(_) | Value::Array(_) => {
                Tree::new(label).with_leaves(value_leaves(child))
            }
            scalar => Tree::new(format!("{}: {}", label, scalar)),
        })
        .collect()
}
