// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage arguments record: an ordered, mergeable field map.
//!
//! Fields keep their first-seen position. Merging a field that already exists
//! overwrites its value in place; merging an unknown field appends it.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Reserved field carrying the orchestrator's invocation descriptor.
pub const INVOCATION_FIELD: &str = "__invocation__";
/// Reserved field carrying the orchestrator's version descriptor.
pub const VERSION_FIELD: &str = "__version__";

/// Named fields handed to stage code (`args`, `outs`, chunk defs).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageArgs {
    fields: IndexMap<String, Value>,
}

impl StageArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON value. Non-object values yield an empty record.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => Self::default(),
        }
    }

    /// Merge fields: known names are overwritten in place, unknown names appended.
    pub fn set<I, K>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (name, value) in fields {
            self.insert(name, value);
        }
    }

    /// Merge every field of a JSON object; other values are ignored.
    pub fn merge_value(&mut self, value: Value) {
        if let Value::Object(map) = value {
            self.set(map);
        }
    }

    /// Set one field, returning its previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Deserialize one field into a typed value.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Option<Result<T, serde_json::Error>> {
        self.fields.get(name).map(|v| T::deserialize(v))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field at `index` in first-seen order.
    pub fn nth(&self, index: usize) -> Option<(&str, &Value)> {
        self.fields.get_index(index).map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in first-seen order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Field values in first-seen order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Snapshot as a JSON object, preserving field order.
    pub fn items(&self) -> Map<String, Value> {
        self.fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.items())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for StageArgs {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        let mut args = Self::new();
        args.set(iter);
        args
    }
}

impl std::ops::Index<usize> for StageArgs {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.fields[index]
    }
}

impl<'a> IntoIterator for &'a StageArgs {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl fmt::Display for StageArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
