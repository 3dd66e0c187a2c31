//! Build/factory property bag.
//!
//! A flat mapping of string keys to JSON-compatible values, merged from the
//! factory and build layers (build wins) and handed to recipe code as a
//! read-only view. Immutability is enforced by the type: there is no
//! mutating API.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors constructing a property bag.
#[derive(Debug, Error)]
pub enum PropertyError {
    /// Properties must be a flat JSON object.
    #[error("properties must be a JSON object, got {0}")]
    NotAnObject(String),
}

/// Read-only property mapping passed into recipe/generator code.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct PropertyBag {
    entries: BTreeMap<String, Value>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bag from a JSON value, which must be an object.
    pub fn from_json(value: Value) -> Result<Self, PropertyError> {
        match value {
            Value::Object(map) => Ok(Self::from_object(map)),
            other => Err(PropertyError::NotAnObject(json_kind(&other).to_string())),
        }
    }

    /// Build a bag from a JSON object map.
    pub fn from_object(map: Map<String, Value>) -> Self {
        Self {
            entries: map.into_iter().collect(),
        }
    }

    /// Merge two layers: build properties override factory properties.
    pub fn merge(factory: PropertyBag, build: PropertyBag) -> PropertyBag {
        let mut entries = factory.entries;
        entries.extend(build.entries);
        PropertyBag { entries }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.entries.get(key).and_then(Value::as_bool)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.entries.get(key).and_then(Value::as_i64)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// The bag as a JSON object value.
    pub fn to_json(&self) -> Value {
        Value::Object(self.entries.clone().into_iter().collect())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
