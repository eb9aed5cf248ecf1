//! Parameter values as handed to the forwarding core.
//!
//! The parameter extractor produces a [`ParameterBag`] per request. The core
//! only reads it through [`ParamSource`], so any keyed store of [`ParamValue`]s
//! can feed the pipeline.

use std::collections::HashMap;

use axum::body::Bytes;
use serde_json::{Map, Value};

/// An uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// A parameter value. Deliberately closed: text, a JSON scalar or array, a JSON
/// object, or a file.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Scalar(Value),
    Map(Map<String, Value>),
    File(FilePart),
}

impl ParamValue {
    /// Objects become `Map`, everything else `Scalar`.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => ParamValue::Map(map),
            other => ParamValue::Scalar(other),
        }
    }

    /// JSON view of the value; `None` for files.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            ParamValue::Text(s) => Some(Value::String(s.clone())),
            ParamValue::Scalar(v) => Some(v.clone()),
            ParamValue::Map(m) => Some(Value::Object(m.clone())),
            ParamValue::File(_) => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

/// Read access to named parameters.
pub trait ParamSource {
    fn get(&self, name: &str) -> Option<&ParamValue>;
}

/// Parameters of a single inbound request, keyed by declared name.
#[derive(Debug, Clone, Default)]
pub struct ParameterBag {
    values: HashMap<String, ParamValue>,
}

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ParamSource for ParameterBag {
    fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParameterBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = ParameterBag::new();
        for (k, v) in iter {
            bag.insert(k, v);
        }
        bag
    }
}

/// Ordered name → value mapping for one outbound channel.
///
/// Inserting an existing name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelMap {
    entries: Vec<(String, ParamValue)>,
}

impl ChannelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ParamValue)> for ChannelMap {
    fn from_iter<I: IntoIterator<Item = (K, ParamValue)>>(iter: I) -> Self {
        let mut map = ChannelMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
