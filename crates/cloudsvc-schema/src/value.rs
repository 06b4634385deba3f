//! Typed declarative user-config values.
//!
//! Values are decoded from user input against a field tree
//! ([`crate::translate::decode_declarative`]) and never held as untyped JSON
//! inside the controller.

use std::collections::BTreeMap;

use serde::Serialize;

/// One declarative value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    List(Vec<ConfigValue>),
    Object(ConfigObject),
    OneOf(VariantSet),
}

impl ConfigValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Number(_) => "number",
            Self::Boolean(_) => "boolean",
            Self::List(_) => "array",
            Self::Object(_) => "object",
            Self::OneOf(_) => "one_of",
        }
    }

    pub fn as_object(&self) -> Option<&ConfigObject> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<ConfigObject> for ConfigValue {
    fn from(value: ConfigObject) -> Self {
        Self::Object(value)
    }
}

impl From<VariantSet> for ConfigValue {
    fn from(value: VariantSet) -> Self {
        Self::OneOf(value)
    }
}

impl<T: Into<ConfigValue>> From<Vec<T>> for ConfigValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// Named fields of an object, ordered by name.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ConfigObject {
    fields: BTreeMap<String, ConfigValue>,
}

impl ConfigObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ConfigValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<ConfigValue> {
        self.fields.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Declarative form of a one-of field: every variant name maps to an
/// object, and at most one of them may be non-empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct VariantSet {
    variants: BTreeMap<String, ConfigObject>,
}

impl VariantSet {
    /// Creates a set with an empty object for every name.
    pub fn empty<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variants: names
                .into_iter()
                .map(|n| (n.into(), ConfigObject::new()))
                .collect(),
        }
    }

    pub fn with_variant(mut self, name: impl Into<String>, value: ConfigObject) -> Self {
        self.variants.insert(name.into(), value);
        self
    }

    pub fn variant(&self, name: &str) -> Option<&ConfigObject> {
        self.variants.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigObject)> {
        self.variants.iter()
    }

    /// Variants that carry at least one field.
    pub fn populated(&self) -> Vec<(&str, &ConfigObject)> {
        self.variants
            .iter()
            .filter(|(_, obj)| !obj.is_empty())
            .map(|(name, obj)| (name.as_str(), obj))
            .collect()
    }

    pub fn is_unpopulated(&self) -> bool {
        self.variants.values().all(ConfigObject::is_empty)
    }
}
