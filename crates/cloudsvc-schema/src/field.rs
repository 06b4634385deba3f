//! User-config field trees.
//!
//! A field tree mirrors the JSON schema the remote API publishes for a
//! service type's user config. Trees are plain data: they are deserialized
//! from schema documents (see [`crate::registry`]) and interpreted by the
//! translator.
//!
//! ```json
//! {
//!   "properties": {
//!     "backup_hour": { "type": "integer", "minimum": 0, "maximum": 23 },
//!     "admin_username": { "type": "string", "mutability": "create_only" },
//!     "auth": {
//!       "type": "one_of",
//!       "discriminator": "method",
//!       "variants": {
//!         "certificate": { "properties": { "cert": { "type": "string" } } },
//!         "password": { "properties": { "password": { "type": "string", "sensitive": true } } }
//!       }
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// When a field may be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutability {
    /// Writable on create and update.
    #[default]
    Mutable,
    /// Accepted only when the resource is created.
    CreateOnly,
    /// Reported by the remote; never sent.
    Computed,
}

/// A single field in a user-config tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(flatten)]
    pub shape: FieldShape,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub mutability: Mutability,
    /// Value must be hidden in logs and diffs.
    #[serde(default)]
    pub sensitive: bool,
    /// The remote accepts the value but never returns it.
    #[serde(default)]
    pub write_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSpec {
    pub fn new(shape: FieldShape) -> Self {
        Self {
            shape,
            required: false,
            mutability: Mutability::Mutable,
            sensitive: false,
            write_only: false,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn create_only(mut self) -> Self {
        self.mutability = Mutability::CreateOnly;
        self
    }

    pub fn computed(mut self) -> Self {
        self.mutability = Mutability::Computed;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    /// Whether the field may be sent on the current path.
    pub fn is_writable(&self, is_create: bool) -> bool {
        match self.mutability {
            Mutability::Mutable => true,
            Mutability::CreateOnly => is_create,
            Mutability::Computed => false,
        }
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        self.shape.type_name()
    }
}

/// Structural part of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldShape {
    String {
        #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
        allowed: Vec<String>,
    },
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<i64>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
    },
    Boolean,
    Array {
        items: Box<FieldSpec>,
    },
    Object {
        #[serde(default)]
        properties: BTreeMap<String, FieldSpec>,
    },
    /// Exactly one named variant may be populated at a time. The remote
    /// reports the active variant's name under `discriminator`.
    OneOf {
        discriminator: String,
        variants: BTreeMap<String, ObjectShape>,
    },
}

impl FieldShape {
    pub fn string() -> Self {
        Self::String {
            allowed: Vec::new(),
        }
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::String {
            allowed: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn integer(minimum: Option<i64>, maximum: Option<i64>) -> Self {
        Self::Integer { minimum, maximum }
    }

    pub fn number(minimum: Option<f64>, maximum: Option<f64>) -> Self {
        Self::Number { minimum, maximum }
    }

    pub fn array(items: FieldSpec) -> Self {
        Self::Array {
            items: Box::new(items),
        }
    }

    pub fn object(shape: ObjectShape) -> Self {
        Self::Object {
            properties: shape.properties,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String { .. } => "string",
            Self::Integer { .. } => "integer",
            Self::Number { .. } => "number",
            Self::Boolean => "boolean",
            Self::Array { .. } => "array",
            Self::Object { .. } => "object",
            Self::OneOf { .. } => "one_of",
        }
    }
}

/// A set of named fields: the root of a user config, a nested object or a
/// one-of variant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectShape {
    #[serde(default)]
    pub properties: BTreeMap<String, FieldSpec>,
}

impl ObjectShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.properties.insert(name.into(), spec);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.properties.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
