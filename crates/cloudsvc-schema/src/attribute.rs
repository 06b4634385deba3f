//! Top-level resource attributes.
//!
//! Attributes describe the fields of a service resource outside of its user
//! config: identity, placement, computed connection data and the per-type
//! connection-info blocks.

use std::fmt;

use cloudsvc_core::ServiceType;

use crate::field::Mutability;

/// Which resource a schema describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// The generic resource able to manage every service type.
    Service,
    /// A resource bound to a single service type.
    Typed(ServiceType),
}

impl ResourceKind {
    /// Service types whose connection-info blocks this resource exposes.
    pub fn block_types(&self) -> Vec<ServiceType> {
        match self {
            Self::Service => ServiceType::ALL.to_vec(),
            Self::Typed(ty) => vec![*ty],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service => f.write_str("service"),
            Self::Typed(ty) => f.write_str(ty.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeKind {
    String,
    Integer,
    Boolean,
    List(Box<AttributeKind>),
    /// Nested block with its own attributes.
    Block(Vec<AttributeSpec>),
    /// The user config of a service type, described by the registry's field tree.
    UserConfig(ServiceType),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSpec {
    pub name: String,
    pub kind: AttributeKind,
    pub required: bool,
    pub mutability: Mutability,
    pub sensitive: bool,
    pub description: String,
}

impl AttributeSpec {
    pub fn new(name: impl Into<String>, kind: AttributeKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            mutability: Mutability::Mutable,
            sensitive: false,
            description: description.into(),
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
        self.required = false;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Same attribute with every nested level made computed.
    pub(crate) fn into_computed(self) -> Self {
        let kind = match self.kind {
            AttributeKind::Block(nested) => {
                AttributeKind::Block(nested.into_iter().map(Self::into_computed).collect())
            }
            other => other,
        };
        Self { kind, ..self }.computed()
    }
}

/// The attribute table of one resource kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSchema {
    pub kind: ResourceKind,
    pub attributes: Vec<AttributeSpec>,
}

impl ResourceSchema {
    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Attributes that cannot change after creation.
    pub fn create_only(&self) -> impl Iterator<Item = &AttributeSpec> {
        self.attributes
            .iter()
            .filter(|a| a.mutability == Mutability::CreateOnly)
    }

    pub fn sensitive(&self) -> impl Iterator<Item = &AttributeSpec> {
        self.attributes.iter().filter(|a| a.sensitive)
    }

    pub fn required(&self) -> impl Iterator<Item = &AttributeSpec> {
        self.attributes.iter().filter(|a| a.required)
    }
}
