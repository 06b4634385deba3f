//! Schema registry and user-config translation for cloudsvc.
//!
//! # Example
//!
//! ```ignore
//! use cloudsvc_core::ServiceType;
//! use cloudsvc_schema::{SchemaRegistry, translate};
//!
//! let registry = SchemaRegistry::builtin()?;
//! let shape = registry.user_config(ServiceType::Pg);
//! let config = translate::decode_declarative(shape, &serde_json::json!({ "backup_hour": "3" }))?;
//! let body = translate::to_remote(shape, &config, true)?;
//! ```

pub mod attribute;
pub mod error;
pub mod field;
pub mod registry;
pub mod translate;
pub mod value;

pub use attribute::{AttributeKind, AttributeSpec, ResourceKind, ResourceSchema};
pub use error::{SchemaError, SchemaResult};
pub use field::{FieldShape, FieldSpec, Mutability, ObjectShape};
pub use registry::{SchemaRegistry, connection_info_attributes};
pub use translate::{
    REDACTED, carry_write_only, decode_declarative, from_remote, prepare_update, redact,
    redact_config, to_remote,
};
pub use value::{ConfigObject, ConfigValue, VariantSet};
