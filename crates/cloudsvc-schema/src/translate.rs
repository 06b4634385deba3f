//! Translation between declarative user config and the remote JSON format.
//!
//! The translator is driven entirely by an [`ObjectShape`]:
//!
//! - [`to_remote`] validates a typed [`ConfigObject`] and renders the JSON
//!   document the remote API expects on create (`is_create = true`) or update.
//! - [`from_remote`] reads a remote document back into the typed form,
//!   skipping anything the schema does not know about.
//! - [`decode_declarative`] is the boundary decoder for user-supplied JSON.
//!
//! One-of fields are rendered as a flat object carrying the active variant's
//! fields plus the discriminator key naming that variant.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{SchemaError, SchemaResult};
use crate::field::{FieldShape, FieldSpec, Mutability, ObjectShape};
use crate::value::{ConfigObject, ConfigValue, VariantSet};

/// Placeholder written over sensitive values by [`redact`].
pub const REDACTED: &str = "<redacted>";

/// Renders declarative config as a remote JSON document.
///
/// # Errors
///
/// Returns [`SchemaError::Validation`] when a required field is missing, a
/// value does not fit its declared type or bounds, more than one variant of
/// a one-of field is populated, or a create-only field is supplied while
/// `is_create` is `false`.
pub fn to_remote(shape: &ObjectShape, value: &ConfigObject, is_create: bool) -> SchemaResult<Value> {
    encode_object(shape, value, is_create, "").map(Value::Object)
}

/// Reads a remote JSON document into declarative config.
///
/// Unknown fields, values that do not fit the schema and write-only fields
/// are dropped; only the active variant of a one-of field is populated.
pub fn from_remote(shape: &ObjectShape, remote: &Value) -> ConfigObject {
    match remote {
        Value::Object(map) => read_object(shape, map, ""),
        Value::Null => ConfigObject::new(),
        other => {
            warn!(kind = json_kind(other), "Remote user config is not an object, ignoring");
            ConfigObject::new()
        }
    }
}

/// Decodes user-supplied JSON into typed declarative config.
///
/// Scalars are coerced to the declared type, `null` means absent and a
/// one-of value without any populated variant is treated as absent.
///
/// # Errors
///
/// Returns [`SchemaError::Validation`] when a value cannot be coerced or is
/// out of bounds.
pub fn decode_declarative(shape: &ObjectShape, input: &Value) -> SchemaResult<ConfigObject> {
    match input {
        Value::Object(map) => decode_object(shape, map, ""),
        Value::Null => Ok(ConfigObject::new()),
        other => Err(SchemaError::validation(
            "<root>",
            format!("expected object, got {}", json_kind(other)),
        )),
    }
}

/// Removes create-only fields that did not change between `prior` and
/// `planned`, so the result can be sent on the update path.
///
/// # Errors
///
/// Returns [`SchemaError::Validation`] when a create-only field changed.
pub fn prepare_update(
    shape: &ObjectShape,
    prior: &ConfigObject,
    planned: &ConfigObject,
) -> SchemaResult<ConfigObject> {
    strip_create_only(shape, prior, planned, "")
}

/// Restores write-only values from `declared` into config read back from
/// the remote, which never returns them.
///
/// Nested objects and list items are matched by name and position. A one-of
/// variant receives values only while the remote still reports it as active,
/// or reports no populated variant at all.
pub fn carry_write_only(shape: &ObjectShape, declared: &ConfigObject, read: &mut ConfigObject) {
    for (name, spec) in &shape.properties {
        let Some(before) = declared.get(name) else {
            continue;
        };
        if spec.write_only {
            if !read.contains(name) {
                read.insert(name.clone(), before.clone());
            }
        } else if let Some(current) = read.remove(name) {
            read.insert(name.clone(), carry_value(&spec.shape, before, current));
        }
    }
}

fn carry_value(shape: &FieldShape, declared: &ConfigValue, read: ConfigValue) -> ConfigValue {
    match (shape, declared, read) {
        (FieldShape::Object { properties }, ConfigValue::Object(before), ConfigValue::Object(mut obj)) => {
            let nested = ObjectShape {
                properties: properties.clone(),
            };
            carry_write_only(&nested, before, &mut obj);
            ConfigValue::Object(obj)
        }
        (FieldShape::Array { items }, ConfigValue::List(before), ConfigValue::List(list)) => ConfigValue::List(
            list.into_iter()
                .enumerate()
                .map(|(i, item)| match before.get(i) {
                    Some(prior) => carry_value(&items.shape, prior, item),
                    None => item,
                })
                .collect(),
        ),
        (FieldShape::OneOf { variants, .. }, ConfigValue::OneOf(before), ConfigValue::OneOf(set)) => {
            let active: Vec<String> = set.populated().iter().map(|(n, _)| n.to_string()).collect();
            let mut out = VariantSet::default();
            for (name, obj) in set.iter() {
                let mut obj = obj.clone();
                if let (Some(variant_shape), Some(prior)) = (variants.get(name), before.variant(name))
                    && (active.is_empty() || active.contains(name))
                {
                    carry_write_only(variant_shape, prior, &mut obj);
                }
                out = out.with_variant(name.clone(), obj);
            }
            ConfigValue::OneOf(out)
        }
        (_, _, read) => read,
    }
}

/// Returns a copy of a remote document with sensitive values masked.
pub fn redact(shape: &ObjectShape, remote: &Value) -> Value {
    match remote {
        Value::Object(map) => Value::Object(redact_object(shape, map)),
        other => other.clone(),
    }
}

/// Returns a copy of declarative config with sensitive values masked.
pub fn redact_config(shape: &ObjectShape, value: &ConfigObject) -> ConfigObject {
    let mut out = ConfigObject::new();
    for (name, field_value) in value.iter() {
        let redacted = match shape.field(name) {
            Some(spec) => redact_config_value(spec, field_value),
            None => field_value.clone(),
        };
        out.insert(name.clone(), redacted);
    }
    out
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ==================== declarative -> remote ====================

fn encode_object(
    shape: &ObjectShape,
    value: &ConfigObject,
    is_create: bool,
    path: &str,
) -> SchemaResult<Map<String, Value>> {
    for (name, _) in value.iter() {
        if shape.field(name).is_none() {
            warn!(field = %join(path, name), "Dropping user config field unknown to the schema");
        }
    }

    let mut out = Map::new();
    for (name, spec) in &shape.properties {
        let field_path = join(path, name);
        if spec.mutability == Mutability::Computed {
            continue;
        }
        let Some(field_value) = value.get(name) else {
            if spec.required && spec.is_writable(is_create) {
                return Err(SchemaError::validation(field_path, "required field is missing"));
            }
            continue;
        };
        if !spec.is_writable(is_create) {
            return Err(SchemaError::validation(
                field_path,
                "field can only be set when the service is created",
            ));
        }
        match encode_value(spec, field_value, is_create, &field_path)? {
            Some(encoded) => {
                out.insert(name.clone(), encoded);
            }
            None if spec.required => {
                return Err(SchemaError::validation(field_path, "required field is missing"));
            }
            None => {}
        }
    }
    Ok(out)
}

/// `Ok(None)` means the field is omitted from the remote document.
fn encode_value(
    spec: &FieldSpec,
    value: &ConfigValue,
    is_create: bool,
    path: &str,
) -> SchemaResult<Option<Value>> {
    match (&spec.shape, value) {
        (FieldShape::Array { items }, ConfigValue::List(list)) => {
            let mut out = Vec::with_capacity(list.len());
            for (i, item) in list.iter().enumerate() {
                let item_path = format!("{path}[{i}]");
                if let Some(encoded) = encode_value(items, item, is_create, &item_path)? {
                    out.push(encoded);
                }
            }
            Ok(Some(Value::Array(out)))
        }
        (FieldShape::Object { properties }, ConfigValue::Object(obj)) => {
            let nested = ObjectShape {
                properties: properties.clone(),
            };
            encode_object(&nested, obj, is_create, path).map(|m| Some(Value::Object(m)))
        }
        (
            FieldShape::OneOf {
                discriminator,
                variants,
            },
            ConfigValue::OneOf(set),
        ) => {
            let populated = set.populated();
            match populated.as_slice() {
                [] => Ok(None),
                [(name, obj)] => {
                    let variant_shape = variants.get(*name).ok_or_else(|| {
                        SchemaError::validation(path, format!("unknown variant '{name}'"))
                    })?;
                    let variant_path = join(path, name);
                    let mut out = encode_object(variant_shape, obj, is_create, &variant_path)?;
                    out.insert(discriminator.clone(), Value::String((*name).to_string()));
                    Ok(Some(Value::Object(out)))
                }
                many => {
                    let names: Vec<&str> = many.iter().map(|(n, _)| *n).collect();
                    Err(SchemaError::validation(
                        path,
                        format!(
                            "only one of [{}] may be set, found {}",
                            names.join(", "),
                            names.len()
                        ),
                    ))
                }
            }
        }
        (shape, scalar) => coerce_scalar(shape, scalar, path).map(|v| Some(scalar_to_json(&v))),
    }
}

fn scalar_to_json(value: &ConfigValue) -> Value {
    match value {
        ConfigValue::String(s) => Value::String(s.clone()),
        ConfigValue::Integer(i) => Value::from(*i),
        ConfigValue::Number(n) => Value::from(*n),
        ConfigValue::Boolean(b) => Value::Bool(*b),
        other => serde_json::to_value(other).unwrap_or(Value::Null),
    }
}

/// Coerces a scalar to the declared type and checks allowed values and bounds.
fn coerce_scalar(shape: &FieldShape, value: &ConfigValue, path: &str) -> SchemaResult<ConfigValue> {
    let mismatch = || {
        SchemaError::validation(
            path,
            format!("expected {}, got {}", shape.type_name(), value.kind()),
        )
    };

    match shape {
        FieldShape::String { allowed } => {
            let s = match value {
                ConfigValue::String(s) => s.clone(),
                ConfigValue::Integer(i) => i.to_string(),
                ConfigValue::Number(n) => n.to_string(),
                ConfigValue::Boolean(b) => b.to_string(),
                _ => return Err(mismatch()),
            };
            if !allowed.is_empty() && !allowed.contains(&s) {
                return Err(SchemaError::validation(
                    path,
                    format!("value {s:?} is not one of {allowed:?}"),
                ));
            }
            Ok(ConfigValue::String(s))
        }
        FieldShape::Integer { minimum, maximum } => {
            let i = match value {
                ConfigValue::Integer(i) => *i,
                ConfigValue::Number(n) if n.fract() == 0.0 => *n as i64,
                ConfigValue::String(s) => s.trim().parse::<i64>().map_err(|_| mismatch())?,
                _ => return Err(mismatch()),
            };
            if let Some(min) = minimum
                && i < *min
            {
                return Err(SchemaError::validation(path, format!("must be >= {min}, got {i}")));
            }
            if let Some(max) = maximum
                && i > *max
            {
                return Err(SchemaError::validation(path, format!("must be <= {max}, got {i}")));
            }
            Ok(ConfigValue::Integer(i))
        }
        FieldShape::Number { minimum, maximum } => {
            let n = match value {
                ConfigValue::Number(n) => *n,
                ConfigValue::Integer(i) => *i as f64,
                ConfigValue::String(s) => s.trim().parse::<f64>().map_err(|_| mismatch())?,
                _ => return Err(mismatch()),
            };
            if !n.is_finite() {
                return Err(SchemaError::validation(path, "must be a finite number"));
            }
            if let Some(min) = minimum
                && n < *min
            {
                return Err(SchemaError::validation(path, format!("must be >= {min}, got {n}")));
            }
            if let Some(max) = maximum
                && n > *max
            {
                return Err(SchemaError::validation(path, format!("must be <= {max}, got {n}")));
            }
            Ok(ConfigValue::Number(n))
        }
        FieldShape::Boolean => match value {
            ConfigValue::Boolean(b) => Ok(ConfigValue::Boolean(*b)),
            ConfigValue::String(s) => match s.trim() {
                "true" => Ok(ConfigValue::Boolean(true)),
                "false" => Ok(ConfigValue::Boolean(false)),
                _ => Err(mismatch()),
            },
            _ => Err(mismatch()),
        },
        FieldShape::Array { .. } | FieldShape::Object { .. } | FieldShape::OneOf { .. } => {
            Err(mismatch())
        }
    }
}

// ==================== remote -> declarative ====================

fn read_object(shape: &ObjectShape, map: &Map<String, Value>, path: &str) -> ConfigObject {
    let mut out = ConfigObject::new();
    for (name, raw) in map {
        let field_path = join(path, name);
        let Some(spec) = shape.field(name) else {
            warn!(field = %field_path, "Skipping remote user config field unknown to the schema");
            continue;
        };
        if spec.write_only || raw.is_null() {
            continue;
        }
        if let Some(value) = read_value(spec, raw, &field_path) {
            out.insert(name.clone(), value);
        }
    }
    out
}

fn read_value(spec: &FieldSpec, raw: &Value, path: &str) -> Option<ConfigValue> {
    match (&spec.shape, raw) {
        (FieldShape::Array { items }, Value::Array(list)) => Some(ConfigValue::List(
            list.iter()
                .enumerate()
                .filter_map(|(i, item)| read_value(items, item, &format!("{path}[{i}]")))
                .collect(),
        )),
        (FieldShape::Object { properties }, Value::Object(map)) => {
            let nested = ObjectShape {
                properties: properties.clone(),
            };
            Some(ConfigValue::Object(read_object(&nested, map, path)))
        }
        (
            FieldShape::OneOf {
                discriminator,
                variants,
            },
            Value::Object(map),
        ) => {
            let Some(active) = map.get(discriminator).and_then(Value::as_str) else {
                warn!(field = %path, discriminator = %discriminator, "One-of value without discriminator, skipping");
                return None;
            };
            let Some(variant_shape) = variants.get(active) else {
                warn!(field = %path, variant = %active, "Unknown one-of variant reported by remote, skipping");
                return None;
            };
            let mut fields = map.clone();
            fields.remove(discriminator);
            let populated = read_object(variant_shape, &fields, &join(path, active));
            Some(ConfigValue::OneOf(
                VariantSet::empty(variants.keys().cloned()).with_variant(active, populated),
            ))
        }
        (shape, raw) => match json_to_scalar(raw).map(|v| coerce_scalar(shape, &v, path)) {
            Some(Ok(value)) => Some(value),
            _ => {
                warn!(
                    field = %path,
                    expected = shape.type_name(),
                    got = json_kind(raw),
                    "Remote user config value does not match the schema, skipping"
                );
                None
            }
        },
    }
}

fn json_to_scalar(raw: &Value) -> Option<ConfigValue> {
    match raw {
        Value::String(s) => Some(ConfigValue::String(s.clone())),
        Value::Bool(b) => Some(ConfigValue::Boolean(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(ConfigValue::Integer)
            .or_else(|| n.as_f64().map(ConfigValue::Number)),
        _ => None,
    }
}

// ==================== user input -> declarative ====================

fn decode_object(
    shape: &ObjectShape,
    map: &Map<String, Value>,
    path: &str,
) -> SchemaResult<ConfigObject> {
    let mut out = ConfigObject::new();
    for (name, raw) in map {
        let field_path = join(path, name);
        let Some(spec) = shape.field(name) else {
            warn!(field = %field_path, "Dropping user config field unknown to the schema");
            continue;
        };
        if raw.is_null() {
            continue;
        }
        if let Some(value) = decode_value(spec, raw, &field_path)? {
            out.insert(name.clone(), value);
        }
    }
    Ok(out)
}

fn decode_value(spec: &FieldSpec, raw: &Value, path: &str) -> SchemaResult<Option<ConfigValue>> {
    let mismatch = || {
        SchemaError::validation(
            path,
            format!("expected {}, got {}", spec.type_name(), json_kind(raw)),
        )
    };

    match &spec.shape {
        FieldShape::Array { items } => {
            let Value::Array(list) = raw else {
                return Err(mismatch());
            };
            let mut out = Vec::with_capacity(list.len());
            for (i, item) in list.iter().enumerate() {
                if let Some(value) = decode_value(items, item, &format!("{path}[{i}]"))? {
                    out.push(value);
                }
            }
            Ok(Some(ConfigValue::List(out)))
        }
        FieldShape::Object { properties } => {
            let Value::Object(map) = raw else {
                return Err(mismatch());
            };
            let nested = ObjectShape {
                properties: properties.clone(),
            };
            decode_object(&nested, map, path).map(|obj| Some(ConfigValue::Object(obj)))
        }
        FieldShape::OneOf { variants, .. } => {
            let Value::Object(map) = raw else {
                return Err(mismatch());
            };
            let mut set = VariantSet::empty(variants.keys().cloned());
            for (name, variant_raw) in map {
                let Some(variant_shape) = variants.get(name) else {
                    warn!(field = %path, variant = %name, "Dropping unknown one-of variant");
                    continue;
                };
                let variant_path = join(path, name);
                let obj = match variant_raw {
                    Value::Null => ConfigObject::new(),
                    Value::Object(vm) => decode_object(variant_shape, vm, &variant_path)?,
                    other => {
                        return Err(SchemaError::validation(
                            variant_path,
                            format!("expected object, got {}", json_kind(other)),
                        ));
                    }
                };
                set = set.with_variant(name.clone(), obj);
            }
            Ok((!set.is_unpopulated()).then_some(ConfigValue::OneOf(set)))
        }
        shape => {
            let scalar = json_to_scalar(raw).ok_or_else(mismatch)?;
            coerce_scalar(shape, &scalar, path).map(Some)
        }
    }
}

// ==================== update preparation ====================

fn strip_create_only(
    shape: &ObjectShape,
    prior: &ConfigObject,
    planned: &ConfigObject,
    path: &str,
) -> SchemaResult<ConfigObject> {
    let mut out = ConfigObject::new();
    for (name, value) in planned.iter() {
        let field_path = join(path, name);
        let Some(spec) = shape.field(name) else {
            out.insert(name.clone(), value.clone());
            continue;
        };
        let before = prior.get(name);
        match spec.mutability {
            Mutability::CreateOnly => {
                if before != Some(value) {
                    return Err(SchemaError::validation(
                        field_path,
                        "field can only be set when the service is created",
                    ));
                }
            }
            Mutability::Computed => {}
            Mutability::Mutable => {
                let stripped = strip_value(&spec.shape, before, value, &field_path)?;
                out.insert(name.clone(), stripped);
            }
        }
    }
    Ok(out)
}

/// Applies [`strip_create_only`] below a mutable field. Array items are
/// matched with the prior list by position, one-of variants by name.
fn strip_value(
    shape: &FieldShape,
    before: Option<&ConfigValue>,
    value: &ConfigValue,
    path: &str,
) -> SchemaResult<ConfigValue> {
    let empty = ConfigObject::new();
    match (shape, value) {
        (FieldShape::Object { properties }, ConfigValue::Object(obj)) => {
            let nested = ObjectShape {
                properties: properties.clone(),
            };
            let prior_obj = before.and_then(ConfigValue::as_object).unwrap_or(&empty);
            Ok(ConfigValue::Object(strip_create_only(&nested, prior_obj, obj, path)?))
        }
        (FieldShape::Array { items }, ConfigValue::List(list)) => {
            let prior_items = match before {
                Some(ConfigValue::List(prior)) => prior.as_slice(),
                _ => &[][..],
            };
            list.iter()
                .enumerate()
                .map(|(i, item)| {
                    strip_value(&items.shape, prior_items.get(i), item, &format!("{path}[{i}]"))
                })
                .collect::<SchemaResult<Vec<_>>>()
                .map(ConfigValue::List)
        }
        (FieldShape::OneOf { variants, .. }, ConfigValue::OneOf(set)) => {
            let prior_set = match before {
                Some(ConfigValue::OneOf(prior)) => Some(prior),
                _ => None,
            };
            let mut out = VariantSet::default();
            for (name, obj) in set.iter() {
                let stripped = match variants.get(name) {
                    Some(variant_shape) => {
                        let prior_obj = prior_set
                            .and_then(|prior| prior.variant(name))
                            .unwrap_or(&empty);
                        strip_create_only(variant_shape, prior_obj, obj, &join(path, name))?
                    }
                    None => obj.clone(),
                };
                out = out.with_variant(name.clone(), stripped);
            }
            Ok(ConfigValue::OneOf(out))
        }
        _ => Ok(value.clone()),
    }
}

// ==================== redaction ====================

fn redact_object(shape: &ObjectShape, map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(name, raw)| {
            let redacted = match shape.field(name) {
                Some(spec) => redact_value(spec, raw),
                None => raw.clone(),
            };
            (name.clone(), redacted)
        })
        .collect()
}

fn redact_value(spec: &FieldSpec, raw: &Value) -> Value {
    if spec.sensitive && !raw.is_null() {
        return Value::String(REDACTED.to_string());
    }
    match (&spec.shape, raw) {
        (FieldShape::Object { properties }, Value::Object(map)) => {
            let nested = ObjectShape {
                properties: properties.clone(),
            };
            Value::Object(redact_object(&nested, map))
        }
        (FieldShape::Array { items }, Value::Array(list)) => {
            Value::Array(list.iter().map(|item| redact_value(items, item)).collect())
        }
        (
            FieldShape::OneOf {
                discriminator,
                variants,
            },
            Value::Object(map),
        ) => {
            let active = map.get(discriminator).and_then(Value::as_str);
            match active.and_then(|name| variants.get(name)) {
                Some(variant_shape) => Value::Object(redact_object(variant_shape, map)),
                None => raw.clone(),
            }
        }
        _ => raw.clone(),
    }
}

fn redact_config_value(spec: &FieldSpec, value: &ConfigValue) -> ConfigValue {
    if spec.sensitive {
        return ConfigValue::String(REDACTED.to_string());
    }
    match (&spec.shape, value) {
        (FieldShape::Object { properties }, ConfigValue::Object(obj)) => {
            let nested = ObjectShape {
                properties: properties.clone(),
            };
            ConfigValue::Object(redact_config(&nested, obj))
        }
        (FieldShape::Array { items }, ConfigValue::List(list)) => {
            ConfigValue::List(list.iter().map(|item| redact_config_value(items, item)).collect())
        }
        (FieldShape::OneOf { variants, .. }, ConfigValue::OneOf(set)) => {
            let mut out = VariantSet::default();
            for (name, obj) in set.iter() {
                let redacted = match variants.get(name) {
                    Some(variant_shape) => redact_config(variant_shape, obj),
                    None => obj.clone(),
                };
                out = out.with_variant(name.clone(), redacted);
            }
            ConfigValue::OneOf(out)
        }
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pg_shape() -> ObjectShape {
        serde_json::from_value(json!({
            "properties": {
                "admin_username": { "type": "string", "mutability": "create_only" },
                "backup_hour": { "type": "integer", "minimum": 0, "maximum": 23 },
                "pg_version": { "type": "string", "enum": ["13", "14", "15"] },
                "shared_buffers_percentage": { "type": "number", "minimum": 20, "maximum": 60 },
                "ip_filter": { "type": "array", "items": { "type": "string" } },
                "pg": {
                    "type": "object",
                    "properties": {
                        "max_connections": { "type": "integer", "minimum": 25 },
                        "jit": { "type": "boolean" }
                    }
                },
                "service_ip": { "type": "string", "mutability": "computed" }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_scalars_are_coerced_to_declared_type() {
        let value = ConfigObject::new()
            .with("backup_hour", "4")
            .with("pg_version", 14i64)
            .with("shared_buffers_percentage", 25i64)
            .with("pg", ConfigObject::new().with("jit", "true"));

        let remote = to_remote(&pg_shape(), &value, true).unwrap();
        assert_eq!(
            remote,
            json!({
                "backup_hour": 4,
                "pg_version": "14",
                "shared_buffers_percentage": 25.0,
                "pg": { "jit": true }
            })
        );
    }

    #[test]
    fn test_bounds_and_enums_are_enforced() {
        let shape = pg_shape();
        let too_late = ConfigObject::new().with("backup_hour", 24i64);
        let err = to_remote(&shape, &too_late, true).unwrap_err();
        assert!(err.to_string().contains("backup_hour"));
        assert!(err.to_string().contains("<= 23"));

        let bad_version = ConfigObject::new().with("pg_version", "9.6");
        assert!(to_remote(&shape, &bad_version, true).unwrap_err().is_validation());

        let nested = ConfigObject::new().with("pg", ConfigObject::new().with("max_connections", 10i64));
        let err = to_remote(&shape, &nested, true).unwrap_err();
        assert!(err.to_string().contains("pg.max_connections"));
    }

    #[test]
    fn test_redact_config_masks_sensitive_values() {
        let shape: ObjectShape = serde_json::from_value(json!({
            "properties": {
                "admin_password": { "type": "string", "sensitive": true },
                "backup_hour": { "type": "integer" },
                "auth": {
                    "type": "one_of",
                    "discriminator": "method",
                    "variants": {
                        "password": { "properties": { "password": { "type": "string", "sensitive": true } } },
                        "certificate": { "properties": { "cert": { "type": "string" } } }
                    }
                }
            }
        }))
        .unwrap();
        let value = ConfigObject::new()
            .with("admin_password", "hunter2")
            .with("backup_hour", 3i64)
            .with(
                "auth",
                VariantSet::empty(["certificate", "password"])
                    .with_variant("password", ConfigObject::new().with("password", "s3cret")),
            );

        let redacted = redact_config(&shape, &value);
        assert_eq!(redacted.get("admin_password"), Some(&ConfigValue::from(REDACTED)));
        assert_eq!(redacted.get("backup_hour"), Some(&ConfigValue::Integer(3)));
        let Some(ConfigValue::OneOf(auth)) = redacted.get("auth") else {
            panic!("expected one-of");
        };
        assert_eq!(
            auth.variant("password").unwrap().get("password"),
            Some(&ConfigValue::from(REDACTED))
        );
        assert!(auth.variant("certificate").unwrap().is_empty());
    }

    #[test]
    fn test_lists_preserve_order() {
        let value = ConfigObject::new().with("ip_filter", vec!["10.0.0.0/8", "0.0.0.0/0", "192.168.1.0/24"]);
        let remote = to_remote(&pg_shape(), &value, false).unwrap();
        assert_eq!(remote["ip_filter"], json!(["10.0.0.0/8", "0.0.0.0/0", "192.168.1.0/24"]));
    }

    #[test]
    fn test_create_only_field_rejected_on_update() {
        let value = ConfigObject::new().with("admin_username", "root");
        assert!(to_remote(&pg_shape(), &value, true).is_ok());

        let err = to_remote(&pg_shape(), &value, false).unwrap_err();
        assert!(matches!(err, SchemaError::Validation { ref path, .. } if path == "admin_username"));
    }

    #[test]
    fn test_computed_fields_are_never_sent() {
        let value = ConfigObject::new().with("service_ip", "10.1.1.1");
        let remote = to_remote(&pg_shape(), &value, true).unwrap();
        assert_eq!(remote, json!({}));
    }

    #[test]
    fn test_required_field_missing() {
        let shape = ObjectShape::new()
            .with_field("name", FieldSpec::new(FieldShape::string()).required())
            .with_field("token", FieldSpec::new(FieldShape::string()).required().create_only());

        let err = to_remote(&shape, &ConfigObject::new().with("token", "t"), true).unwrap_err();
        assert!(err.to_string().contains("name"));

        // A required create-only field is not expected on the update path.
        let remote = to_remote(&shape, &ConfigObject::new().with("name", "n"), false).unwrap();
        assert_eq!(remote, json!({ "name": "n" }));
    }

    #[test]
    fn test_from_remote_drops_unknown_and_coerces() {
        let remote = json!({
            "backup_hour": 5.0,
            "pg_version": "15",
            "new_field_from_api": { "x": 1 },
            "pg": { "max_connections": 100, "unknown_nested": true },
            "service_ip": "10.1.1.1"
        });
        let decoded = from_remote(&pg_shape(), &remote);
        assert_eq!(decoded.get("backup_hour"), Some(&ConfigValue::Integer(5)));
        assert!(!decoded.contains("new_field_from_api"));
        let pg = decoded.get("pg").and_then(ConfigValue::as_object).unwrap();
        assert_eq!(pg.get("max_connections"), Some(&ConfigValue::Integer(100)));
        assert!(!pg.contains("unknown_nested"));
        assert_eq!(decoded.get("service_ip"), Some(&ConfigValue::String("10.1.1.1".into())));
    }

    #[test]
    fn test_from_remote_skips_mismatched_values() {
        let remote = json!({ "backup_hour": "soon", "ip_filter": ["a", 1, "b"] });
        let decoded = from_remote(&pg_shape(), &remote);
        assert!(!decoded.contains("backup_hour"));
        assert_eq!(
            decoded.get("ip_filter"),
            Some(&ConfigValue::from(vec!["a", "1", "b"]))
        );
    }

    #[test]
    fn test_decode_declarative_null_and_unknown() {
        let input = json!({ "backup_hour": null, "nonsense": 1, "pg_version": "13" });
        let decoded = decode_declarative(&pg_shape(), &input).unwrap();
        assert_eq!(decoded, ConfigObject::new().with("pg_version", "13"));

        let err = decode_declarative(&pg_shape(), &json!({ "ip_filter": "10.0.0.0/8" })).unwrap_err();
        assert!(err.to_string().contains("expected array"));
    }

    #[test]
    fn test_prepare_update_strips_unchanged_create_only() {
        let shape = pg_shape();
        let prior = ConfigObject::new().with("admin_username", "root").with("backup_hour", 3i64);
        let planned = ConfigObject::new().with("admin_username", "root").with("backup_hour", 4i64);

        let prepared = prepare_update(&shape, &prior, &planned).unwrap();
        assert_eq!(prepared, ConfigObject::new().with("backup_hour", 4i64));
        assert!(to_remote(&shape, &prepared, false).is_ok());

        let changed = ConfigObject::new().with("admin_username", "admin");
        let err = prepare_update(&shape, &prior, &changed).unwrap_err();
        assert!(err.to_string().contains("admin_username"));
    }

    #[test]
    fn test_prepare_update_strips_create_only_inside_variants_and_lists() {
        let shape: ObjectShape = serde_json::from_value(json!({
            "properties": {
                "auth": {
                    "type": "one_of",
                    "discriminator": "method",
                    "variants": {
                        "password": { "properties": {
                            "username": { "type": "string", "mutability": "create_only" },
                            "password": { "type": "string" }
                        } },
                        "certificate": { "properties": { "cert": { "type": "string" } } }
                    }
                },
                "users": {
                    "type": "array",
                    "items": { "type": "object", "properties": {
                        "name": { "type": "string", "mutability": "create_only" },
                        "role": { "type": "string" }
                    } }
                }
            }
        }))
        .unwrap();
        let config = |password: &str, role: &str| {
            ConfigObject::new()
                .with(
                    "auth",
                    VariantSet::empty(["certificate", "password"]).with_variant(
                        "password",
                        ConfigObject::new().with("username", "root").with("password", password),
                    ),
                )
                .with(
                    "users",
                    ConfigValue::List(vec![ConfigValue::Object(
                        ConfigObject::new().with("name", "alice").with("role", role),
                    )]),
                )
        };

        let prepared = prepare_update(&shape, &config("a", "reader"), &config("b", "admin")).unwrap();
        assert_eq!(
            to_remote(&shape, &prepared, false).unwrap(),
            json!({
                "auth": { "method": "password", "password": "b" },
                "users": [{ "role": "admin" }]
            })
        );

        let renamed = ConfigObject::new().with(
            "auth",
            VariantSet::empty(["certificate", "password"])
                .with_variant("password", ConfigObject::new().with("username", "admin")),
        );
        let err = prepare_update(&shape, &config("a", "reader"), &renamed).unwrap_err();
        assert!(err.to_string().contains("auth.password.username"));
    }

    #[test]
    fn test_carry_write_only_restores_nested_values() {
        let shape: ObjectShape = serde_json::from_value(json!({
            "properties": {
                "migration": {
                    "type": "object",
                    "properties": {
                        "host": { "type": "string" },
                        "password": { "type": "string", "write_only": true }
                    }
                },
                "auth": {
                    "type": "one_of",
                    "discriminator": "provider",
                    "variants": {
                        "github": { "properties": {
                            "client_id": { "type": "string" },
                            "client_secret": { "type": "string", "write_only": true }
                        } },
                        "google": { "properties": {
                            "client_id": { "type": "string" },
                            "client_secret": { "type": "string", "write_only": true }
                        } }
                    }
                }
            }
        }))
        .unwrap();
        let declared = ConfigObject::new()
            .with(
                "migration",
                ConfigObject::new().with("host", "old.db").with("password", "s3cret"),
            )
            .with(
                "auth",
                VariantSet::empty(["github", "google"]).with_variant(
                    "github",
                    ConfigObject::new().with("client_id", "id").with("client_secret", "shh"),
                ),
            );
        let remote = to_remote(&shape, &declared, true).unwrap();

        let mut read = from_remote(&shape, &remote);
        assert_ne!(read, declared);
        carry_write_only(&shape, &declared, &mut read);
        assert_eq!(read, declared);

        // The remote switched providers: the old secret is not resurrected.
        let switched = json!({ "auth": { "provider": "google", "client_id": "other" } });
        let mut read = from_remote(&shape, &switched);
        carry_write_only(&shape, &declared, &mut read);
        let Some(ConfigValue::OneOf(auth)) = read.get("auth") else {
            panic!("auth should be read back");
        };
        assert_eq!(auth.variant("google"), Some(&ConfigObject::new().with("client_id", "other")));
        assert_eq!(auth.variant("github"), Some(&ConfigObject::new()));
        assert!(!read.contains("migration"));
    }

    #[test]
    fn test_redact_masks_sensitive_values() {
        let shape = ObjectShape::new()
            .with_field("user", FieldSpec::new(FieldShape::string()))
            .with_field("password", FieldSpec::new(FieldShape::string()).sensitive());
        let redacted = redact(&shape, &json!({ "user": "admin", "password": "hunter2" }));
        assert_eq!(redacted, json!({ "user": "admin", "password": REDACTED }));
    }
}
