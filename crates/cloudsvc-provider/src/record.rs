//! Declarative service record.
//!
//! A [`ServiceRecord`] is what the caller declares plus what the remote
//! computed. It is decoded from JSON once at the boundary: top-level
//! attributes through serde, the `<type>_user_config` attribute through the
//! registry's field tree. Connection-info blocks are output only.

use std::collections::BTreeMap;

use cloudsvc_api::{RemoteComponent, RemoteMaintenance};
use cloudsvc_core::{IntegrationType, MaintenanceWindow, ServiceId, ServiceState, ServiceType};
use cloudsvc_schema::{
    AttributeKind, AttributeSpec, ConfigObject, REDACTED, ResourceKind, ResourceSchema,
    SchemaRegistry, decode_declarative, redact_config,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{ProviderError, ProviderResult};
use crate::projection::ConnectionInfo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIntegration {
    pub integration_type: IntegrationType,
    pub source_service_name: String,
}

/// A network endpoint of a running service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Component {
    pub component: String,
    pub host: String,
    pub port: i64,
    pub route: String,
    pub usage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kafka_authentication_method: Option<String>,
}

impl From<&RemoteComponent> for Component {
    fn from(remote: &RemoteComponent) -> Self {
        Self {
            component: remote.component.clone(),
            host: remote.host.clone(),
            port: remote.port,
            route: remote.route.clone(),
            usage: remote.usage.clone(),
            ssl: remote.ssl,
            kafka_authentication_method: remote.kafka_authentication_method.clone(),
        }
    }
}

/// Per-type connection-info slots.
///
/// A missing slot is unset. A present slot holds zero entries (cleared) or
/// one entry (projected from the remote).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionBlocks(BTreeMap<ServiceType, Vec<ConnectionInfo>>);

impl ConnectionBlocks {
    /// Clears every slot in `types` that is still unset.
    pub fn seed_empty(&mut self, types: &[ServiceType]) {
        for ty in types {
            self.0.entry(*ty).or_default();
        }
    }

    pub fn set(&mut self, ty: ServiceType, info: ConnectionInfo) {
        self.0.insert(ty, vec![info]);
    }

    pub fn get(&self, ty: ServiceType) -> Option<&[ConnectionInfo]> {
        self.0.get(&ty).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ServiceType, &[ConnectionInfo])> {
        self.0.iter().map(|(ty, blocks)| (*ty, blocks.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ServiceId>,
    pub project: String,
    pub service_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<ServiceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_window_dow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_window_time: Option<String>,
    pub termination_protection: bool,
    /// `project/vpc_id` reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_vpc_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub service_integrations: Vec<ServiceIntegration>,
    #[serde(skip)]
    pub user_config: ConfigObject,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ServiceState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_password: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
    #[serde(skip)]
    pub connection_blocks: ConnectionBlocks,
}

impl ServiceRecord {
    /// Decodes a declarative JSON document for a resource of `kind`.
    ///
    /// # Errors
    ///
    /// Returns a validation error when an attribute has the wrong type, the
    /// service type or integration type is unknown, the maintenance window
    /// is half set, or the user config does not fit its field tree.
    pub fn from_declarative(
        registry: &SchemaRegistry,
        kind: ResourceKind,
        input: &Value,
    ) -> ProviderResult<Self> {
        let Value::Object(map) = input else {
            return Err(ProviderError::validation("service", "expected a JSON object"));
        };
        let mut record: Self = serde_json::from_value(input.clone())
            .map_err(|e| ProviderError::validation("service", e.to_string()))?;

        if let ResourceKind::Typed(ty) = kind {
            match record.service_type {
                Some(declared) if declared != ty => {
                    return Err(ProviderError::validation(
                        "service_type",
                        format!("{kind} resource cannot manage a {declared} service"),
                    ));
                }
                _ => record.service_type = Some(ty),
            }
        }

        for (key, value) in map {
            if !key.ends_with("_user_config") {
                continue;
            }
            match record.service_type {
                Some(ty) if *key == ty.user_config_attribute() => {
                    record.user_config = decode_declarative(registry.user_config(ty), value)?;
                }
                _ if is_blank(value) => {}
                _ => warn!(attribute = %key, "Ignoring user config for a different service type"),
            }
        }

        record.maintenance()?;
        Ok(record)
    }

    /// Identity of the service, taken from `id` or built from the natural keys.
    pub fn service_id(&self) -> ProviderResult<ServiceId> {
        if let Some(id) = &self.id {
            return Ok(id.clone());
        }
        if self.project.is_empty() || self.service_name.is_empty() {
            return Err(ProviderError::validation(
                "id",
                "record has neither an id nor both project and service_name",
            ));
        }
        Ok(ServiceId::new(&self.project, &self.service_name))
    }

    /// The declared maintenance window, if any.
    pub fn maintenance(&self) -> ProviderResult<Option<MaintenanceWindow>> {
        Ok(MaintenanceWindow::from_parts(
            self.maintenance_window_dow.as_deref(),
            self.maintenance_window_time.as_deref(),
        )?)
    }

    pub(crate) fn set_maintenance(&mut self, remote: Option<&RemoteMaintenance>) {
        self.maintenance_window_dow = remote.map(|m| m.dow.clone());
        self.maintenance_window_time = remote.map(|m| m.time.clone());
    }

    /// Renders the record in its declarative JSON form, including the user
    /// config attribute and every connection-info slot that is set.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        let mut out = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut out {
            if let Some(ty) = self.service_type
                && !self.user_config.is_empty()
            {
                map.insert(ty.user_config_attribute(), serde_json::to_value(&self.user_config)?);
            }
            for (ty, blocks) in self.connection_blocks.iter() {
                map.insert(ty.as_str().to_string(), serde_json::to_value(blocks)?);
            }
        }
        Ok(out)
    }

    /// Same as [`to_json`](Self::to_json) with every sensitive value masked.
    pub fn to_json_redacted(
        &self,
        registry: &SchemaRegistry,
        schema: &ResourceSchema,
    ) -> serde_json::Result<Value> {
        let mut masked = self.clone();
        if let Some(ty) = self.service_type {
            masked.user_config = redact_config(registry.user_config(ty), &self.user_config);
        }
        let mut out = masked.to_json()?;
        if let Value::Object(map) = &mut out {
            redact_attributes(&schema.attributes, map);
        }
        Ok(out)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(list) => list.is_empty(),
        _ => false,
    }
}

fn redact_attributes(attributes: &[AttributeSpec], map: &mut Map<String, Value>) {
    for attr in attributes {
        let Some(value) = map.get_mut(&attr.name) else {
            continue;
        };
        if attr.sensitive {
            if !value.is_null() {
                *value = Value::String(REDACTED.to_string());
            }
            continue;
        }
        let nested = match &attr.kind {
            AttributeKind::Block(nested) => nested,
            AttributeKind::List(item) => match item.as_ref() {
                AttributeKind::Block(nested) => nested,
                _ => continue,
            },
            _ => continue,
        };
        if let Value::Array(entries) = value {
            for entry in entries {
                if let Value::Object(entry) = entry {
                    redact_attributes(nested, entry);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::PgConnection;
    use cloudsvc_schema::ConfigValue;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::builtin().unwrap()
    }

    #[test]
    fn test_decode_typed_user_config() {
        let record = ServiceRecord::from_declarative(
            &registry(),
            ResourceKind::Typed(ServiceType::Pg),
            &json!({
                "project": "acme",
                "service_name": "db",
                "plan": "startup-4",
                "pg_user_config": { "backup_hour": "3", "pg": { "jit": "false" } },
                "kafka_user_config": {}
            }),
        )
        .unwrap();

        assert_eq!(record.service_type, Some(ServiceType::Pg));
        assert_eq!(record.user_config.get("backup_hour"), Some(&ConfigValue::Integer(3)));
        assert_eq!(record.service_id().unwrap(), ServiceId::new("acme", "db"));
    }

    #[test]
    fn test_decode_rejects_half_maintenance_window() {
        let err = ServiceRecord::from_declarative(
            &registry(),
            ResourceKind::Service,
            &json!({
                "project": "acme",
                "service_name": "db",
                "service_type": "pg",
                "maintenance_window_dow": "monday"
            }),
        )
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_decode_rejects_unknown_enumerations() {
        let unknown_type = ServiceRecord::from_declarative(
            &registry(),
            ResourceKind::Service,
            &json!({ "project": "acme", "service_name": "db", "service_type": "dynamodb" }),
        )
        .unwrap_err();
        assert!(unknown_type.is_validation());

        let unknown_integration = ServiceRecord::from_declarative(
            &registry(),
            ResourceKind::Service,
            &json!({
                "project": "acme",
                "service_name": "db",
                "service_type": "pg",
                "service_integrations": [
                    { "integration_type": "logs", "source_service_name": "other" }
                ]
            }),
        )
        .unwrap_err();
        assert!(unknown_integration.is_validation());
    }

    #[test]
    fn test_typed_kind_rejects_other_service_type() {
        let err = ServiceRecord::from_declarative(
            &registry(),
            ResourceKind::Typed(ServiceType::Redis),
            &json!({ "project": "acme", "service_name": "cache", "service_type": "pg" }),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error for service_type: redis resource cannot manage a pg service"
        );
    }

    #[test]
    fn test_json_output_reads_back() {
        let registry = registry();
        let kind = ResourceKind::Typed(ServiceType::Redis);
        let mut record = ServiceRecord::from_declarative(
            &registry,
            kind,
            &json!({
                "project": "acme",
                "service_name": "cache",
                "redis_user_config": { "redis_maxmemory_policy": "allkeys-lru" }
            }),
        )
        .unwrap();
        record.id = Some(ServiceId::new("acme", "cache"));
        record.connection_blocks.seed_empty(&[ServiceType::Redis, ServiceType::Pg]);

        let rendered = record.to_json().unwrap();
        assert_eq!(rendered["id"], json!("acme/cache"));
        assert_eq!(rendered["pg"], json!([]));
        assert_eq!(
            rendered["redis_user_config"],
            json!({ "redis_maxmemory_policy": "allkeys-lru" })
        );

        let decoded = ServiceRecord::from_declarative(&registry, kind, &rendered).unwrap();
        assert_eq!(decoded.user_config, record.user_config);
        assert_eq!(decoded.id, record.id);
    }

    #[test]
    fn test_redacted_output_masks_secrets() {
        let registry = registry();
        let kind = ResourceKind::Typed(ServiceType::Pg);
        let mut record = ServiceRecord::from_declarative(
            &registry,
            kind,
            &json!({
                "project": "acme",
                "service_name": "db",
                "pg_user_config": { "admin_password": "hunter2", "backup_hour": 3 }
            }),
        )
        .unwrap();
        record.service_password = Some("pw".into());
        record.service_host = Some("db.example.com".into());
        record.connection_blocks.set(
            ServiceType::Pg,
            ConnectionInfo::Pg(PgConnection {
                password: "pw".into(),
                host: "db.example.com".into(),
                ..PgConnection::default()
            }),
        );

        let schema = registry.resource_schema(kind);
        let out = record.to_json_redacted(&registry, &schema).unwrap();
        assert_eq!(out["service_password"], json!(REDACTED));
        assert_eq!(out["service_host"], json!("db.example.com"));
        assert_eq!(out["pg"][0]["password"], json!(REDACTED));
        assert_eq!(out["pg"][0]["host"], json!("db.example.com"));
        assert_eq!(out["pg_user_config"]["admin_password"], json!(REDACTED));
        assert_eq!(out["pg_user_config"]["backup_hour"], json!(3));
    }
}
