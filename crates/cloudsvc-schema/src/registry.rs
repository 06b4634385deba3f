//! Schema registry.
//!
//! The registry is built once at startup and handed to the controller and
//! translator by reference. It owns the user-config field tree of every
//! service type and derives the attribute table of each resource kind.

use std::collections::BTreeMap;

use cloudsvc_core::ServiceType;
use tracing::{debug, warn};

use crate::attribute::{AttributeKind, AttributeSpec, ResourceKind, ResourceSchema};
use crate::error::{SchemaError, SchemaResult};
use crate::field::ObjectShape;

const BUILTIN_USER_CONFIG: &str = include_str!("../schemas/user_config.json");

#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    user_configs: BTreeMap<ServiceType, ObjectShape>,
}

impl SchemaRegistry {
    /// Registry loaded from the bundled user-config document.
    pub fn builtin() -> SchemaResult<Self> {
        Self::from_json(BUILTIN_USER_CONFIG)
    }

    /// Parses a document mapping service type names to user-config shapes.
    ///
    /// Entries for service types this build does not know are skipped; types
    /// missing from the document get an empty shape.
    pub fn from_json(document: &str) -> SchemaResult<Self> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(document)?;
        let mut registry = Self::default();
        for (name, shape) in raw {
            let Ok(ty) = name.parse::<ServiceType>() else {
                warn!(service_type = %name, "Skipping user config schema for unknown service type");
                continue;
            };
            let shape: ObjectShape = serde_json::from_value(shape)
                .map_err(|e| SchemaError::definition(format!("{name}: {e}")))?;
            registry.user_configs.insert(ty, shape);
        }
        debug!(types = registry.user_configs.len(), "Loaded user config schemas");
        Ok(registry)
    }

    /// Replaces the user-config shape of one service type.
    pub fn with_user_config(mut self, ty: ServiceType, shape: ObjectShape) -> Self {
        self.user_configs.insert(ty, shape);
        self
    }

    /// User-config field tree of a service type. Unregistered types have an
    /// empty tree, so every field they receive is dropped as unknown.
    pub fn user_config(&self, ty: ServiceType) -> &ObjectShape {
        static EMPTY: ObjectShape = ObjectShape {
            properties: BTreeMap::new(),
        };
        self.user_configs.get(&ty).unwrap_or(&EMPTY)
    }

    /// Attribute table of a managed resource.
    pub fn resource_schema(&self, kind: ResourceKind) -> ResourceSchema {
        let mut attributes = common_attributes();

        let service_type = AttributeSpec::new(
            "service_type",
            AttributeKind::String,
            "Service type code",
        );
        attributes.push(match kind {
            ResourceKind::Service => service_type.required().create_only(),
            ResourceKind::Typed(_) => service_type.computed(),
        });

        for ty in kind.block_types() {
            attributes.push(
                AttributeSpec::new(
                    ty.as_str(),
                    AttributeKind::Block(connection_info_attributes(ty)),
                    format!("{ty} specific server provided values"),
                )
                .computed(),
            );
            attributes.push(AttributeSpec::new(
                ty.user_config_attribute(),
                AttributeKind::UserConfig(ty),
                format!("{ty} user configurable settings"),
            ));
        }

        ResourceSchema { kind, attributes }
    }

    /// Read-only variant of a resource schema for lookups by natural keys.
    ///
    /// Every attribute becomes computed except `keys`, which become required
    /// inputs.
    pub fn datasource_schema(&self, kind: ResourceKind, keys: &[&str]) -> ResourceSchema {
        let base = self.resource_schema(kind);
        let attributes = base
            .attributes
            .into_iter()
            .map(|attr| {
                if keys.contains(&attr.name.as_str()) {
                    AttributeSpec {
                        required: true,
                        mutability: crate::field::Mutability::Mutable,
                        ..attr
                    }
                } else {
                    attr.into_computed()
                }
            })
            .collect();
        ResourceSchema { kind, attributes }
    }
}

fn common_attributes() -> Vec<AttributeSpec> {
    use AttributeKind::{Block, Boolean, Integer, List, String};

    vec![
        AttributeSpec::new("project", String, "Target project").required().create_only(),
        AttributeSpec::new("service_name", String, "Service name").required().create_only(),
        AttributeSpec::new("cloud_name", String, "Cloud the service runs in"),
        AttributeSpec::new("plan", String, "Subscription plan"),
        AttributeSpec::new(
            "project_vpc_id",
            String,
            "Identifier of the VPC the service should be in, if any",
        ),
        AttributeSpec::new(
            "maintenance_window_dow",
            String,
            "Day of week when maintenance operations should be performed",
        ),
        AttributeSpec::new(
            "maintenance_window_time",
            String,
            "Time of day when maintenance operations should be performed, UTC HH:mm:ss",
        ),
        AttributeSpec::new(
            "termination_protection",
            Boolean,
            "Prevents the service from being deleted",
        ),
        AttributeSpec::new(
            "service_integrations",
            List(Box::new(Block(vec![
                AttributeSpec::new("source_service_name", String, "Name of the source service").required(),
                AttributeSpec::new("integration_type", String, "Type of the service integration").required(),
            ]))),
            "Service integrations to specify when creating a service",
        ),
        AttributeSpec::new("service_uri", String, "URI for connecting to the service")
            .computed()
            .sensitive(),
        AttributeSpec::new("service_host", String, "The hostname of the service").computed(),
        AttributeSpec::new("service_port", Integer, "The port of the service").computed(),
        AttributeSpec::new("service_username", String, "Username used for connecting to the service")
            .computed(),
        AttributeSpec::new("service_password", String, "Password used for connecting to the service")
            .computed()
            .sensitive(),
        AttributeSpec::new("state", String, "Service state").computed(),
        AttributeSpec::new(
            "components",
            List(Box::new(Block(vec![
                AttributeSpec::new("component", String, "Service component name").computed(),
                AttributeSpec::new("host", String, "DNS name for connecting to the component").computed(),
                AttributeSpec::new("port", Integer, "Port number of the component").computed(),
                AttributeSpec::new("route", String, "Network access route").computed(),
                AttributeSpec::new("usage", String, "DNS usage name").computed(),
                AttributeSpec::new("ssl", Boolean, "Whether the endpoint is encrypted").computed(),
                AttributeSpec::new("kafka_authentication_method", String, "Kafka authentication method")
                    .computed(),
            ]))),
            "Service component information objects",
        )
        .computed(),
    ]
}

/// Attributes of the computed connection-info block of a service type.
pub fn connection_info_attributes(ty: ServiceType) -> Vec<AttributeSpec> {
    use AttributeKind::{Integer, List, String};

    let field = |name: &str, kind: AttributeKind, description: &str| {
        AttributeSpec::new(name, kind, description).computed()
    };

    match ty {
        ServiceType::Pg => vec![
            field("uri", String, "PostgreSQL master connection URI").sensitive(),
            field("replica_uri", String, "PostgreSQL replica URI for services with a replica").sensitive(),
            field("dbname", String, "Primary PostgreSQL database name"),
            field("host", String, "PostgreSQL master node host IP or name"),
            field("port", Integer, "PostgreSQL port"),
            field("password", String, "PostgreSQL admin user password").sensitive(),
            field("sslmode", String, "PostgreSQL sslmode setting"),
            field("user", String, "PostgreSQL admin user name"),
        ],
        ServiceType::Kafka => vec![
            field("access_cert", String, "The Kafka client certificate").sensitive(),
            field("access_key", String, "The Kafka client certificate key").sensitive(),
            field("connect_uri", String, "The Kafka Connect URI, if any").sensitive(),
            field("rest_uri", String, "The Kafka REST URI, if any").sensitive(),
            field("schema_registry_uri", String, "The Schema Registry URI, if any").sensitive(),
        ],
        ServiceType::Elasticsearch => {
            vec![field("kibana_uri", String, "URI for Kibana frontend").sensitive()]
        }
        ServiceType::Opensearch => vec![
            field("opensearch_dashboards_uri", String, "URI for Opensearch dashboard frontend")
                .sensitive(),
        ],
        ServiceType::InfluxDb => {
            vec![field("database_name", String, "Name of the default InfluxDB database")]
        }
        ServiceType::Flink => vec![field(
            "host_ports",
            List(Box::new(String)),
            "Host and port of each Flink server",
        )],
        ServiceType::Cassandra
        | ServiceType::Grafana
        | ServiceType::Redis
        | ServiceType::MySql
        | ServiceType::KafkaConnect
        | ServiceType::KafkaMirrormaker
        | ServiceType::M3Db
        | ServiceType::M3Aggregator => Vec::new(),
    }
}
