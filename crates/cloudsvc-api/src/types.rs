//! Wire types exchanged with the remote control plane.

use std::collections::BTreeMap;

use cloudsvc_core::ServiceState;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMaintenance {
    pub dow: String,
    pub time: String,
}

/// Integration declared at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewServiceIntegration {
    pub integration_type: String,
    pub source_service: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateServiceRequest {
    pub service_name: String,
    pub service_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance: Option<RemoteMaintenance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_vpc_id: Option<String>,
    pub termination_protection: bool,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub user_config: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_integrations: Vec<NewServiceIntegration>,
}

/// Update body. `project_vpc_id` is always sent so that `null` moves the
/// service out of its VPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateServiceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance: Option<RemoteMaintenance>,
    pub project_vpc_id: Option<String>,
    pub termination_protection: bool,
    pub powered: bool,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub user_config: Value,
}

/// A service as reported by the remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteService {
    pub service_name: String,
    pub service_type: String,
    pub state: ServiceState,
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub cloud_name: String,
    #[serde(default)]
    pub project_vpc_id: Option<String>,
    #[serde(default)]
    pub maintenance: Option<RemoteMaintenance>,
    #[serde(default)]
    pub termination_protection: bool,
    #[serde(default)]
    pub service_uri: Option<String>,
    #[serde(default)]
    pub service_uri_params: BTreeMap<String, Value>,
    #[serde(default)]
    pub user_config: Value,
    #[serde(default)]
    pub components: Vec<RemoteComponent>,
    #[serde(default)]
    pub connection_info: RemoteConnectionInfo,
    /// Diagnostic text the remote attaches to failed operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RemoteService {
    /// A service URI parameter rendered as a string, whatever its JSON type.
    pub fn uri_param(&self, key: &str) -> Option<String> {
        match self.service_uri_params.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoteComponent {
    pub component: String,
    pub host: String,
    pub port: i64,
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub usage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kafka_authentication_method: Option<String>,
}

/// Flat connection info. Which keys are populated depends on the service type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConnectionInfo {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pg: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pg_params: Vec<PgParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pg_replica_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kafka_access_cert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kafka_access_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kafka_connect_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kafka_rest_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_registry_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kibana_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opensearch_dashboards_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub influxdb_dbname: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flink: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PgParams {
    pub dbname: String,
    pub host: String,
    pub password: String,
    pub port: String,
    pub sslmode: String,
    pub user: String,
}
