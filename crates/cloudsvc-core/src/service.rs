use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Closed set of service types offered by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Pg,
    Cassandra,
    Elasticsearch,
    Opensearch,
    Grafana,
    #[serde(rename = "influxdb")]
    InfluxDb,
    Redis,
    #[serde(rename = "mysql")]
    MySql,
    Kafka,
    KafkaConnect,
    KafkaMirrormaker,
    #[serde(rename = "m3db")]
    M3Db,
    #[serde(rename = "m3aggregator")]
    M3Aggregator,
    Flink,
}

impl ServiceType {
    pub const ALL: [ServiceType; 14] = [
        ServiceType::Pg,
        ServiceType::Cassandra,
        ServiceType::Elasticsearch,
        ServiceType::Opensearch,
        ServiceType::Grafana,
        ServiceType::InfluxDb,
        ServiceType::Redis,
        ServiceType::MySql,
        ServiceType::Kafka,
        ServiceType::KafkaConnect,
        ServiceType::KafkaMirrormaker,
        ServiceType::M3Db,
        ServiceType::M3Aggregator,
        ServiceType::Flink,
    ];

    /// Wire name used by the remote API and as attribute prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pg => "pg",
            Self::Cassandra => "cassandra",
            Self::Elasticsearch => "elasticsearch",
            Self::Opensearch => "opensearch",
            Self::Grafana => "grafana",
            Self::InfluxDb => "influxdb",
            Self::Redis => "redis",
            Self::MySql => "mysql",
            Self::Kafka => "kafka",
            Self::KafkaConnect => "kafka_connect",
            Self::KafkaMirrormaker => "kafka_mirrormaker",
            Self::M3Db => "m3db",
            Self::M3Aggregator => "m3aggregator",
            Self::Flink => "flink",
        }
    }

    /// Name of the declarative attribute holding this type's user config.
    pub fn user_config_attribute(&self) -> String {
        format!("{}_user_config", self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::unknown_service_type(s))
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state reported by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceState {
    Provisioning,
    Rebuilding,
    Rebalancing,
    Running,
    #[serde(rename = "POWEROFF")]
    PoweredOff,
    Deleted,
    /// Any state string this client does not know about yet.
    #[serde(other)]
    Unknown,
}

impl ServiceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provisioning => "PROVISIONING",
            Self::Rebuilding => "REBUILDING",
            Self::Rebalancing => "REBALANCING",
            Self::Running => "RUNNING",
            Self::PoweredOff => "POWEROFF",
            Self::Deleted => "DELETED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Integration kinds accepted at service creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationType {
    ReadReplica,
}

impl IntegrationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadReplica => "read_replica",
        }
    }
}

impl FromStr for IntegrationType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "read_replica" => Ok(Self::ReadReplica),
            other => Err(CoreError::unknown_integration_type(other)),
        }
    }
}

impl fmt::Display for IntegrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Weekly maintenance slot. Day and time are always set together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    pub dow: String,
    pub time: String,
}

impl MaintenanceWindow {
    /// Builds a window from the two optional declarative parts.
    ///
    /// Both absent (or empty) yields `None`; exactly one set is an error.
    pub fn from_parts(dow: Option<&str>, time: Option<&str>) -> Result<Option<Self>> {
        let dow = dow.filter(|d| !d.is_empty());
        let time = time.filter(|t| !t.is_empty());
        match (dow, time) {
            (None, None) => Ok(None),
            (Some(dow), Some(time)) => Self::new(dow, time).map(Some),
            _ => Err(CoreError::invalid_value(
                "maintenance_window",
                "maintenance_window_dow and maintenance_window_time must be set together",
            )),
        }
    }

    pub fn new(dow: &str, time: &str) -> Result<Self> {
        if !WEEKDAYS.contains(&dow) {
            return Err(CoreError::invalid_value(
                "maintenance_window_dow",
                format!("expected one of {WEEKDAYS:?}, got {dow:?}"),
            ));
        }
        if !is_time_of_day(time) {
            return Err(CoreError::invalid_value(
                "maintenance_window_time",
                format!("expected HH:mm:ss, got {time:?}"),
            ));
        }
        Ok(Self {
            dow: dow.to_string(),
            time: time.to_string(),
        })
    }
}

fn is_time_of_day(value: &str) -> bool {
    let fields: Vec<&str> = value.split(':').collect();
    if fields.len() != 3 || fields.iter().any(|f| f.len() != 2) {
        return false;
    }
    let limits = [23u32, 59, 59];
    fields
        .iter()
        .zip(limits)
        .all(|(f, max)| f.parse::<u32>().is_ok_and(|v| v <= max))
}
