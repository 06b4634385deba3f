//! Connection-info projection.
//!
//! The remote reports connection data in one flat object whatever the
//! service type. Each service type has a pure function picking out the keys
//! it owns; [`project`] dispatches over the closed [`ServiceType`] enum.

use cloudsvc_api::RemoteConnectionInfo;
use cloudsvc_core::ServiceType;
use serde::Serialize;

/// Typed connection-info block of one service type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConnectionInfo {
    Pg(PgConnection),
    Kafka(KafkaConnection),
    Elasticsearch { kibana_uri: String },
    Opensearch { opensearch_dashboards_uri: String },
    InfluxDb { database_name: String },
    Flink { host_ports: Vec<String> },
    /// Service types that expose no connection data.
    Empty {},
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PgConnection {
    pub uri: String,
    pub replica_uri: String,
    pub dbname: String,
    pub host: String,
    pub port: u16,
    pub password: String,
    pub sslmode: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct KafkaConnection {
    pub access_cert: String,
    pub access_key: String,
    pub connect_uri: String,
    pub rest_uri: String,
    pub schema_registry_uri: String,
}

/// Projects the remote's flat connection info onto the block of `ty`.
pub fn project(ty: ServiceType, info: &RemoteConnectionInfo) -> ConnectionInfo {
    match ty {
        ServiceType::Pg => pg(info),
        ServiceType::Kafka => kafka(info),
        ServiceType::Elasticsearch => elasticsearch(info),
        ServiceType::Opensearch => opensearch(info),
        ServiceType::InfluxDb => influxdb(info),
        ServiceType::Flink => flink(info),
        ServiceType::Cassandra
        | ServiceType::Grafana
        | ServiceType::Redis
        | ServiceType::MySql
        | ServiceType::KafkaConnect
        | ServiceType::KafkaMirrormaker
        | ServiceType::M3Db
        | ServiceType::M3Aggregator => ConnectionInfo::Empty {},
    }
}

fn pg(info: &RemoteConnectionInfo) -> ConnectionInfo {
    let mut conn = PgConnection {
        uri: info.pg.first().cloned().unwrap_or_default(),
        replica_uri: info.pg_replica_uri.clone().unwrap_or_default(),
        ..PgConnection::default()
    };
    if let Some(params) = info.pg_params.first() {
        conn.dbname = params.dbname.clone();
        conn.host = params.host.clone();
        conn.port = params.port.parse().unwrap_or(0);
        conn.password = params.password.clone();
        conn.sslmode = params.sslmode.clone();
        conn.user = params.user.clone();
    }
    ConnectionInfo::Pg(conn)
}

fn kafka(info: &RemoteConnectionInfo) -> ConnectionInfo {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    ConnectionInfo::Kafka(KafkaConnection {
        access_cert: text(&info.kafka_access_cert),
        access_key: text(&info.kafka_access_key),
        connect_uri: text(&info.kafka_connect_uri),
        rest_uri: text(&info.kafka_rest_uri),
        schema_registry_uri: text(&info.schema_registry_uri),
    })
}

fn elasticsearch(info: &RemoteConnectionInfo) -> ConnectionInfo {
    ConnectionInfo::Elasticsearch {
        kibana_uri: info.kibana_uri.clone().unwrap_or_default(),
    }
}

fn opensearch(info: &RemoteConnectionInfo) -> ConnectionInfo {
    ConnectionInfo::Opensearch {
        opensearch_dashboards_uri: info.opensearch_dashboards_uri.clone().unwrap_or_default(),
    }
}

fn influxdb(info: &RemoteConnectionInfo) -> ConnectionInfo {
    ConnectionInfo::InfluxDb {
        database_name: info.influxdb_dbname.clone().unwrap_or_default(),
    }
}

fn flink(info: &RemoteConnectionInfo) -> ConnectionInfo {
    ConnectionInfo::Flink {
        host_ports: info.flink.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudsvc_api::PgParams;
    use serde_json::json;

    #[test]
    fn test_pg_takes_first_uri_and_params() {
        let info = RemoteConnectionInfo {
            pg: vec!["postgres://a@h:5432/db".into(), "postgres://ignored".into()],
            pg_params: vec![PgParams {
                dbname: "defaultdb".into(),
                host: "h".into(),
                password: "pw".into(),
                port: "5432".into(),
                sslmode: "require".into(),
                user: "avnadmin".into(),
            }],
            pg_replica_uri: Some("postgres://replica".into()),
            ..Default::default()
        };
        let ConnectionInfo::Pg(conn) = project(ServiceType::Pg, &info) else {
            panic!("expected pg block");
        };
        assert_eq!(conn.uri, "postgres://a@h:5432/db");
        assert_eq!(conn.replica_uri, "postgres://replica");
        assert_eq!(conn.port, 5432);
        assert_eq!(conn.user, "avnadmin");
    }

    #[test]
    fn test_pg_bad_port_is_zero() {
        let info = RemoteConnectionInfo {
            pg_params: vec![PgParams {
                port: "not-a-port".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let ConnectionInfo::Pg(conn) = project(ServiceType::Pg, &info) else {
            panic!("expected pg block");
        };
        assert_eq!(conn.port, 0);
        assert_eq!(conn.uri, "");
    }

    #[test]
    fn test_kafka_and_search_blocks() {
        let info = RemoteConnectionInfo {
            kafka_access_cert: Some("cert".into()),
            kafka_rest_uri: Some("https://rest".into()),
            kibana_uri: Some("https://kibana".into()),
            ..Default::default()
        };
        let ConnectionInfo::Kafka(kafka) = project(ServiceType::Kafka, &info) else {
            panic!("expected kafka block");
        };
        assert_eq!(kafka.access_cert, "cert");
        assert_eq!(kafka.access_key, "");
        assert_eq!(kafka.rest_uri, "https://rest");
        assert_eq!(
            project(ServiceType::Elasticsearch, &info),
            ConnectionInfo::Elasticsearch {
                kibana_uri: "https://kibana".into()
            }
        );
    }

    #[test]
    fn test_types_without_connection_data_are_empty() {
        let info = RemoteConnectionInfo::default();
        for ty in [ServiceType::Redis, ServiceType::Grafana, ServiceType::M3Aggregator] {
            let block = project(ty, &info);
            assert_eq!(block, ConnectionInfo::Empty {});
            assert_eq!(serde_json::to_value(&block).unwrap(), json!({}));
        }
    }

    #[test]
    fn test_serialized_field_names() {
        let info = RemoteConnectionInfo {
            flink: vec!["flink-1:8082".into()],
            influxdb_dbname: Some("defaultdb".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(project(ServiceType::Flink, &info)).unwrap(),
            json!({ "host_ports": ["flink-1:8082"] })
        );
        assert_eq!(
            serde_json::to_value(project(ServiceType::InfluxDb, &info)).unwrap(),
            json!({ "database_name": "defaultdb" })
        );
    }
}
