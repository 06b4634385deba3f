use cloudsvc_api::{
    ApiError, CreateServiceRequest, HttpServiceApi, ServiceApi, UpdateServiceRequest,
};
use cloudsvc_core::ServiceState;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service_body(state: &str) -> Value {
    json!({
        "service": {
            "service_name": "pg-main",
            "service_type": "pg",
            "state": state,
            "plan": "startup-4",
            "cloud_name": "aws-eu-west-1",
            "termination_protection": false,
            "service_uri": "postgres://avnadmin:pw@pg-main.example.com:24947/defaultdb",
            "service_uri_params": { "host": "pg-main.example.com", "port": "24947" },
            "user_config": { "pg_version": "15" },
            "components": [
                { "component": "pg", "host": "pg-main.example.com", "port": 24947, "route": "dynamic", "usage": "primary", "ssl": true }
            ],
            "connection_info": {
                "pg": ["postgres://avnadmin:pw@pg-main.example.com:24947/defaultdb"],
                "pg_params": [{ "dbname": "defaultdb", "host": "pg-main.example.com", "password": "pw", "port": "24947", "sslmode": "require", "user": "avnadmin" }]
            },
            "unrelated_new_field": 42
        }
    })
}

#[tokio::test]
async fn get_sends_token_and_decodes_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/project/acme/service/pg-main"))
        .and(header("authorization", "aivenv1 tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(service_body("RUNNING")))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpServiceApi::new(&server.uri(), Some("tok-123".into())).unwrap();
    let service = api.get("acme", "pg-main").await.unwrap();

    assert_eq!(service.state, ServiceState::Running);
    assert_eq!(service.components.len(), 1);
    assert_eq!(service.connection_info.pg_params[0].port, "24947");
    assert_eq!(service.user_config, json!({ "pg_version": "15" }));
}

#[tokio::test]
async fn missing_service_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/project/acme/service/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Service does not exist" })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/project/acme/service/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let api = HttpServiceApi::new(&server.uri(), None).unwrap();
    assert_eq!(
        api.get("acme", "gone").await.unwrap_err(),
        ApiError::not_found("acme", "gone")
    );
    assert!(api.delete("acme", "gone").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn create_posts_request_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/project/acme/service"))
        .and(body_partial_json(json!({
            "service_name": "pg-main",
            "service_type": "pg",
            "plan": "startup-4",
            "user_config": { "pg_version": "15" },
            "service_integrations": [{ "integration_type": "read_replica", "source_service": "pg-primary" }]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(service_body("REBUILDING")))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpServiceApi::new(&server.uri(), Some("t".into())).unwrap();
    let request = CreateServiceRequest {
        service_name: "pg-main".into(),
        service_type: "pg".into(),
        cloud: None,
        plan: Some("startup-4".into()),
        maintenance: None,
        project_vpc_id: None,
        termination_protection: false,
        user_config: json!({ "pg_version": "15" }),
        service_integrations: vec![cloudsvc_api::NewServiceIntegration {
            integration_type: "read_replica".into(),
            source_service: "pg-primary".into(),
        }],
    };

    let service = api.create("acme", &request).await.unwrap();
    assert_eq!(service.state, ServiceState::Rebuilding);
}

#[tokio::test]
async fn update_surfaces_remote_diagnostics() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/project/acme/service/pg-main"))
        .and(body_partial_json(json!({ "powered": true })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Invalid input",
            "errors": [{ "message": "Plan hobbyist is not available in cloud aws-eu-west-1" }]
        })))
        .mount(&server)
        .await;

    let api = HttpServiceApi::new(&server.uri(), None).unwrap();
    let request = UpdateServiceRequest {
        cloud: None,
        plan: Some("hobbyist".into()),
        maintenance: None,
        project_vpc_id: None,
        termination_protection: false,
        powered: true,
        user_config: Value::Null,
    };

    let err = api.update("acme", "pg-main", &request).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::http(400, "Plan hobbyist is not available in cloud aws-eu-west-1")
    );
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/project/acme/service/pg-main"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"service\": 7}"))
        .mount(&server)
        .await;

    let api = HttpServiceApi::new(&server.uri(), None).unwrap();
    assert!(matches!(
        api.get("acme", "pg-main").await.unwrap_err(),
        ApiError::Decode(_)
    ));
}
