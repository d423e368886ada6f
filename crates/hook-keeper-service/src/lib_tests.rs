//! Tests for service configuration, error mapping, and response assembly

use super::*;
use hook_keeper_core::adapters::InMemoryRecordStore;
use http::header::{HeaderValue, CONTENT_TYPE};
use tower::ServiceExt; // for `oneshot`

#[test]
fn test_service_config_defaults() {
    let config = ServiceConfig::default();

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.upstream.base_url, "https://api.github.com");
    assert_eq!(config.store.provider, StoreProvider::DynamoDb);
    assert_eq!(config.store.table_name, "tf_webhooks");
    assert!(config.authorization.owner.is_empty());
    assert!(config.authorization.repositories.is_empty());
}

#[test]
fn test_store_provider_serde_names() {
    assert_eq!(
        serde_json::to_string(&StoreProvider::Memory).unwrap(),
        r#""memory""#
    );
    assert_eq!(
        serde_json::to_string(&StoreProvider::DynamoDb).unwrap(),
        r#""dynamodb""#
    );

    let parsed: StoreProvider = serde_json::from_str(r#""memory""#).unwrap();
    assert_eq!(parsed, StoreProvider::Memory);
}

#[test]
fn test_service_config_deserializes_from_partial_yaml() {
    // Every field carries a serde default, so a sparse file is enough.
    let yaml = r#"
authorization:
  owner: octocat
  repositories:
    - widgets
store:
  provider: memory
"#;
    let config: ServiceConfig = serde_yaml_from_str(yaml);

    assert_eq!(config.authorization.owner, "octocat");
    assert_eq!(config.authorization.repositories, vec!["widgets"]);
    assert_eq!(config.store.provider, StoreProvider::Memory);
    assert_eq!(config.server.port, 8080);
}

/// Deserialize YAML through the same `config` crate pipeline the binary uses.
fn serde_yaml_from_str(yaml: &str) -> ServiceConfig {
    config::Config::builder()
        .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap()
}

#[test]
fn test_parse_repository_list() {
    let repositories = parse_repository_list(r#"["widgets", "gadgets"]"#).unwrap();
    assert_eq!(repositories, vec!["widgets", "gadgets"]);

    assert!(parse_repository_list("widgets,gadgets").is_err());
    assert!(parse_repository_list(r#"{"repo": "widgets"}"#).is_err());
    assert_eq!(parse_repository_list("[]").unwrap().len(), 0);
}

#[test]
fn test_authorization_config_to_policy() {
    let config = AuthorizationConfig {
        owner: "octocat".to_string(),
        repositories: vec!["widgets".to_string()],
    };
    let policy = config.to_policy();

    assert!(policy.owner_authorized("octocat"));
    assert!(!policy.owner_authorized("intruder"));
    assert!(policy.repo_allowed("widgets"));
    assert!(!policy.repo_allowed("gadgets"));
}

#[test]
fn test_response_assembly_filters_framing_headers() {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_LENGTH, HeaderValue::from_static("2"));
    headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("x-github-request-id", HeaderValue::from_static("ABCD:1234"));

    let response = into_http_response(StatusCode::OK, &headers, Bytes::from_static(b"[]"));

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "application/json");
    assert_eq!(response.headers().get("x-github-request-id").unwrap(), "ABCD:1234");
    assert!(response.headers().get(CONTENT_LENGTH).is_none());
    assert!(response.headers().get(TRANSFER_ENCODING).is_none());
    assert!(response.headers().get(CONNECTION).is_none());
}

#[tokio::test]
async fn test_relay_error_maps_to_bad_gateway() {
    let error = RelayError::Upstream(UpstreamError::Transport {
        message: "connection refused".to_string(),
    });

    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(payload["status"], 502);
    assert!(payload["error"]
        .as_str()
        .unwrap()
        .contains("connection refused"));
}

fn test_state() -> AppState {
    build_state(
        ServiceConfig::default(),
        Arc::new(InMemoryRecordStore::new()),
    )
    .unwrap()
}

#[tokio::test]
async fn test_router_has_health_endpoint() {
    let app = create_router(test_state());

    let request = http::Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(payload["status"], "healthy");
}

#[tokio::test]
async fn test_router_has_readiness_endpoint() {
    let app = create_router(test_state());

    let request = http::Request::builder()
        .uri("/ready")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_router_returns_404_for_unknown_routes() {
    let app = create_router(test_state());

    let request = http::Request::builder()
        .uri("/repos/octocat/widgets")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_build_state_rejects_invalid_upstream_url() {
    let config = ServiceConfig {
        upstream: UpstreamConfig {
            base_url: "not a url".to_string(),
            ..UpstreamConfig::default()
        },
        ..ServiceConfig::default()
    };

    assert!(matches!(
        build_state(config, Arc::new(InMemoryRecordStore::new())),
        Err(ServiceError::Configuration(_))
    ));
}
