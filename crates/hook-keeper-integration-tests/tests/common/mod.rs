//! Common test utilities for hook-keeper integration tests
//!
//! Provides a router wired to a wiremock upstream and an in-memory record
//! store, plus builders for realistic webhook fixtures.

use axum::body::Body;
use axum::Router;
use bytes::Bytes;
use hook_keeper_core::adapters::InMemoryRecordStore;
use hook_keeper_core::{HookId, RepoKey, SyntheticHookRecord};
use hook_keeper_service::{
    build_state, create_router, AuthorizationConfig, ServiceConfig, StoreConfig, StoreProvider,
    UpstreamConfig,
};
use http::{Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

/// Owner authorized for augmentation in every test configuration.
#[allow(dead_code)]
pub const OWNER: &str = "octocat";

/// Build a service configuration pointing at the given upstream.
pub fn test_config(upstream_url: &str) -> ServiceConfig {
    ServiceConfig {
        authorization: AuthorizationConfig {
            owner: OWNER.to_string(),
            repositories: vec!["widgets".to_string(), "gadgets".to_string()],
        },
        upstream: UpstreamConfig {
            base_url: upstream_url.to_string(),
            ..UpstreamConfig::default()
        },
        store: StoreConfig {
            provider: StoreProvider::Memory,
            ..StoreConfig::default()
        },
        ..ServiceConfig::default()
    }
}

/// Build the full relay router against the given upstream and store.
#[allow(dead_code)]
pub fn test_app(upstream_url: &str, store: InMemoryRecordStore) -> Router {
    let state = build_state(test_config(upstream_url), Arc::new(store))
        .expect("test configuration must produce valid state");
    create_router(state)
}

/// A realistic webhook entry as the upstream returns it.
#[allow(dead_code)]
pub fn hook_json(repo: &str, id: u64) -> serde_json::Value {
    serde_json::json!({
        "type": "Repository",
        "id": id,
        "name": "web",
        "active": true,
        "events": ["push", "pull_request"],
        "config": {
            "content_type": "json",
            "insecure_ssl": "0",
            "url": "https://ci.example.com/github-webhook/"
        },
        "updated_at": "2022-11-07T00:30:31Z",
        "created_at": "2022-11-07T00:14:31Z",
        "url": format!("https://api.github.com/repos/{}/hooks/{}", repo, id),
        "test_url": format!("https://api.github.com/repos/{}/hooks/{}/test", repo, id),
        "ping_url": format!("https://api.github.com/repos/{}/hooks/{}/pings", repo, id),
        "deliveries_url": format!("https://api.github.com/repos/{}/hooks/{}/deliveries", repo, id),
        "last_response": {
            "code": 200,
            "status": "active",
            "message": "OK"
        }
    })
}

/// A synthetic webhook record for the given repository.
#[allow(dead_code)]
pub fn record(owner: &str, repo: &str, id: u64, date: &str) -> SyntheticHookRecord {
    SyntheticHookRecord::new(
        HookId::new(id),
        format!("https://reconciler.example.com/hooks/{}", id),
        date,
        RepoKey::from_parts(owner, repo),
    )
}

/// Issue one request against the router and buffer the response.
#[allow(dead_code)]
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, http::HeaderMap, Bytes) {
    let response = app.oneshot(request).await.expect("router must respond");
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body must buffer");
    (status, headers, body)
}

/// Convenience for a bodyless GET against the router.
#[allow(dead_code)]
pub async fn send_get(app: Router, path: &str) -> (StatusCode, http::HeaderMap, Bytes) {
    let request = Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .expect("request must build");
    send(app, request).await
}
