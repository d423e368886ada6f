//! # Hook-Keeper HTTP Service
//!
//! HTTP relay in front of the GitHub webhook-listing endpoint.
//!
//! Every inbound request for `/repos/{user}/{repo}/hooks` is forwarded to the
//! upstream API unchanged. When the response is a webhook listing the caller
//! is authorized to manage, synthetic webhook entries from the record store
//! are merged into it before it is returned, so reconciliation tooling sees
//! phantom webhooks as real ones.
//!
//! This crate provides:
//! - The relay endpoint and its orchestration
//! - Health check endpoints
//! - Service configuration types
//! - Request logging middleware with correlation IDs

pub mod upstream;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::{any, get},
    Router,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use hook_keeper_core::{AugmentOutcome, AugmentPolicy, Augmenter, RecordStore};
use http::header::{CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

pub use upstream::{UpstreamClient, UpstreamError, UpstreamResponse};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: ServiceConfig,

    /// Client relaying requests to the upstream API
    pub upstream: UpstreamClient,

    /// Gate + merge logic for webhook-listing responses
    pub augmenter: Arc<Augmenter>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: ServiceConfig, upstream: UpstreamClient, augmenter: Arc<Augmenter>) -> Self {
        Self {
            config,
            upstream,
            augmenter,
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Upstream API settings
    pub upstream: UpstreamConfig,

    /// Which owner and repositories qualify for augmentation
    pub authorization: AuthorizationConfig,

    /// Record store settings
    pub store: StoreConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

/// Upstream API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL requests are relayed to
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// User agent for outbound requests (required by GitHub)
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            timeout_seconds: 30,
            user_agent: format!("hook-keeper/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Authorization configuration for the augmentation gate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizationConfig {
    /// The single owner whose repositories may be augmented
    pub owner: String,

    /// Repository names (without owner) augmentation is allowed for
    pub repositories: Vec<String>,
}

impl AuthorizationConfig {
    /// Build the augmentation policy from this configuration.
    pub fn to_policy(&self) -> AugmentPolicy {
        AugmentPolicy::new(self.owner.clone(), self.repositories.iter().cloned())
    }
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Which store implementation to use
    pub provider: StoreProvider,

    /// Table holding the synthetic webhook records
    pub table_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: StoreProvider::DynamoDb,
            table_name: "tf_webhooks".to_string(),
        }
    }
}

/// Available record store implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreProvider {
    /// In-memory store; development only, starts empty.
    Memory,

    /// DynamoDB table queried with the ambient AWS configuration.
    DynamoDb,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Parse the repository allow-list from its single JSON-array environment
/// value (`GITHUB_REPOSITORIES`).
pub fn parse_repository_list(raw: &str) -> Result<Vec<String>, ConfigError> {
    serde_json::from_str::<Vec<String>>(raw).map_err(|e| ConfigError::Invalid {
        message: format!("repository list is not a JSON string array: {}", e),
    })
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let relay_routes = Router::new().route("/repos/{user}/{repo}/hooks", any(relay_hooks));

    let health_routes = Router::new()
        .route("/health", get(handle_health_check))
        .route("/ready", get(handle_readiness_check));

    Router::new()
        .merge(relay_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(request_logging_middleware))
                .into_inner(),
        )
        .with_state(state)
}

/// Build application state from configuration and a record store.
pub fn build_state(
    config: ServiceConfig,
    store: Arc<dyn RecordStore>,
) -> Result<AppState, ServiceError> {
    let upstream = UpstreamClient::new(&config.upstream).map_err(|e| {
        ServiceError::Configuration(ConfigError::Invalid {
            message: e.to_string(),
        })
    })?;

    if config.authorization.owner.is_empty() {
        warn!("No authorized owner configured; the service will relay without augmenting");
    }

    let augmenter = Arc::new(Augmenter::new(
        config.authorization.to_policy(),
        store,
        config.upstream.base_url.clone(),
    ));

    Ok(AppState::new(config, upstream, augmenter))
}

/// Start HTTP server
pub async fn start_server(
    config: ServiceConfig,
    store: Arc<dyn RecordStore>,
) -> Result<(), ServiceError> {
    let state = build_state(config.clone(), store)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|_| {
            ServiceError::Configuration(ConfigError::Invalid {
                message: format!(
                    "invalid bind address {}:{}",
                    config.server.host, config.server.port
                ),
            })
        })?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: addr.to_string(),
            message: e.to_string(),
        })?;

    info!("Starting HTTP server on {}", addr);

    let shutdown_timeout = std::time::Duration::from_secs(config.server.shutdown_timeout_seconds);

    let shutdown_signal = async move {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C signal handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
            },
            _ = terminate => {
                info!("Received SIGTERM, initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
            },
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

// ============================================================================
// Relay Handler
// ============================================================================

/// Relay a webhook-listing request to the upstream API.
///
/// The request is forwarded as-is (method, path, headers, body) with the
/// upstream host substituted and `Accept-Encoding` removed. If the buffered
/// response qualifies under the augmentation gate, synthetic entries from the
/// record store are merged into the body before it is returned; otherwise the
/// upstream response passes through untouched.
#[instrument(skip_all, fields(user = %user, repo = %repo, method = %method))]
async fn relay_hooks(
    State(state): State<AppState>,
    Path((user, repo)): Path<(String, String)>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayError> {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    let upstream = state
        .upstream
        .relay(method.clone(), path_and_query, &headers, body)
        .await?;

    let outcome = state
        .augmenter
        .augment(&method, &user, &repo, upstream.status, &upstream.body)
        .await;

    let response = match outcome {
        AugmentOutcome::Unchanged => {
            into_http_response(upstream.status, &upstream.headers, upstream.body)
        }
        AugmentOutcome::Augmented { body } => {
            info!(user = %user, repo = %repo, "Returning augmented webhook listing");
            into_http_response(upstream.status, &upstream.headers, body)
        }
        AugmentOutcome::StoreFailed { status, body } => {
            into_http_response(status, &upstream.headers, body)
        }
    };

    Ok(response)
}

/// Build the final HTTP response from status, upstream headers, and body.
///
/// Framing and connection headers are dropped; they described the upstream
/// exchange and are recomputed for the response actually served.
fn into_http_response(status: StatusCode, headers: &HeaderMap, body: Bytes) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;

    let out = response.headers_mut();
    for (name, value) in headers {
        if *name == CONTENT_LENGTH || *name == TRANSFER_ENCODING || *name == CONNECTION {
            continue;
        }
        out.append(name.clone(), value.clone());
    }

    response
}

// ============================================================================
// Health Check Handlers
// ============================================================================

/// Basic health check endpoint
#[instrument(skip_all)]
async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check for load balancers
#[instrument(skip_all)]
async fn handle_readiness_check() -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        ready: true,
        timestamp: Utc::now(),
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware with correlation ID tracking
///
/// Extracts or generates a correlation ID, logs request start and completion
/// with structured fields, and propagates the ID through response headers.
#[instrument(skip(request, next), fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::Span::current().record("correlation_id", correlation_id.as_str());
    request.extensions_mut().insert(correlation_id.clone());

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert("x-correlation-id", header_value);
    }

    let status = response.status();

    if status.is_server_error() {
        error!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        warn!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        info!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed successfully"
        );
    }

    response
}

// ============================================================================
// Response Types
// ============================================================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Readiness check response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Error Types
// ============================================================================

/// Relay handler errors with HTTP status code mapping
///
/// Non-qualifying requests are not errors; they pass through. The only
/// handler-level failure is the upstream transport failing, which maps to
/// `502 Bad Gateway` so the caller's infrastructure sees a failed relay
/// rather than a fabricated upstream answer.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The outbound call to the upstream API failed at the transport level.
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] UpstreamError),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Upstream(e) => {
                error!(error = %e, "Relay failed");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
            "timestamp": Utc::now().to_rfc3339(),
        });

        (status, Json(body)).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
