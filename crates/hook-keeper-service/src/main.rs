//! # Hook-Keeper Service
//!
//! Binary entry point for the Hook-Keeper relay service.
//!
//! This executable:
//! - Loads configuration from environment and files
//! - Initializes observability (logging, tracing)
//! - Creates the record store and relay dependencies
//! - Starts the HTTP server from the service library

use hook_keeper_core::adapters::{DynamoDbRecordStore, InMemoryRecordStore};
use hook_keeper_core::RecordStore;
use hook_keeper_service::{parse_repository_list, start_server, ServiceConfig, StoreProvider};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "hook_keeper_service=info,hook_keeper_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hook-Keeper Service");

    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Sources (applied in order — later sources override earlier ones):
    //  1. /etc/hook-keeper/service.yaml    — system-wide defaults
    //  2. ./config/service.yaml            — deployment-local override
    //  3. Path given by HK_CONFIG_FILE env — operator-specified file
    //  4. Environment variables prefixed HK__ (double-underscore separator)
    //     e.g. HK__SERVER__PORT=9090 sets server.port = 9090
    //
    // All service configuration fields carry serde defaults, so absent files
    // or an entirely unconfigured environment produces a valid service config
    // with built-in defaults.  A malformed file or an environment variable
    // that cannot be coerced to the correct type IS a hard error because it
    // indicates deliberate-but-broken operator configuration.
    // -------------------------------------------------------------------------
    let mut config_builder = config::Config::builder()
        .add_source(
            config::File::with_name("/etc/hook-keeper/service")
                .required(false)
                .format(config::FileFormat::Yaml),
        )
        .add_source(
            config::File::with_name("config/service")
                .required(false)
                .format(config::FileFormat::Yaml),
        );

    // Optional explicit path supplied by the operator.
    if let Ok(explicit_path) = std::env::var("HK_CONFIG_FILE") {
        if !explicit_path.is_empty() {
            config_builder = config_builder.add_source(
                config::File::with_name(&explicit_path)
                    .required(true)
                    .format(config::FileFormat::Yaml),
            );
            info!(path = %explicit_path, "Loading configuration from explicit path");
        }
    }

    let config = match config_builder
        .add_source(config::Environment::with_prefix("HK").separator("__"))
        .build()
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "Failed to build configuration; aborting");
            std::process::exit(3);
        }
    };

    let mut service_config: ServiceConfig = match config.try_deserialize() {
        Ok(sc) => sc,
        Err(e) => {
            error!(
                error = %e,
                "Could not deserialize service configuration; aborting. \
                 Fix the configuration and restart."
            );
            std::process::exit(3);
        }
    };

    // -------------------------------------------------------------------------
    // Deployment environment contract
    //
    // GITHUB_OWNER and GITHUB_REPOSITORIES (a single JSON string array) are
    // how deployments have always provided the authorization settings; when
    // present they take precedence over anything in the config files.
    // -------------------------------------------------------------------------
    if let Ok(owner) = std::env::var("GITHUB_OWNER") {
        if !owner.is_empty() {
            service_config.authorization.owner = owner;
        }
    }

    if let Ok(raw) = std::env::var("GITHUB_REPOSITORIES") {
        if !raw.is_empty() {
            match parse_repository_list(&raw) {
                Ok(repositories) => service_config.authorization.repositories = repositories,
                Err(e) => {
                    error!(error = %e, "GITHUB_REPOSITORIES is malformed; aborting");
                    std::process::exit(3);
                }
            }
        }
    }

    info!(
        owner = %service_config.authorization.owner,
        repositories = service_config.authorization.repositories.len(),
        upstream = %service_config.upstream.base_url,
        "Configuration loaded"
    );

    // -------------------------------------------------------------------------
    // Record store
    // -------------------------------------------------------------------------
    let store: Arc<dyn RecordStore> = match service_config.store.provider {
        StoreProvider::DynamoDb => {
            info!(table = %service_config.store.table_name, "Using DynamoDB record store");
            Arc::new(DynamoDbRecordStore::from_env(service_config.store.table_name.clone()).await)
        }
        StoreProvider::Memory => {
            warn!("Using in-memory record store; no synthetic webhooks will be served");
            Arc::new(InMemoryRecordStore::new())
        }
    };

    // Start the HTTP server (runs until shutdown signal)
    if let Err(e) = start_server(service_config, store).await {
        error!(error = %e, "Service failed");
        std::process::exit(1);
    }

    info!("Hook-Keeper Service stopped");
    Ok(())
}
