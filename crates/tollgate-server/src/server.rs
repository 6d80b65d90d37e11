use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{any, get},
};
use serde_json::{Value, json};
use tollgate_auth::{
    ClientStorage, ConfigError, StaticClientRegistry, TokenEndpoint, TokenState, token_handler,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::{AppConfig, HEALTH_PATH};

pub struct TollgateServer {
    addr: SocketAddr,
    app: Router,
    clients: StaticClientRegistry,
}

/// Builds the router serving the token endpoint and the health probe.
///
/// Client lookups go through `clients`, so reloading the registry takes
/// effect without rebuilding the router.
pub fn build_app(cfg: &AppConfig, clients: StaticClientRegistry) -> Result<Router, ConfigError> {
    let storage: Arc<dyn ClientStorage> = Arc::new(clients);
    let endpoint = TokenEndpoint::from_config(&cfg.auth, storage)?;
    let state = TokenState::new(Arc::new(endpoint));

    Ok(Router::new()
        .route(HEALTH_PATH, get(healthz))
        .route(&cfg.server.token_path, any(token_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(cfg.server.body_limit_bytes)),
        ))
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub struct ServerBuilder {
    config: AppConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.config = cfg;
        self
    }

    pub fn build(self) -> Result<TollgateServer, ConfigError> {
        let clients = StaticClientRegistry::new(self.config.auth.clients.clone())?;
        let app = build_app(&self.config, clients.clone())?;

        Ok(TollgateServer {
            addr: self.config.addr(),
            app,
            clients,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TollgateServer {
    /// Handle to the live client registry, for hot reload.
    pub fn clients(&self) -> StaticClientRegistry {
        self.clients.clone()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!(
            addr = %self.addr,
            clients = self.clients.len(),
            "listening"
        );
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
