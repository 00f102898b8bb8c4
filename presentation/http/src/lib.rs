//! HTTP presentation adapter for the PersonaChat proxy
//!
//! Mounts the request proxy on an axum router so the browser client can
//! reach it, with a fixed CORS header set on every response.

use async_trait::async_trait;
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{any, get, MethodRouter},
    Router,
};
use personachat_core::prelude::*;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

mod handlers;
mod middleware;

/// Path the browser client posts to when deployed as a Netlify function
pub const NETLIFY_FUNCTION_PATH: &str = "/.netlify/functions/chat";

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,
    /// Path the proxy is mounted on
    pub proxy_path: String,
    /// Also mount the proxy on the Netlify function path
    pub netlify_alias: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8888)),
            proxy_path: "/api/chat".to_string(),
            netlify_alias: true,
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<RequestProxy>,
}

/// axum-based presentation adapter
pub struct HttpServer {
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the axum router with all routes
    pub fn build_router(&self, proxy: Arc<RequestProxy>) -> Router {
        let app_state = AppState { proxy };

        let mut router = Router::new()
            .route("/health", get(handlers::health::health_check))
            .route(&self.config.proxy_path, proxy_route());

        if self.config.netlify_alias && self.config.proxy_path != NETLIFY_FUNCTION_PATH {
            router = router.route(NETLIFY_FUNCTION_PATH, proxy_route());
        }

        let service_builder = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(from_fn(middleware::request_logging))
            .layer(from_fn(middleware::cors_headers));

        router.with_state(app_state).layer(service_builder)
    }

    /// Serve until `shutdown` resolves
    pub async fn serve_with_shutdown<F>(&self, proxy: Arc<RequestProxy>, shutdown: F) -> Result<(), PresentationError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router(proxy);

        let listener = tokio::net::TcpListener::bind(&self.config.bind_address)
            .await
            .map_err(|e| PresentationError::StartupFailed(format!("Failed to bind to {}: {}", self.config.bind_address, e)))?;

        info!(
            "PersonaChat proxy listening on http://{}{}",
            self.config.bind_address, self.config.proxy_path
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| PresentationError::ShutdownFailed(format!("Server error: {}", e)))?;

        info!("PersonaChat proxy stopped");
        Ok(())
    }
}

/// Every method reaches the proxy, which owns the method gate. Prompts carry
/// the whole conversation, so axum's 2 MiB body cap is lifted here.
fn proxy_route() -> MethodRouter<AppState> {
    any(handlers::chat::proxy_chat).layer(DefaultBodyLimit::disable())
}

#[async_trait]
impl PresentationAdapter for HttpServer {
    async fn start(&self, proxy: Arc<RequestProxy>) -> Result<(), PresentationError> {
        self.serve_with_shutdown(proxy, shutdown_signal()).await
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
