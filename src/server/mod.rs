// Signalscope - REST proxy module
// Exposes signal discovery over plain HTTP for browser front ends

mod handlers;

pub use handlers::{create_router, health_check, search_signals, SearchParams};

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::{Config, ServerConfig};
use crate::providers::{create_providers, SignalProvider};

/// REST proxy in front of the configured signal providers
pub struct ProxyServer {
    providers: Vec<Arc<dyn SignalProvider>>,
    config: ServerConfig,
    request_timeout: Option<Duration>,
}

impl ProxyServer {
    pub fn new(
        providers: Vec<Arc<dyn SignalProvider>>,
        config: ServerConfig,
        request_timeout: Option<Duration>,
    ) -> Self {
        Self {
            providers,
            config,
            request_timeout,
        }
    }

    /// Build the server from a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let providers = create_providers(config)?;
        Ok(Self::new(
            providers,
            config.server.clone(),
            config.request_timeout(),
        ))
    }

    /// Start the HTTP server
    pub async fn serve(self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .bind_address
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.config.bind_address))?;

        let app_state = Arc::new(self);

        let app = create_router(app_state)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http());

        tracing::info!("Starting signal proxy on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    pub fn providers(&self) -> &[Arc<dyn SignalProvider>] {
        &self.providers
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }
}
