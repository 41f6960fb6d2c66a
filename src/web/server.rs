//! Web server for filegate.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::store::DiskStore;
use crate::{GatewayError, Result};

use super::handlers::AppState;
use super::router::{create_health_router, create_openapi_router, create_router};

/// Web server for the file API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
}

impl WebServer {
    /// Create a new web server from configuration.
    ///
    /// Fails if the configured host and port do not form a valid socket address.
    pub fn new(config: &Config) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| {
                GatewayError::Config(format!(
                    "invalid server address {}:{}: {e}",
                    config.server.host, config.server.port
                ))
            })?;

        Ok(Self {
            addr,
            app_state: Arc::new(AppState::from_config(&config.files)),
        })
    }

    /// Create a web server around existing application state.
    pub fn with_state(addr: SocketAddr, app_state: Arc<AppState>) -> Self {
        Self { addr, app_state }
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Check the store directory before serving.
    ///
    /// With `create_if_missing` the directory is created; otherwise a missing store
    /// is only reported, and listings fail until it appears.
    pub async fn prepare_store(config: &Config) -> Result<()> {
        let store = DiskStore::new(&config.files.storage_path);

        if config.files.create_if_missing {
            store.ensure_root().await?;
            tracing::info!("File store ready at: {}", store.root().display());
        } else if !tokio::fs::try_exists(store.root()).await.unwrap_or(false) {
            tracing::warn!(
                "File store {} does not exist; listing will fail until it is created",
                store.root().display()
            );
        } else {
            tracing::info!("Serving files from: {}", store.root().display());
        }
        Ok(())
    }

    fn build_router(self) -> Router {
        create_router(self.app_state)
            .merge(create_health_router())
            .merge(create_openapi_router())
    }

    /// Run the web server.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        let router = self.build_router();

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(listener, router).await?;
        Ok(())
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        let router = self.build_router();

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
