//! Relay server listener
//!
//! Binds the well-known port and serves the WebSocket relay and the health
//! check on it.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::relay::Relay;
use crate::server::config::ServerConfig;

use super::connection::ws_handler;
use super::health::health_handler;
use super::AppState;

/// Relay server
pub struct RelayServer {
    config: Arc<ServerConfig>,
    relay: Arc<Relay>,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl RelayServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        let relay = Relay::with_config(config.registry_config(), config.history_capacity);

        Self {
            config: Arc::new(config),
            relay: Arc::new(relay),
            connection_semaphore,
        }
    }

    /// Get a reference to the shared relay state
    pub fn relay(&self) -> &Arc<Relay> {
        &self.relay
    }

    /// Build the HTTP router (WebSocket at `/`, health at `/health`)
    pub fn router(&self) -> Router {
        let state = AppState {
            relay: Arc::clone(&self.relay),
            config: Arc::clone(&self.config),
            connection_semaphore: self.connection_semaphore.clone(),
        };

        Router::new()
            .route("/", get(ws_handler))
            .route("/health", get(health_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Run the server
    ///
    /// This method blocks until the process is terminated.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "Relay listening on ws://{}", addr);

        axum::serve(
            listener,
            self.router().into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

        Ok(())
    }
}
