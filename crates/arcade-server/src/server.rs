use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Arcade HTTP server.
pub struct ArcadeServer {
    state: Arc<AppState>,
}

impl ArcadeServer {
    /// Server over the filesystem bucket named in `config`.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        Ok(Self {
            state: AppState::from_config(config)?,
        })
    }

    /// Server over prebuilt state (e.g. an in-memory store).
    pub fn with_state(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> ServerResult<axum::Router> {
        build_router(self.state.clone())
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router()?;
        let addr = self.state.config.bind_addr;
        let listener = TcpListener::bind(addr).await?;
        info!("arcade server listening on {addr}");
        info!(
            bucket = %self.state.config.bucket,
            key = %self.state.config.document_key,
            origin = %self.state.config.allowed_origin,
            "serving user registry"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        info!("arcade server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
