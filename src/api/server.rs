use std::net::SocketAddr;

use tokio::signal;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::ServerConfig;
use crate::error::{ReingresoError, Result};

/// HTTP server serving the prediction API
pub struct ApiServer {
    state: AppState,
    config: ServerConfig,
}

impl ApiServer {
    pub fn new(state: AppState, config: ServerConfig) -> Self {
        Self { state, config }
    }

    /// Serves until Ctrl-C or SIGTERM.
    pub async fn run(self) -> Result<()> {
        let app = create_router(self.state, &self.config.cors_origins)?;

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| {
                ReingresoError::Internal(format!(
                    "invalid listen address {}:{}: {e}",
                    self.config.host, self.config.port
                ))
            })?;
        info!("Starting API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ReingresoError::Internal(format!("API server error: {}", e)))?;

        info!("API server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
    info!("Shutdown signal received");
}
