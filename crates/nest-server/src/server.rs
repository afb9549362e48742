use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// How often expired sessions are swept.
const SESSION_SWEEP: Duration = Duration::from_secs(60);

/// NestDB HTTP server.
pub struct NestServer {
    state: AppState,
}

impl NestServer {
    /// Build the server `config` describes, loading its schema and token
    /// files.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        Ok(Self {
            state: AppState::from_config(config)?,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let bind_addr = self.state.config.bind_addr;
        let listener = TcpListener::bind(bind_addr).await?;
        tracing::info!(%bind_addr, "NestDB server listening");

        let sessions = self.state.sessions.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SESSION_SWEEP);
            loop {
                ticker.tick().await;
                if let Err(e) = sessions.purge_expired() {
                    tracing::warn!(error = %e, "session sweep failed");
                }
            }
        });

        axum::serve(listener, self.router())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
