//! HTTP server wiring: routes, layers and the listener

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use torrent::TorrentManager;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::auth_context;
use crate::play::play;
use crate::state::ServerState;

/// File server API for managing the HTTP server
#[derive(Clone)]
pub struct FileServerApi {
    state: ServerState,
}

impl FileServerApi {
    /// Create a new file server API
    ///
    /// # Arguments
    /// * `manager` - Torrent backend used to resolve play requests
    /// * `accounts` - Basic auth accounts (user name to password); empty disables auth
    pub fn new(manager: Arc<dyn TorrentManager>, accounts: HashMap<String, String>) -> Self {
        let state = ServerState::new(manager, accounts);
        Self { state }
    }

    /// Create the axum router with all routes configured
    pub fn router(&self) -> Router {
        Router::new()
            .route("/play/:hash/:id", get(play))
            .route("/health", get(health_check))
            .layer(middleware::from_fn_with_state(self.state.clone(), auth_context))
            .with_state(self.state.clone())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Start the file server
    ///
    /// # Arguments
    /// * `host` - Host to bind to (e.g., "0.0.0.0")
    /// * `port` - Port to bind to (e.g., 8090)
    pub async fn serve(self, host: &str, port: u16) -> crate::Result<()> {
        let addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!(
            "File server listening on {} (authorization {})",
            addr,
            if self.state.auth_required() { "required" } else { "disabled" }
        );

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}

/// Health check endpoint
async fn health_check(State(state): State<ServerState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        format!(
            "File server running. Authorization: {}",
            if state.auth_required() { "required" } else { "disabled" }
        ),
    )
}
