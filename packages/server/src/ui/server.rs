//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use super::{
    handler::{
        end_session, get_session_state, health_check, leave_session, run_code, stop_sandbox,
        websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Build the application router over the shared state.
///
/// Exposed separately from [`Server`] so integration tests can serve the
/// same routes on an ephemeral listener.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket エンドポイント
        .route("/ws", get(websocket_handler))
        // HTTP エンドポイント
        .route("/api/health", get(health_check))
        .route("/api/sessions/run/{session_id}", post(run_code))
        .route("/api/sessions/stop/{session_id}", post(stop_sandbox))
        .route("/api/sessions/end/{session_id}", post(end_session))
        .route("/api/sessions/leave/{session_id}", post(leave_session))
        .route("/api/sessions/{session_id}", get(get_session_state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Collaborative debug session server
///
/// This struct encapsulates the server configuration and provides methods to run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(app_state);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Create a new Server instance
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Run the session server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app = router(self.state);

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        // Start the server
        tracing::info!(
            "Collaborative session server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
