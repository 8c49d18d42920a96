//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::NotifierError;
use crate::server::handlers::{
    building_handler, deploying_handler, done_handler, failed_handler, health_handler,
    noop_handler, status_handler, succeeded_handler, version_handler,
};
use crate::server::state::ServerState;

/// Build the router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Pipeline pings
        .route("/building/{project}", get(building_handler))
        .route("/deploying/{project}", get(deploying_handler))
        .route("/failed/{project}", get(failed_handler))
        .route("/succeeded/{project}", get(succeeded_handler))
        .route("/noop/{project}", get(noop_handler))
        .route("/done", get(done_handler))
        // Introspection
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/status", get(status_handler))
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), NotifierError>>, NotifierError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| NotifierError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| NotifierError::ServerError(e.to_string()))
    });

    Ok(handle)
}
