//! Status server exposing the latest health snapshot

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::state::StateHandle;

/// Build the status server router.
///
/// `GET /health` returns every target's report; anything else is a bare 404.
pub fn build_router(state: StateHandle) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .fallback(not_found)
        .with_state(state)
}

async fn health_handler(State(state): State<StateHandle>) -> impl IntoResponse {
    let reports = state.read().await.reports();
    axum::Json(reports)
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Bind the status server on all interfaces
pub async fn bind(port: u16) -> crate::Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    TcpListener::bind(addr)
        .await
        .map_err(|e| crate::SidecarError::Server(format!("Failed to bind port {}: {}", port, e)))
}

/// Serve until the token is cancelled
pub async fn serve(
    listener: TcpListener,
    state: StateHandle,
    cancel: CancellationToken,
) -> crate::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Serving health status on http://{}", addr);
    }

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
        })
        .await
        .map_err(|e| crate::SidecarError::Server(e.to_string()))?;

    tracing::debug!("Status server stopped");
    Ok(())
}
