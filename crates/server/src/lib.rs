//! HTTP transport for docchat.
//!
//! Exposes the answering pipeline as an event-stream endpoint alongside a
//! model catalog and a health probe:
//!
//! - `POST /api/chat`: stream an answer as `data:` frames ending in `[DONE]`
//! - `GET /api/models`: models the configured credentials can serve
//! - `GET /health`: liveness, no authorization

pub mod api;
pub mod auth;
pub mod error;
pub mod state;

#[cfg(test)]
mod tests;

pub use auth::{Authorized, SessionVerifier, StaticTokenVerifier};
pub use error::ApiError;
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use docchat_core::{AppConfig, AppResult};
use std::future::Future;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(api::chat::chat))
        .route("/api/models", get(api::models::models))
        .route("/health", get(api::health::health))
        .with_state(state)
}

/// Bind the configured address and serve until `shutdown` resolves.
pub async fn serve<F>(config: &AppConfig, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = AppState::from_config(config)?;
    if !state.pipeline.has_embedder() {
        tracing::warn!("Starting without an embedding provider; /api/chat will return 500");
    }

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    let addr = listener.local_addr()?;
    tracing::info!("docchat listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
