//! `api` — HTTP surface over the expression service and history store.
//!
//! ## URL layout
//!
//! ```text
//! POST   /api/evaluate
//! POST   /api/differentiate
//! POST   /api/integrate
//! GET    /api/history?limit=100
//! DELETE /api/history/{id}
//! GET    /api/health
//! ```
//!
//! Handlers receive [`ApiState`] via `axum::extract::State`. The compute
//! routes go through the expression service; the history routes talk to the
//! store directly.

mod handlers;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::AppError;
use crate::service::ExpressionService;
use crate::store::HistoryStore;

/// Router state injected into every handler. Cheap to clone.
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<ExpressionService>,
    pub store: HistoryStore,
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/evaluate", post(handlers::evaluate))
        .route("/api/differentiate", post(handlers::differentiate))
        .route("/api/integrate", post(handlers::integrate))
        .route("/api/history", get(handlers::history))
        .route("/api/history/{id}", delete(handlers::delete_history))
        .route("/api/health", get(handlers::health))
        .with_state(state)
}

/// Bind and serve until the shutdown token is cancelled.
pub async fn serve(
    bind_addr: &str,
    state: ApiState,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let router = build_router(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Server(format!("bind failed on {bind_addr}: {e}")))?;

    info!(%bind_addr, "api listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Server(format!("server error: {e}")))?;

    info!("api shut down");
    Ok(())
}
