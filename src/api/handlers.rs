//! Axum handlers for `/api/*` routes.
//!
//! Each compute handler delegates to the expression service and maps its
//! closed error kind through [`compute_failure`] — one translation point
//! from error kind to transport status, no inline conversion elsewhere.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::service::{ComputeError, DEFAULT_VAR};
use crate::store::{DEFAULT_HISTORY_LIMIT, StoreError};

use super::ApiState;

// ── Request types ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct EvaluateRequest {
    expr: String,
    #[serde(default = "default_save")]
    save: bool,
}

#[derive(Deserialize)]
pub(super) struct DifferentiateRequest {
    expr: String,
    #[serde(default = "default_var")]
    var: String,
    #[serde(default = "default_order")]
    order: u32,
    #[serde(default = "default_save")]
    save: bool,
}

#[derive(Deserialize)]
pub(super) struct IntegrateRequest {
    expr: String,
    #[serde(default = "default_var")]
    var: String,
    lower: Option<String>,
    upper: Option<String>,
    #[serde(default = "default_save")]
    save: bool,
}

#[derive(Deserialize)]
pub(super) struct HistoryQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_save() -> bool {
    true
}

fn default_var() -> String {
    DEFAULT_VAR.to_string()
}

fn default_order() -> u32 {
    1
}

fn default_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Uniform failure payload: `{"detail": "<prefix><message>"}`.
fn detail(message: impl std::fmt::Display) -> Json<serde_json::Value> {
    Json(json!({ "detail": format!("{message}") }))
}

/// Single translation point from the service's error kind to a response.
/// Every compute failure is client-addressable (bad expression or a
/// computation that ran past the deadline), so both kinds map to 400.
fn compute_failure(prefix: &str, err: ComputeError) -> Response {
    (StatusCode::BAD_REQUEST, detail(format!("{prefix}{err}"))).into_response()
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// POST /api/evaluate
pub(super) async fn evaluate(
    State(state): State<ApiState>,
    Json(req): Json<EvaluateRequest>,
) -> Response {
    match state.service.evaluate(req.expr, req.save).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => compute_failure("Error al evaluar: ", e),
    }
}

/// POST /api/differentiate
pub(super) async fn differentiate(
    State(state): State<ApiState>,
    Json(req): Json<DifferentiateRequest>,
) -> Response {
    match state
        .service
        .differentiate(req.expr, req.var, req.order, req.save)
        .await
    {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => compute_failure("Error al derivar: ", e),
    }
}

/// POST /api/integrate
pub(super) async fn integrate(
    State(state): State<ApiState>,
    Json(req): Json<IntegrateRequest>,
) -> Response {
    match state
        .service
        .integrate(req.expr, req.var, req.lower, req.upper, req.save)
        .await
    {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => compute_failure("Error al integrar: ", e),
    }
}

/// GET /api/history
pub(super) async fn history(
    State(state): State<ApiState>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    match state.store.list_recent(query.limit) {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => {
            warn!("history listing failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, detail(e)).into_response()
        }
    }
}

/// DELETE /api/history/{id}
pub(super) async fn delete_history(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Response {
    match state.store.delete(id) {
        Ok(()) => (StatusCode::OK, Json(json!({ "ok": true }))).into_response(),
        Err(StoreError::NotFound) => {
            (StatusCode::NOT_FOUND, detail("Cálculo no encontrado")).into_response()
        }
        Err(e) => {
            warn!("history delete failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, detail(e)).into_response()
        }
    }
}

/// GET /api/health
pub(super) async fn health() -> Response {
    (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
}
