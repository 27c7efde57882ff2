use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};

use crate::models::Person;
use crate::render::roster_order;
use crate::store::StoreStats;

use super::AppState;

const GRAPH_CONTENT_TYPE: &str = "text/vnd.graphviz; charset=utf-8";

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

// ============================================================
// Page
// ============================================================

pub async fn index(
    State(state): State<AppState>,
) -> Result<Html<String>, (StatusCode, String)> {
    state
        .page
        .render(&state.store.snapshot(), None)
        .map(Html)
        .map_err(internal_error)
}

/// Force a reload, then render the page. A failed reload still renders the
/// previous data, with a notice and a 502 status.
pub async fn reload_page(
    State(state): State<AppState>,
) -> Result<(StatusCode, Html<String>), (StatusCode, String)> {
    let (status, notice) = match state.store.reload(true).await {
        Ok(()) => (StatusCode::OK, None),
        Err(e) => {
            tracing::warn!("Forced reload failed, serving previous data: {}", e);
            (StatusCode::BAD_GATEWAY, Some(format!("Reload failed: {}", e)))
        }
    };

    let html = state
        .page
        .render(&state.store.snapshot(), notice.as_deref())
        .map_err(internal_error)?;
    Ok((status, Html(html)))
}

// ============================================================
// JSON / text API
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn graph(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, GRAPH_CONTENT_TYPE)],
        state.store.graph_document(),
    )
}

/// All persons in roster order.
pub async fn list_persons(State(state): State<AppState>) -> Json<Vec<Person>> {
    let snapshot = state.store.snapshot();
    Json(
        roster_order(snapshot.persons())
            .into_iter()
            .cloned()
            .collect(),
    )
}

pub async fn stats(State(state): State<AppState>) -> Json<StoreStats> {
    Json(state.store.snapshot().stats())
}

pub async fn reload(
    State(state): State<AppState>,
) -> Result<Json<StoreStats>, (StatusCode, String)> {
    match state.store.reload(true).await {
        Ok(()) => Ok(Json(state.store.snapshot().stats())),
        Err(e) => {
            tracing::warn!("Forced reload failed: {}", e);
            Err((StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}
