use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::api::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub store: String,
    pub index_chunks: usize,
    pub embedding_model: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Ready when the message store answers and the index holds chunks.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, StatusCode> {
    let store_status = match state.store().ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "message store ping failed");
            "disconnected"
        }
    };

    let index = state.retriever().index();
    let is_ready = store_status == "connected" && !index.is_empty();

    let response = ReadinessResponse {
        status: if is_ready { "ready" } else { "not_ready" }.into(),
        store: store_status.into(),
        index_chunks: index.len(),
        embedding_model: index.manifest().embedding_model.clone(),
    };

    if is_ready {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
