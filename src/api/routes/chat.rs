use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::{error::reject, state::AppState};
use crate::application::{ChatReply, ExportFormat};
use crate::domain::{StoredTurn, UserStats};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub user_id: String,
    pub turns: Vec<StoredTurn>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, StatusCode> {
    state
        .chat
        .send(&request.user_id, &request.message)
        .await
        .map(Json)
        .map_err(|e| reject(e, "chat"))
}

pub async fn get_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, StatusCode> {
    let limit = query
        .limit
        .unwrap_or(state.config.config.store.history_limit);
    let turns = state
        .chat
        .history(&user_id, limit)
        .await
        .map_err(|e| reject(e, "history"))?;

    Ok(Json(HistoryResponse { user_id, turns }))
}

pub async fn clear_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    state
        .chat
        .clear(&user_id)
        .await
        .map_err(|e| reject(e, "clear history"))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserStats>, StatusCode> {
    state
        .chat
        .stats(&user_id)
        .await
        .map(Json)
        .map_err(|e| reject(e, "stats"))
}

pub async fn export_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let format = match query.format.as_deref() {
        Some(raw) => raw
            .parse::<ExportFormat>()
            .map_err(|e| reject(e, "export"))?,
        None => ExportFormat::default(),
    };
    let body = state
        .chat
        .export(&user_id, format)
        .await
        .map_err(|e| reject(e, "export"))?;

    Ok(([(header::CONTENT_TYPE, format.content_type())], body))
}
