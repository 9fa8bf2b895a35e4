use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::api::{error::reject, state::AppState};
use crate::domain::{DomainError, Locator};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub k: Option<usize>,
    pub subject: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub source: String,
    pub locator: Locator,
    pub content: String,
    pub distance: f32,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

/// Raw retrieval against the index, without the tutor.
pub async fn search_handler(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, StatusCode> {
    if request.query.trim().is_empty() {
        return Err(reject(
            DomainError::validation("query must not be empty"),
            "search",
        ));
    }
    let retriever = state.retriever();
    let k = request.k.unwrap_or(retriever.default_top_k());

    let results = retriever
        .retrieve_with_scores(&request.query, k)
        .await
        .map_err(|e| reject(e, "search"))?;

    let subject = request.subject.as_deref();
    let results = results
        .into_iter()
        .filter(|r| subject.map_or(true, |s| r.chunk.matches_subject(s)))
        .map(|r| SearchHit {
            source: r.chunk.source_name().to_string(),
            locator: r.chunk.locator,
            content: r.chunk.text,
            distance: r.distance,
        })
        .collect();

    Ok(Json(SearchResponse { results }))
}
