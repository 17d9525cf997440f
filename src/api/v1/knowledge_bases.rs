//! Knowledge base listing and search handlers

use axum::extract::State;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, KnowledgeBasesResponse, SearchResponse};
use crate::domain::SearchRequest;

/// GET /v1/knowledge-bases
pub async fn list_knowledge_bases(
    State(state): State<AppState>,
) -> Result<Json<KnowledgeBasesResponse>, ApiError> {
    debug!("Listing replicated knowledge bases");

    let list = state.search_service.list_bases()?;

    Ok(Json(KnowledgeBasesResponse::from(list)))
}

/// POST /v1/knowledge-bases/search
pub async fn search_knowledge_bases(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    debug!(
        knowledge_base_ids = ?request.knowledge_base_ids,
        top_k = ?request.top_k,
        "Searching knowledge bases"
    );

    let items = state.search_service.search(&request).await?;

    Ok(Json(SearchResponse::new(items)))
}
