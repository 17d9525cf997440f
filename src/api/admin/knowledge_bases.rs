//! Owner-side knowledge base management endpoints
//!
//! Every change here goes through the registry, so an active sync session
//! replicates it to the search side.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, KnowledgeBasesResponse};
use crate::domain::{KnowledgeBase, KnowledgeBaseList, KnowledgeBaseMetadata, KnowledgeItem};

/// GET /admin/knowledge-bases
pub async fn list_knowledge_bases(State(state): State<AppState>) -> Json<KnowledgeBasesResponse> {
    let data: Vec<KnowledgeBaseMetadata> = state
        .registry
        .list()
        .iter()
        .map(KnowledgeBaseMetadata::from)
        .collect();

    Json(KnowledgeBasesResponse::from(KnowledgeBaseList {
        total: data.len(),
        data,
        synced_at: None,
    }))
}

/// GET /admin/knowledge-bases/{kb_id}
pub async fn get_knowledge_base(
    State(state): State<AppState>,
    Path(kb_id): Path<String>,
) -> Result<Json<KnowledgeBaseMetadata>, ApiError> {
    let base = state
        .registry
        .get(&kb_id)
        .ok_or_else(|| ApiError::not_found(format!("Knowledge base '{}' not found", kb_id)))?;

    Ok(Json(KnowledgeBaseMetadata::from(&base)))
}

/// PUT /admin/knowledge-bases/{kb_id}
pub async fn put_knowledge_base(
    State(state): State<AppState>,
    Path(kb_id): Path<String>,
    Json(base): Json<KnowledgeBase>,
) -> Result<Json<KnowledgeBaseMetadata>, ApiError> {
    if base.id != kb_id {
        return Err(ApiError::bad_request(format!(
            "Body id '{}' does not match path id '{}'",
            base.id, kb_id
        ))
        .with_param("id"));
    }

    debug!(kb_id = %kb_id, "Upserting knowledge base");
    let stored = state.registry.upsert(base)?;

    Ok(Json(KnowledgeBaseMetadata::from(&stored)))
}

/// DELETE /admin/knowledge-bases/{kb_id}
pub async fn delete_knowledge_base(
    State(state): State<AppState>,
    Path(kb_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state.registry.remove(&kb_id) {
        return Err(ApiError::not_found(format!("Knowledge base '{}' not found", kb_id)));
    }

    debug!(kb_id = %kb_id, "Deleted knowledge base");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/knowledge-bases/{kb_id}/items
pub async fn add_item(
    State(state): State<AppState>,
    Path(kb_id): Path<String>,
    Json(item): Json<KnowledgeItem>,
) -> Result<(StatusCode, Json<KnowledgeBaseMetadata>), ApiError> {
    let updated = state.registry.add_item(&kb_id, item)?;

    Ok((StatusCode::CREATED, Json(KnowledgeBaseMetadata::from(&updated))))
}

/// DELETE /admin/knowledge-bases/{kb_id}/items/{item_id}
pub async fn remove_item(
    State(state): State<AppState>,
    Path((kb_id, item_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    if !state.registry.remove_item(&kb_id, &item_id)? {
        return Err(ApiError::not_found(format!(
            "Item '{}' not found in knowledge base '{}'",
            item_id, kb_id
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
