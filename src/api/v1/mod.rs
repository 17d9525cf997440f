//! Public v1 API endpoints

pub mod knowledge_bases;

use axum::{
    Router,
    routing::{get, post},
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/knowledge-bases", get(knowledge_bases::list_knowledge_bases))
        .route(
            "/knowledge-bases/search",
            post(knowledge_bases::search_knowledge_bases),
        )
}
