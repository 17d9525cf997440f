//! Admin API endpoints for the owner registry and the sync session

pub mod knowledge_bases;
pub mod sync;

use axum::{
    Router,
    routing::{delete, get, post},
};

use super::state::AppState;

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        // Owner-side knowledge bases
        .route(
            "/knowledge-bases",
            get(knowledge_bases::list_knowledge_bases),
        )
        .route(
            "/knowledge-bases/{kb_id}",
            get(knowledge_bases::get_knowledge_base)
                .put(knowledge_bases::put_knowledge_base)
                .delete(knowledge_bases::delete_knowledge_base),
        )
        .route(
            "/knowledge-bases/{kb_id}/items",
            post(knowledge_bases::add_item),
        )
        .route(
            "/knowledge-bases/{kb_id}/items/{item_id}",
            delete(knowledge_bases::remove_item),
        )
        // Sync session
        .route("/sync", get(sync::get_sync_status))
        .route("/sync/start", post(sync::start_sync))
        .route("/sync/stop", post(sync::stop_sync))
}
