//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::knowledge_base::KnowledgeBaseRegistry;
use crate::infrastructure::services::KnowledgeBaseSearchService;
use crate::infrastructure::sync::{StoreReplica, SyncSessionController};

/// Handles shared by every request handler
///
/// Both ends of the sync session live in this process: the owner side
/// (`registry`, `controller`) and the server side (`replica`, `search_service`).
#[derive(Clone)]
pub struct AppState {
    pub search_service: Arc<KnowledgeBaseSearchService>,
    pub replica: Arc<StoreReplica>,
    pub registry: Arc<KnowledgeBaseRegistry>,
    pub controller: SyncSessionController,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("replica", &self.replica.status())
            .field("controller_active", &self.controller.is_active())
            .finish()
    }
}
