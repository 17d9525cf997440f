//! Knowledge base sync and search
//!
//! Replicates knowledge base metadata from an owner-side registry into a
//! search-side replica and answers listing and search requests against it:
//! - Owner registry with change notification
//! - Fingerprint-gated snapshot pushes over an ordered message channel
//! - Threshold, rerank and limit pipeline per knowledge base

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use domain::{Reranker, Retriever};
use infrastructure::{
    knowledge_base::{HttpReranker, HttpRetriever, KnowledgeBaseRegistry},
    services::KnowledgeBaseSearchService,
    sync::{
        LocalChannel, StoreReplica, SyncSessionController, spawn_owner_endpoint,
        spawn_replica_endpoint,
    },
};

/// Create the application state with HTTP retrieval and rerank collaborators
///
/// Must be called inside a tokio runtime.
pub fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let registry = Arc::new(KnowledgeBaseRegistry::with_bases(
        config.knowledge_bases.clone(),
    )?);

    let timeout = Duration::from_millis(config.retrieval.timeout_ms);
    let retriever = Arc::new(
        HttpRetriever::new(config.retrieval.endpoint.clone(), timeout)?
            .with_api_key(config.retrieval.api_key.clone()),
    );
    let reranker = Arc::new(HttpReranker::new(timeout)?);

    tracing::info!(
        knowledge_bases = config.knowledge_bases.len(),
        retrieval_endpoint = %config.retrieval.endpoint,
        "Owner registry seeded"
    );

    Ok(create_app_state_with(registry, retriever, reranker, config))
}

/// Wire both ends of the sync session around the given collaborators
///
/// Spawns the channel endpoint tasks, so it must be called inside a tokio runtime.
pub fn create_app_state_with(
    registry: Arc<KnowledgeBaseRegistry>,
    retriever: Arc<dyn Retriever>,
    reranker: Arc<dyn Reranker>,
    config: &AppConfig,
) -> AppState {
    let channel = LocalChannel::new(config.sync.channel_buffer);

    let controller = SyncSessionController::new(
        Arc::clone(&registry),
        channel.replica_peer.clone(),
        config.sync.allow_list(),
    );
    let replica = Arc::new(StoreReplica::new(channel.owner_peer.clone()));

    spawn_owner_endpoint(channel.owner_inbox, controller.clone());
    spawn_replica_endpoint(channel.replica_inbox, Arc::clone(&replica));

    let search_service = Arc::new(KnowledgeBaseSearchService::new(
        Arc::clone(&replica),
        retriever,
        reranker,
        config.search.defaults(),
    ));

    AppState {
        search_service,
        replica,
        registry,
        controller,
    }
}
