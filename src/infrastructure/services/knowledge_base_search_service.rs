//! Knowledge base search service - queries the replicated knowledge bases

use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join_all;
use tracing::{debug, error};

use crate::domain::{
    DomainError, KnowledgeBaseList, Reranker, Retriever, ScoredResult, SearchDefaults,
    SearchRequest, SearchResponseItem, SearchStage, SyncEntry,
};
use crate::infrastructure::observability::record_search;
use crate::infrastructure::sync::{ReplicaSnapshot, StoreReplica};

/// Resolves requested bases against the replica and runs retrieval and rerank per base
pub struct KnowledgeBaseSearchService {
    replica: Arc<StoreReplica>,
    retriever: Arc<dyn Retriever>,
    reranker: Arc<dyn Reranker>,
    defaults: SearchDefaults,
}

impl std::fmt::Debug for KnowledgeBaseSearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBaseSearchService")
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl KnowledgeBaseSearchService {
    pub fn new(
        replica: Arc<StoreReplica>,
        retriever: Arc<dyn Retriever>,
        reranker: Arc<dyn Reranker>,
        defaults: SearchDefaults,
    ) -> Self {
        Self {
            replica,
            retriever,
            reranker,
            defaults,
        }
    }

    /// List the metadata of every replicated knowledge base
    pub fn list_bases(&self) -> Result<KnowledgeBaseList, DomainError> {
        let snapshot = self.ready_snapshot()?;
        let data = snapshot.metadata();

        Ok(KnowledgeBaseList {
            total: data.len(),
            data,
            synced_at: snapshot.synced_at(),
        })
    }

    /// Search the requested knowledge bases
    ///
    /// Items follow the request's id order. Any failing base fails the whole search.
    pub async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<SearchResponseItem>, DomainError> {
        let started = Instant::now();
        let result = self.run(request).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(DomainError::NotReady { .. }) => "not_ready",
            Err(DomainError::NotFound { .. }) => "not_found",
            Err(DomainError::Upstream { .. }) => "upstream_error",
            Err(_) => "error",
        };
        let searched = result.as_ref().map(Vec::len).unwrap_or(0);
        record_search(outcome, searched, started.elapsed());

        result
    }

    async fn run(&self, request: &SearchRequest) -> Result<Vec<SearchResponseItem>, DomainError> {
        let snapshot = self.ready_snapshot()?;

        let resolved: Vec<&SyncEntry> = request
            .knowledge_base_ids
            .iter()
            .filter_map(|id| snapshot.get(id))
            .collect();

        if resolved.is_empty() {
            return Err(DomainError::not_found(format!(
                "No matching knowledge bases for [{}]",
                request.knowledge_base_ids.join(", ")
            )));
        }

        let query = request.effective_query();
        debug!(
            knowledge_bases = resolved.len(),
            rewritten = query != request.query,
            "Searching knowledge bases"
        );

        try_join_all(
            resolved
                .into_iter()
                .map(|entry| self.search_base(query, request, entry)),
        )
        .await
    }

    async fn search_base(
        &self,
        query: &str,
        request: &SearchRequest,
        entry: &SyncEntry,
    ) -> Result<SearchResponseItem, DomainError> {
        let metadata = &entry.metadata;
        let params = &entry.params;

        let limit = self
            .defaults
            .effective_limit(request.top_k, metadata.document_count);
        let threshold = self
            .defaults
            .effective_threshold(request.threshold, metadata.threshold);

        let retrieved = self
            .retriever
            .retrieve(query, params)
            .await
            .map_err(|e| upstream_failure(&metadata.id, SearchStage::Retrieval, e))?;

        let mut results: Vec<ScoredResult> = retrieved
            .into_iter()
            .filter(|result| result.score >= threshold)
            .collect();

        if !results.is_empty() && params.has_reranker() {
            results = self
                .reranker
                .rerank(query, params, results)
                .await
                .map_err(|e| upstream_failure(&metadata.id, SearchStage::Rerank, e))?;
        }

        results.truncate(limit);

        Ok(SearchResponseItem {
            knowledge_base_id: metadata.id.clone(),
            name: metadata.name.clone(),
            results,
        })
    }

    fn ready_snapshot(&self) -> Result<Arc<ReplicaSnapshot>, DomainError> {
        self.replica
            .active_snapshot()
            .filter(|snapshot| !snapshot.is_empty())
            .ok_or_else(|| {
                DomainError::not_ready("Knowledge bases are not synced yet, try again later")
            })
    }
}

fn upstream_failure(knowledge_base_id: &str, stage: SearchStage, cause: DomainError) -> DomainError {
    error!(
        knowledge_base_id = %knowledge_base_id,
        stage = %stage,
        error = %cause,
        "Knowledge base search failed"
    );
    DomainError::upstream(knowledge_base_id, stage, cause.to_string())
}
