//! Retrieval and rerank collaborator traits

use std::fmt::Debug;

use async_trait::async_trait;

use super::metadata::KnowledgeBaseParams;
use super::search::ScoredResult;
use crate::domain::error::DomainError;

/// Vector retrieval over one knowledge base
///
/// Results come back in the engine's order; callers must not assume they are
/// sorted by score.
#[async_trait]
pub trait Retriever: Send + Sync + Debug {
    async fn retrieve(
        &self,
        query: &str,
        params: &KnowledgeBaseParams,
    ) -> Result<Vec<ScoredResult>, DomainError>;
}

/// Secondary scoring pass over already-retrieved results
///
/// May reorder, rescore, or drop results.
#[async_trait]
pub trait Reranker: Send + Sync + Debug {
    async fn rerank(
        &self,
        query: &str,
        params: &KnowledgeBaseParams,
        results: Vec<ScoredResult>,
    ) -> Result<Vec<ScoredResult>, DomainError>;
}
