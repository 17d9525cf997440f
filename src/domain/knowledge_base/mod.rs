//! Knowledge Base domain - replicated metadata and search

mod entity;
mod metadata;
mod provider;
mod search;
mod validation;

pub use entity::{
    ClientDescriptor, KnowledgeBase, KnowledgeItem, KnowledgeItemKind, ProviderDescriptor,
};
pub use metadata::{KnowledgeBaseMetadata, KnowledgeBaseParams, ModelDescriptor, SyncEntry};
pub use provider::{Reranker, Retriever};
pub use search::{
    DEFAULT_THRESHOLD, DEFAULT_TOP_K, KnowledgeBaseList, MAX_TOP_K, ScoredResult, SearchDefaults,
    SearchRequest, SearchResponseItem,
};
pub use validation::{
    KnowledgeBaseValidationError, MAX_QUERY_LENGTH, validate_knowledge_base_id,
};

#[cfg(test)]
pub use provider::mock::{MockReranker, MockRetriever};
