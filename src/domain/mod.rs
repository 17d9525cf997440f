//! Domain layer - knowledge base types, sync protocol, and collaborator traits

pub mod error;
pub mod knowledge_base;
pub mod sync;

pub use error::{DomainError, SearchStage};
pub use knowledge_base::{
    ClientDescriptor, KnowledgeBase, KnowledgeBaseList, KnowledgeBaseMetadata,
    KnowledgeBaseParams, KnowledgeItem, KnowledgeItemKind, Reranker, Retriever, ScoredResult,
    SearchDefaults, SearchRequest, SearchResponseItem, SyncEntry,
};
pub use sync::{AllowList, OwnerPeer, ReplicaPeer, Snapshot, SyncAck, SyncMessage};
