//! Knowledge base infrastructure: owner registry and HTTP collaborators

mod http_reranker;
mod http_retriever;
mod registry;

pub use http_reranker::{HttpReranker, RELEVANCE_SCORE_KEY};
pub use http_retriever::HttpRetriever;
pub use registry::{KnowledgeBaseRegistry, RegistryListener, Subscription};
