//! Replicated knowledge base types
//!
//! A [`SyncEntry`] is the unit of replication between the owner process and
//! the search server. It splits a [`KnowledgeBase`] into the metadata that can
//! be listed to clients and the connection parameters needed to query it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{ClientDescriptor, KnowledgeBase, ProviderDescriptor};

/// Model reference without connection secrets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub provider: String,
}

impl From<&ClientDescriptor> for ModelDescriptor {
    fn from(client: &ClientDescriptor) -> Self {
        Self {
            id: client.model.clone(),
            provider: client.provider.clone(),
        }
    }
}

/// Listable snapshot of a knowledge base at sync time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseMetadata {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub dimensions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_overlap: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
    pub item_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprocess_provider: Option<ProviderDescriptor>,
    pub embedding_model: ModelDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rerank_model: Option<ModelDescriptor>,
}

impl From<&KnowledgeBase> for KnowledgeBaseMetadata {
    fn from(base: &KnowledgeBase) -> Self {
        Self {
            id: base.id.clone(),
            name: base.name.clone(),
            description: base.description.clone(),
            dimensions: base.dimensions,
            document_count: base.document_count,
            chunk_size: base.chunk_size,
            chunk_overlap: base.chunk_overlap,
            threshold: base.threshold,
            created_at: base.created_at,
            updated_at: base.updated_at,
            version: base.version,
            item_count: base.item_count(),
            preprocess_provider: base.preprocess_provider.clone(),
            embedding_model: ModelDescriptor::from(&base.embedding),
            rerank_model: base.rerank.as_ref().map(ModelDescriptor::from),
        }
    }
}

/// Parameters needed to run retrieval (and optionally rerank) against one base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseParams {
    pub knowledge_base_id: String,
    pub dimensions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_overlap: Option<u32>,
    pub embedding: ClientDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rerank: Option<ClientDescriptor>,
}

impl KnowledgeBaseParams {
    pub fn has_reranker(&self) -> bool {
        self.rerank.is_some()
    }
}

impl From<&KnowledgeBase> for KnowledgeBaseParams {
    fn from(base: &KnowledgeBase) -> Self {
        Self {
            knowledge_base_id: base.id.clone(),
            dimensions: base.dimensions,
            chunk_size: base.chunk_size,
            chunk_overlap: base.chunk_overlap,
            embedding: base.embedding.clone(),
            rerank: base.rerank.clone(),
        }
    }
}

/// Metadata and query parameters for one knowledge base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEntry {
    pub metadata: KnowledgeBaseMetadata,
    pub params: KnowledgeBaseParams,
}

impl SyncEntry {
    pub fn from_knowledge_base(base: &KnowledgeBase) -> Self {
        Self {
            metadata: KnowledgeBaseMetadata::from(base),
            params: KnowledgeBaseParams::from(base),
        }
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }
}
