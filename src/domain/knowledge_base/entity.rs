//! Owner-side knowledge base entity and related types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Connection details for an embedding or rerank service
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientDescriptor {
    /// Provider name (e.g., "openai", "jina")
    pub provider: String,
    /// Model identifier at the provider
    pub model: String,
    /// Base URL of the provider API
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl ClientDescriptor {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            base_url: base_url.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl fmt::Debug for ClientDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientDescriptor")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Document preprocessing provider (OCR, PDF parsing, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub id: String,
    pub name: String,
}

/// Kind of content an item was ingested from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeItemKind {
    File,
    Url,
    Note,
    Directory,
    Sitemap,
}

/// One ingested source inside a knowledge base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub id: String,
    pub kind: KnowledgeItemKind,
    pub source: String,
}

impl KnowledgeItem {
    pub fn new(id: impl Into<String>, kind: KnowledgeItemKind, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            source: source.into(),
        }
    }
}

fn default_version() -> u64 {
    1
}

/// Knowledge base as held by the owner process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Embedding dimensions
    pub dimensions: u32,
    /// Number of results to return per search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_overlap: Option<u32>,
    /// Minimum score a result needs to be returned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default = "default_version")]
    pub version: u64,
    #[serde(default)]
    pub items: Vec<KnowledgeItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprocess_provider: Option<ProviderDescriptor>,
    pub embedding: ClientDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rerank: Option<ClientDescriptor>,
}

impl KnowledgeBase {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        dimensions: u32,
        embedding: ClientDescriptor,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            dimensions,
            document_count: None,
            chunk_size: None,
            chunk_overlap: None,
            threshold: None,
            created_at: now,
            updated_at: now,
            version: default_version(),
            items: Vec::new(),
            preprocess_provider: None,
            embedding,
            rerank: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_document_count(mut self, count: u32) -> Self {
        self.document_count = Some(count);
        self
    }

    pub fn with_chunking(mut self, chunk_size: u32, chunk_overlap: u32) -> Self {
        self.chunk_size = Some(chunk_size);
        self.chunk_overlap = Some(chunk_overlap);
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_rerank(mut self, rerank: ClientDescriptor) -> Self {
        self.rerank = Some(rerank);
        self
    }

    pub fn with_preprocess_provider(mut self, provider: ProviderDescriptor) -> Self {
        self.preprocess_provider = Some(provider);
        self
    }

    pub fn with_items(mut self, items: Vec<KnowledgeItem>) -> Self {
        self.items = items;
        self
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Record a modification: bump the version and refresh the update timestamp
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}
