//! Knowledge base listing and search response types

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{KnowledgeBaseList, KnowledgeBaseMetadata, SearchResponseItem};

/// List knowledge bases response
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeBasesResponse {
    pub object: &'static str,
    pub data: Vec<KnowledgeBaseMetadata>,
    pub total: usize,
    #[serde(rename = "syncedAt", skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
}

impl From<KnowledgeBaseList> for KnowledgeBasesResponse {
    fn from(list: KnowledgeBaseList) -> Self {
        Self {
            object: "list",
            data: list.data,
            total: list.total,
            synced_at: list.synced_at,
        }
    }
}

/// Search response
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub object: &'static str,
    pub data: Vec<SearchResponseItem>,
}

impl SearchResponse {
    pub fn new(items: Vec<SearchResponseItem>) -> Self {
        Self {
            object: "list",
            data: items,
        }
    }
}
