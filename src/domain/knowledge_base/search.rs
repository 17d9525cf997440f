//! Search request and response types

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::metadata::KnowledgeBaseMetadata;
use super::validation::{
    KnowledgeBaseValidationError, validate_knowledge_base_ids, validate_query_text,
    validate_threshold, validate_top_k,
};

/// Hard ceiling on the number of results per knowledge base
pub const MAX_TOP_K: u32 = 100;

/// Result count used when neither the request nor the base configures one
pub const DEFAULT_TOP_K: u32 = 6;

/// Threshold used when neither the request nor the base configures one
pub const DEFAULT_THRESHOLD: f32 = 0.0;

/// A single scored result from retrieval or rerank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub content: String,
    /// Relevance score, higher is more relevant
    pub score: f32,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ScoredResult {
    pub fn new(content: impl Into<String>, score: f32) -> Self {
        Self {
            content: content.into(),
            score,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Search across one or more knowledge bases
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub knowledge_base_ids: Vec<String>,
    /// Rewritten query, used in place of `query` when non-blank
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

impl SearchRequest {
    pub fn new<I, S>(query: impl Into<String>, knowledge_base_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            query: query.into(),
            knowledge_base_ids: knowledge_base_ids.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_rewrite(mut self, rewrite: impl Into<String>) -> Self {
        self.rewrite = Some(rewrite.into());
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// The text actually sent to retrieval and rerank
    pub fn effective_query(&self) -> &str {
        match self.rewrite.as_deref() {
            Some(rewrite) if !rewrite.trim().is_empty() => rewrite,
            _ => &self.query,
        }
    }

    /// Check the request against the public bounds
    pub fn validate(&self) -> Result<(), KnowledgeBaseValidationError> {
        validate_query_text("query", &self.query)?;

        if let Some(rewrite) = &self.rewrite {
            validate_query_text("rewrite", rewrite)?;
        }

        validate_knowledge_base_ids(&self.knowledge_base_ids)?;

        if let Some(threshold) = self.threshold {
            validate_threshold(threshold)?;
        }

        if let Some(top_k) = self.top_k {
            validate_top_k(top_k, MAX_TOP_K)?;
        }

        Ok(())
    }
}

/// Results for one knowledge base, in request order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponseItem {
    pub knowledge_base_id: String,
    pub name: String,
    pub results: Vec<ScoredResult>,
}

/// Fallbacks applied when a request and a base both leave a setting open
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchDefaults {
    pub default_top_k: u32,
    pub default_threshold: f32,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            default_top_k: DEFAULT_TOP_K,
            default_threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl SearchDefaults {
    /// Request override (capped at [`MAX_TOP_K`]), then the base's document
    /// count, then the default
    pub fn effective_limit(&self, requested: Option<u32>, configured: Option<u32>) -> usize {
        let limit = requested
            .map(|top_k| top_k.min(MAX_TOP_K))
            .or(configured.filter(|count| *count > 0))
            .unwrap_or(self.default_top_k);

        limit as usize
    }

    /// Request override, then the base's threshold, then the default
    pub fn effective_threshold(&self, requested: Option<f32>, configured: Option<f32>) -> f32 {
        requested.or(configured).unwrap_or(self.default_threshold)
    }
}

/// Listing of replicated knowledge bases
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeBaseList {
    pub data: Vec<KnowledgeBaseMetadata>,
    pub total: usize,
    pub synced_at: Option<DateTime<Utc>>,
}
