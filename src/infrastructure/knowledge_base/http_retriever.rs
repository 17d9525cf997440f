//! Retriever backed by an HTTP retrieval service

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{DomainError, KnowledgeBaseParams, Retriever, ScoredResult};

const PROVIDER: &str = "retrieval";

#[derive(Debug, Deserialize)]
struct RetrievalResponse {
    #[serde(default)]
    results: Vec<RetrievedChunk>,
}

#[derive(Debug, Deserialize)]
struct RetrievedChunk {
    #[serde(alias = "pageContent")]
    content: String,
    score: f32,
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
}

/// Sends the query and the knowledge base's embedding configuration to a
/// retrieval service and returns its scored chunks unchanged
///
/// The embedding descriptor, key included, travels in the request body so the
/// service can embed the query. The `Authorization` header carries only the
/// retrieval service's own key.
#[derive(Clone)]
pub struct HttpRetriever {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for HttpRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRetriever")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl HttpRetriever {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Invalid HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: None,
        })
    }

    /// Authenticate to the retrieval service with a bearer token
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.is_empty());
        self
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn retrieve(
        &self,
        query: &str,
        params: &KnowledgeBaseParams,
    ) -> Result<Vec<ScoredResult>, DomainError> {
        let body = serde_json::json!({
            "knowledge_base_id": params.knowledge_base_id,
            "query": query,
            "dimensions": params.dimensions,
            "embedding": params.embedding,
        });

        let mut request = self.client.post(&self.endpoint).json(&body);

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DomainError::provider(PROVIDER, format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(DomainError::provider(
                PROVIDER,
                format!("HTTP {}: {}", status, error_body),
            ));
        }

        let parsed: RetrievalResponse = response.json().await.map_err(|e| {
            DomainError::provider(PROVIDER, format!("Failed to parse response: {}", e))
        })?;

        debug!(
            knowledge_base_id = %params.knowledge_base_id,
            count = parsed.results.len(),
            "Retrieved chunks"
        );

        Ok(parsed
            .results
            .into_iter()
            .map(|chunk| ScoredResult {
                content: chunk.content,
                score: chunk.score,
                metadata: chunk.metadata,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::domain::{ClientDescriptor, KnowledgeBase, SyncEntry};

    fn params() -> KnowledgeBaseParams {
        let base = KnowledgeBase::new(
            "kb-1",
            "Docs",
            1024,
            ClientDescriptor::new("openai", "text-embedding-3-small", "https://api.openai.com/v1")
                .with_api_key("sk-test"),
        );
        SyncEntry::from_knowledge_base(&base).params
    }

    #[tokio::test]
    async fn test_retrieve_preserves_engine_order() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("authorization", "Bearer svc-key"))
            .and(body_partial_json(serde_json::json!({
                "knowledge_base_id": "kb-1",
                "query": "refund policy"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    { "content": "low", "score": 0.2, "metadata": { "source": "a.md" } },
                    { "pageContent": "high", "score": 0.9 }
                ]
            })))
            .mount(&server)
            .await;

        let retriever =
            HttpRetriever::new(format!("{}/search", server.uri()), Duration::from_secs(5))
                .unwrap()
                .with_api_key(Some("svc-key".to_string()));
        let results = retriever.retrieve("refund policy", &params()).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "low");
        assert_eq!(results[0].metadata.get("source"), Some(&serde_json::json!("a.md")));
        assert_eq!(results[1].content, "high");
    }

    #[tokio::test]
    async fn test_retrieve_maps_http_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("index offline"))
            .mount(&server)
            .await;

        let retriever = HttpRetriever::new(server.uri(), Duration::from_secs(5)).unwrap();
        let error = retriever.retrieve("q", &params()).await.unwrap_err();

        assert!(matches!(error, DomainError::Provider { .. }));
        assert!(error.to_string().contains("index offline"));
    }

    #[tokio::test]
    async fn test_embedding_key_only_travels_in_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "embedding": { "provider": "openai", "api_key": "sk-test" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "results": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let retriever = HttpRetriever::new(server.uri(), Duration::from_secs(5))
            .unwrap()
            .with_api_key(None);
        retriever.retrieve("q", &params()).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("authorization").is_none());
        assert!(!format!("{:?}", retriever).contains("sk-test"));
    }
}
