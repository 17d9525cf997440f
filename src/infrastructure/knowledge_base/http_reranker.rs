//! Reranker speaking the common `/rerank` HTTP API (Jina, Cohere, Voyage, ...)
//!
//! Results keep their retrieval score; the relevance score is recorded in
//! their metadata under [`RELEVANCE_SCORE_KEY`].

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::domain::{DomainError, KnowledgeBaseParams, Reranker, ScoredResult};

const PROVIDER: &str = "rerank";

pub const RELEVANCE_SCORE_KEY: &str = "relevance_score";

/// Reranks results through the rerank client configured on each knowledge base
#[derive(Debug, Clone)]
pub struct HttpReranker {
    client: reqwest::Client,
}

impl HttpReranker {
    pub fn new(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Invalid HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Reranker for HttpReranker {
    async fn rerank(
        &self,
        query: &str,
        params: &KnowledgeBaseParams,
        results: Vec<ScoredResult>,
    ) -> Result<Vec<ScoredResult>, DomainError> {
        let rerank = params.rerank.as_ref().ok_or_else(|| {
            DomainError::configuration(format!(
                "Knowledge base '{}' has no rerank client",
                params.knowledge_base_id
            ))
        })?;

        let url = format!("{}/rerank", rerank.base_url.trim_end_matches('/'));
        let documents: Vec<&str> = results.iter().map(|r| r.content.as_str()).collect();
        let body = serde_json::json!({
            "model": rerank.model,
            "query": query,
            "documents": documents,
            "top_n": documents.len(),
        });

        let mut request = self.client.post(url).json(&body);

        if let Some(api_key) = &rerank.api_key {
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

        let json: Value = response.json().await.map_err(|e| {
            DomainError::provider(PROVIDER, format!("Failed to parse response: {}", e))
        })?;

        let ranking = parse_rerank_response(&json, results.len())?;
        debug!(
            knowledge_base_id = %params.knowledge_base_id,
            input = results.len(),
            output = ranking.len(),
            "Reranked results"
        );

        Ok(apply_ranking(results, ranking))
    }
}

/// Extract `(index, relevance)` pairs, sorted by relevance descending
fn parse_rerank_response(json: &Value, doc_count: usize) -> Result<Vec<(usize, f32)>, DomainError> {
    let items = json
        .get("results")
        .or_else(|| json.get("data"))
        .and_then(Value::as_array)
        .ok_or_else(|| DomainError::provider(PROVIDER, "Rerank response is missing results"))?;

    let mut ranking = Vec::with_capacity(items.len());

    for item in items {
        let index = item
            .get("index")
            .and_then(Value::as_u64)
            .ok_or_else(|| DomainError::provider(PROVIDER, "Rerank result missing index"))?
            as usize;
        let score = item
            .get("relevance_score")
            .or_else(|| item.get("score"))
            .and_then(Value::as_f64)
            .ok_or_else(|| DomainError::provider(PROVIDER, "Rerank result missing score"))?
            as f32;

        if index < doc_count {
            ranking.push((index, score));
        }
    }

    ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(ranking)
}

fn apply_ranking(results: Vec<ScoredResult>, ranking: Vec<(usize, f32)>) -> Vec<ScoredResult> {
    let mut slots: Vec<Option<ScoredResult>> = results.into_iter().map(Some).collect();

    ranking
        .into_iter()
        .filter_map(|(index, score)| {
            slots[index].take().map(|result| {
                result.with_metadata(RELEVANCE_SCORE_KEY, Value::from(f64::from(score)))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::domain::{ClientDescriptor, KnowledgeBase, SyncEntry};

    fn params(rerank_base_url: Option<String>) -> KnowledgeBaseParams {
        let mut base = KnowledgeBase::new(
            "kb-1",
            "Docs",
            1024,
            ClientDescriptor::new("openai", "text-embedding-3-small", "https://api.openai.com/v1"),
        );
        if let Some(url) = rerank_base_url {
            base = base.with_rerank(ClientDescriptor::new("jina", "jina-reranker-v2", url));
        }
        SyncEntry::from_knowledge_base(&base).params
    }

    #[test]
    fn test_parse_sorts_by_relevance() {
        let json = serde_json::json!({
            "results": [
                { "index": 1, "relevance_score": 0.2 },
                { "index": 0, "relevance_score": 0.9 },
                { "index": 7, "relevance_score": 0.99 }
            ]
        });

        let ranking = parse_rerank_response(&json, 2).unwrap();
        assert_eq!(ranking, vec![(0, 0.9), (1, 0.2)]);
    }

    #[test]
    fn test_parse_requires_results() {
        let json = serde_json::json!({ "usage": {} });
        assert!(parse_rerank_response(&json, 1).is_err());
    }

    #[test]
    fn test_apply_ranking_drops_unranked() {
        let results = vec![
            ScoredResult::new("a", 0.5),
            ScoredResult::new("b", 0.6),
            ScoredResult::new("c", 0.7),
        ];

        let reranked = apply_ranking(results, vec![(2, 0.95), (0, 0.4)]);

        assert_eq!(reranked.len(), 2);
        assert_eq!(reranked[0].content, "c");
        assert_eq!(reranked[0].score, 0.7);
        assert_eq!(
            reranked[0].metadata.get(RELEVANCE_SCORE_KEY),
            Some(&Value::from(f64::from(0.95_f32)))
        );
        assert_eq!(reranked[1].content, "a");
    }

    #[tokio::test]
    async fn test_rerank_over_http() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/rerank"))
            .and(body_partial_json(serde_json::json!({
                "model": "jina-reranker-v2",
                "query": "q",
                "documents": ["first", "second"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    { "index": 1, "relevance_score": 0.8 },
                    { "index": 0, "relevance_score": 0.3 }
                ]
            })))
            .mount(&server)
            .await;

        let reranker = HttpReranker::new(Duration::from_secs(5)).unwrap();
        let results = vec![ScoredResult::new("first", 0.5), ScoredResult::new("second", 0.4)];

        let reranked = reranker
            .rerank("q", &params(Some(format!("{}/v1/", server.uri()))), results)
            .await
            .unwrap();

        assert_eq!(reranked[0].content, "second");
        assert_eq!(reranked[1].content, "first");
    }

    #[tokio::test]
    async fn test_rerank_without_client_is_configuration_error() {
        let reranker = HttpReranker::new(Duration::from_secs(5)).unwrap();
        let error = reranker
            .rerank("q", &params(None), vec![ScoredResult::new("a", 0.5)])
            .await
            .unwrap_err();

        assert!(matches!(error, DomainError::Configuration { .. }));
    }
}
