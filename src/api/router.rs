use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use super::admin;
use super::health;
use super::middleware::metrics_middleware;
use super::state::AppState;
use super::v1;

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Listing and search over the replica
        .nest("/v1", v1::create_v1_router())
        // Owner registry and sync session control
        .nest("/admin", admin::create_admin_router())
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::create_app_state_with;
    use crate::domain::knowledge_base::{MockReranker, MockRetriever};
    use crate::domain::{ClientDescriptor, KnowledgeBase, ScoredResult};
    use crate::infrastructure::knowledge_base::KnowledgeBaseRegistry;

    fn base(id: &str) -> KnowledgeBase {
        KnowledgeBase::new(
            id,
            format!("Base {}", id),
            1536,
            ClientDescriptor::new("openai", "text-embedding-3-small", "https://api.openai.com/v1")
                .with_api_key("sk-secret"),
        )
    }

    fn app() -> Router {
        let registry =
            Arc::new(KnowledgeBaseRegistry::with_bases(vec![base("kb-1"), base("kb-2")]).unwrap());
        let retriever = Arc::new(MockRetriever::new().with_results(
            "kb-1",
            vec![
                ScoredResult::new("low", 0.05),
                ScoredResult::new("mid", 0.2),
                ScoredResult::new("high", 0.9),
            ],
        ));

        let state = create_app_state_with(
            registry,
            retriever,
            Arc::new(MockReranker::new()),
            &AppConfig::default(),
        );
        create_router(state)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, json)
    }

    async fn start_and_wait(app: &Router) {
        let (status, _) = send(app, Method::POST, "/admin/sync/start", None).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        for _ in 0..100 {
            let (status, _) = send(app, Method::GET, "/ready", None).await;
            if status == StatusCode::OK {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("replica never became ready");
    }

    #[tokio::test]
    async fn test_health_and_live() {
        let app = app();

        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, _) = send(&app, Method::GET, "/live", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_not_ready_before_sync() {
        let app = app();

        let (status, _) = send(&app, Method::GET, "/ready", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, body) = send(&app, Method::GET, "/v1/knowledge-bases", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "not_ready");
    }

    #[tokio::test]
    async fn test_list_after_sync() {
        let app = app();
        start_and_wait(&app).await;

        let (status, body) = send(&app, Method::GET, "/v1/knowledge-bases", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["object"], "list");
        assert_eq!(body["total"], 2);
        assert_eq!(body["data"][0]["id"], "kb-1");
        assert!(body["syncedAt"].is_string());
        assert!(!body.to_string().contains("sk-secret"));
    }

    #[tokio::test]
    async fn test_search_after_sync() {
        let app = app();
        start_and_wait(&app).await;

        let request = json!({ "query": "pricing", "knowledge_base_ids": ["kb-1"], "threshold": 0.1 });
        let (status, body) =
            send(&app, Method::POST, "/v1/knowledge-bases/search", Some(request)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["object"], "list");
        let results = body["data"][0]["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["content"], "mid");
        assert_eq!(results[1]["content"], "high");
    }

    #[tokio::test]
    async fn test_search_validation_and_not_found() {
        let app = app();
        start_and_wait(&app).await;

        let empty_ids = json!({ "query": "q", "knowledge_base_ids": [] });
        let (status, _) =
            send(&app, Method::POST, "/v1/knowledge-bases/search", Some(empty_ids)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let too_many = json!({ "query": "q", "knowledge_base_ids": ["kb-1"], "top_k": 101 });
        let (status, _) =
            send(&app, Method::POST, "/v1/knowledge-bases/search", Some(too_many)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let missing = json!({ "query": "q", "knowledge_base_ids": ["missing"] });
        let (status, body) =
            send(&app, Method::POST, "/v1/knowledge-bases/search", Some(missing)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "not_found_error");
    }

    #[tokio::test]
    async fn test_search_drops_unmatched_ids() {
        let app = app();
        start_and_wait(&app).await;

        let request = json!({
            "query": "refunds",
            "knowledge_base_ids": ["kb-1", "legacy kb"],
            "threshold": 0.1
        });
        let (status, body) =
            send(&app, Method::POST, "/v1/knowledge-bases/search", Some(request)).await;

        assert_eq!(status, StatusCode::OK);
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["knowledge_base_id"], "kb-1");
        assert_eq!(data[0]["results"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_admin_changes_replicate() {
        let app = app();
        start_and_wait(&app).await;

        let new_base = serde_json::to_value(base("kb-3")).unwrap();
        let (status, body) =
            send(&app, Method::PUT, "/admin/knowledge-bases/kb-3", Some(new_base)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "kb-3");

        for _ in 0..100 {
            let (_, body) = send(&app, Method::GET, "/v1/knowledge-bases", None).await;
            if body["total"] == 3 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("new knowledge base never replicated");
    }

    #[tokio::test]
    async fn test_admin_put_rejects_mismatched_id() {
        let app = app();

        let body = serde_json::to_value(base("kb-3")).unwrap();
        let (status, body) =
            send(&app, Method::PUT, "/admin/knowledge-bases/other", Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["param"], "id");
    }

    #[tokio::test]
    async fn test_admin_items() {
        let app = app();

        let item = json!({ "id": "doc-1", "kind": "url", "source": "https://example.com" });
        let (status, body) =
            send(&app, Method::POST, "/admin/knowledge-bases/kb-1/items", Some(item)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["item_count"], 1);

        let (status, _) =
            send(&app, Method::DELETE, "/admin/knowledge-bases/kb-1/items/doc-1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) =
            send(&app, Method::DELETE, "/admin/knowledge-bases/kb-1/items/doc-1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::DELETE, "/admin/knowledge-bases/ghost", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stop_sync_clears_replica() {
        let app = app();
        start_and_wait(&app).await;

        let (status, body) = send(&app, Method::POST, "/admin/sync/stop", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["replica"]["active"], false);
        assert_eq!(body["replica"]["knowledge_base_count"], 0);

        let (status, _) = send(&app, Method::GET, "/v1/knowledge-bases", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (_, body) = send(&app, Method::GET, "/admin/sync", None).await;
        assert_eq!(body["owner"]["pushes_issued"], 1);
    }
}
