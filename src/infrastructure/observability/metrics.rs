//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, extract::State, response::IntoResponse, routing::get};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::MetricsConfig;

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("kb_sync_search_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);

            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Record a snapshot push issued by the owner-side controller
pub fn record_sync_push(trigger: PushTrigger) {
    counter!("kb_sync_pushes_total", "trigger" => trigger.as_str()).increment(1);
}

/// Record a snapshot arriving at the replica
pub fn record_sync_received(accepted: bool, entries: usize) {
    let outcome = if accepted { "accepted" } else { "rejected" };
    counter!("kb_sync_received_total", "outcome" => outcome).increment(1);

    if accepted {
        gauge!("kb_replica_knowledge_bases").set(entries as f64);
    }
}

/// Record that the replica dropped its knowledge bases
pub fn record_replica_cleared() {
    gauge!("kb_replica_knowledge_bases").set(0.0);
}

/// Record a finished search request
pub fn record_search(outcome: &str, knowledge_bases: usize, duration: Duration) {
    let labels = [("outcome", outcome.to_string())];

    counter!("kb_search_requests_total", &labels).increment(1);
    histogram!("kb_search_duration_seconds", &labels).record(duration.as_secs_f64());

    if knowledge_bases > 0 {
        histogram!("kb_search_knowledge_bases").record(knowledge_bases as f64);
    }
}

/// Why a snapshot was pushed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushTrigger {
    Start,
    Refresh,
    Mutation,
}

impl PushTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Refresh => "refresh",
            Self::Mutation => "mutation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_trigger_labels() {
        assert_eq!(PushTrigger::Start.as_str(), "start");
        assert_eq!(PushTrigger::Refresh.as_str(), "refresh");
        assert_eq!(PushTrigger::Mutation.as_str(), "mutation");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_sync_push(PushTrigger::Mutation);
        record_sync_received(false, 0);
        record_replica_cleared();
        record_search("ok", 2, Duration::from_millis(12));
        record_http_request("GET", "/v1/knowledge-bases", 503, Duration::from_millis(1));
    }
}
