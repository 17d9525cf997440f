//! Observability infrastructure - Prometheus metrics

mod metrics;

pub use metrics::{
    PrometheusMetrics, PushTrigger, create_metrics_router, init_metrics, record_http_request,
    record_replica_cleared, record_search, record_sync_push, record_sync_received,
};
