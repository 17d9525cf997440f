//! Health check endpoints for Kubernetes probes

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::api::types::Json;

use super::state::AppState;

/// Detailed health response with component status
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
}

/// Health check status
#[derive(Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Individual component health check
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthCheck {
    fn new(name: &str, healthy: bool, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: if healthy {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            },
            message: (!healthy).then(|| message.to_string()),
        }
    }
}

/// Simple health check - returns 200 if the service is running
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check: search is only served once the replica holds bases
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.replica.status();

    let checks = vec![
        HealthCheck::new("sync_session", status.active, "No active sync session"),
        HealthCheck::new(
            "replica",
            status.knowledge_base_count > 0,
            "No knowledge bases replicated yet",
        ),
    ];

    let ready = checks.iter().all(|c| c.status == HealthStatus::Healthy);
    let response = HealthResponse {
        status: if ready {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
    };

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

/// Liveness check - simple check to verify the service is running
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Unhealthy).unwrap(),
            "\"unhealthy\""
        );
    }

    #[test]
    fn test_failed_check_carries_message() {
        let check = HealthCheck::new("replica", false, "No knowledge bases replicated yet");
        let json = serde_json::to_string(&check).unwrap();

        assert!(json.contains("\"unhealthy\""));
        assert!(json.contains("No knowledge bases replicated yet"));
        assert!(HealthCheck::new("replica", true, "unused").message.is_none());
    }
}
