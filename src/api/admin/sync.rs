//! Sync session admin endpoints

use axum::{extract::State, http::StatusCode};
use serde::Serialize;
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::infrastructure::sync::SyncStatus;

/// Owner-side session summary
#[derive(Debug, Clone, Serialize)]
pub struct OwnerSyncStatus {
    pub active: bool,
    pub pushes_issued: u64,
}

/// Both ends of the session
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatusResponse {
    pub replica: SyncStatus,
    pub owner: OwnerSyncStatus,
}

impl SyncStatusResponse {
    fn from_state(state: &AppState) -> Self {
        Self {
            replica: state.replica.status(),
            owner: OwnerSyncStatus {
                active: state.controller.is_active(),
                pushes_issued: state.controller.pushes_issued(),
            },
        }
    }
}

/// GET /admin/sync
pub async fn get_sync_status(State(state): State<AppState>) -> Json<SyncStatusResponse> {
    Json(SyncStatusResponse::from_state(&state))
}

/// POST /admin/sync/start
///
/// Snapshots arrive asynchronously; poll `GET /admin/sync` for progress.
pub async fn start_sync(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SyncStatusResponse>), ApiError> {
    info!("Sync session start requested");
    state.replica.start_session().await?;

    Ok((StatusCode::ACCEPTED, Json(SyncStatusResponse::from_state(&state))))
}

/// POST /admin/sync/stop
pub async fn stop_sync(
    State(state): State<AppState>,
) -> Result<Json<SyncStatusResponse>, ApiError> {
    info!("Sync session stop requested");
    state.replica.stop_session().await?;

    Ok(Json(SyncStatusResponse::from_state(&state)))
}
