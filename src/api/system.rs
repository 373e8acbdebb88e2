//! System endpoints: health/status and the manual expiry sweep.

use axum::{Json, extract::State};
use std::sync::Arc;
use tracing::info;

use super::{ApiError, ApiResponse, AppState, SystemStatus};
use crate::services::SweepReport;

/// Returns database reachability and the platforms that can be searched.
///
/// # Endpoint
/// `GET /api/system/status`
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SystemStatus>>, ApiError> {
    let database = state.store().ping().await.is_ok();

    let status = SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        database,
        configured_platforms: state.dispatcher().providers().configured_platforms(),
        cache_ttl_hours: state.config().cache.ttl_hours,
    };

    Ok(Json(ApiResponse::success(status)))
}

/// Deletes expired cache rows and watermarks right away.
///
/// # Endpoint
/// `POST /api/system/sweep`
pub async fn trigger_sweep(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SweepReport>>, ApiError> {
    let report = state
        .coordinator()
        .sweep_expired(state.config().cache.ttl())
        .await?;

    info!(
        cache_deleted = report.cache_deleted,
        viewed_deleted = report.viewed_deleted,
        "Manual sweep finished"
    );

    Ok(Json(ApiResponse::success(report)))
}
