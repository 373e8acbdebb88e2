use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::user::CurrentUser;
use super::{ApiError, ApiResponse, AppState, MarkViewedRequest, QueryParams, WriteThroughRequest};
use crate::models::{MergedView, Platform, SearchQuery};

/// `GET /api/cache?q=`
pub async fn read_merged(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(params): Query<QueryParams>,
) -> Result<Json<ApiResponse<BTreeMap<Platform, MergedView>>>, ApiError> {
    if SearchQuery::normalize(&params.q).is_none() {
        return Err(ApiError::validation("Query is required"));
    }

    let views = state.coordinator().read_merged(user.id(), &params.q).await;
    Ok(Json(ApiResponse::success(views)))
}

/// `PUT /api/cache/{platform}`
pub async fn write_through(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(platform): Path<String>,
    Json(request): Json<WriteThroughRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let platform: Platform = platform.parse()?;

    if SearchQuery::normalize(&request.query).is_none() {
        return Err(ApiError::validation("Query is required"));
    }
    if let Some(foreign) = request.view.results.iter().find(|r| r.platform != platform) {
        return Err(ApiError::validation(format!(
            "Result {} belongs to {}, not {platform}",
            foreign.url, foreign.platform
        )));
    }
    if let Some(token) = &request.view.continuation
        && !token.belongs_to(platform)
    {
        return Err(ApiError::validation(format!(
            "Continuation {:?} cannot be used with {platform}",
            token.scheme()
        )));
    }

    state
        .coordinator()
        .write_through(user.id(), &request.query, platform, &request.view)
        .await;

    Ok(Json(ApiResponse::success(())))
}

/// `POST /api/viewed/{platform}`
pub async fn mark_viewed(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(platform): Path<String>,
    Json(request): Json<MarkViewedRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let platform: Platform = platform.parse()?;

    let recorded = state
        .dispatcher()
        .mark_viewed(user.id(), &request.query, platform, request.displayed_index)
        .await?;

    if !recorded {
        return Err(ApiError::unauthorized("Viewed state requires a signed-in user"));
    }

    Ok(Json(ApiResponse::success(())))
}
