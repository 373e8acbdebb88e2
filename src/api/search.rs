use axum::{
    Json,
    extract::{Query, State},
};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::user::CurrentUser;
use super::{ApiError, ApiResponse, AppState, LoadMoreRequest, SearchParams};
use crate::models::Platform;
use crate::services::PlatformOutcome;

fn parse_platforms(raw: Option<&str>) -> Result<Vec<Platform>, ApiError> {
    raw.unwrap_or_default()
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<Platform>().map_err(ApiError::from))
        .collect()
}

/// `GET /api/search?q=&platforms=`
pub async fn search(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<BTreeMap<Platform, PlatformOutcome>>>, ApiError> {
    let platforms = parse_platforms(params.platforms.as_deref())?;

    let outcomes = state
        .dispatcher()
        .search(user.id(), &params.q, &platforms)
        .await?;

    Ok(Json(ApiResponse::success(outcomes)))
}

/// `POST /api/search/more`
pub async fn load_more(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(request): Json<LoadMoreRequest>,
) -> Result<Json<ApiResponse<PlatformOutcome>>, ApiError> {
    let platform: Platform = request.platform.parse()?;

    let outcome = state
        .dispatcher()
        .load_more(user.id(), &request.query, platform)
        .await?;

    Ok(Json(ApiResponse::success(outcome)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_platforms() {
        assert!(parse_platforms(None).unwrap().is_empty());
        assert_eq!(
            parse_platforms(Some("youtube, TikTok,")).unwrap(),
            vec![Platform::Youtube, Platform::Tiktok]
        );
        assert!(parse_platforms(Some("youtube,myspace")).is_err());
    }
}
