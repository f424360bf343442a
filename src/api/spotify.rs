use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde_json::Value;

use crate::{
    error::AppError,
    server::AppState,
    types::{RecentQuery, TimeRange, TopQuery},
    utils,
};

pub(crate) const DEFAULT_LIMIT: u32 = 20;

pub(crate) fn parse_time_range(raw: Option<&str>) -> Result<TimeRange, AppError> {
    match raw {
        Some(value) => value.parse().map_err(AppError::BadRequest),
        None => Ok(TimeRange::default()),
    }
}

pub async fn me(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    Ok(Json(state.spotify.me().await?))
}

pub async fn top_tracks(
    State(state): State<AppState>,
    query: Result<Query<TopQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(query) = query?;
    let time_range = parse_time_range(query.time_range.as_deref())?;
    let limit = utils::clamp_limit(query.limit, DEFAULT_LIMIT);

    let body = state
        .spotify
        .top_tracks(time_range, limit, query.offset.unwrap_or(0))
        .await?;
    Ok(Json(body))
}

pub async fn top_artists(
    State(state): State<AppState>,
    query: Result<Query<TopQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(query) = query?;
    let time_range = parse_time_range(query.time_range.as_deref())?;
    let limit = utils::clamp_limit(query.limit, DEFAULT_LIMIT);

    let body = state
        .spotify
        .top_artists(time_range, limit, query.offset.unwrap_or(0))
        .await?;
    Ok(Json(body))
}

pub async fn recent(
    State(state): State<AppState>,
    query: Result<Query<RecentQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(query) = query?;
    let limit = utils::clamp_limit(query.limit, DEFAULT_LIMIT);
    Ok(Json(state.spotify.recently_played(limit).await?))
}
