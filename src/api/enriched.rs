use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};

use crate::{
    api::spotify::{DEFAULT_LIMIT, parse_time_range},
    error::AppError,
    server::AppState,
    snapshot,
    spotify::library,
    types::{EnrichedTopTracks, Paging, TopQuery, Track},
    utils,
};

/// Top tracks with the genres of their artists attached.
pub async fn enriched_top_tracks(
    State(state): State<AppState>,
    query: Result<Query<TopQuery>, QueryRejection>,
) -> Result<Json<EnrichedTopTracks>, AppError> {
    let Query(query) = query?;
    let time_range = parse_time_range(query.time_range.as_deref())?;
    let limit = utils::clamp_limit(query.limit, DEFAULT_LIMIT);

    let body = state
        .spotify
        .top_tracks(time_range, limit, query.offset.unwrap_or(0))
        .await?;
    let page: Paging<Track> = library::parse(body)?;

    let ids = snapshot::artist_ids(&page.items);
    let artists = state.spotify.artists(&ids).await?;

    Ok(Json(EnrichedTopTracks {
        time_range,
        total: page.total,
        items: snapshot::enrich_tracks(&page.items, &artists),
    }))
}
