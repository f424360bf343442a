use std::collections::BTreeMap;

use axum::{Json, extract::State};
use serde_json::Value;

use crate::{
    error::AppError,
    server::AppState,
    spotify::library,
    types::{Paging, TimeRange, TokenStatus, TopCount},
    utils,
};

const COUNT_LIMIT: u32 = 50;

/// Number of top tracks and artists Spotify returns for every time range.
pub async fn top_counts(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<&'static str, TopCount>>, AppError> {
    let mut counts = BTreeMap::new();

    for range in TimeRange::ALL {
        let (tracks, artists) = tokio::try_join!(
            state.spotify.top_tracks(range, COUNT_LIMIT, 0),
            state.spotify.top_artists(range, COUNT_LIMIT, 0),
        )?;
        let tracks: Paging<Value> = library::parse(tracks)?;
        let artists: Paging<Value> = library::parse(artists)?;

        counts.insert(
            range.as_str(),
            TopCount {
                tracks: tracks.items.len(),
                artists: artists.items.len(),
                total_tracks: tracks.total,
                total_artists: artists.total,
            },
        );
    }

    Ok(Json(counts))
}

/// Token diagnostics with the secrets masked.
pub async fn token_status(State(state): State<AppState>) -> Json<TokenStatus> {
    let status = match state.spotify.tokens().current_token().await {
        Some(token) => {
            let now = utils::now_secs();
            TokenStatus {
                authenticated: true,
                access_token: Some(utils::mask_token(&token.access_token)),
                refresh_token: Some(utils::mask_token(&token.refresh_token)),
                scope: Some(token.scope.clone()),
                obtained_at: Some(token.obtained_at),
                expires_at: Some(token.expires_at()),
                expires_in_secs: Some(token.expires_at() as i64 - now as i64),
                expired: Some(token.is_expired(now)),
            }
        }
        None => TokenStatus {
            authenticated: false,
            access_token: None,
            refresh_token: None,
            scope: None,
            obtained_at: None,
            expires_at: None,
            expires_in_secs: None,
            expired: None,
        },
    };

    Json(status)
}
