use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    error::AppError,
    spotify::SpotifyClient,
    types::{Artist, SeveralArtistsResponse, TimeRange},
};

/// Maximum number of ids accepted by `GET /artists`.
pub const ARTISTS_BATCH_SIZE: usize = 50;

impl SpotifyClient {
    /// `GET /me` — profile of the current user.
    pub async fn me(&self) -> Result<Value, AppError> {
        self.get_json("/me", &[]).await
    }

    /// `GET /me/top/tracks`.
    pub async fn top_tracks(
        &self,
        time_range: TimeRange,
        limit: u32,
        offset: u32,
    ) -> Result<Value, AppError> {
        self.get_json("/me/top/tracks", &top_query(time_range, limit, offset))
            .await
    }

    /// `GET /me/top/artists`.
    pub async fn top_artists(
        &self,
        time_range: TimeRange,
        limit: u32,
        offset: u32,
    ) -> Result<Value, AppError> {
        self.get_json("/me/top/artists", &top_query(time_range, limit, offset))
            .await
    }

    /// `GET /me/player/recently-played`.
    pub async fn recently_played(&self, limit: u32) -> Result<Value, AppError> {
        self.get_json(
            "/me/player/recently-played",
            &[("limit", limit.to_string())],
        )
        .await
    }

    /// Fetches full artist objects for the given ids.
    ///
    /// Requests are split into batches of [`ARTISTS_BATCH_SIZE`]. Ids Spotify
    /// does not know come back as `null` and are skipped.
    pub async fn artists(&self, ids: &[String]) -> Result<Vec<Artist>, AppError> {
        let mut artists = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(ARTISTS_BATCH_SIZE) {
            let body = self
                .get_json("/artists", &[("ids", chunk.join(","))])
                .await?;
            let page: SeveralArtistsResponse = parse(body)?;
            artists.extend(page.artists.into_iter().flatten());
        }

        Ok(artists)
    }
}

fn top_query(time_range: TimeRange, limit: u32, offset: u32) -> Vec<(&'static str, String)> {
    vec![
        ("time_range", time_range.to_string()),
        ("limit", limit.to_string()),
        ("offset", offset.to_string()),
    ]
}

/// Deserializes an upstream JSON body into one of the typed shapes.
pub fn parse<T: DeserializeOwned>(body: Value) -> Result<T, AppError> {
    Ok(serde_json::from_value(body)?)
}
