//! Compaction of Spotify listening data.
//!
//! The chat endpoint charges per token, so the data forwarded alongside a
//! question is reduced to the fields a language model can reason about and is
//! capped at a configurable number of characters.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use crate::{
    types::{
        Artist, CompactArtist, CompactPlay, CompactTrack, EnrichedArtist, EnrichedTrack,
        PlayHistory, TimeRange, Track,
    },
    utils,
};

/// Keys that carry no information about listening taste.
pub const NOISE_KEYS: [&str; 8] = [
    "available_markets",
    "images",
    "external_urls",
    "external_ids",
    "href",
    "uri",
    "preview_url",
    "is_local",
];

const TRUNCATION_MARKER: &str = "…[truncated]";

/// Listening data rendered to text, ready to be embedded in a prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSnapshot {
    pub text: String,
    pub chars: usize,
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub time_range: TimeRange,
    pub top_tracks: Vec<CompactTrack>,
    pub top_artists: Vec<CompactArtist>,
    pub recently_played: Vec<CompactPlay>,
}

/// Recursively removes [`NOISE_KEYS`] from objects in `value`.
pub fn strip_noise(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|key, _| !NOISE_KEYS.contains(&key.as_str()));
            map.values_mut().for_each(strip_noise);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_noise),
        _ => {}
    }
}

pub fn compact_tracks(tracks: &[Track]) -> Vec<CompactTrack> {
    tracks
        .iter()
        .map(|t| CompactTrack {
            name: t.name.clone(),
            artists: t.artists.iter().map(|a| a.name.clone()).collect(),
            album: t.album.name.clone(),
            popularity: t.popularity,
        })
        .collect()
}

pub fn compact_artists(artists: &[Artist]) -> Vec<CompactArtist> {
    artists
        .iter()
        .map(|a| CompactArtist {
            name: a.name.clone(),
            genres: a.genres.clone(),
            popularity: a.popularity,
        })
        .collect()
}

pub fn compact_recent(plays: &[PlayHistory]) -> Vec<CompactPlay> {
    plays
        .iter()
        .map(|p| CompactPlay {
            track: p.track.name.clone(),
            artists: p.track.artists.iter().map(|a| a.name.clone()).collect(),
            played_at: p.played_at.clone(),
        })
        .collect()
}

/// Collects the distinct artist ids of `tracks` in first-seen order.
pub fn artist_ids(tracks: &[Track]) -> Vec<String> {
    let mut seen = HashSet::new();
    tracks
        .iter()
        .flat_map(|t| t.artists.iter())
        .filter_map(|a| a.id.clone())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Attaches artist genres to each track.
///
/// Artists missing from `artists` keep an empty genre list. The track-level
/// `genres` field is the de-duplicated union over all of its artists.
pub fn enrich_tracks(tracks: &[Track], artists: &[Artist]) -> Vec<EnrichedTrack> {
    let genres_by_id: HashMap<&str, &Vec<String>> = artists
        .iter()
        .map(|a| (a.id.as_str(), &a.genres))
        .collect();

    tracks
        .iter()
        .map(|t| {
            let enriched_artists: Vec<EnrichedArtist> = t
                .artists
                .iter()
                .map(|a| EnrichedArtist {
                    id: a.id.clone(),
                    name: a.name.clone(),
                    genres: a
                        .id
                        .as_deref()
                        .and_then(|id| genres_by_id.get(id))
                        .map(|g| g.to_vec())
                        .unwrap_or_default(),
                })
                .collect();

            let mut seen = HashSet::new();
            let genres = enriched_artists
                .iter()
                .flat_map(|a| a.genres.iter().cloned())
                .filter(|g| seen.insert(g.clone()))
                .collect();

            EnrichedTrack {
                id: t.id.clone(),
                name: t.name.clone(),
                album: t.album.name.clone(),
                release_date: t.album.release_date.clone(),
                popularity: t.popularity,
                duration_ms: t.duration_ms,
                artists: enriched_artists,
                genres,
            }
        })
        .collect()
}

/// Serializes `value` compactly and caps it at `max_chars` characters.
///
/// When the text is cut, a marker is appended so the model knows the data is
/// incomplete. The marker counts against `max_chars`, and a cap too small to
/// hold it gets a plain cut.
pub fn render(value: &Value, max_chars: usize) -> RenderedSnapshot {
    let full = value.to_string();
    let full_chars = full.chars().count();
    if full_chars <= max_chars {
        return RenderedSnapshot {
            chars: full_chars,
            text: full,
            truncated: false,
        };
    }

    let marker_chars = TRUNCATION_MARKER.chars().count();
    let text = if max_chars > marker_chars {
        let (mut text, _) = utils::truncate_chars(&full, max_chars - marker_chars);
        text.push_str(TRUNCATION_MARKER);
        text
    } else {
        utils::truncate_chars(&full, max_chars).0
    };

    RenderedSnapshot {
        chars: text.chars().count(),
        text,
        truncated: true,
    }
}

/// Prepares a client supplied snapshot: strips noise, then renders it.
pub fn render_supplied(mut value: Value, max_chars: usize) -> RenderedSnapshot {
    strip_noise(&mut value);
    render(&value, max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strip_noise_removes_nested_keys() {
        let mut value = json!({
            "name": "Song",
            "href": "https://api.spotify.com/v1/tracks/1",
            "album": {
                "name": "Album",
                "images": [{"url": "x"}],
                "available_markets": ["DE", "US"]
            },
            "artists": [{"name": "A", "external_urls": {"spotify": "y"}}]
        });

        strip_noise(&mut value);

        assert_eq!(
            value,
            json!({
                "name": "Song",
                "album": {"name": "Album"},
                "artists": [{"name": "A"}]
            })
        );
    }

    #[test]
    fn render_marks_truncation() {
        let value = json!({"text": "x".repeat(100)});

        let short = render(&value, 20);
        assert!(short.truncated);
        assert!(short.text.ends_with(TRUNCATION_MARKER));
        assert_eq!(short.chars, 20);
        assert_eq!(short.text.chars().count(), 20);

        let tiny = render(&value, 5);
        assert!(tiny.truncated);
        assert_eq!(tiny.chars, 5);
        assert!(!tiny.text.contains(TRUNCATION_MARKER));

        let full = render(&value, 10_000);
        assert!(!full.truncated);
        assert_eq!(full.text, value.to_string());
    }
}
