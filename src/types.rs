use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub token_type: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

impl Token {
    /// Seconds before the nominal expiry at which the token is treated as expired.
    pub const EXPIRY_BUFFER_SECS: u64 = 240;

    pub fn expires_at(&self) -> u64 {
        self.obtained_at.saturating_add(self.expires_in)
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at().saturating_sub(Self::EXPIRY_BUFFER_SECS)
    }
}

/// Body of a successful response from the Spotify token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    pub refresh_token: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    ShortTerm,
    #[default]
    MediumTerm,
    LongTerm,
}

impl TimeRange {
    pub const ALL: [TimeRange; 3] = [
        TimeRange::ShortTerm,
        TimeRange::MediumTerm,
        TimeRange::LongTerm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short_term" | "short" => Ok(TimeRange::ShortTerm),
            "medium_term" | "medium" => Ok(TimeRange::MediumTerm),
            "long_term" | "long" => Ok(TimeRange::LongTerm),
            other => Err(format!(
                "invalid time_range '{}', expected short_term, medium_term or long_term",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopQuery {
    pub time_range: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginQuery {
    pub show_dialog: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

// Upstream Spotify shapes. Only the fields the relay reshapes are modelled.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistRef {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumRef {
    pub name: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    pub album: AlbumRef,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeveralArtistsResponse {
    pub artists: Vec<Option<Artist>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayHistory {
    pub track: Track,
    pub played_at: String,
}

// Compact shapes sent to clients and the language model.

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompactTrack {
    pub name: String,
    pub artists: Vec<String>,
    pub album: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompactArtist {
    pub name: String,
    pub genres: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompactPlay {
    pub track: String,
    pub artists: Vec<String>,
    pub played_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedArtist {
    pub id: Option<String>,
    pub name: String,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedTrack {
    pub id: Option<String>,
    pub name: String,
    pub album: String,
    pub release_date: Option<String>,
    pub popularity: Option<u32>,
    pub duration_ms: Option<u64>,
    pub artists: Vec<EnrichedArtist>,
    /// Union of all artist genres, in first-seen order.
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedTopTracks {
    pub time_range: TimeRange,
    pub total: Option<u64>,
    pub items: Vec<EnrichedTrack>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopCount {
    pub tracks: usize,
    pub artists: usize,
    pub total_tracks: Option<u64>,
    pub total_artists: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obtained_at: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_secs: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired: Option<bool>,
}

// Chat surface.

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub snapshot: Option<Value>,
    #[serde(default)]
    pub time_range: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub model: String,
    pub snapshot_chars: usize,
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTestResponse {
    pub ok: bool,
    pub model: String,
    pub reply: String,
}

// OpenAI-compatible chat-completions wire format.

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}
