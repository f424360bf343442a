use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{
    api::spotify::parse_time_range,
    error::AppError,
    server::AppState,
    snapshot::{self, RenderedSnapshot, Snapshot},
    spotify::library,
    types::{
        Artist, ChatRequest, ChatResponse, ChatTestResponse, Paging, PlayHistory, TimeRange, Track,
    },
};

const MAX_QUESTION_CHARS: usize = 2_000;
const SNAPSHOT_ITEMS: u32 = 20;

/// Answers a question about the user's listening data.
///
/// Clients may send their own `snapshot`; otherwise one is assembled from the
/// user's top tracks, top artists and recently played tracks.
pub async fn chat(
    State(state): State<AppState>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = request?;
    let question = request.question.trim();
    if question.is_empty() {
        return Err(AppError::BadRequest("question must not be empty".to_string()));
    }
    if question.chars().count() > MAX_QUESTION_CHARS {
        return Err(AppError::BadRequest(format!(
            "question must be at most {} characters",
            MAX_QUESTION_CHARS
        )));
    }

    let max_chars = state.config.snapshot_max_chars;
    let rendered = match request.snapshot {
        Some(value) => snapshot::render_supplied(value, max_chars),
        None => {
            let time_range = parse_time_range(request.time_range.as_deref())?;
            build_snapshot(&state, time_range, max_chars).await?
        }
    };

    tracing::info!(
        snapshot_chars = rendered.chars,
        truncated = rendered.truncated,
        "forwarding question to chat endpoint"
    );

    let completion = state.llm.ask(question, &rendered).await?;

    Ok(Json(ChatResponse {
        answer: completion.content,
        model: completion.model,
        snapshot_chars: rendered.chars,
        truncated: rendered.truncated,
    }))
}

/// Round-trips a fixed prompt to verify the chat endpoint is reachable.
pub async fn chat_test(State(state): State<AppState>) -> Result<Json<ChatTestResponse>, AppError> {
    let completion = state.llm.ping().await?;

    Ok(Json(ChatTestResponse {
        ok: true,
        model: completion.model,
        reply: completion.content,
    }))
}

async fn build_snapshot(
    state: &AppState,
    time_range: TimeRange,
    max_chars: usize,
) -> Result<RenderedSnapshot, AppError> {
    let (tracks, artists, recent) = tokio::try_join!(
        state.spotify.top_tracks(time_range, SNAPSHOT_ITEMS, 0),
        state.spotify.top_artists(time_range, SNAPSHOT_ITEMS, 0),
        state.spotify.recently_played(SNAPSHOT_ITEMS),
    )?;

    let tracks: Paging<Track> = library::parse(tracks)?;
    let artists: Paging<Artist> = library::parse(artists)?;
    let recent: Paging<PlayHistory> = library::parse(recent)?;

    let data = Snapshot {
        time_range,
        top_tracks: snapshot::compact_tracks(&tracks.items),
        top_artists: snapshot::compact_artists(&artists.items),
        recently_played: snapshot::compact_recent(&recent.items),
    };

    Ok(snapshot::render(&serde_json::to_value(&data)?, max_chars))
}
