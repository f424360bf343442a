use axum::{extract::State, response::Json};
use serde_json::{Value, json};

use crate::server::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "authenticated": state.spotify.tokens().is_present().await,
        "chat_configured": state.config.llm_api_key.is_some(),
    }))
}
