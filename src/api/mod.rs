//! # API Module
//!
//! HTTP handlers for every route the relay exposes. Handlers are thin: they
//! extract and validate parameters, call into [`crate::spotify`],
//! [`crate::snapshot`] or [`crate::llm`], and turn failures into
//! [`crate::error::AppError`] responses.
//!
//! ## Endpoints
//!
//! ### Authentication
//!
//! - [`login`] - `GET /auth/login`, redirects to the Spotify consent page with
//!   a signed `state`.
//! - [`callback`] - `GET /auth/callback`, verifies `state` and exchanges the
//!   authorization code for tokens.
//!
//! ### Spotify proxy
//!
//! - [`me`], [`top_tracks`], [`top_artists`], [`recent`] - pass the upstream
//!   JSON through unchanged.
//! - [`enriched_top_tracks`] - top tracks joined with artist genres.
//!
//! ### Chat
//!
//! - [`chat`] - `POST /chat`, forwards a compacted snapshot and a question.
//! - [`chat_test`] - `GET /chat/test`, connectivity check.
//!
//! ### Diagnostics
//!
//! - [`health`] - status and version.
//! - [`top_counts`], [`token_status`] - mounted under `/debug` when enabled.

mod auth;
mod chat;
mod debug;
mod enriched;
mod health;
mod spotify;

pub use auth::{callback, login};
pub use chat::{chat, chat_test};
pub use debug::{token_status, top_counts};
pub use enriched::enriched_top_tracks;
pub use health::health;
pub use spotify::{me, recent, top_artists, top_tracks};
