//! # Spotify Integration Module
//!
//! This module is the integration layer between the relay and Spotify's
//! services. It covers the Accounts service (authorization URL, code exchange,
//! token refresh) and the read-only Web API calls the relay proxies.
//!
//! ## Architecture
//!
//! ```text
//! HTTP handlers (api)
//!          ↓
//! SpotifyClient (token lookup, refresh-and-retry)
//!     ├── auth     (Accounts service)
//!     └── library  (me, top items, recently played, artists)
//!          ↓
//! reqwest
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## Token lifecycle
//!
//! Every request reads the current token from the shared [`TokenManager`].
//! A token known to be expired (with a 4-minute buffer) is refreshed before the
//! request is sent. If Spotify still answers `401 Unauthorized`, the client
//! refreshes once, stores the new token and retries the request exactly once.
//! Concurrent requests holding the same stale token share a single refresh.
//! Any other failure is returned to the caller with the upstream body text.

pub mod auth;
pub mod library;

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::{config::Config, error::AppError, management::TokenManager, types::Token, utils};

#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    config: Arc<Config>,
    tokens: TokenManager,
}

impl SpotifyClient {
    pub fn new(http: Client, config: Arc<Config>, tokens: TokenManager) -> Self {
        Self {
            http,
            config,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Completes the authorization-code flow and stores the resulting token.
    pub async fn complete_login(&self, code: &str) -> Result<Token, AppError> {
        let token = auth::exchange_code(&self.http, &self.config, code).await?;
        self.tokens.set(token.clone()).await;
        tracing::info!(scope = %token.scope, expires_in = token.expires_in, "spotify login completed");
        Ok(token)
    }

    /// Performs an authenticated GET against the Web API and returns the JSON body.
    ///
    /// `path` is relative to the configured API base URL, e.g. `/me/top/tracks`.
    pub async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, AppError> {
        let mut token = self
            .tokens
            .current_token()
            .await
            .ok_or(AppError::NotAuthenticated)?;

        if token.is_expired(utils::now_secs()) {
            tracing::debug!("access token expired, refreshing before request");
            token = self.refresh(&token).await?;
        }

        let url = format!("{}{}", self.config.spotify_api_url, path);
        let mut response = self.send(&url, query, &token.access_token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::info!(path, "spotify answered 401, refreshing token and retrying once");
            token = self.refresh(&token).await?;
            response = self.send(&url, query, &token.access_token).await?;
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                service: "spotify",
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<Value>().await?)
    }

    async fn send(
        &self,
        url: &str,
        query: &[(&str, String)],
        access_token: &str,
    ) -> Result<reqwest::Response, AppError> {
        Ok(self
            .http
            .get(url)
            .query(query)
            .bearer_auth(access_token)
            .send()
            .await?)
    }

    async fn refresh(&self, stale: &Token) -> Result<Token, AppError> {
        self.tokens
            .refresh_with(stale, |refresh_token| async move {
                auth::refresh_token(&self.http, &self.config, &refresh_token).await
            })
            .await
    }
}
