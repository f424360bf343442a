//! Configuration management for the Spotify Chat Relay.
//!
//! This module handles loading configuration values from environment variables
//! and `.env` files, and turns them into a typed [`Config`] that is shared by
//! every handler. The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the working directory
//! 3. `.env` file in the local data directory
//! 4. Application defaults (where applicable)

use std::{env, path::PathBuf};

use rand::{Rng, distr::Alphanumeric};
use thiserror::Error;

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_SPOTIFY_SCOPE: &str =
    "user-read-private user-read-email user-top-read user-read-recently-played";
pub const DEFAULT_SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LLM_MAX_TOKENS: u32 = 800;
pub const DEFAULT_SNAPSHOT_MAX_CHARS: usize = 12_000;
pub const DEFAULT_STATE_MAX_AGE_SECS: u64 = 600;

const APP_DIR: &str = "spotify-chat-relay";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Loads environment variables from `.env` files.
///
/// Looks in the working directory first and then in the platform-specific
/// local data directory under `spotify-chat-relay/.env`:
/// - Linux: `~/.local/share/spotify-chat-relay/.env`
/// - macOS: `~/Library/Application Support/spotify-chat-relay/.env`
/// - Windows: `%LOCALAPPDATA%/spotify-chat-relay/.env`
///
/// Variables that are already present in the process environment are never
/// overridden. Missing files are skipped silently; the returned list contains
/// the files that were actually read.
pub fn load_env() -> Vec<PathBuf> {
    let mut loaded = Vec::new();

    if let Ok(path) = dotenv::dotenv() {
        loaded.push(path);
    }

    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path.push(".env");
    if path.is_file() && dotenv::from_path(&path).is_ok() {
        loaded.push(path);
    }

    loaded
}

/// Typed runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub spotify_redirect_uri: String,
    pub spotify_scope: String,
    pub spotify_auth_url: String,
    pub spotify_token_url: String,
    pub spotify_api_url: String,
    pub state_secret: Vec<u8>,
    /// True when no `OAUTH_STATE_SECRET` was configured and a random one was
    /// generated for this process. Login links do not survive a restart then.
    pub state_secret_ephemeral: bool,
    pub state_max_age_secs: u64,
    pub frontend_url: Option<String>,
    pub llm_api_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub llm_max_tokens: u32,
    pub snapshot_max_chars: usize,
    pub debug_routes: bool,
}

impl Config {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let (state_secret, state_secret_ephemeral) = match get("OAUTH_STATE_SECRET") {
            Some(secret) => (secret.into_bytes(), false),
            None => (generate_secret(), true),
        };

        Ok(Self {
            server_address: get("SERVER_ADDRESS")
                .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string()),
            spotify_client_id: required("SPOTIFY_API_AUTH_CLIENT_ID")?,
            spotify_client_secret: required("SPOTIFY_API_AUTH_CLIENT_SECRET")?,
            spotify_redirect_uri: required("SPOTIFY_API_REDIRECT_URI")?,
            spotify_scope: get("SPOTIFY_API_AUTH_SCOPE")
                .unwrap_or_else(|| DEFAULT_SPOTIFY_SCOPE.to_string()),
            spotify_auth_url: get("SPOTIFY_API_AUTH_URL")
                .unwrap_or_else(|| DEFAULT_SPOTIFY_AUTH_URL.to_string()),
            spotify_token_url: get("SPOTIFY_API_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_SPOTIFY_TOKEN_URL.to_string()),
            spotify_api_url: get("SPOTIFY_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_SPOTIFY_API_URL.to_string()),
            state_secret,
            state_secret_ephemeral,
            state_max_age_secs: parse_or(
                "OAUTH_STATE_MAX_AGE_SECS",
                get("OAUTH_STATE_MAX_AGE_SECS"),
                DEFAULT_STATE_MAX_AGE_SECS,
            )?,
            frontend_url: get("FRONTEND_URL"),
            llm_api_url: get("LLM_API_URL").unwrap_or_else(|| DEFAULT_LLM_API_URL.to_string()),
            llm_api_key: get("LLM_API_KEY"),
            llm_model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            llm_max_tokens: parse_or(
                "LLM_MAX_TOKENS",
                get("LLM_MAX_TOKENS"),
                DEFAULT_LLM_MAX_TOKENS,
            )?,
            snapshot_max_chars: parse_or(
                "SNAPSHOT_MAX_CHARS",
                get("SNAPSHOT_MAX_CHARS"),
                DEFAULT_SNAPSHOT_MAX_CHARS,
            )?,
            debug_routes: parse_bool("DEBUG_ROUTES", get("DEBUG_ROUTES"), true)?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: v }),
        None => Ok(default),
    }
}

fn parse_bool(key: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(_) => Err(ConfigError::Invalid {
            key,
            value: value.unwrap_or_default(),
        }),
    }
}

fn generate_secret() -> Vec<u8> {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("SPOTIFY_API_AUTH_CLIENT_ID", "client"),
        ("SPOTIFY_API_AUTH_CLIENT_SECRET", "secret"),
        ("SPOTIFY_API_REDIRECT_URI", "http://localhost:8080/auth/callback"),
    ];

    #[test]
    fn defaults_apply_when_only_required_keys_are_set() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.server_address, DEFAULT_SERVER_ADDRESS);
        assert_eq!(config.spotify_api_url, DEFAULT_SPOTIFY_API_URL);
        assert_eq!(config.llm_model, DEFAULT_LLM_MODEL);
        assert_eq!(config.snapshot_max_chars, DEFAULT_SNAPSHOT_MAX_CHARS);
        assert!(config.debug_routes);
        assert!(config.llm_api_key.is_none());
        assert!(config.state_secret_ephemeral);
        assert_eq!(config.state_secret.len(), 32);
    }

    #[test]
    fn missing_client_secret_is_reported() {
        let err = Config::from_lookup(lookup(&[
            ("SPOTIFY_API_AUTH_CLIENT_ID", "client"),
            ("SPOTIFY_API_REDIRECT_URI", "http://localhost/cb"),
        ]))
        .unwrap_err();

        assert_eq!(err, ConfigError::Missing("SPOTIFY_API_AUTH_CLIENT_SECRET"));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut pairs = REQUIRED.to_vec();
        pairs[0] = ("SPOTIFY_API_AUTH_CLIENT_ID", "   ");
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();

        assert_eq!(err, ConfigError::Missing("SPOTIFY_API_AUTH_CLIENT_ID"));
    }

    #[test]
    fn numeric_and_boolean_overrides_are_parsed() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("SNAPSHOT_MAX_CHARS", "500"),
            ("DEBUG_ROUTES", "false"),
            ("OAUTH_STATE_SECRET", "s3cret"),
            ("SPOTIFY_API_URL", "http://127.0.0.1:9999/v1/"),
        ]);
        let config = Config::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(config.snapshot_max_chars, 500);
        assert!(!config.debug_routes);
        assert_eq!(config.state_secret, b"s3cret".to_vec());
        assert!(!config.state_secret_ephemeral);
        assert_eq!(config.spotify_api_url, "http://127.0.0.1:9999/v1");
    }

    #[test]
    fn invalid_number_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("LLM_MAX_TOKENS", "lots"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();

        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "LLM_MAX_TOKENS",
                value: "lots".to_string()
            }
        );
    }
}
