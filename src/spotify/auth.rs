use reqwest::{Client, Url};

use crate::{
    config::Config,
    error::AppError,
    types::{Token, TokenResponse},
    utils,
};

/// Builds the Spotify authorization URL the user is redirected to.
///
/// The `state` value is a signed token from [`utils::sign_state`]; the
/// callback verifies it before any code exchange happens.
pub fn authorize_url(config: &Config, state: &str, show_dialog: bool) -> Result<Url, AppError> {
    let mut params = vec![
        ("client_id", config.spotify_client_id.as_str()),
        ("response_type", "code"),
        ("redirect_uri", config.spotify_redirect_uri.as_str()),
        ("scope", config.spotify_scope.as_str()),
        ("state", state),
    ];
    if show_dialog {
        params.push(("show_dialog", "true"));
    }

    Url::parse_with_params(&config.spotify_auth_url, &params)
        .map_err(|e| AppError::Config(format!("invalid SPOTIFY_API_AUTH_URL: {}", e)))
}

/// Exchanges an authorization code for an access token.
///
/// Completes the authorization-code flow by posting the code together with the
/// registered redirect URI to the token endpoint. The client authenticates
/// with its id and secret through HTTP Basic auth.
///
/// # Errors
///
/// Common failure scenarios:
/// - Invalid, expired or already used authorization code
/// - Redirect URI that does not match the one used for the authorize request
/// - Network connectivity issues
///
/// Non-success responses are returned as [`AppError::Upstream`] carrying the
/// body Spotify sent back.
pub async fn exchange_code(client: &Client, config: &Config, code: &str) -> Result<Token, AppError> {
    let response = client
        .post(&config.spotify_token_url)
        .basic_auth(&config.spotify_client_id, Some(&config.spotify_client_secret))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.spotify_redirect_uri.as_str()),
        ])
        .send()
        .await?;

    let body = read_token_response(response).await?;
    let refresh_token = body.refresh_token.clone().ok_or_else(|| AppError::Upstream {
        service: "spotify accounts",
        status: 200,
        body: "token response did not contain a refresh_token".to_string(),
    })?;

    Ok(into_token(body, refresh_token))
}

/// Refreshes an expired access token using a refresh token.
///
/// Spotify may or may not rotate the refresh token. When the response omits
/// it, the previous refresh token stays valid and is carried over.
pub async fn refresh_token(
    client: &Client,
    config: &Config,
    refresh_token: &str,
) -> Result<Token, AppError> {
    let response = client
        .post(&config.spotify_token_url)
        .basic_auth(&config.spotify_client_id, Some(&config.spotify_client_secret))
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .send()
        .await?;

    let body = read_token_response(response).await?;
    let rotated = body
        .refresh_token
        .clone()
        .unwrap_or_else(|| refresh_token.to_string());

    Ok(into_token(body, rotated))
}

async fn read_token_response(response: reqwest::Response) -> Result<TokenResponse, AppError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Upstream {
            service: "spotify accounts",
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json::<TokenResponse>().await?)
}

fn into_token(body: TokenResponse, refresh_token: String) -> Token {
    Token {
        access_token: body.access_token,
        refresh_token,
        scope: body.scope,
        token_type: body.token_type,
        expires_in: body.expires_in,
        obtained_at: utils::now_secs(),
    }
}
