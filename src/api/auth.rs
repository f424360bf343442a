use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::{
    error::AppError,
    server::AppState,
    spotify::auth,
    types::{CallbackQuery, LoginQuery},
    utils::{self, StateError},
};

/// Redirects the browser to the Spotify consent page.
pub async fn login(
    State(state): State<AppState>,
    params: Result<Query<LoginQuery>, QueryRejection>,
) -> Result<Redirect, AppError> {
    let Query(params) = params?;
    let oauth_state = utils::sign_state(&state.config.state_secret, utils::now_secs())?;
    let url = auth::authorize_url(
        &state.config,
        &oauth_state,
        params.show_dialog.unwrap_or(false),
    )?;

    tracing::debug!("redirecting to spotify authorize page");
    Ok(Redirect::to(url.as_str()))
}

/// Handles the redirect back from Spotify.
///
/// The signed `state` is checked before the code is exchanged, so a forged or
/// replayed-after-expiry callback never reaches the token endpoint.
pub async fn callback(
    State(state): State<AppState>,
    params: Result<Query<CallbackQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params?;
    if let Some(error) = params.error {
        return Err(AppError::AuthorizationDenied(error));
    }

    let oauth_state = params.state.ok_or(StateError::Missing)?;
    utils::verify_state(
        &state.config.state_secret,
        &oauth_state,
        utils::now_secs(),
        state.config.state_max_age_secs,
    )?;

    let code = params
        .code
        .ok_or_else(|| AppError::BadRequest("missing authorization code".to_string()))?;

    state.spotify.complete_login(&code).await?;

    match &state.config.frontend_url {
        Some(url) => Ok(Redirect::to(url).into_response()),
        None => Ok(Html(
            "<h2>Authentication successful.</h2><p>You can close this window.</p>",
        )
        .into_response()),
    }
}
