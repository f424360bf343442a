use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    Res, api,
    config::Config,
    llm::ChatClient,
    management::TokenManager,
    spotify::SpotifyClient,
};

/// Shared handler state. Cloning is cheap; all members are handles.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub spotify: SpotifyClient,
    pub llm: ChatClient,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::with_tokens(config, TokenManager::new())
    }

    pub fn with_tokens(config: Config, tokens: TokenManager) -> Self {
        let config = Arc::new(config);
        let http = reqwest::Client::new();

        Self {
            spotify: SpotifyClient::new(http.clone(), Arc::clone(&config), tokens),
            llm: ChatClient::new(http, Arc::clone(&config)),
            config,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(api::health))
        .route("/auth/login", get(api::login))
        .route("/auth/callback", get(api::callback))
        .route("/spotify/me", get(api::me))
        .route("/spotify/top-tracks", get(api::top_tracks))
        .route("/spotify/top-artists", get(api::top_artists))
        .route("/spotify/recent", get(api::recent))
        .route("/enriched/top-tracks", get(api::enriched_top_tracks))
        .route("/chat", post(api::chat))
        .route("/chat/test", get(api::chat_test));

    if state.config.debug_routes {
        app = app
            .route("/debug/topcounts", get(api::top_counts))
            .route("/debug/tokens", get(api::token_status));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

pub async fn start_api_server(config: Config) -> Res<()> {
    let addr = SocketAddr::from_str(&config.server_address)?;
    let app = router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %listener.local_addr()?, "listening for connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(err = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
