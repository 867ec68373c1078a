use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, put},
};
use configuration::SearchSettings;
use configuration::settings::Config;
use database::Store;
use search::error::SearchError;
use search::{AlgoliaClient, SearchBackend};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;

use auth::TokenVerifier;

/// The shared application state that all handlers can access.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub verifier: TokenVerifier,
    /// `None` when hosted search is not configured.
    pub search: Option<Arc<dyn SearchBackend>>,
    pub search_settings: SearchSettings,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn Store>) -> Self {
        let search = match AlgoliaClient::new(&config.search) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn SearchBackend>),
            Err(SearchError::NotConfigured) => {
                tracing::warn!("Hosted search is not configured; searching the database instead.");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Hosted search is unavailable; searching the database instead.");
                None
            }
        };
        Self {
            store,
            verifier: TokenVerifier::new(&config.auth),
            search,
            search_settings: config.search.clone(),
        }
    }
}

/// Builds the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>, body_limit_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    use handlers::{catalog, challenges, saves, search as search_routes, users};

    Router::new()
        .route("/api/health", get(catalog::health))
        // --- Reference data ---
        .route("/api/games", get(catalog::list_games))
        .route("/api/countries", get(catalog::list_countries))
        .route("/api/teams", get(catalog::search_teams))
        .route("/api/teams/:team_id", get(catalog::get_team))
        .route(
            "/api/competitions",
            get(catalog::list_competitions).post(catalog::create_competition_group),
        )
        .route(
            "/api/competitions/:group_id",
            get(catalog::get_competition_group).patch(catalog::update_competition_group),
        )
        .route(
            "/api/competitions/:group_id/members/:competition_id",
            put(catalog::assign_competition),
        )
        // --- Users ---
        .route("/api/users/me", get(users::get_me).put(users::update_me))
        // --- Saves ---
        .route("/api/saves", get(saves::list_saves).post(saves::create_save))
        .route(
            "/api/saves/:save_id",
            get(saves::get_save).patch(saves::update_save).delete(saves::delete_save),
        )
        .route("/api/saves/:save_id/stints", get(saves::list_stints).post(saves::create_stint))
        .route(
            "/api/saves/:save_id/stints/:stint_id",
            axum::routing::patch(saves::update_stint).delete(saves::delete_stint),
        )
        .route("/api/saves/:save_id/trophies", get(saves::list_trophies).post(saves::create_trophy))
        .route(
            "/api/saves/:save_id/trophies/:trophy_id",
            axum::routing::delete(saves::delete_trophy),
        )
        .route("/api/saves/:save_id/seasons", get(saves::list_seasons).post(saves::create_season))
        .route(
            "/api/saves/:save_id/seasons/:season_id",
            axum::routing::delete(saves::delete_season),
        )
        .route(
            "/api/saves/:save_id/challenges",
            get(challenges::list_save_challenges).post(challenges::start_challenge),
        )
        .route(
            "/api/saves/:save_id/challenges/:challenge_id/goals/:goal_id",
            put(challenges::set_goal),
        )
        // --- Challenges ---
        .route(
            "/api/challenges",
            get(challenges::list_challenges).post(challenges::create_challenge),
        )
        .route(
            "/api/challenges/:challenge_id",
            get(challenges::get_challenge).delete(challenges::delete_challenge),
        )
        // --- Search ---
        .route("/api/search/teams", get(search_routes::search_teams))
        .route("/api/search/competitions", get(search_routes::search_competitions))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit_bytes))
}

/// The main function to configure and run the web server.
pub async fn run_server(config: &Config, addr: SocketAddr, store: Arc<dyn Store>) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config, store));
    let app = build_router(state, config.server.body_limit_mb * 1024 * 1024);

    tracing::info!("Web server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests;
