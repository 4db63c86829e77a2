//! Router configuration for the HTTP surface.

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    add_channel, add_channel_by_url, delete_account, delete_channel, export_opml, get_article,
    get_config, get_feed, health_check, list_accounts, list_channels, pause_channel,
    query_articles, refresh_account, scheduler_status, trigger_fetch, version, AppState,
};
use super::middleware::{create_cors_layer, require_token, ApiToken};

/// Create the main router: public feeds, the token-gated API, and service
/// endpoints.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let token = ApiToken::new(&app_state.config.server.token);

    let api_routes = Router::new()
        .route("/add/:id", get(add_channel))
        .route("/addurl", get(add_channel_by_url))
        .route("/del/:id", delete(delete_channel))
        .route("/pause/:id", get(pause_channel))
        .route("/list", get(list_channels))
        .route("/query", get(query_articles))
        .route("/article/:id", get(get_article))
        .route("/fetch", get(trigger_fetch))
        .route("/accounts", get(list_accounts))
        .route("/accounts/:id/delete", delete(delete_account))
        .route("/accounts/:id/refresh", post(refresh_account))
        .route("/config", get(get_config))
        .route("/scheduler", get(scheduler_status))
        .route("/opml", get(export_opml))
        .layer(middleware::from_fn_with_state(token, require_token));

    Router::new()
        .route("/feed/:id", get(get_feed))
        .nest("/api", api_routes)
        .merge(create_health_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}

/// Ungated service endpoints.
pub fn create_health_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/version", get(version))
}
