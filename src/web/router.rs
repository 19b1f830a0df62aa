//! Router configuration for Web API.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_feed, create_user, error_check, get_user, healthz, list_feeds, list_posts, AppState,
};
use super::middleware::create_cors_layer;

/// Create the API router. Every route lives under `/v1`.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let v1_routes = Router::new()
        .route("/healthz", get(healthz))
        .route("/err", get(error_check))
        .route("/users", post(create_user).get(get_user))
        .route("/feeds", post(create_feed).get(list_feeds))
        .route("/posts", get(list_posts));

    Router::new()
        .nest("/v1", v1_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}
