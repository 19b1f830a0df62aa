//! Feed handlers for Web API.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::rss::{validate_url, FeedRepository, NewFeed};
use crate::web::dto::{ApiResponse, CreateFeedRequest, FeedResponse, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// POST /v1/feeds - Register a feed owned by the authenticated user.
///
/// The URL must be http(s) and point at a public host. A URL that is already
/// registered by anyone is a conflict.
pub async fn create_feed(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateFeedRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FeedResponse>>), ApiError> {
    let url = req.url.trim();
    validate_url(url)?;

    let feed = FeedRepository::new(state.db.pool())
        .create(&NewFeed::new(req.name.trim(), url, user.id))
        .await?;

    tracing::info!(feed_id = %feed.id, user_id = %user.id, "Feed {} registered", feed.url);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(FeedResponse::from(feed))),
    ))
}

/// GET /v1/feeds - List every registered feed, oldest first.
pub async fn list_feeds(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<FeedResponse>>>, ApiError> {
    let feeds = FeedRepository::new(state.db.pool()).list_all().await?;

    Ok(Json(ApiResponse::new(
        feeds.into_iter().map(FeedResponse::from).collect(),
    )))
}
