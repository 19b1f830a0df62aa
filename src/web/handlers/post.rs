//! Post handlers for Web API.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::rss::PostRepository;
use crate::web::dto::{ApiResponse, PostResponse, PostsQuery};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// GET /v1/posts - Newest posts from the authenticated user's feeds.
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<PostsQuery>,
) -> Result<Json<ApiResponse<Vec<PostResponse>>>, ApiError> {
    let posts = PostRepository::new(state.db.pool())
        .list_for_user(user.id, query.limit() as usize)
        .await?;

    Ok(Json(ApiResponse::new(
        posts.into_iter().map(PostResponse::from).collect(),
    )))
}
