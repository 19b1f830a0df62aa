//! User handlers for Web API.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::db::{NewUser, UserRepository};
use crate::web::dto::{ApiResponse, CreateUserRequest, UserResponse, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// POST /v1/users - Create a user with a fresh API key.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    let user = UserRepository::new(state.db.pool())
        .create(&NewUser::new(req.name.trim()))
        .await?;

    tracing::info!(user_id = %user.id, "User {} created", user.name);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(UserResponse::from(user))),
    ))
}

/// GET /v1/users - Get the authenticated user.
pub async fn get_user(AuthUser(user): AuthUser) -> Json<ApiResponse<UserResponse>> {
    Json(ApiResponse::new(UserResponse::from(user)))
}
