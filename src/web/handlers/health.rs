//! Liveness handlers.

use axum::Json;

use crate::web::dto::{ApiResponse, HealthResponse};
use crate::web::error::ApiError;

/// GET /v1/healthz - Report that the server is up.
pub async fn healthz() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::new(HealthResponse { status: "ok" }))
}

/// GET /v1/err - Always fail, to check the error path end to end.
pub async fn error_check() -> ApiError {
    ApiError::internal("Something went wrong")
}
