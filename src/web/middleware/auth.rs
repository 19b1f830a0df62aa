//! API key authentication.
//!
//! Clients authenticate with an `Authorization: ApiKey <key>` header.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use thiserror::Error;

use crate::db::{User, UserRepository};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Scheme expected in the `Authorization` header.
pub const API_KEY_SCHEME: &str = "ApiKey";

/// Why an `Authorization` header could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthHeaderError {
    #[error("no authorization header included")]
    Missing,
    #[error("malformed authorization header")]
    Malformed,
}

/// Extract the API key from request headers.
///
/// The header value must be exactly two space-separated parts: the `ApiKey`
/// scheme and a non-empty key.
pub fn get_api_key(headers: &HeaderMap) -> Result<&str, AuthHeaderError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthHeaderError::Missing)?
        .to_str()
        .map_err(|_| AuthHeaderError::Malformed)?;

    if value.is_empty() {
        return Err(AuthHeaderError::Missing);
    }

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [scheme, key] if *scheme == API_KEY_SCHEME && !key.is_empty() => Ok(key),
        _ => Err(AuthHeaderError::Malformed),
    }
}

/// Extractor for the authenticated user.
///
/// Rejects with 401 when the header is missing or malformed and with 404
/// when no user owns the key.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let api_key = get_api_key(&parts.headers).map_err(|e| {
            tracing::debug!("Rejected authorization header: {}", e);
            ApiError::unauthorized(format!("Auth error: {}", e))
        })?;

        let user = UserRepository::new(state.db.pool())
            .get_by_api_key(api_key)
            .await?
            .ok_or_else(|| ApiError::not_found("Couldn't get user"))?;

        Ok(AuthUser(user))
    }
}
