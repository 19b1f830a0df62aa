//! Middleware for Web API.

pub mod auth;
pub mod cors;

pub use auth::{get_api_key, AuthHeaderError, AuthUser, API_KEY_SCHEME};
pub use cors::create_cors_layer;
