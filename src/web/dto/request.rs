//! Request DTOs for Web API.

use serde::Deserialize;
use validator::Validate;

use super::validation::{no_control_chars, not_empty_trimmed};

/// Default number of posts returned by `GET /v1/posts`.
pub const DEFAULT_POSTS_LIMIT: u32 = 20;

/// Maximum number of posts returned by `GET /v1/posts`.
pub const MAX_POSTS_LIMIT: u32 = 100;

/// User creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Display name.
    #[validate(
        length(max = 200, message = "Must be at most 200 characters"),
        custom(function = "not_empty_trimmed"),
        custom(function = "no_control_chars")
    )]
    pub name: String,
}

/// Feed creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFeedRequest {
    /// Display name.
    #[validate(
        length(max = 200, message = "Must be at most 200 characters"),
        custom(function = "not_empty_trimmed"),
        custom(function = "no_control_chars")
    )]
    pub name: String,
    /// Feed URL.
    #[validate(
        length(max = 2048, message = "Must be at most 2048 characters"),
        custom(function = "not_empty_trimmed")
    )]
    pub url: String,
}

/// Query parameters for listing posts.
#[derive(Debug, Default, Deserialize)]
pub struct PostsQuery {
    /// Maximum number of posts.
    pub limit: Option<u32>,
}

impl PostsQuery {
    /// Requested limit clamped to `1..=MAX_POSTS_LIMIT`.
    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_POSTS_LIMIT)
            .clamp(1, MAX_POSTS_LIMIT)
    }
}
