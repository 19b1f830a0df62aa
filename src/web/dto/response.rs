//! Response DTOs for Web API.

use serde::Serialize;
use uuid::Uuid;

use crate::db::User;
use crate::rss::{Feed, Post};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// User response. Includes the API key, which is only ever shown to its owner.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub created_at: String,
    pub updated_at: String,
    pub name: String,
    pub api_key: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
            name: user.name,
            api_key: user.api_key,
        }
    }
}

/// Feed response.
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub id: Uuid,
    pub created_at: String,
    pub updated_at: String,
    pub name: String,
    pub url: String,
    pub user_id: Uuid,
    /// Null until the scraper has attempted the feed.
    pub last_fetched_at: Option<String>,
}

impl From<Feed> for FeedResponse {
    fn from(feed: Feed) -> Self {
        Self {
            id: feed.id,
            created_at: feed.created_at.to_rfc3339(),
            updated_at: feed.updated_at.to_rfc3339(),
            name: feed.name,
            url: feed.url,
            user_id: feed.user_id,
            last_fetched_at: feed.last_fetched_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Post response.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub created_at: String,
    pub updated_at: String,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: Option<String>,
    pub feed_id: Uuid,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.to_rfc3339(),
            title: post.title,
            url: post.url,
            description: post.description,
            published_at: post.published_at.map(|t| t.to_rfc3339()),
            feed_id: post.feed_id,
        }
    }
}
