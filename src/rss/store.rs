//! Storage operations the scraper depends on.

use async_trait::async_trait;
use uuid::Uuid;

use super::repository::{FeedRepository, PostRepository};
use super::types::{Feed, NewPost, Post};
use crate::{Database, Result};

/// The storage contract used by the scheduler and its workers.
///
/// Implementations must tolerate one concurrent caller per worker.
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Up to `limit` feeds ordered by `last_fetched_at` ascending, never
    /// fetched first. Must not modify anything.
    async fn get_next_feeds_to_fetch(&self, limit: usize) -> Result<Vec<Feed>>;

    /// Set the feed's `last_fetched_at` to now.
    async fn mark_feed_fetched(&self, feed_id: Uuid) -> Result<Feed>;

    /// Store a candidate post. `None` means it was already stored.
    async fn create_post(&self, post: &NewPost) -> Result<Option<Post>>;
}

#[async_trait]
impl FeedStore for Database {
    async fn get_next_feeds_to_fetch(&self, limit: usize) -> Result<Vec<Feed>> {
        FeedRepository::new(self.pool()).next_to_fetch(limit).await
    }

    async fn mark_feed_fetched(&self, feed_id: Uuid) -> Result<Feed> {
        FeedRepository::new(self.pool()).mark_fetched(feed_id).await
    }

    async fn create_post(&self, post: &NewPost) -> Result<Option<Post>> {
        PostRepository::new(self.pool()).create_or_ignore(post).await
    }
}
