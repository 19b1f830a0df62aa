//! Feed and post repositories.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::types::{Feed, NewFeed, NewPost, Post};
use crate::db::{format_timestamp, parse_id, parse_timestamp};
use crate::{AppError, Result};

const FEED_COLUMNS: &str = "id, created_at, updated_at, name, url, user_id, last_fetched_at";

const POST_COLUMNS: &str =
    "id, created_at, updated_at, title, url, description, published_at, feed_id";

/// Row type for feeds.
#[derive(Debug, sqlx::FromRow)]
struct FeedRow {
    id: String,
    created_at: String,
    updated_at: String,
    name: String,
    url: String,
    user_id: String,
    last_fetched_at: Option<String>,
}

impl TryFrom<FeedRow> for Feed {
    type Error = AppError;

    fn try_from(row: FeedRow) -> Result<Self> {
        Ok(Feed {
            id: parse_id(&row.id)?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            name: row.name,
            url: row.url,
            user_id: parse_id(&row.user_id)?,
            last_fetched_at: row
                .last_fetched_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
        })
    }
}

/// Row type for posts.
#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: String,
    created_at: String,
    updated_at: String,
    title: String,
    url: String,
    description: Option<String>,
    published_at: Option<String>,
    feed_id: String,
}

impl TryFrom<PostRow> for Post {
    type Error = AppError;

    fn try_from(row: PostRow) -> Result<Self> {
        Ok(Post {
            id: parse_id(&row.id)?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            title: row.title,
            url: row.url,
            description: row.description,
            published_at: row
                .published_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            feed_id: parse_id(&row.feed_id)?,
        })
    }
}

/// Repository for feed operations.
pub struct FeedRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FeedRepository<'a> {
    /// Create a new FeedRepository with the given pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new feed. A URL that is already registered yields
    /// [`AppError::Conflict`].
    pub async fn create(&self, feed: &NewFeed) -> Result<Feed> {
        let now = format_timestamp(Utc::now());
        let query = format!(
            "INSERT INTO feeds (id, created_at, updated_at, name, url, user_id)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {}",
            FEED_COLUMNS
        );
        let row = sqlx::query_as::<_, FeedRow>(&query)
            .bind(Uuid::new_v4().to_string())
            .bind(&now)
            .bind(&now)
            .bind(&feed.name)
            .bind(&feed.url)
            .bind(feed.user_id.to_string())
            .fetch_one(self.pool)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => {
                    AppError::Conflict(format!("feed url already registered: {}", feed.url))
                }
                other => other,
            })?;

        row.try_into()
    }

    /// Get a feed by ID.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Feed>> {
        let query = format!("SELECT {} FROM feeds WHERE id = ?", FEED_COLUMNS);
        let row = sqlx::query_as::<_, FeedRow>(&query)
            .bind(id.to_string())
            .fetch_optional(self.pool)
            .await?;

        row.map(Feed::try_from).transpose()
    }

    /// Get a feed by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let query = format!("SELECT {} FROM feeds WHERE url = ?", FEED_COLUMNS);
        let row = sqlx::query_as::<_, FeedRow>(&query)
            .bind(url)
            .fetch_optional(self.pool)
            .await?;

        row.map(Feed::try_from).transpose()
    }

    /// List all feeds, oldest first.
    pub async fn list_all(&self) -> Result<Vec<Feed>> {
        let query = format!(
            "SELECT {} FROM feeds ORDER BY created_at ASC, rowid ASC",
            FEED_COLUMNS
        );
        let rows = sqlx::query_as::<_, FeedRow>(&query)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(Feed::try_from).collect()
    }

    /// Up to `limit` feeds, least recently fetched first.
    ///
    /// Never-fetched feeds come before every fetched one. Ties fall back to
    /// creation order. Read only.
    pub async fn next_to_fetch(&self, limit: usize) -> Result<Vec<Feed>> {
        let query = format!(
            "SELECT {} FROM feeds
             ORDER BY last_fetched_at ASC NULLS FIRST, created_at ASC, rowid ASC
             LIMIT ?",
            FEED_COLUMNS
        );
        let rows = sqlx::query_as::<_, FeedRow>(&query)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(Feed::try_from).collect()
    }

    /// Stamp a feed as fetched now and return the updated feed.
    ///
    /// The stored stamp never moves backwards, even if the wall clock does.
    pub async fn mark_fetched(&self, id: Uuid) -> Result<Feed> {
        let now = format_timestamp(Utc::now());
        let query = format!(
            "UPDATE feeds
             SET last_fetched_at = MAX(COALESCE(last_fetched_at, ''), ?),
                 updated_at = MAX(updated_at, ?)
             WHERE id = ?
             RETURNING {}",
            FEED_COLUMNS
        );
        let row = sqlx::query_as::<_, FeedRow>(&query)
            .bind(&now)
            .bind(&now)
            .bind(id.to_string())
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("feed".to_string()))?;

        row.try_into()
    }

    /// Count all feeds.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feeds")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

/// Repository for post operations.
pub struct PostRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PostRepository<'a> {
    /// Create a new PostRepository with the given pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a post unless one with the same URL exists.
    ///
    /// Returns `None` for a duplicate.
    pub async fn create_or_ignore(&self, post: &NewPost) -> Result<Option<Post>> {
        let now = format_timestamp(Utc::now());
        let query = format!(
            "INSERT INTO posts (id, created_at, updated_at, title, url, description, published_at, feed_id)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(url) DO NOTHING
             RETURNING {}",
            POST_COLUMNS
        );
        let row = sqlx::query_as::<_, PostRow>(&query)
            .bind(Uuid::new_v4().to_string())
            .bind(&now)
            .bind(&now)
            .bind(&post.title)
            .bind(&post.url)
            .bind(&post.description)
            .bind(post.published_at.map(format_timestamp))
            .bind(post.feed_id.to_string())
            .fetch_optional(self.pool)
            .await?;

        row.map(Post::try_from).transpose()
    }

    /// Newest posts from feeds owned by `user_id`.
    pub async fn list_for_user(&self, user_id: Uuid, limit: usize) -> Result<Vec<Post>> {
        let query = format!(
            "SELECT {} FROM posts
             WHERE feed_id IN (SELECT id FROM feeds WHERE user_id = ?)
             ORDER BY published_at DESC NULLS LAST, created_at DESC
             LIMIT ?",
            POST_COLUMNS
        );
        let rows = sqlx::query_as::<_, PostRow>(&query)
            .bind(user_id.to_string())
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(Post::try_from).collect()
    }

    /// Count posts of a feed.
    pub async fn count_by_feed(&self, feed_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE feed_id = ?")
            .bind(feed_id.to_string())
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
