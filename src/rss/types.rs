//! Feed, post and feed-document types.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Default total timeout for one feed request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Maximum feed size in bytes (5MB).
pub const MAX_FEED_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum length for a stored post description.
pub const MAX_DESCRIPTION_LENGTH: usize = 10000;

/// A subscribed RSS source.
#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    /// Feed ID.
    pub id: Uuid,
    /// When the feed was created.
    pub created_at: DateTime<Utc>,
    /// When the feed was last updated.
    pub updated_at: DateTime<Utc>,
    /// Display name.
    pub name: String,
    /// Feed URL (globally unique).
    pub url: String,
    /// Owning user.
    pub user_id: Uuid,
    /// Last fetch attempt. `None` until the scraper first picks the feed.
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl Feed {
    /// Whether the scraper has ever attempted this feed.
    pub fn is_never_fetched(&self) -> bool {
        self.last_fetched_at.is_none()
    }
}

/// New feed for creation.
#[derive(Debug, Clone)]
pub struct NewFeed {
    /// Display name.
    pub name: String,
    /// Feed URL.
    pub url: String,
    /// Owning user.
    pub user_id: Uuid,
}

impl NewFeed {
    /// Create a new feed.
    pub fn new(name: impl Into<String>, url: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            user_id,
        }
    }
}

/// A stored post discovered in a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    /// Post ID.
    pub id: Uuid,
    /// When the post was stored.
    pub created_at: DateTime<Utc>,
    /// When the post was last updated.
    pub updated_at: DateTime<Utc>,
    /// Post title.
    pub title: String,
    /// Link to the article (unique).
    pub url: String,
    /// Summary text.
    pub description: Option<String>,
    /// Publication time, when the feed provided a parseable one.
    pub published_at: Option<DateTime<Utc>>,
    /// Feed this post came from.
    pub feed_id: Uuid,
}

/// Candidate post reported by a worker.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    /// Feed ID.
    pub feed_id: Uuid,
    /// Post title.
    pub title: String,
    /// Link to the article.
    pub url: String,
    /// Summary text.
    pub description: Option<String>,
    /// Publication time.
    pub published_at: Option<DateTime<Utc>>,
}

impl NewPost {
    /// Create a new post.
    pub fn new(feed_id: Uuid, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            feed_id,
            title: title.into(),
            url: url.into(),
            description: None,
            published_at: None,
        }
    }

    /// Set the description, truncated to [`MAX_DESCRIPTION_LENGTH`] characters.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let desc = description.into();
        if desc.chars().count() > MAX_DESCRIPTION_LENGTH {
            self.description = Some(desc.chars().take(MAX_DESCRIPTION_LENGTH).collect());
        } else {
            self.description = Some(desc);
        }
        self
    }

    /// Set the published date.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }
}

/// Parsed remote feed. Built per fetch and never persisted.
///
/// Absent fields are empty strings rather than errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedDocument {
    /// Channel title.
    pub title: String,
    /// Channel website link.
    pub link: String,
    /// Channel description.
    pub description: String,
    /// Channel language.
    pub language: String,
    /// Items in document order.
    pub items: Vec<FeedItem>,
}

/// One entry of a [`FeedDocument`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedItem {
    /// Item title.
    pub title: String,
    /// Item link.
    pub link: String,
    /// Item description.
    pub description: String,
    /// Publish date as RFC 2822 text, taken from the item's published or
    /// updated date. Empty when the feed gives no date or one the parser
    /// cannot read; the original text is not kept.
    pub pub_date: String,
}
