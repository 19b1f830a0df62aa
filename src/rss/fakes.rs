//! In-memory store and fetcher used by the scraper unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::error::FetchError;
use super::fetcher::Fetcher;
use super::store::FeedStore;
use super::types::{Feed, FeedDocument, FeedItem, NewPost, Post};
use crate::{AppError, Result};

/// Something that happened to the fakes, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Select(usize),
    Stamp(Uuid),
    Fetch(String),
    Post(String),
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

pub fn feed(name: &str) -> Feed {
    let now = Utc::now();
    Feed {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        name: name.to_string(),
        url: format!("https://feeds.example.com/{}", name),
        user_id: Uuid::nil(),
        last_fetched_at: None,
    }
}

pub fn item(title: &str, link: &str) -> FeedItem {
    FeedItem {
        title: title.to_string(),
        link: link.to_string(),
        ..FeedItem::default()
    }
}

pub fn document(items: Vec<FeedItem>) -> FeedDocument {
    FeedDocument {
        title: "Fake".to_string(),
        items,
        ..FeedDocument::default()
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub feeds: Mutex<Vec<Feed>>,
    pub posts: Mutex<Vec<NewPost>>,
    pub fail_select: bool,
    pub fail_stamp: HashSet<Uuid>,
    pub fail_post: HashSet<String>,
    pub log: EventLog,
}

impl FakeStore {
    pub fn with_feeds(feeds: Vec<Feed>, log: EventLog) -> Self {
        Self {
            feeds: Mutex::new(feeds),
            log,
            ..Self::default()
        }
    }

    pub fn stamp_count(&self) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, Event::Stamp(_)))
            .count()
    }

    pub fn post_urls(&self) -> Vec<String> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.url.clone())
            .collect()
    }

    pub fn last_fetched(&self, id: Uuid) -> Option<chrono::DateTime<Utc>> {
        self.feeds
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id == id)
            .and_then(|f| f.last_fetched_at)
    }
}

#[async_trait]
impl FeedStore for FakeStore {
    async fn get_next_feeds_to_fetch(&self, limit: usize) -> Result<Vec<Feed>> {
        self.log.lock().unwrap().push(Event::Select(limit));
        if self.fail_select {
            return Err(AppError::Database("database is locked".to_string()));
        }

        let mut feeds = self.feeds.lock().unwrap().clone();
        // None sorts before Some.
        feeds.sort_by_key(|f| f.last_fetched_at);
        feeds.truncate(limit);
        Ok(feeds)
    }

    async fn mark_feed_fetched(&self, feed_id: Uuid) -> Result<Feed> {
        self.log.lock().unwrap().push(Event::Stamp(feed_id));
        if self.fail_stamp.contains(&feed_id) {
            return Err(AppError::Database("disk I/O error".to_string()));
        }

        let mut feeds = self.feeds.lock().unwrap();
        let feed = feeds
            .iter_mut()
            .find(|f| f.id == feed_id)
            .ok_or_else(|| AppError::NotFound("feed".to_string()))?;
        feed.last_fetched_at = Some(Utc::now());
        Ok(feed.clone())
    }

    async fn create_post(&self, post: &NewPost) -> Result<Option<Post>> {
        self.log.lock().unwrap().push(Event::Post(post.url.clone()));
        if self.fail_post.contains(&post.url) {
            return Err(AppError::Database("disk full".to_string()));
        }

        let mut posts = self.posts.lock().unwrap();
        if posts.iter().any(|p| p.url == post.url) {
            return Ok(None);
        }
        posts.push(post.clone());

        let now = Utc::now();
        Ok(Some(Post {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            title: post.title.clone(),
            url: post.url.clone(),
            description: post.description.clone(),
            published_at: post.published_at,
            feed_id: post.feed_id,
        }))
    }
}

/// Canned fetch outcome.
#[derive(Clone)]
pub enum Response {
    Doc(FeedDocument),
    Slow(Duration, FeedDocument),
    Status(u16),
    Malformed,
    Panic,
}

#[derive(Default)]
pub struct FakeFetcher {
    pub responses: HashMap<String, Response>,
    pub log: EventLog,
    pub starts: Mutex<Vec<(String, tokio::time::Instant)>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeFetcher {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn respond(mut self, feed: &Feed, response: Response) -> Self {
        self.responses.insert(feed.url.clone(), response);
        self
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<FeedDocument, FetchError> {
        self.log.lock().unwrap().push(Event::Fetch(url.to_string()));
        self.starts
            .lock()
            .unwrap()
            .push((url.to_string(), tokio::time::Instant::now()));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let result = match self.responses.get(url).cloned() {
            Some(Response::Doc(doc)) => Ok(doc),
            Some(Response::Slow(delay, doc)) => {
                tokio::time::sleep(delay).await;
                Ok(doc)
            }
            Some(Response::Status(code)) => Err(FetchError::HttpStatus(code)),
            Some(Response::Malformed) => Err(FetchError::Parse("unexpected EOF".to_string())),
            Some(Response::Panic) => panic!("fetcher blew up"),
            None => Err(FetchError::HttpStatus(404)),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
