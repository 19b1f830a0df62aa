//! Feed worker.
//!
//! A worker processes exactly one feed: stamp it, fetch it, then report each
//! item to the store. Every fault is returned or counted, never raised past
//! the worker.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::ScrapeError;
use super::fetcher::Fetcher;
use super::store::FeedStore;
use super::types::{Feed, FeedItem, NewPost};
use crate::AppError;

/// Per-feed item counts from one successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedOutcome {
    /// Items in the fetched document.
    pub found: usize,
    /// Items stored as new posts.
    pub inserted: usize,
    /// Items the store already had.
    pub skipped: usize,
    /// Items that could not be stored.
    pub failed: usize,
}

/// Processes one feed at a time against a store and a fetcher.
#[derive(Clone)]
pub struct FeedWorker {
    store: Arc<dyn FeedStore>,
    fetcher: Arc<dyn Fetcher>,
}

impl FeedWorker {
    /// Create a worker.
    pub fn new(store: Arc<dyn FeedStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { store, fetcher }
    }

    /// Process one feed.
    ///
    /// The feed is stamped before the network fetch starts. A stamp failure
    /// aborts before fetching; a fetch or parse failure aborts before any item
    /// is reported. Item faults are logged and counted and never stop the
    /// remaining items.
    pub async fn process(&self, feed: &Feed) -> Result<FeedOutcome, ScrapeError> {
        self.store
            .mark_feed_fetched(feed.id)
            .await
            .map_err(|source| ScrapeError::Stamp {
                feed_id: feed.id,
                source,
            })?;

        let document = self
            .fetcher
            .fetch(&feed.url)
            .await
            .map_err(|e| ScrapeError::from_fetch(feed.id, e))?;

        let mut outcome = FeedOutcome {
            found: document.items.len(),
            ..FeedOutcome::default()
        };

        for item in document.items {
            match self.report_item(feed.id, item).await {
                Ok(true) => outcome.inserted += 1,
                Ok(false) => outcome.skipped += 1,
                Err(e) => {
                    outcome.failed += 1;
                    warn!(feed_id = %feed.id, error = %e, "Failed to store feed item");
                }
            }
        }

        if outcome.inserted > 0 {
            info!(
                feed_id = %feed.id,
                "Feed {} collected, {} new post(s)",
                feed.name,
                outcome.inserted
            );
        } else {
            debug!(feed_id = %feed.id, "Feed {} collected, no new posts", feed.name);
        }

        Ok(outcome)
    }

    /// Report one item. `Ok(false)` means the post already existed.
    async fn report_item(&self, feed_id: Uuid, item: FeedItem) -> Result<bool, ScrapeError> {
        let link = item.link.clone();
        let post = item_to_post(feed_id, item).map_err(|source| ScrapeError::ItemReport {
            feed_id,
            link: link.clone(),
            source,
        })?;

        info!(feed_id = %feed_id, "Found post {}", post.title);

        let created = self
            .store
            .create_post(&post)
            .await
            .map_err(|source| ScrapeError::ItemReport {
                feed_id,
                link,
                source,
            })?;

        Ok(created.is_some())
    }
}

/// Convert a feed item into a candidate post.
///
/// An item without a link cannot be stored. An empty title falls back to the
/// link and an empty description is stored as NULL.
pub fn item_to_post(feed_id: Uuid, item: FeedItem) -> Result<NewPost, AppError> {
    let link = item.link.trim();
    if link.is_empty() {
        return Err(AppError::Validation("item has no link".to_string()));
    }

    let title = match item.title.trim() {
        "" => link,
        title => title,
    };

    let mut post = NewPost::new(feed_id, title, link);

    if !item.description.trim().is_empty() {
        post = post.with_description(item.description);
    }

    if let Some(published_at) = parse_pub_date(&item.pub_date) {
        post = post.with_published_at(published_at);
    } else if !item.pub_date.trim().is_empty() {
        debug!("Unparseable publish date {:?} for {}", item.pub_date, link);
    }

    Ok(post)
}

/// Parse a publish date written as RFC 2822 or RFC 3339.
pub fn parse_pub_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc2822(s)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rss::error::FaultKind;
    use crate::rss::fakes::{document, feed, item, Event, EventLog, FakeFetcher, FakeStore, Response};
    use chrono::TimeZone;

    fn worker(store: FakeStore, fetcher: FakeFetcher) -> (FeedWorker, Arc<FakeStore>) {
        let store = Arc::new(store);
        (FeedWorker::new(store.clone(), Arc::new(fetcher)), store)
    }

    #[tokio::test]
    async fn test_stamps_before_fetching() {
        let log = EventLog::default();
        let f = feed("a");
        let doc = document(vec![
            item("One", "https://example.com/1"),
            item("Two", "https://example.com/2"),
        ]);
        let (worker, store) = worker(
            FakeStore::with_feeds(vec![f.clone()], log.clone()),
            FakeFetcher::new(log.clone()).respond(&f, Response::Doc(doc)),
        );

        let outcome = worker.process(&f).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            [
                Event::Stamp(f.id),
                Event::Fetch(f.url.clone()),
                Event::Post("https://example.com/1".to_string()),
                Event::Post("https://example.com/2".to_string()),
            ]
        );
        assert_eq!(
            outcome,
            FeedOutcome {
                found: 2,
                inserted: 2,
                skipped: 0,
                failed: 0
            }
        );
        assert!(store.last_fetched(f.id).is_some());
    }

    #[tokio::test]
    async fn test_stamp_failure_skips_fetch() {
        let log = EventLog::default();
        let f = feed("a");
        let mut store = FakeStore::with_feeds(vec![f.clone()], log.clone());
        store.fail_stamp.insert(f.id);
        let (worker, _) = worker(
            store,
            FakeFetcher::new(log.clone()).respond(&f, Response::Doc(document(vec![]))),
        );

        let err = worker.process(&f).await.unwrap_err();

        assert_eq!(err.kind(), FaultKind::Stamp);
        assert_eq!(*log.lock().unwrap(), [Event::Stamp(f.id)]);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_stamp_and_stores_nothing() {
        let log = EventLog::default();
        let f = feed("a");
        let (worker, store) = worker(
            FakeStore::with_feeds(vec![f.clone()], log.clone()),
            FakeFetcher::new(log.clone()).respond(&f, Response::Status(500)),
        );

        let err = worker.process(&f).await.unwrap_err();

        assert_eq!(err.kind(), FaultKind::Fetch);
        assert_eq!(err.feed_id(), Some(f.id));
        assert!(store.last_fetched(f.id).is_some());
        assert!(store.post_urls().is_empty());
    }

    #[tokio::test]
    async fn test_parse_failure() {
        let log = EventLog::default();
        let f = feed("a");
        let (worker, store) = worker(
            FakeStore::with_feeds(vec![f.clone()], log.clone()),
            FakeFetcher::new(log.clone()).respond(&f, Response::Malformed),
        );

        let err = worker.process(&f).await.unwrap_err();

        assert_eq!(err.kind(), FaultKind::Parse);
        assert_eq!(store.stamp_count(), 1);
        assert!(store.post_urls().is_empty());
    }

    #[tokio::test]
    async fn test_zero_items() {
        let log = EventLog::default();
        let f = feed("a");
        let (worker, store) = worker(
            FakeStore::with_feeds(vec![f.clone()], log.clone()),
            FakeFetcher::new(log.clone()).respond(&f, Response::Doc(document(vec![]))),
        );

        let outcome = worker.process(&f).await.unwrap();

        assert_eq!(outcome, FeedOutcome::default());
        assert!(store.post_urls().is_empty());
    }

    #[tokio::test]
    async fn test_item_faults_are_isolated() {
        let log = EventLog::default();
        let f = feed("a");
        let doc = document(vec![
            item("Good", "https://example.com/good"),
            item("No link", ""),
            item("Broken", "https://example.com/broken"),
            item("Good again", "https://example.com/good"),
            item("Last", "https://example.com/last"),
        ]);
        let mut store = FakeStore::with_feeds(vec![f.clone()], log.clone());
        store
            .fail_post
            .insert("https://example.com/broken".to_string());
        let (worker, store) = worker(
            store,
            FakeFetcher::new(log.clone()).respond(&f, Response::Doc(doc)),
        );

        let outcome = worker.process(&f).await.unwrap();

        assert_eq!(
            outcome,
            FeedOutcome {
                found: 5,
                inserted: 2,
                skipped: 1,
                failed: 2
            }
        );
        assert_eq!(
            store.post_urls(),
            ["https://example.com/good", "https://example.com/last"]
        );

        let reported: Vec<_> = log
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                Event::Post(url) => Some(url.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            reported,
            [
                "https://example.com/good",
                "https://example.com/broken",
                "https://example.com/good",
                "https://example.com/last",
            ]
        );
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_found_posts_logged_at_info() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let log = EventLog::default();
        let f = feed("a");
        let (worker, _) = worker(
            FakeStore::with_feeds(vec![f.clone()], log.clone()),
            FakeFetcher::new(log.clone()).respond(
                &f,
                Response::Doc(document(vec![item("Hello world", "https://example.com/1")])),
            ),
        );

        worker.process(&f).await.unwrap();

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("INFO"), "{}", output);
        assert!(output.contains("Found post Hello world"), "{}", output);
    }

    #[test]
    fn test_item_to_post_defaults() {
        let feed_id = Uuid::new_v4();
        let post = item_to_post(feed_id, item("", " https://example.com/1 ")).unwrap();

        assert_eq!(post.feed_id, feed_id);
        assert_eq!(post.title, "https://example.com/1");
        assert_eq!(post.url, "https://example.com/1");
        assert_eq!(post.description, None);
        assert_eq!(post.published_at, None);
    }

    #[test]
    fn test_item_to_post_full() {
        let post = item_to_post(
            Uuid::new_v4(),
            FeedItem {
                title: "Title".to_string(),
                link: "https://example.com/1".to_string(),
                description: "Summary".to_string(),
                pub_date: "Mon, 01 Jan 2024 10:00:00 +0000".to_string(),
            },
        )
        .unwrap();

        assert_eq!(post.title, "Title");
        assert_eq!(post.description.as_deref(), Some("Summary"));
        assert_eq!(
            post.published_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_item_to_post_requires_link() {
        let err = item_to_post(Uuid::new_v4(), item("Title", "  ")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_parse_pub_date() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();

        assert_eq!(
            parse_pub_date("Mon, 01 Jan 2024 10:00:00 GMT"),
            Some(expected)
        );
        assert_eq!(
            parse_pub_date("Mon, 1 Jan 2024 19:00:00 +0900"),
            Some(expected)
        );
        assert_eq!(parse_pub_date("2024-01-01T10:00:00Z"), Some(expected));
        assert_eq!(parse_pub_date(""), None);
        assert_eq!(parse_pub_date("last tuesday"), None);
    }
}
