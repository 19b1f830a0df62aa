//! Feed scraping for rssagg.
//!
//! This module provides the feed and post model, the feed fetcher, the
//! storage contract the scraper depends on, and the periodic scheduler that
//! drives per-feed workers.

pub mod error;
pub mod fetcher;
pub mod repository;
pub mod scheduler;
pub mod store;
pub mod types;
pub mod worker;

#[cfg(test)]
mod fakes;

pub use error::{FaultKind, FetchError, ScrapeError};
pub use fetcher::{parse_feed, validate_url, Fetcher, RssFetcher};
pub use repository::{FeedRepository, PostRepository};
pub use scheduler::{spawn_scheduler, CycleReport, Scheduler};
pub use store::FeedStore;
pub use types::{
    Feed, FeedDocument, FeedItem, NewFeed, NewPost, Post, DEFAULT_REQUEST_TIMEOUT_SECS,
    MAX_DESCRIPTION_LENGTH, MAX_FEED_SIZE,
};
pub use worker::{item_to_post, parse_pub_date, FeedOutcome, FeedWorker};
