//! Fetch and scrape error kinds.

use thiserror::Error;
use uuid::Uuid;

use crate::AppError;

/// Errors from fetching and decoding one remote feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level failure (DNS, connection refused, TLS, body read).
    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),
    /// The request exceeded the client timeout.
    #[error("request timed out")]
    Timeout,
    /// The server answered with a non-2xx status.
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// The body exceeded the configured size limit.
    #[error("feed too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },
    /// The body is not a well-formed feed document.
    #[error("failed to parse feed: {0}")]
    Parse(String),
}

impl FetchError {
    /// Whether this is a decode failure rather than a transport failure.
    pub fn is_parse(&self) -> bool {
        matches!(self, FetchError::Parse(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(e)
        }
    }
}

/// Fault category of a [`ScrapeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Picking the due feeds failed.
    Selection,
    /// Marking a feed fetched failed.
    Stamp,
    /// Network, timeout, status or size failure.
    Fetch,
    /// The feed body could not be decoded.
    Parse,
    /// Storing one item as a post failed.
    ItemReport,
}

/// Scraper failures. None of them stop the scheduler.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The store could not produce the due feeds; the cycle is skipped.
    #[error("couldn't get next feeds to fetch: {0}")]
    Selection(#[source] AppError),

    /// The feed could not be marked fetched; the feed is skipped this cycle.
    #[error("couldn't mark feed {feed_id} fetched: {source}")]
    Stamp { feed_id: Uuid, source: AppError },

    /// The feed could not be downloaded.
    #[error("couldn't collect feed {feed_id}: {source}")]
    Fetch { feed_id: Uuid, source: FetchError },

    /// The feed body could not be decoded.
    #[error("couldn't parse feed {feed_id}: {source}")]
    Parse { feed_id: Uuid, source: FetchError },

    /// One item could not be stored. Sibling items are unaffected.
    #[error("couldn't store item {link:?} of feed {feed_id}: {source}")]
    ItemReport {
        feed_id: Uuid,
        link: String,
        source: AppError,
    },
}

impl ScrapeError {
    /// Classify a fetcher failure for the given feed.
    pub fn from_fetch(feed_id: Uuid, source: FetchError) -> Self {
        if source.is_parse() {
            ScrapeError::Parse { feed_id, source }
        } else {
            ScrapeError::Fetch { feed_id, source }
        }
    }

    /// The fault category.
    pub fn kind(&self) -> FaultKind {
        match self {
            ScrapeError::Selection(_) => FaultKind::Selection,
            ScrapeError::Stamp { .. } => FaultKind::Stamp,
            ScrapeError::Fetch { .. } => FaultKind::Fetch,
            ScrapeError::Parse { .. } => FaultKind::Parse,
            ScrapeError::ItemReport { .. } => FaultKind::ItemReport,
        }
    }

    /// The feed this fault belongs to, if any.
    pub fn feed_id(&self) -> Option<Uuid> {
        match self {
            ScrapeError::Selection(_) => None,
            ScrapeError::Stamp { feed_id, .. }
            | ScrapeError::Fetch { feed_id, .. }
            | ScrapeError::Parse { feed_id, .. }
            | ScrapeError::ItemReport { feed_id, .. } => Some(*feed_id),
        }
    }
}
