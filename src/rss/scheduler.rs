//! Scrape cycle scheduler.
//!
//! This module runs the periodic scrape: on every tick it asks the store for
//! the stalest feeds, runs one worker per feed concurrently, and waits for
//! the whole batch before waiting for the next tick.

use std::sync::Arc;

use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::error::ScrapeError;
use super::fetcher::Fetcher;
use super::store::FeedStore;
use super::worker::FeedWorker;

/// Summary of one scrape cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Feeds returned by the selection.
    pub selected: usize,
    /// Feeds processed without a feed-level fault.
    pub succeeded: usize,
    /// Feeds that hit a stamp, fetch or parse fault, or whose worker panicked.
    pub failed: usize,
    /// New posts stored across the batch.
    pub posts_inserted: usize,
}

/// Periodic scraper.
pub struct Scheduler {
    store: Arc<dyn FeedStore>,
    worker: FeedWorker,
}

impl Scheduler {
    /// Create a scheduler over the given store and fetcher.
    pub fn new(store: Arc<dyn FeedStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            worker: FeedWorker::new(store.clone(), fetcher),
            store,
        }
    }

    /// Run cycles forever, one per `period`.
    ///
    /// The first cycle starts immediately. Batches never overlap: ticks
    /// missed while a batch overruns the period collapse into a single tick
    /// delivered when the batch ends, after which cycles stay aligned to the
    /// original schedule.
    pub async fn run(&self, concurrency: usize, period: Duration) {
        let concurrency = concurrency.max(1);
        let period = if period.is_zero() {
            warn!("Scrape interval is zero, using 1 second");
            Duration::from_secs(1)
        } else {
            period
        };

        info!(
            "Collecting feeds every {:?} on {} worker(s)",
            period, concurrency
        );

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            if let Err(e) = self.run_cycle(concurrency).await {
                error!(error = %e, "Scrape cycle aborted");
            }
        }
    }

    /// Run exactly one cycle and wait for every worker in it.
    ///
    /// Only a selection fault is returned. Faults of individual feeds are
    /// logged and counted in the report.
    pub async fn run_cycle(&self, concurrency: usize) -> Result<CycleReport, ScrapeError> {
        let mut feeds = self
            .store
            .get_next_feeds_to_fetch(concurrency)
            .await
            .map_err(ScrapeError::Selection)?;
        feeds.truncate(concurrency);

        let mut report = CycleReport {
            selected: feeds.len(),
            ..CycleReport::default()
        };

        if feeds.is_empty() {
            debug!("No feeds due for collection");
            return Ok(report);
        }

        debug!("Collecting {} feed(s)", feeds.len());

        let mut tasks = JoinSet::new();
        for feed in feeds {
            let worker = self.worker.clone();
            tasks.spawn(async move {
                let result = worker.process(&feed).await;
                if let Err(ref e) = result {
                    warn!(
                        feed_id = %feed.id,
                        kind = ?e.kind(),
                        error = %e,
                        "Failed to collect feed {}",
                        feed.url
                    );
                }
                result
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(outcome)) => {
                    report.succeeded += 1;
                    report.posts_inserted += outcome.inserted;
                }
                Ok(Err(_)) => report.failed += 1,
                Err(e) => {
                    report.failed += 1;
                    error!(error = %e, "Feed worker terminated abnormally");
                }
            }
        }

        info!(
            selected = report.selected,
            succeeded = report.succeeded,
            failed = report.failed,
            posts = report.posts_inserted,
            "Scrape cycle finished"
        );

        Ok(report)
    }
}

/// Spawn the scheduler loop as a background task.
pub fn spawn_scheduler(
    store: Arc<dyn FeedStore>,
    fetcher: Arc<dyn Fetcher>,
    concurrency: usize,
    period: Duration,
) -> JoinHandle<()> {
    let scheduler = Scheduler::new(store, fetcher);
    tokio::spawn(async move {
        scheduler.run(concurrency, period).await;
    })
}
