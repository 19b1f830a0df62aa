//! rssagg - RSS feed aggregator
//!
//! A REST API for registering users and feeds, backed by a background
//! scraper that periodically collects posts from the registered feeds.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod rss;
pub mod web;

pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{AppError, Result};
pub use web::WebServer;
