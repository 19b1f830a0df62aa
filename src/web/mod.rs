//! HTTP API for rssagg.
//!
//! Users register with a name and receive an API key; authenticated users
//! register feeds and read the posts the scraper collected from them.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
