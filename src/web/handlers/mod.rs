//! API handlers.

pub mod feed;
pub mod health;
pub mod post;
pub mod user;

pub use feed::*;
pub use health::*;
pub use post::*;
pub use user::*;

use crate::Database;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Database handle. Cloning shares the pool.
    pub db: Database,
}

impl AppState {
    /// Create a new application state.
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}
