//! User model.

use chrono::{DateTime, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A registered API user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Unique user ID.
    pub id: Uuid,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Display name.
    pub name: String,
    /// Secret key presented in the `Authorization: ApiKey <key>` header.
    pub api_key: String,
}

/// New user for creation.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// API key to assign.
    pub api_key: String,
}

impl NewUser {
    /// Create a new user with a freshly generated API key.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_key: generate_api_key(),
        }
    }

    /// Use a specific API key instead of a generated one.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }
}

/// Generate a random API key: the hex SHA-256 digest of 32 random bytes.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    format!("{:x}", Sha256::digest(bytes))
}
