//! User repository.
//!
//! This module provides CRUD operations for users in the database.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::user::{NewUser, User};
use super::{format_timestamp, parse_id, parse_timestamp};
use crate::{AppError, Result};

/// Row type for users.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    created_at: String,
    updated_at: String,
    name: String,
    api_key: String,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: parse_id(&row.id)?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            name: row.name,
            api_key: row.api_key,
        })
    }
}

/// Repository for user operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let now = format_timestamp(Utc::now());
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (id, created_at, updated_at, name, api_key)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, created_at, updated_at, name, api_key",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&now)
        .bind(&now)
        .bind(&new_user.name)
        .bind(&new_user.api_key)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, created_at, updated_at, name, api_key FROM users WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by API key.
    pub async fn get_by_api_key(&self, api_key: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, created_at, updated_at, name, api_key FROM users WHERE api_key = ?",
        )
        .bind(api_key)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
