//! User repository
//!
//! Database operations for user accounts:
//! - `UserRepository` trait defining the interface
//! - `SqlxUserRepository` implementing it for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username (exact match)
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Count total users
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based user repository supporting SQLite and MySQL.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared repository handle
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_username_sqlite(self.pool.as_sqlite().unwrap(), username).await
            }
            DatabaseDriver::Mysql => {
                get_by_username_mysql(self.pool.as_mysql().unwrap(), username).await
            }
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => count_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_rowid(),
        username: user.username.clone(),
        password_hash: user.password_hash.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, username, password_hash, created_at, updated_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by ID")?;

    Ok(row.map(|row| row_to_user(&row)))
}

async fn get_by_username_sqlite(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, username, password_hash, created_at, updated_at FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by username")?;

    Ok(row.map(|row| row_to_user(&row)))
}

async fn count_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;

    Ok(row.get("count"))
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_id() as i64,
        username: user.username.clone(),
        password_hash: user.password_hash.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, username, password_hash, created_at, updated_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by ID")?;

    Ok(row.map(|row| row_to_user_mysql(&row)))
}

async fn get_by_username_mysql(pool: &MySqlPool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, username, password_hash, created_at, updated_at FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by username")?;

    Ok(row.map(|row| row_to_user_mysql(&row)))
}

async fn count_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;

    Ok(row.get("count"))
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::services::password::hash_password;

    async fn setup() -> (DynDatabasePool, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxUserRepository::new(pool.clone());
        (pool, repo)
    }

    fn test_user(username: &str) -> User {
        User::new(
            username.to_string(),
            hash_password("test_password").expect("Failed to hash password"),
        )
    }

    #[tokio::test]
    async fn test_create_user() {
        let (_pool, repo) = setup().await;

        let created = repo
            .create(&test_user("painter"))
            .await
            .expect("Failed to create user");

        assert!(created.id > 0);
        assert_eq!(created.username, "painter");
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let (_pool, repo) = setup().await;
        let created = repo
            .create(&test_user("painter"))
            .await
            .expect("Failed to create user");

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get user")
            .expect("User not found");

        assert_eq!(found.id, created.id);
        assert_eq!(found.username, "painter");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let (_pool, repo) = setup().await;

        let found = repo.get_by_id(999).await.expect("Failed to get user");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_get_by_username_exact_match() {
        let (_pool, repo) = setup().await;
        repo.create(&test_user("painter"))
            .await
            .expect("Failed to create user");

        let found = repo
            .get_by_username("painter")
            .await
            .expect("Failed to get user");
        assert!(found.is_some());

        let missing = repo
            .get_by_username("Painter2")
            .await
            .expect("Failed to get user");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_count_users() {
        let (_pool, repo) = setup().await;

        assert_eq!(repo.count().await.expect("Failed to count"), 0);

        repo.create(&test_user("a")).await.expect("Failed to create");
        repo.create(&test_user("b")).await.expect("Failed to create");

        assert_eq!(repo.count().await.expect("Failed to count"), 2);
    }

    #[tokio::test]
    async fn test_unique_username_constraint() {
        let (_pool, repo) = setup().await;

        repo.create(&test_user("duplicate"))
            .await
            .expect("Failed to create first user");
        let result = repo.create(&test_user("duplicate")).await;

        assert!(result.is_err(), "Should fail due to duplicate username");
    }
}
