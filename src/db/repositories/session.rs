//! Session repository
//!
//! Database operations for server-side sessions backing the auth cookie.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new session
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get session by ID (token)
    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Delete a session
    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete expired sessions; returns the number removed
    async fn delete_expired(&self) -> Result<i64>;
}

/// SQLx-based session repository supporting SQLite and MySQL.
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    /// Create a new SQLx session repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared repository handle
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), session).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), session).await,
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn delete_expired(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_expired_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => delete_expired_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, session: &Session) -> Result<Session> {
    sqlx::query(
        "INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&session.id)
    .bind(session.user_id)
    .bind(session.expires_at)
    .bind(session.created_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(session.clone())
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Session>> {
    let row = sqlx::query(
        "SELECT id, user_id, expires_at, created_at FROM sessions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get session by ID")?;

    Ok(row.map(|row| Session {
        id: row.get("id"),
        user_id: row.get("user_id"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }))
}

async fn delete_sqlite(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete session")?;

    Ok(())
}

async fn delete_expired_sqlite(pool: &SqlitePool) -> Result<i64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to delete expired sessions")?;

    Ok(result.rows_affected() as i64)
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, session: &Session) -> Result<Session> {
    sqlx::query(
        "INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&session.id)
    .bind(session.user_id)
    .bind(session.expires_at)
    .bind(session.created_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(session.clone())
}

async fn get_by_id_mysql(pool: &MySqlPool, id: &str) -> Result<Option<Session>> {
    let row = sqlx::query(
        "SELECT id, user_id, expires_at, created_at FROM sessions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get session by ID")?;

    Ok(row.map(|row| Session {
        id: row.get("id"),
        user_id: row.get("user_id"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }))
}

async fn delete_mysql(pool: &MySqlPool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete session")?;

    Ok(())
}

async fn delete_expired_mysql(pool: &MySqlPool) -> Result<i64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to delete expired sessions")?;

    Ok(result.rows_affected() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use chrono::Duration;

    async fn setup() -> (DynDatabasePool, SqlxSessionRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let user = users
            .create(&User::new("painter".to_string(), "hash".to_string()))
            .await
            .expect("Failed to create user");

        (pool.clone(), SqlxSessionRepository::new(pool), user.id)
    }

    fn session_for(user_id: i64, minutes: i64) -> Session {
        let now = Utc::now();
        Session {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::minutes(minutes),
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let (_pool, repo, user_id) = setup().await;
        let session = session_for(user_id, 60);

        repo.create(&session).await.expect("Failed to create session");

        let found = repo
            .get_by_id(&session.id)
            .await
            .expect("Failed to get session")
            .expect("Session not found");

        assert_eq!(found.user_id, user_id);
        assert!(!found.is_expired());
    }

    #[tokio::test]
    async fn test_get_unknown_session() {
        let (_pool, repo, _user_id) = setup().await;

        let found = repo
            .get_by_id("no-such-token")
            .await
            .expect("Failed to get session");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_delete_session() {
        let (_pool, repo, user_id) = setup().await;
        let session = session_for(user_id, 60);
        repo.create(&session).await.expect("Failed to create session");

        repo.delete(&session.id).await.expect("Failed to delete");

        let found = repo
            .get_by_id(&session.id)
            .await
            .expect("Failed to get session");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_delete_expired_sessions() {
        let (_pool, repo, user_id) = setup().await;
        let live = session_for(user_id, 60);
        let dead = session_for(user_id, -60);
        repo.create(&live).await.expect("Failed to create session");
        repo.create(&dead).await.expect("Failed to create session");

        let removed = repo.delete_expired().await.expect("Failed to clean up");

        assert_eq!(removed, 1);
        assert!(repo.get_by_id(&live.id).await.unwrap().is_some());
        assert!(repo.get_by_id(&dead.id).await.unwrap().is_none());
    }
}
