//! Database migrations
//!
//! Code-based migrations embedded in the binary, with SQL variants for both
//! SQLite and MySQL. Applied versions are tracked in a `_migrations` table
//! so `run_migrations` is idempotent and safe to call on every startup.
//!
//! `painted_models.model_id` and `painted_models.color_id` deliberately
//! carry no foreign key clauses: deleting a model or color leaves its
//! associations behind, and the repaint workflow repairs dangling color
//! references when it encounters them.

use anyhow::{Context, Result};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both supported backends
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (unique, ordered)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// All migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(50) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_users_username ON users(username);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                username VARCHAR(50) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_users_username ON users(username);
        "#,
    },
    Migration {
        version: 2,
        name: "create_sessions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id INTEGER NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id BIGINT NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);
        "#,
    },
    Migration {
        version: 3,
        name: "create_models",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS models (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(255) NOT NULL,
                filepath VARCHAR(255) NOT NULL,
                mesh TEXT NOT NULL,
                user_id INTEGER,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );
            CREATE INDEX IF NOT EXISTS idx_models_user_id ON models(user_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS models (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(255) NOT NULL,
                filepath VARCHAR(255) NOT NULL,
                mesh TEXT NOT NULL,
                user_id BIGINT,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );
            CREATE INDEX idx_models_user_id ON models(user_id);
        "#,
    },
    Migration {
        version: 4,
        name: "create_colors",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS colors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100),
                hexcode VARCHAR(20) NOT NULL,
                material VARCHAR(100) NOT NULL UNIQUE
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS colors (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(100),
                hexcode VARCHAR(20) NOT NULL,
                material VARCHAR(100) NOT NULL UNIQUE
            );
        "#,
    },
    Migration {
        version: 5,
        name: "create_painted_models",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS painted_models (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                model_id INTEGER NOT NULL,
                color_id INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_painted_models_model_id ON painted_models(model_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS painted_models (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                model_id BIGINT NOT NULL,
                color_id BIGINT NOT NULL
            );
            CREATE INDEX idx_painted_models_model_id ON painted_models(model_id);
        "#,
    },
];

/// Run all pending migrations. Returns the number applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = applied_versions(pool).await?;
    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Check whether every known migration has been applied.
pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    let _ = create_migrations_table(pool).await;
    let applied = applied_versions(pool).await?;
    Ok(applied.len() == MIGRATIONS.len())
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

async fn applied_versions(pool: &DynDatabasePool) -> Result<Vec<i32>> {
    let versions = match pool.driver() {
        DatabaseDriver::Sqlite => {
            let rows = sqlx::query("SELECT version FROM _migrations ORDER BY version")
                .fetch_all(pool.as_sqlite().unwrap())
                .await?;
            rows.iter().map(|r| r.get::<i64, _>("version") as i32).collect()
        }
        DatabaseDriver::Mysql => {
            let rows = sqlx::query("SELECT version FROM _migrations ORDER BY version")
                .fetch_all(pool.as_mysql().unwrap())
                .await?;
            rows.iter().map(|r| r.get::<i32, _>("version")).collect()
        }
    };
    Ok(versions)
}

async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => {
            apply_migration_sqlite(pool.as_sqlite().unwrap(), migration).await
        }
        DatabaseDriver::Mysql => apply_migration_mysql(pool.as_mysql().unwrap(), migration).await,
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    for statement in split_statements(migration.up_sqlite) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", statement))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    for statement in split_statements(migration.up_mysql) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", statement))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Split a migration's SQL into individual statements.
///
/// The embedded SQL contains no string literals with semicolons, so a plain
/// split is sufficient.
fn split_statements(sql: &str) -> impl Iterator<Item = &str> {
    sql.split(';').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[test]
    fn test_migration_versions_are_sequential() {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version, i as i32 + 1);
        }
    }

    #[test]
    fn test_split_statements() {
        let statements: Vec<&str> =
            split_statements("CREATE TABLE a (id INT);\n CREATE INDEX b ON a(id);\n").collect();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE"));
        assert!(statements[1].starts_with("CREATE INDEX"));
    }

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await.expect("Failed to create pool");

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, MIGRATIONS.len());

        // Second run is a no-op
        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, 0);

        assert!(is_up_to_date(&pool).await.expect("Failed to check status"));
    }

    #[tokio::test]
    async fn test_migrations_create_all_tables() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        for table in ["users", "sessions", "models", "colors", "painted_models"] {
            let sql = format!("SELECT COUNT(*) FROM {}", table);
            pool.execute(&sql)
                .await
                .unwrap_or_else(|e| panic!("Table {} missing: {}", table, e));
        }
    }
}
