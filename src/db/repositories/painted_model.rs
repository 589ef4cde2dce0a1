//! Painted model repository
//!
//! CRUD access to the painted_models join table. References are not
//! enforced at the schema level, so inserts and patches accept ids that no
//! longer resolve; the repaint workflow is the component that deals with
//! the resulting dangling references.

use crate::config::DatabaseDriver;
use crate::db::repositories::EntityStore;
use crate::db::DynDatabasePool;
use crate::models::{NewPaintedModel, PaintedModel, PaintedModelPatch};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// SQLx-based painted model repository supporting SQLite and MySQL.
pub struct SqlxPaintedModelRepository {
    pool: DynDatabasePool,
}

impl SqlxPaintedModelRepository {
    /// Create a new SQLx painted model repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared store handle
    pub fn boxed(
        pool: DynDatabasePool,
    ) -> Arc<dyn EntityStore<Entity = PaintedModel, New = NewPaintedModel, Patch = PaintedModelPatch>>
    {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl EntityStore for SqlxPaintedModelRepository {
    type Entity = PaintedModel;
    type New = NewPaintedModel;
    type Patch = PaintedModelPatch;

    async fn list(&self) -> Result<Vec<PaintedModel>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn get(&self, id: i64) -> Result<Option<PaintedModel>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn insert(&self, new: &NewPaintedModel) -> Result<PaintedModel> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => insert_sqlite(self.pool.as_sqlite().unwrap(), new).await,
            DatabaseDriver::Mysql => insert_mysql(self.pool.as_mysql().unwrap(), new).await,
        }
    }

    async fn update(&self, id: i64, patch: &PaintedModelPatch) -> Result<Option<PaintedModel>> {
        let mut painted = match self.get(id).await? {
            Some(painted) => painted,
            None => return Ok(None),
        };
        patch.apply(&mut painted);

        match self.pool.driver() {
            DatabaseDriver::Sqlite => save_sqlite(self.pool.as_sqlite().unwrap(), &painted).await?,
            DatabaseDriver::Mysql => save_mysql(self.pool.as_mysql().unwrap(), &painted).await?,
        }

        Ok(Some(painted))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await?,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await?,
        };
        Ok(affected > 0)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn list_sqlite(pool: &SqlitePool) -> Result<Vec<PaintedModel>> {
    let rows = sqlx::query("SELECT id, model_id, color_id FROM painted_models ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to list painted models")?;

    Ok(rows.iter().map(row_to_painted).collect())
}

async fn get_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<PaintedModel>> {
    let row = sqlx::query("SELECT id, model_id, color_id FROM painted_models WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get painted model")?;

    Ok(row.as_ref().map(row_to_painted))
}

async fn insert_sqlite(pool: &SqlitePool, new: &NewPaintedModel) -> Result<PaintedModel> {
    let result = sqlx::query("INSERT INTO painted_models (model_id, color_id) VALUES (?, ?)")
        .bind(new.model_id)
        .bind(new.color_id)
        .execute(pool)
        .await
        .context("Failed to insert painted model")?;

    Ok(PaintedModel {
        id: result.last_insert_rowid(),
        model_id: new.model_id,
        color_id: new.color_id,
    })
}

async fn save_sqlite(pool: &SqlitePool, painted: &PaintedModel) -> Result<()> {
    sqlx::query("UPDATE painted_models SET model_id = ?, color_id = ? WHERE id = ?")
        .bind(painted.model_id)
        .bind(painted.color_id)
        .bind(painted.id)
        .execute(pool)
        .await
        .context("Failed to update painted model")?;

    Ok(())
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM painted_models WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete painted model")?;

    Ok(result.rows_affected())
}

fn row_to_painted(row: &sqlx::sqlite::SqliteRow) -> PaintedModel {
    PaintedModel {
        id: row.get("id"),
        model_id: row.get("model_id"),
        color_id: row.get("color_id"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn list_mysql(pool: &MySqlPool) -> Result<Vec<PaintedModel>> {
    let rows = sqlx::query("SELECT id, model_id, color_id FROM painted_models ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to list painted models")?;

    Ok(rows.iter().map(row_to_painted_mysql).collect())
}

async fn get_mysql(pool: &MySqlPool, id: i64) -> Result<Option<PaintedModel>> {
    let row = sqlx::query("SELECT id, model_id, color_id FROM painted_models WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get painted model")?;

    Ok(row.as_ref().map(row_to_painted_mysql))
}

async fn insert_mysql(pool: &MySqlPool, new: &NewPaintedModel) -> Result<PaintedModel> {
    let result = sqlx::query("INSERT INTO painted_models (model_id, color_id) VALUES (?, ?)")
        .bind(new.model_id)
        .bind(new.color_id)
        .execute(pool)
        .await
        .context("Failed to insert painted model")?;

    Ok(PaintedModel {
        id: result.last_insert_id() as i64,
        model_id: new.model_id,
        color_id: new.color_id,
    })
}

async fn save_mysql(pool: &MySqlPool, painted: &PaintedModel) -> Result<()> {
    sqlx::query("UPDATE painted_models SET model_id = ?, color_id = ? WHERE id = ?")
        .bind(painted.model_id)
        .bind(painted.color_id)
        .bind(painted.id)
        .execute(pool)
        .await
        .context("Failed to update painted model")?;

    Ok(())
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM painted_models WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete painted model")?;

    Ok(result.rows_affected())
}

fn row_to_painted_mysql(row: &sqlx::mysql::MySqlRow) -> PaintedModel {
    PaintedModel {
        id: row.get("id"),
        model_id: row.get("model_id"),
        color_id: row.get("color_id"),
    }
}
