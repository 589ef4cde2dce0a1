//! Model repository
//!
//! CRUD access to the models table through the generic `EntityStore`
//! contract. Patch application is read-modify-write: the row is loaded,
//! the allow-listed fields are overwritten in memory, and the full row is
//! written back.

use crate::config::DatabaseDriver;
use crate::db::repositories::EntityStore;
use crate::db::DynDatabasePool;
use crate::models::{Model, ModelPatch, NewModel};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// SQLx-based model repository supporting SQLite and MySQL.
pub struct SqlxModelRepository {
    pool: DynDatabasePool,
}

impl SqlxModelRepository {
    /// Create a new SQLx model repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared store handle
    pub fn boxed(
        pool: DynDatabasePool,
    ) -> Arc<dyn EntityStore<Entity = Model, New = NewModel, Patch = ModelPatch>> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl EntityStore for SqlxModelRepository {
    type Entity = Model;
    type New = NewModel;
    type Patch = ModelPatch;

    async fn list(&self) -> Result<Vec<Model>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn get(&self, id: i64) -> Result<Option<Model>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn insert(&self, new: &NewModel) -> Result<Model> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => insert_sqlite(self.pool.as_sqlite().unwrap(), new).await,
            DatabaseDriver::Mysql => insert_mysql(self.pool.as_mysql().unwrap(), new).await,
        }
    }

    async fn update(&self, id: i64, patch: &ModelPatch) -> Result<Option<Model>> {
        let mut model = match self.get(id).await? {
            Some(model) => model,
            None => return Ok(None),
        };
        patch.apply(&mut model);

        match self.pool.driver() {
            DatabaseDriver::Sqlite => save_sqlite(self.pool.as_sqlite().unwrap(), &model).await?,
            DatabaseDriver::Mysql => save_mysql(self.pool.as_mysql().unwrap(), &model).await?,
        }

        Ok(Some(model))
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

async fn list_sqlite(pool: &SqlitePool) -> Result<Vec<Model>> {
    let rows = sqlx::query("SELECT id, name, filepath, mesh, user_id FROM models ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to list models")?;

    Ok(rows.iter().map(row_to_model).collect())
}

async fn get_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Model>> {
    let row = sqlx::query("SELECT id, name, filepath, mesh, user_id FROM models WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get model")?;

    Ok(row.as_ref().map(row_to_model))
}

async fn insert_sqlite(pool: &SqlitePool, new: &NewModel) -> Result<Model> {
    let result = sqlx::query(
        "INSERT INTO models (name, filepath, mesh, user_id) VALUES (?, ?, ?, NULL)",
    )
    .bind(&new.name)
    .bind(&new.filepath)
    .bind(&new.mesh)
    .execute(pool)
    .await
    .context("Failed to insert model")?;

    Ok(Model {
        id: result.last_insert_rowid(),
        name: new.name.clone(),
        filepath: new.filepath.clone(),
        mesh: new.mesh.clone(),
        user_id: None,
    })
}

async fn save_sqlite(pool: &SqlitePool, model: &Model) -> Result<()> {
    sqlx::query("UPDATE models SET name = ?, filepath = ?, mesh = ? WHERE id = ?")
        .bind(&model.name)
        .bind(&model.filepath)
        .bind(&model.mesh)
        .bind(model.id)
        .execute(pool)
        .await
        .context("Failed to update model")?;

    Ok(())
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM models WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete model")?;

    Ok(result.rows_affected())
}

fn row_to_model(row: &sqlx::sqlite::SqliteRow) -> Model {
    Model {
        id: row.get("id"),
        name: row.get("name"),
        filepath: row.get("filepath"),
        mesh: row.get("mesh"),
        user_id: row.get("user_id"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn list_mysql(pool: &MySqlPool) -> Result<Vec<Model>> {
    let rows = sqlx::query("SELECT id, name, filepath, mesh, user_id FROM models ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to list models")?;

    Ok(rows.iter().map(row_to_model_mysql).collect())
}

async fn get_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Model>> {
    let row = sqlx::query("SELECT id, name, filepath, mesh, user_id FROM models WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get model")?;

    Ok(row.as_ref().map(row_to_model_mysql))
}

async fn insert_mysql(pool: &MySqlPool, new: &NewModel) -> Result<Model> {
    let result = sqlx::query(
        "INSERT INTO models (name, filepath, mesh, user_id) VALUES (?, ?, ?, NULL)",
    )
    .bind(&new.name)
    .bind(&new.filepath)
    .bind(&new.mesh)
    .execute(pool)
    .await
    .context("Failed to insert model")?;

    Ok(Model {
        id: result.last_insert_id() as i64,
        name: new.name.clone(),
        filepath: new.filepath.clone(),
        mesh: new.mesh.clone(),
        user_id: None,
    })
}

async fn save_mysql(pool: &MySqlPool, model: &Model) -> Result<()> {
    sqlx::query("UPDATE models SET name = ?, filepath = ?, mesh = ? WHERE id = ?")
        .bind(&model.name)
        .bind(&model.filepath)
        .bind(&model.mesh)
        .bind(model.id)
        .execute(pool)
        .await
        .context("Failed to update model")?;

    Ok(())
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM models WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete model")?;

    Ok(result.rows_affected())
}

fn row_to_model_mysql(row: &sqlx::mysql::MySqlRow) -> Model {
    Model {
        id: row.get("id"),
        name: row.get("name"),
        filepath: row.get("filepath"),
        mesh: row.get("mesh"),
        user_id: row.get("user_id"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxModelRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxModelRepository::new(pool)
    }

    fn dragon() -> NewModel {
        NewModel {
            name: "Dragon".to_string(),
            filepath: "/m/dragon.gltf".to_string(),
            mesh: "head,body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = setup().await;

        let created = repo.insert(&dragon()).await.expect("Failed to insert");
        assert!(created.id > 0);
        assert!(created.user_id.is_none());

        let found = repo
            .get(created.id)
            .await
            .expect("Failed to get")
            .expect("Model not found");
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_list() {
        let repo = setup().await;
        assert!(repo.list().await.expect("Failed to list").is_empty());

        repo.insert(&dragon()).await.expect("Failed to insert");
        repo.insert(&dragon()).await.expect("Failed to insert");

        assert_eq!(repo.list().await.expect("Failed to list").len(), 2);
    }

    #[tokio::test]
    async fn test_update_applies_patch_only() {
        let repo = setup().await;
        let created = repo.insert(&dragon()).await.expect("Failed to insert");

        let patch = ModelPatch {
            name: Some("Wyvern".to_string()),
            ..Default::default()
        };
        let updated = repo
            .update(created.id, &patch)
            .await
            .expect("Failed to update")
            .expect("Model not found");

        assert_eq!(updated.name, "Wyvern");
        assert_eq!(updated.filepath, "/m/dragon.gltf");
        assert_eq!(updated.mesh, "head,body");
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let repo = setup().await;
        let result = repo
            .update(42, &ModelPatch::default())
            .await
            .expect("Failed to update");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup().await;
        let created = repo.insert(&dragon()).await.expect("Failed to insert");

        assert!(repo.delete(created.id).await.expect("Failed to delete"));
        assert!(repo.get(created.id).await.expect("Failed to get").is_none());
        assert!(!repo.delete(created.id).await.expect("Failed to delete"));
    }
}
