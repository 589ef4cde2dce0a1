//! Color repository
//!
//! CRUD access to the colors table. The `material` column is UNIQUE, so a
//! duplicate insert or a patch that collides with an existing material
//! surfaces as a database error here and maps to a 500 at the API boundary,
//! matching the observed contract.

use crate::config::DatabaseDriver;
use crate::db::repositories::EntityStore;
use crate::db::DynDatabasePool;
use crate::models::{Color, ColorPatch, NewColor};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// SQLx-based color repository supporting SQLite and MySQL.
pub struct SqlxColorRepository {
    pool: DynDatabasePool,
}

impl SqlxColorRepository {
    /// Create a new SQLx color repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared store handle
    pub fn boxed(
        pool: DynDatabasePool,
    ) -> Arc<dyn EntityStore<Entity = Color, New = NewColor, Patch = ColorPatch>> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl EntityStore for SqlxColorRepository {
    type Entity = Color;
    type New = NewColor;
    type Patch = ColorPatch;

    async fn list(&self) -> Result<Vec<Color>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn get(&self, id: i64) -> Result<Option<Color>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn insert(&self, new: &NewColor) -> Result<Color> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => insert_sqlite(self.pool.as_sqlite().unwrap(), new).await,
            DatabaseDriver::Mysql => insert_mysql(self.pool.as_mysql().unwrap(), new).await,
        }
    }

    async fn update(&self, id: i64, patch: &ColorPatch) -> Result<Option<Color>> {
        let mut color = match self.get(id).await? {
            Some(color) => color,
            None => return Ok(None),
        };
        patch.apply(&mut color);

        match self.pool.driver() {
            DatabaseDriver::Sqlite => save_sqlite(self.pool.as_sqlite().unwrap(), &color).await?,
            DatabaseDriver::Mysql => save_mysql(self.pool.as_mysql().unwrap(), &color).await?,
        }

        Ok(Some(color))
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

async fn list_sqlite(pool: &SqlitePool) -> Result<Vec<Color>> {
    let rows = sqlx::query("SELECT id, name, hexcode, material FROM colors ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to list colors")?;

    Ok(rows.iter().map(row_to_color).collect())
}

async fn get_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Color>> {
    let row = sqlx::query("SELECT id, name, hexcode, material FROM colors WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get color")?;

    Ok(row.as_ref().map(row_to_color))
}

async fn insert_sqlite(pool: &SqlitePool, new: &NewColor) -> Result<Color> {
    let result = sqlx::query("INSERT INTO colors (name, hexcode, material) VALUES (?, ?, ?)")
        .bind(&new.name)
        .bind(&new.hexcode)
        .bind(&new.material)
        .execute(pool)
        .await
        .context("Failed to insert color")?;

    Ok(Color {
        id: result.last_insert_rowid(),
        name: Some(new.name.clone()),
        hexcode: new.hexcode.clone(),
        material: new.material.clone(),
    })
}

async fn save_sqlite(pool: &SqlitePool, color: &Color) -> Result<()> {
    sqlx::query("UPDATE colors SET name = ?, hexcode = ?, material = ? WHERE id = ?")
        .bind(&color.name)
        .bind(&color.hexcode)
        .bind(&color.material)
        .bind(color.id)
        .execute(pool)
        .await
        .context("Failed to update color")?;

    Ok(())
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM colors WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete color")?;

    Ok(result.rows_affected())
}

fn row_to_color(row: &sqlx::sqlite::SqliteRow) -> Color {
    Color {
        id: row.get("id"),
        name: row.get("name"),
        hexcode: row.get("hexcode"),
        material: row.get("material"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn list_mysql(pool: &MySqlPool) -> Result<Vec<Color>> {
    let rows = sqlx::query("SELECT id, name, hexcode, material FROM colors ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to list colors")?;

    Ok(rows.iter().map(row_to_color_mysql).collect())
}

async fn get_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Color>> {
    let row = sqlx::query("SELECT id, name, hexcode, material FROM colors WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get color")?;

    Ok(row.as_ref().map(row_to_color_mysql))
}

async fn insert_mysql(pool: &MySqlPool, new: &NewColor) -> Result<Color> {
    let result = sqlx::query("INSERT INTO colors (name, hexcode, material) VALUES (?, ?, ?)")
        .bind(&new.name)
        .bind(&new.hexcode)
        .bind(&new.material)
        .execute(pool)
        .await
        .context("Failed to insert color")?;

    Ok(Color {
        id: result.last_insert_id() as i64,
        name: Some(new.name.clone()),
        hexcode: new.hexcode.clone(),
        material: new.material.clone(),
    })
}

async fn save_mysql(pool: &MySqlPool, color: &Color) -> Result<()> {
    sqlx::query("UPDATE colors SET name = ?, hexcode = ?, material = ? WHERE id = ?")
        .bind(&color.name)
        .bind(&color.hexcode)
        .bind(&color.material)
        .bind(color.id)
        .execute(pool)
        .await
        .context("Failed to update color")?;

    Ok(())
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM colors WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete color")?;

    Ok(result.rows_affected())
}

fn row_to_color_mysql(row: &sqlx::mysql::MySqlRow) -> Color {
    Color {
        id: row.get("id"),
        name: row.get("name"),
        hexcode: row.get("hexcode"),
        material: row.get("material"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxColorRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxColorRepository::new(pool)
    }

    fn red_scale() -> NewColor {
        NewColor {
            name: "Dragon Red".to_string(),
            hexcode: "#ff0000".to_string(),
            material: "scale".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = setup().await;

        let created = repo.insert(&red_scale()).await.expect("Failed to insert");
        assert!(created.id > 0);

        let found = repo
            .get(created.id)
            .await
            .expect("Failed to get")
            .expect("Color not found");
        assert_eq!(found.material, "scale");
        assert_eq!(found.name.as_deref(), Some("Dragon Red"));
    }

    #[tokio::test]
    async fn test_material_unique_constraint() {
        let repo = setup().await;
        repo.insert(&red_scale()).await.expect("Failed to insert");

        let mut clash = red_scale();
        clash.hexcode = "#00ff00".to_string();
        assert!(repo.insert(&clash).await.is_err());
    }

    #[tokio::test]
    async fn test_update_hexcode() {
        let repo = setup().await;
        let created = repo.insert(&red_scale()).await.expect("Failed to insert");

        let patch = ColorPatch {
            hexcode: Some("#00ff00".to_string()),
            ..Default::default()
        };
        let updated = repo
            .update(created.id, &patch)
            .await
            .expect("Failed to update")
            .expect("Color not found");

        assert_eq!(updated.hexcode, "#00ff00");
        assert_eq!(updated.material, "scale");
    }

    #[tokio::test]
    async fn test_delete_missing_returns_false() {
        let repo = setup().await;
        assert!(!repo.delete(77).await.expect("Failed to delete"));
    }
}
