//! Composite save-model workflows
//!
//! The one multi-step write path in the system. Both workflows run on a
//! single request-scoped transaction:
//!
//! - `save_new` inserts a model owned by the session user, then walks the
//!   submitted color list in order, reusing an existing Color row for each
//!   (hexcode, material) pair or creating one, and linking a PaintedModel
//!   row per entry. The lookup re-runs for every entry against the
//!   transaction connection, so a pair that appears twice in one request
//!   resolves to the row created for its first occurrence.
//! - `repaint` updates the paint job of an existing model. Entries are
//!   keyed by material. A material already painted on the model gets its
//!   Color's hexcode rewritten in place; the Color row is shared, so every
//!   other model painted with that material observes the change. A material
//!   not yet painted gets a find-or-create Color and a new association.
//!
//! On any database failure the transaction is dropped and nothing of the
//! request persists.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Model;
use sqlx::{MySqlPool, Row, SqlitePool};

/// Error types for the composite save workflows
#[derive(Debug, thiserror::Error)]
pub enum PaintError {
    /// Target model does not exist (repaint only)
    #[error("Model not found")]
    ModelNotFound,

    /// Underlying database failure; the message is echoed in the repaint
    /// error response
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// One color entry of a save request: paint `material` with `hexcode`.
#[derive(Debug, Clone)]
pub struct PaintSpec {
    pub hexcode: String,
    pub material: String,
}

/// Input for the create workflow.
#[derive(Debug, Clone)]
pub struct SaveModelInput {
    pub name: String,
    pub filepath: String,
    pub meshes: Vec<String>,
    pub colors: Vec<PaintSpec>,
}

/// One entry of a repaint request.
#[derive(Debug, Clone)]
pub struct Repaint {
    pub material: String,
    pub hexcode: String,
}

/// Service running the composite save workflows
pub struct PaintService {
    pool: DynDatabasePool,
}

impl PaintService {
    /// Create a new paint service
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a model with its paint job. Returns the new model's id.
    pub async fn save_new(&self, user_id: i64, input: &SaveModelInput) -> Result<i64, PaintError> {
        let model_id = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                save_new_sqlite(self.pool.as_sqlite().unwrap(), user_id, input).await?
            }
            DatabaseDriver::Mysql => {
                save_new_mysql(self.pool.as_mysql().unwrap(), user_id, input).await?
            }
        };
        tracing::debug!(model_id, user_id, "Model and colors saved");
        Ok(model_id)
    }

    /// Update the paint job of an existing model.
    pub async fn repaint(&self, model_id: i64, entries: &[Repaint]) -> Result<(), PaintError> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                repaint_sqlite(self.pool.as_sqlite().unwrap(), model_id, entries).await?
            }
            DatabaseDriver::Mysql => {
                repaint_mysql(self.pool.as_mysql().unwrap(), model_id, entries).await?
            }
        }
        tracing::debug!(model_id, "Model repainted");
        Ok(())
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn save_new_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    input: &SaveModelInput,
) -> Result<i64, PaintError> {
    let mut tx = pool.begin().await?;

    let mesh = Model::join_meshes(&input.meshes);
    let model_id = sqlx::query(
        "INSERT INTO models (name, filepath, mesh, user_id) VALUES (?, ?, ?, ?)",
    )
    .bind(&input.name)
    .bind(&input.filepath)
    .bind(&mesh)
    .bind(user_id)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    for paint in &input.colors {
        // Fresh lookup per entry; rows created earlier in this request are
        // visible on the transaction connection
        let existing: Option<i64> =
            sqlx::query("SELECT id FROM colors WHERE hexcode = ? AND material = ?")
                .bind(&paint.hexcode)
                .bind(&paint.material)
                .fetch_optional(&mut *tx)
                .await?
                .map(|row| row.get("id"));

        let color_id = match existing {
            Some(id) => id,
            None => sqlx::query("INSERT INTO colors (hexcode, material) VALUES (?, ?)")
                .bind(&paint.hexcode)
                .bind(&paint.material)
                .execute(&mut *tx)
                .await?
                .last_insert_rowid(),
        };

        sqlx::query("INSERT INTO painted_models (model_id, color_id) VALUES (?, ?)")
            .bind(model_id)
            .bind(color_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(model_id)
}

async fn repaint_sqlite(
    pool: &SqlitePool,
    model_id: i64,
    entries: &[Repaint],
) -> Result<(), PaintError> {
    let mut tx = pool.begin().await?;

    let model_exists = sqlx::query("SELECT id FROM models WHERE id = ?")
        .bind(model_id)
        .fetch_optional(&mut *tx)
        .await?
        .is_some();
    if !model_exists {
        return Err(PaintError::ModelNotFound);
    }

    // Snapshot the model's associations once; entries match against this
    // snapshot, not against rows created later in the loop
    let snapshot: Vec<(i64, i64, Option<String>)> = sqlx::query(
        r#"
        SELECT pm.id, pm.color_id, c.material
        FROM painted_models pm
        LEFT JOIN colors c ON c.id = pm.color_id
        WHERE pm.model_id = ?
        "#,
    )
    .bind(model_id)
    .fetch_all(&mut *tx)
    .await?
    .iter()
    .map(|row| (row.get("id"), row.get("color_id"), row.get("material")))
    .collect();

    for entry in entries {
        let painted: Option<(i64, i64)> = snapshot
            .iter()
            .find(|(_, _, material)| material.as_deref() == Some(entry.material.as_str()))
            .map(|(painted_id, color_id, _)| (*painted_id, *color_id));

        match painted {
            Some((painted_id, color_id)) => {
                let hexcode: Option<String> =
                    sqlx::query("SELECT hexcode FROM colors WHERE id = ?")
                        .bind(color_id)
                        .fetch_optional(&mut *tx)
                        .await?
                        .map(|row| row.get("hexcode"));

                match hexcode {
                    Some(hexcode) => {
                        if hexcode != entry.hexcode {
                            sqlx::query("UPDATE colors SET hexcode = ? WHERE id = ?")
                                .bind(&entry.hexcode)
                                .bind(color_id)
                                .execute(&mut *tx)
                                .await?;
                        }
                    }
                    None => {
                        // Color deleted out from under the association;
                        // replace it and repoint
                        let new_color_id =
                            sqlx::query("INSERT INTO colors (hexcode, material) VALUES (?, ?)")
                                .bind(&entry.hexcode)
                                .bind(&entry.material)
                                .execute(&mut *tx)
                                .await?
                                .last_insert_rowid();
                        sqlx::query("UPDATE painted_models SET color_id = ? WHERE id = ?")
                            .bind(new_color_id)
                            .bind(painted_id)
                            .execute(&mut *tx)
                            .await?;
                    }
                }
            }
            None => {
                let existing: Option<i64> =
                    sqlx::query("SELECT id FROM colors WHERE material = ? AND hexcode = ?")
                        .bind(&entry.material)
                        .bind(&entry.hexcode)
                        .fetch_optional(&mut *tx)
                        .await?
                        .map(|row| row.get("id"));

                let color_id = match existing {
                    Some(id) => id,
                    None => sqlx::query("INSERT INTO colors (hexcode, material) VALUES (?, ?)")
                        .bind(&entry.hexcode)
                        .bind(&entry.material)
                        .execute(&mut *tx)
                        .await?
                        .last_insert_rowid(),
                };

                sqlx::query("INSERT INTO painted_models (model_id, color_id) VALUES (?, ?)")
                    .bind(model_id)
                    .bind(color_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }
    }

    tx.commit().await?;
    Ok(())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn save_new_mysql(
    pool: &MySqlPool,
    user_id: i64,
    input: &SaveModelInput,
) -> Result<i64, PaintError> {
    let mut tx = pool.begin().await?;

    let mesh = Model::join_meshes(&input.meshes);
    let model_id = sqlx::query(
        "INSERT INTO models (name, filepath, mesh, user_id) VALUES (?, ?, ?, ?)",
    )
    .bind(&input.name)
    .bind(&input.filepath)
    .bind(&mesh)
    .bind(user_id)
    .execute(&mut *tx)
    .await?
    .last_insert_id() as i64;

    for paint in &input.colors {
        let existing: Option<i64> =
            sqlx::query("SELECT id FROM colors WHERE hexcode = ? AND material = ?")
                .bind(&paint.hexcode)
                .bind(&paint.material)
                .fetch_optional(&mut *tx)
                .await?
                .map(|row| row.get("id"));

        let color_id = match existing {
            Some(id) => id,
            None => sqlx::query("INSERT INTO colors (hexcode, material) VALUES (?, ?)")
                .bind(&paint.hexcode)
                .bind(&paint.material)
                .execute(&mut *tx)
                .await?
                .last_insert_id() as i64,
        };

        sqlx::query("INSERT INTO painted_models (model_id, color_id) VALUES (?, ?)")
            .bind(model_id)
            .bind(color_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(model_id)
}

async fn repaint_mysql(
    pool: &MySqlPool,
    model_id: i64,
    entries: &[Repaint],
) -> Result<(), PaintError> {
    let mut tx = pool.begin().await?;

    let model_exists = sqlx::query("SELECT id FROM models WHERE id = ?")
        .bind(model_id)
        .fetch_optional(&mut *tx)
        .await?
        .is_some();
    if !model_exists {
        return Err(PaintError::ModelNotFound);
    }

    let snapshot: Vec<(i64, i64, Option<String>)> = sqlx::query(
        r#"
        SELECT pm.id, pm.color_id, c.material
        FROM painted_models pm
        LEFT JOIN colors c ON c.id = pm.color_id
        WHERE pm.model_id = ?
        "#,
    )
    .bind(model_id)
    .fetch_all(&mut *tx)
    .await?
    .iter()
    .map(|row| (row.get("id"), row.get("color_id"), row.get("material")))
    .collect();

    for entry in entries {
        let painted: Option<(i64, i64)> = snapshot
            .iter()
            .find(|(_, _, material)| material.as_deref() == Some(entry.material.as_str()))
            .map(|(painted_id, color_id, _)| (*painted_id, *color_id));

        match painted {
            Some((painted_id, color_id)) => {
                let hexcode: Option<String> =
                    sqlx::query("SELECT hexcode FROM colors WHERE id = ?")
                        .bind(color_id)
                        .fetch_optional(&mut *tx)
                        .await?
                        .map(|row| row.get("hexcode"));

                match hexcode {
                    Some(hexcode) => {
                        if hexcode != entry.hexcode {
                            sqlx::query("UPDATE colors SET hexcode = ? WHERE id = ?")
                                .bind(&entry.hexcode)
                                .bind(color_id)
                                .execute(&mut *tx)
                                .await?;
                        }
                    }
                    None => {
                        let new_color_id =
                            sqlx::query("INSERT INTO colors (hexcode, material) VALUES (?, ?)")
                                .bind(&entry.hexcode)
                                .bind(&entry.material)
                                .execute(&mut *tx)
                                .await?
                                .last_insert_id() as i64;
                        sqlx::query("UPDATE painted_models SET color_id = ? WHERE id = ?")
                            .bind(new_color_id)
                            .bind(painted_id)
                            .execute(&mut *tx)
                            .await?;
                    }
                }
            }
            None => {
                let existing: Option<i64> =
                    sqlx::query("SELECT id FROM colors WHERE material = ? AND hexcode = ?")
                        .bind(&entry.material)
                        .bind(&entry.hexcode)
                        .fetch_optional(&mut *tx)
                        .await?
                        .map(|row| row.get("id"));

                let color_id = match existing {
                    Some(id) => id,
                    None => sqlx::query("INSERT INTO colors (hexcode, material) VALUES (?, ?)")
                        .bind(&entry.hexcode)
                        .bind(&entry.material)
                        .execute(&mut *tx)
                        .await?
                        .last_insert_id() as i64,
                };

                sqlx::query("INSERT INTO painted_models (model_id, color_id) VALUES (?, ?)")
                    .bind(model_id)
                    .bind(color_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }
    }

    tx.commit().await?;
    Ok(())
}
